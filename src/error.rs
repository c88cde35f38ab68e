//! Error types for notation parsing, move validation and engine configuration.
//!
//! Every `ChessError` is recoverable: the operation that returns it leaves the
//! game and position exactly as they were.

use crate::game::GameState;
use crate::piece::Color;
use crate::square::Square;

/// Errors raised while parsing notation or validating a move.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChessError {
    /// Move text or position notation that does not follow the grammar.
    #[error("malformed notation: {0}")]
    MalformedNotation(String),

    /// A square letter or digit outside a-h / 1-8.
    #[error("square out of bounds: {0}")]
    OutOfBoundsSquare(String),

    #[error("no piece at {0}")]
    NoPieceAtOrigin(Square),

    #[error("the piece on {square} is {owner}, but it is {to_move}'s turn")]
    WrongSideColor {
        square: Square,
        owner: Color,
        to_move: Color,
    },

    /// The destination is not reachable with the piece's movement pattern.
    #[error("illegal move shape {from}-{to}")]
    IllegalShape { from: Square, to: Square },

    #[error("path from {from} to {to} is blocked")]
    BlockedPath { from: Square, to: Square },

    #[error("cannot capture own piece on {0}")]
    SelfCapture(Square),

    /// The move would leave (or castle through) the mover's king in check.
    #[error("move {from}-{to} leaves the king exposed")]
    KingExposed { from: Square, to: Square },

    #[error("game is over: {0}")]
    GameOver(GameState),
}

/// Result type alias for rule and game operations.
pub type ChessResult<T> = Result<T, ChessError>;

/// Errors raised while loading a search configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read search config: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse search config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid search config: {0}")]
    Invalid(String),
}
