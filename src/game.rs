//! Turn sequencing for a single game: validates submitted move text,
//! applies accepted moves, and tracks check, checkmate, stalemate and
//! resignation.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ChessError, ChessResult};
use crate::moves::{Move, MoveInput};
use crate::piece::Color;
use crate::position::Position;
use crate::rules::{is_in_check, legal_moves, validate};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// The game continues with this side to move.
    InProgress(Color),
    /// The side to move is mated; holds the winner.
    Checkmate(Color),
    Stalemate,
    /// A player resigned; holds the winner.
    Resigned(Color),
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameState::InProgress(_))
    }

    pub fn winner(self) -> Option<Color> {
        match self {
            GameState::Checkmate(c) | GameState::Resigned(c) => Some(c),
            GameState::InProgress(_) | GameState::Stalemate => None,
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameState::InProgress(c) => write!(f, "{c} to move"),
            GameState::Checkmate(c) => write!(f, "checkmate, {c} wins"),
            GameState::Stalemate => f.write_str("stalemate"),
            GameState::Resigned(c) => write!(f, "resignation, {c} wins"),
        }
    }
}

/// Classify `pos` from the point of view of the side to move.
pub fn classify(pos: &Position) -> GameState {
    let side = pos.side_to_move();
    if !legal_moves(pos, side).is_empty() {
        GameState::InProgress(side)
    } else if is_in_check(pos, side) {
        GameState::Checkmate(side.opposite())
    } else {
        GameState::Stalemate
    }
}

#[derive(Clone, Debug)]
pub struct Game {
    position: Position,
    state: GameState,
    moves: Vec<Move>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// A game from the standard starting position.
    pub fn new() -> Self {
        Game {
            position: Position::new(),
            state: GameState::InProgress(Color::White),
            moves: Vec::new(),
        }
    }

    /// A game from position notation. A mated or stalemated position loads
    /// as a finished game.
    pub fn from_fen(text: &str) -> ChessResult<Self> {
        let position = Position::from_fen(text)?;
        let state = classify(&position);
        Ok(Game {
            position,
            state,
            moves: Vec::new(),
        })
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    /// The current position in notation form.
    pub fn current_position(&self) -> String {
        self.position.to_fen()
    }

    /// Moves played so far, oldest first.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Legal moves for the side to move; empty once the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.state.is_terminal() {
            return Vec::new();
        }
        legal_moves(&self.position, self.position.side_to_move())
    }

    pub fn in_check(&self) -> bool {
        is_in_check(&self.position, self.position.side_to_move())
    }

    /// Parse and play a move such as `e2-e4` or `e7-e8=Q`.
    ///
    /// On error nothing changes.
    pub fn submit_move(&mut self, text: &str) -> ChessResult<GameState> {
        let input = text.parse::<MoveInput>().inspect_err(|err| {
            debug!(text, %err, "rejected move text");
        })?;
        self.play(&input)
    }

    /// Play an already parsed move.
    pub fn play(&mut self, input: &MoveInput) -> ChessResult<GameState> {
        if self.state.is_terminal() {
            return Err(ChessError::GameOver(self.state));
        }

        let mv = validate(&self.position, input).inspect_err(|err| {
            debug!(from = %input.from, to = %input.to, %err, "rejected move");
        })?;

        self.position.apply_move(&mv);
        self.moves.push(mv);
        self.state = classify(&self.position);

        debug!(%mv, capture = mv.is_capture(), state = %self.state, "move played");
        if self.state.is_terminal() {
            info!(state = %self.state, plies = self.moves.len(), "game over");
        }
        Ok(self.state)
    }

    /// The side to move resigns. Has no effect once the game is over.
    pub fn resign(&mut self) -> GameState {
        if let GameState::InProgress(side) = self.state {
            self.state = GameState::Resigned(side.opposite());
            info!(resigned = %side, "game over by resignation");
        }
        self.state
    }
}
