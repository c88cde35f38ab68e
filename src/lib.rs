pub mod engine;
pub mod error;
pub mod game;
pub mod moves;
pub mod piece;
pub mod position;
pub mod rules;
pub mod square;

pub use engine::{find_best_move, search_with_time_budget, SearchConfig, SearchResult};
pub use error::{ChessError, ChessResult, ConfigError};
pub use game::{Game, GameState};
pub use moves::{Move, MoveInput};
pub use piece::{Color, Piece, PieceType};
pub use position::Position;
pub use square::Square;
