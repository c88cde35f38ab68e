use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChessError, ChessResult};

/// A board coordinate. File 0 is the a-file, rank 0 is rank 1.
///
/// Ordering follows the board scan order used for move enumeration:
/// rank-major, a1, b1, ..., h1, a2, ..., h8.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Square {
    rank: u8,
    file: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> ChessResult<Square> {
        if file < 8 && rank < 8 {
            Ok(Square { rank, file })
        } else {
            Err(ChessError::OutOfBoundsSquare(format!("file {file}, rank {rank}")))
        }
    }

    /// Unchecked constructor for squares known to be on the board.
    pub(crate) const fn at(file: u8, rank: u8) -> Square {
        Square { rank, file }
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    /// The square `df` files and `dr` ranks away, if still on the board.
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let file = self.file as i8 + df;
        let rank = self.rank as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::at(file as u8, rank as u8))
        } else {
            None
        }
    }

    /// Every square in scan order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|rank| (0..8u8).map(move |file| Square::at(file, rank)))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file) as char, (b'1' + self.rank) as char)
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> ChessResult<Square> {
        let s = s.trim();
        let mut chars = s.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(ChessError::MalformedNotation(format!(
                "expected a square like \"e4\", got {s:?}"
            )));
        };
        let file = file.to_ascii_lowercase();
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return Err(ChessError::OutOfBoundsSquare(s.to_string()));
        }
        Ok(Square::at(file as u8 - b'a', rank as u8 - b'1'))
    }
}

impl From<Square> for String {
    fn from(sq: Square) -> String {
        sq.to_string()
    }
}

impl TryFrom<String> for Square {
    type Error = ChessError;

    fn try_from(s: String) -> ChessResult<Square> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_prints_coordinates() {
        let e4: Square = "e4".parse().expect("e4 is a square");
        assert_eq!((e4.file(), e4.rank()), (4, 3));
        assert_eq!(e4.to_string(), "e4");
        assert_eq!("H8".parse::<Square>().map(|s| (s.file(), s.rank())), Ok((7, 7)));
    }

    #[test]
    fn rejects_off_board_letters_and_digits() {
        assert!(matches!("i1".parse::<Square>(), Err(ChessError::OutOfBoundsSquare(_))));
        assert!(matches!("a9".parse::<Square>(), Err(ChessError::OutOfBoundsSquare(_))));
        assert!(matches!("a0".parse::<Square>(), Err(ChessError::OutOfBoundsSquare(_))));
        assert!(matches!("e".parse::<Square>(), Err(ChessError::MalformedNotation(_))));
        assert!(matches!(Square::new(8, 0), Err(ChessError::OutOfBoundsSquare(_))));
    }

    #[test]
    fn scan_order_is_rank_major() {
        let order: Vec<String> = Square::all().take(10).map(|s| s.to_string()).collect();
        assert_eq!(order[0], "a1");
        assert_eq!(order[7], "h1");
        assert_eq!(order[8], "a2");
        let a2: Square = "a2".parse().expect("square");
        let h1: Square = "h1".parse().expect("square");
        assert!(h1 < a2, "h1 must sort before a2");
    }

    #[test]
    fn offsets_stay_on_board() {
        let a1 = Square::at(0, 0);
        assert_eq!(a1.offset(1, 2), Some(Square::at(1, 2)));
        assert_eq!(a1.offset(-1, 0), None);
        assert_eq!(Square::at(7, 7).offset(0, 1), None);
    }

    #[test]
    fn serializes_as_coordinate_text() {
        let json = serde_json::to_string(&Square::at(4, 3)).expect("serialize");
        assert_eq!(json, "\"e4\"");
        let back: Square = serde_json::from_str("\"g7\"").expect("deserialize");
        assert_eq!(back, Square::at(6, 6));
    }
}
