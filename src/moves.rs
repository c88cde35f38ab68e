use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChessError, ChessResult};
use crate::piece::{Piece, PieceType};
use crate::square::Square;

/// What a move does besides relocating the moving piece. Derived from the
/// position when the move is validated, never supplied by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    Normal,
    Capture,
    Castle,
    EnPassant,
}

/// A move validated against a specific position.
///
/// Only the legality engine constructs moves, so the moving piece and the
/// kind always agree with the position the move was produced for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Move {
    from: Square,
    to: Square,
    piece: Piece,
    promotion: Option<PieceType>,
    kind: MoveKind,
}

impl Move {
    pub(crate) fn new(
        from: Square,
        to: Square,
        piece: Piece,
        promotion: Option<PieceType>,
        kind: MoveKind,
    ) -> Self {
        Move { from, to, piece, promotion, kind }
    }

    pub fn from(&self) -> Square {
        self.from
    }

    pub fn to(&self) -> Square {
        self.to
    }

    /// The piece standing on the origin square before the move.
    pub fn piece(&self) -> Piece {
        self.piece
    }

    pub fn promotion(&self) -> Option<PieceType> {
        self.promotion
    }

    pub fn kind(&self) -> MoveKind {
        self.kind
    }

    pub fn is_capture(&self) -> bool {
        matches!(self.kind, MoveKind::Capture | MoveKind::EnPassant)
    }

    /// Whether this move is the one a player asked for with `input`.
    pub fn matches(&self, input: &MoveInput) -> bool {
        self.from == input.from && self.to == input.to && self.promotion == input.promotion
    }

    /// Sort key giving the enumeration order: origin, destination, then
    /// promotion piece in [`PieceType::PROMOTIONS`] order.
    pub(crate) fn order_key(&self) -> (Square, Square, usize) {
        let promo_rank = self
            .promotion
            .and_then(|pt| PieceType::PROMOTIONS.iter().position(|&p| p == pt))
            .unwrap_or(0);
        (self.from, self.to, promo_rank)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)?;
        if let Some(pt) = self.promotion {
            write!(f, "={}", pt.letter())?;
        }
        Ok(())
    }
}

/// A move as typed by a player: `<from>-<to>` with an optional `=<letter>`
/// promotion suffix, e.g. `e2-e4` or `a7-a8=Q`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveInput {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceType>,
}

impl FromStr for MoveInput {
    type Err = ChessError;

    fn from_str(s: &str) -> ChessResult<MoveInput> {
        let text = s.trim();
        let (body, promotion) = match text.split_once('=') {
            Some((body, suffix)) => (body, Some(parse_promotion(suffix)?)),
            None => (text, None),
        };

        let mut parts = body.split('-');
        let (Some(from), Some(to), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ChessError::MalformedNotation(format!(
                "expected a move like \"e2-e4\", got {text:?}"
            )));
        };

        Ok(MoveInput {
            from: from.parse()?,
            to: to.parse()?,
            promotion,
        })
    }
}

fn parse_promotion(suffix: &str) -> ChessResult<PieceType> {
    let mut chars = suffix.trim().chars();
    match (chars.next().and_then(PieceType::from_letter), chars.next()) {
        (Some(pt), None) if PieceType::PROMOTIONS.contains(&pt) => Ok(pt),
        _ => Err(ChessError::MalformedNotation(format!(
            "promotion must be one of N, B, R, Q, got {suffix:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().expect("valid square")
    }

    #[test]
    fn parses_plain_move_text() {
        let input: MoveInput = "e2-e4".parse().expect("valid move text");
        assert_eq!(input.from, sq("e2"));
        assert_eq!(input.to, sq("e4"));
        assert_eq!(input.promotion, None);
    }

    #[test]
    fn parses_promotion_suffix_case_insensitively() {
        let input: MoveInput = "A7-A8=n".parse().expect("valid move text");
        assert_eq!(input.from, sq("a7"));
        assert_eq!(input.promotion, Some(PieceType::Knight));
    }

    #[test]
    fn rejects_malformed_text() {
        for text in ["e2e4", "e2-e4-e5", "", "e2-", "e2-e4=K", "e2-e4=QQ", "e2-e4="] {
            assert!(
                matches!(text.parse::<MoveInput>(), Err(ChessError::MalformedNotation(_))),
                "{text:?} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_off_board_squares() {
        assert!(matches!("z2-e4".parse::<MoveInput>(), Err(ChessError::OutOfBoundsSquare(_))));
        assert!(matches!("e2-e9".parse::<MoveInput>(), Err(ChessError::OutOfBoundsSquare(_))));
    }

    #[test]
    fn displays_in_input_grammar() {
        let pawn = Piece::new(PieceType::Pawn, crate::piece::Color::White);
        let mv = Move::new(sq("b7"), sq("b8"), pawn, Some(PieceType::Queen), MoveKind::Normal);
        assert_eq!(mv.to_string(), "b7-b8=Q");
        let input: MoveInput = mv.to_string().parse().expect("round-trips");
        assert!(mv.matches(&input));
    }
}
