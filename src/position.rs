use std::fmt;
use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChessError, ChessResult};
use crate::moves::{Move, MoveKind};
use crate::piece::{Color, Piece, PieceType};
use crate::rules::is_in_check;
use crate::square::Square;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    fn revoke_all(&mut self, color: Color) {
        match color {
            Color::White => {
                self.white_kingside = false;
                self.white_queenside = false;
            }
            Color::Black => {
                self.black_kingside = false;
                self.black_queenside = false;
            }
        }
    }

    /// A piece leaving or arriving on a rook's home corner ends that right.
    fn revoke_corner(&mut self, sq: Square) {
        match (sq.file(), sq.rank()) {
            (0, 0) => self.white_queenside = false,
            (7, 0) => self.white_kingside = false,
            (0, 7) => self.black_queenside = false,
            (7, 7) => self.black_kingside = false,
            _ => {}
        }
    }

    fn to_fen(self) -> String {
        let mut s = String::new();
        if self.white_kingside {
            s.push('K');
        }
        if self.white_queenside {
            s.push('Q');
        }
        if self.black_kingside {
            s.push('k');
        }
        if self.black_queenside {
            s.push('q');
        }
        if s.is_empty() {
            s.push('-');
        }
        s
    }

    fn from_fen(field: &str) -> ChessResult<CastlingRights> {
        let mut rights = CastlingRights::default();
        if field == "-" {
            return Ok(rights);
        }
        for c in field.chars() {
            let slot = match c {
                'K' => &mut rights.white_kingside,
                'Q' => &mut rights.white_queenside,
                'k' => &mut rights.black_kingside,
                'q' => &mut rights.black_queenside,
                _ => {
                    return Err(ChessError::MalformedNotation(format!(
                        "invalid castling rights {field:?}"
                    )))
                }
            };
            if *slot {
                return Err(ChessError::MalformedNotation(format!(
                    "repeated castling right {c:?} in {field:?}"
                )));
            }
            *slot = true;
        }
        Ok(rights)
    }
}

/// Everything `apply_move` overwrites, so `undo_move` can put it back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Undo {
    captured: Option<(Square, Piece)>,
    castling_rights: CastlingRights,
    en_passant_target: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Undo {
    pub fn captured(&self) -> Option<Piece> {
        self.captured.map(|(_, p)| p)
    }
}

/// The full state of a game at one instant.
///
/// Squares are indexed `[rank][file]`, rank 0 = rank 1, file 0 = the a-file.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Position {
    squares: [[Option<Piece>; 8]; 8],
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant_target: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    /// An empty board, White to move. Only used to build test positions.
    #[cfg(test)]
    pub(crate) fn empty() -> Self {
        Position {
            squares: [[None; 8]; 8],
            side_to_move: Color::White,
            castling_rights: CastlingRights::default(),
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// The standard starting position.
    pub fn new() -> Self {
        let mut squares = [[None; 8]; 8];
        let back = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];
        for (file, &pt) in back.iter().enumerate() {
            squares[0][file] = Some(Piece::new(pt, Color::White));
            squares[1][file] = Some(Piece::new(PieceType::Pawn, Color::White));
            squares[6][file] = Some(Piece::new(PieceType::Pawn, Color::Black));
            squares[7][file] = Some(Piece::new(pt, Color::Black));
        }

        Position {
            squares,
            side_to_move: Color::White,
            castling_rights: CastlingRights::ALL,
            en_passant_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Parse position notation:
    /// `<placement> <side> <castling> <en-passant> <halfmove> <fullmove>`.
    ///
    /// Placement lists rank 8 first. The two clock fields may be omitted.
    pub fn from_fen(text: &str) -> ChessResult<Position> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        if !(4..=6).contains(&fields.len()) {
            return Err(malformed(format!(
                "expected 4 to 6 space-separated fields, found {}",
                fields.len()
            )));
        }

        let squares = parse_placement(fields[0])?;

        let side_to_move = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(malformed(format!("invalid side to move {other:?}"))),
        };

        let castling_rights = CastlingRights::from_fen(fields[2])?;

        let en_passant_target = match fields[3] {
            "-" => None,
            field => {
                let sq: Square = field
                    .parse()
                    .map_err(|_| malformed(format!("invalid en-passant square {field:?}")))?;
                // The target lies behind a pawn the opponent just pushed two squares.
                let pusher = side_to_move.opposite();
                let expected_rank =
                    pusher.pawn_start_rank().wrapping_add_signed(pusher.pawn_direction());
                if sq.rank() != expected_rank {
                    return Err(malformed(format!(
                        "en-passant square {field} is impossible with {side_to_move} to move"
                    )));
                }
                Some(sq)
            }
        };

        let halfmove_clock =
            parse_counter(fields.get(4).copied().unwrap_or("0"), "halfmove clock")?;
        let fullmove_number =
            parse_counter(fields.get(5).copied().unwrap_or("1"), "fullmove number")?;

        let position = Position {
            squares,
            side_to_move,
            castling_rights,
            en_passant_target,
            halfmove_clock,
            fullmove_number,
        };

        for color in [Color::White, Color::Black] {
            let kings = position
                .pieces(color)
                .filter(|(_, p)| p.piece_type == PieceType::King)
                .count();
            if kings != 1 {
                return Err(malformed(format!("{color} has {kings} kings, expected exactly one")));
            }
        }

        let waiting = side_to_move.opposite();
        if is_in_check(&position, waiting) {
            return Err(malformed(format!(
                "{waiting} is in check but it is {side_to_move}'s turn"
            )));
        }

        Ok(position)
    }

    /// Canonical notation: ranks 8 to 1, files a to h.
    pub fn to_fen(&self) -> String {
        let mut placement = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.squares[rank][file] {
                    Some(p) => {
                        if empty > 0 {
                            placement.push_str(&empty.to_string());
                            empty = 0;
                        }
                        placement.push(p.to_fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                placement.push_str(&empty.to_string());
            }
            if rank > 0 {
                placement.push('/');
            }
        }

        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };
        let ep = self
            .en_passant_target
            .map(|sq| sq.to_string())
            .unwrap_or_else(|| "-".to_string());

        format!(
            "{placement} {side} {} {ep} {} {}",
            self.castling_rights.to_fen(),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Board diagram, rank 8 at the top, `.` for empty squares.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        for rank in (0..8).rev() {
            out.push((b'1' + rank as u8) as char);
            for file in 0..8 {
                out.push(' ');
                out.push(self.squares[rank][file].map(Piece::to_fen_char).unwrap_or('.'));
            }
            out.push('\n');
        }
        out.push_str("  a b c d e f g h\n");
        out
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.rank() as usize][sq.file() as usize]
    }

    pub(crate) fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.rank() as usize][sq.file() as usize] = piece;
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.en_passant_target
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Pieces of one color with their squares, in scan order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| {
            self.piece_at(sq)
                .filter(|p| p.color == color)
                .map(|p| (sq, p))
        })
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, p)| p.piece_type == PieceType::King)
            .map(|(sq, _)| sq)
    }

    /// Play `mv` in place and return what is needed to take it back.
    ///
    /// `mv` must have been produced by the legality engine for this exact
    /// position; the moving piece and move kind are taken from it.
    pub fn apply_move(&mut self, mv: &Move) -> Undo {
        let undo_base = Undo {
            captured: None,
            castling_rights: self.castling_rights,
            en_passant_target: self.en_passant_target,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        };
        let piece = mv.piece();
        let (from, to) = (mv.from(), mv.to());

        let captured_sq = match mv.kind() {
            MoveKind::EnPassant => Square::at(to.file(), from.rank()),
            _ => to,
        };
        let captured = self.piece_at(captured_sq).map(|p| (captured_sq, p));
        self.set_piece(captured_sq, None);

        self.set_piece(from, None);
        let placed = match mv.promotion() {
            Some(pt) => Piece::new(pt, piece.color),
            None => piece,
        };
        self.set_piece(to, Some(placed));

        if mv.kind() == MoveKind::Castle {
            let (rook_from, rook_to) = castle_rook_squares(to);
            let rook = self.piece_at(rook_from);
            self.set_piece(rook_from, None);
            self.set_piece(rook_to, rook);
        }

        if piece.piece_type == PieceType::King {
            self.castling_rights.revoke_all(piece.color);
        }
        self.castling_rights.revoke_corner(from);
        self.castling_rights.revoke_corner(to);

        let is_pawn = piece.piece_type == PieceType::Pawn;
        self.en_passant_target = if is_pawn && from.rank().abs_diff(to.rank()) == 2 {
            Some(Square::at(from.file(), (from.rank() + to.rank()) / 2))
        } else {
            None
        };

        if is_pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        if self.side_to_move == Color::Black {
            self.fullmove_number += 1;
        }
        self.side_to_move = self.side_to_move.opposite();

        Undo { captured, ..undo_base }
    }

    /// Exact inverse of [`Position::apply_move`] for the same move.
    pub fn undo_move(&mut self, mv: &Move, undo: Undo) {
        self.side_to_move = self.side_to_move.opposite();
        self.castling_rights = undo.castling_rights;
        self.en_passant_target = undo.en_passant_target;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;

        if mv.kind() == MoveKind::Castle {
            let (rook_from, rook_to) = castle_rook_squares(mv.to());
            let rook = self.piece_at(rook_to);
            self.set_piece(rook_to, None);
            self.set_piece(rook_from, rook);
        }

        self.set_piece(mv.to(), None);
        self.set_piece(mv.from(), Some(mv.piece()));
        if let Some((sq, piece)) = undo.captured {
            self.set_piece(sq, Some(piece));
        }
    }

    /// Copy of this position with `mv` played.
    pub fn applied(&self, mv: &Move) -> Position {
        let mut next = self.clone();
        next.apply_move(mv);
        next
    }

    /// Play `mv` for the lifetime of the returned guard. The move is taken
    /// back when the guard is dropped, including during unwinding, and the
    /// guard holds the only borrow of the position meanwhile.
    pub fn scoped(&mut self, mv: &Move) -> Applied<'_> {
        let undo = self.apply_move(mv);
        Applied { position: self, mv: *mv, undo }
    }
}

/// Guard returned by [`Position::scoped`].
pub struct Applied<'a> {
    position: &'a mut Position,
    mv: Move,
    undo: Undo,
}

impl Deref for Applied<'_> {
    type Target = Position;

    fn deref(&self) -> &Position {
        self.position
    }
}

impl DerefMut for Applied<'_> {
    fn deref_mut(&mut self) -> &mut Position {
        self.position
    }
}

impl Drop for Applied<'_> {
    fn drop(&mut self) {
        self.position.undo_move(&self.mv, self.undo);
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({})", self.to_fen())
    }
}

impl FromStr for Position {
    type Err = ChessError;

    fn from_str(s: &str) -> ChessResult<Position> {
        Position::from_fen(s)
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> String {
        pos.to_fen()
    }
}

impl TryFrom<String> for Position {
    type Error = ChessError;

    fn try_from(s: String) -> ChessResult<Position> {
        Position::from_fen(&s)
    }
}

/// Rook origin and destination for a castling king landing on `king_to`.
pub(crate) fn castle_rook_squares(king_to: Square) -> (Square, Square) {
    let rank = king_to.rank();
    if king_to.file() == 6 {
        (Square::at(7, rank), Square::at(5, rank))
    } else {
        (Square::at(0, rank), Square::at(3, rank))
    }
}

fn malformed(reason: String) -> ChessError {
    ChessError::MalformedNotation(reason)
}

fn parse_placement(field: &str) -> ChessResult<[[Option<Piece>; 8]; 8]> {
    let ranks: Vec<&str> = field.split('/').collect();
    if ranks.len() != 8 {
        return Err(malformed(format!("expected 8 ranks, found {}", ranks.len())));
    }

    let mut squares = [[None; 8]; 8];
    for (i, rank_text) in ranks.iter().enumerate() {
        let rank = 7 - i;
        let mut file = 0usize;
        for c in rank_text.chars() {
            if let Some(run) = c.to_digit(10) {
                if !(1..=8).contains(&run) {
                    return Err(malformed(format!("invalid empty-square count {c:?}")));
                }
                file += run as usize;
            } else {
                let piece = Piece::from_fen_char(c)
                    .ok_or_else(|| malformed(format!("invalid piece letter {c:?}")))?;
                if file < 8 {
                    squares[rank][file] = Some(piece);
                }
                file += 1;
            }
            if file > 8 {
                break;
            }
        }
        if file != 8 {
            return Err(malformed(format!(
                "rank {} describes {file} squares, expected 8",
                rank + 1
            )));
        }
    }
    Ok(squares)
}

fn parse_counter(field: &str, what: &str) -> ChessResult<u32> {
    field
        .parse()
        .map_err(|_| malformed(format!("invalid {what} {field:?}")))
}
