//! Move legality: per-piece shape checks, square attacks, and legal move
//! enumeration.
//!
//! Validation runs in stages and reports the first one that fails:
//! shape (`IllegalShape`), then path (`BlockedPath`), then destination
//! (`SelfCapture`), then king safety (`KingExposed`). Enumeration feeds
//! geometric candidates through the same shape check, so a move is
//! generated exactly when [`validate`] would accept it.

use crate::error::{ChessError, ChessResult};
use crate::moves::{Move, MoveInput, MoveKind};
use crate::piece::{Color, Piece, PieceType};
use crate::position::Position;
use crate::square::Square;

/// (file delta, rank delta) pairs.
#[rustfmt::skip]
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-1, -2), (1, -2), (-2, -1), (2, -1),
    (-2, 1), (2, 1), (-1, 2), (1, 2),
];

#[rustfmt::skip]
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1), (0, -1), (1, -1),
    (-1, 0), (1, 0),
    (-1, 1), (0, 1), (1, 1),
];

const STRAIGHT_DIRS: [(i8, i8); 4] = [(0, 1), (0, -1), (1, 0), (-1, 0)];
const DIAGONAL_DIRS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

// =============================================================================
// Attacks
// =============================================================================

/// Whether any piece of color `by` attacks `target`.
///
/// Works backwards from the target square. Pawns are looked up on the two
/// diagonal squares behind the target; a pawn's straight push never attacks.
pub fn is_square_attacked(pos: &Position, target: Square, by: Color) -> bool {
    let mut knights = KNIGHT_OFFSETS.iter().filter_map(|&(df, dr)| target.offset(df, dr));
    if knights.any(|sq| holds(pos, sq, by, &[PieceType::Knight])) {
        return true;
    }

    let mut kings = KING_OFFSETS.iter().filter_map(|&(df, dr)| target.offset(df, dr));
    if kings.any(|sq| holds(pos, sq, by, &[PieceType::King])) {
        return true;
    }

    // A pawn of `by` one rank behind the target (from its own point of view)
    // on an adjacent file attacks it.
    let behind = -by.pawn_direction();
    let mut pawns = [-1, 1].into_iter().filter_map(|df| target.offset(df, behind));
    if pawns.any(|sq| holds(pos, sq, by, &[PieceType::Pawn])) {
        return true;
    }

    ray_hits(pos, target, by, &STRAIGHT_DIRS, &[PieceType::Rook, PieceType::Queen])
        || ray_hits(pos, target, by, &DIAGONAL_DIRS, &[PieceType::Bishop, PieceType::Queen])
}

fn holds(pos: &Position, sq: Square, by: Color, kinds: &[PieceType]) -> bool {
    pos.piece_at(sq)
        .is_some_and(|p| p.color == by && kinds.contains(&p.piece_type))
}

/// Whether the first piece met along any of `dirs` from `target` is one of
/// `sliders` belonging to `by`.
fn ray_hits(
    pos: &Position,
    target: Square,
    by: Color,
    dirs: &[(i8, i8)],
    sliders: &[PieceType],
) -> bool {
    for &(df, dr) in dirs {
        let mut cur = target.offset(df, dr);
        while let Some(sq) = cur {
            if pos.piece_at(sq).is_some() {
                if holds(pos, sq, by, sliders) {
                    return true;
                }
                break;
            }
            cur = sq.offset(df, dr);
        }
    }
    false
}

pub fn is_in_check(pos: &Position, color: Color) -> bool {
    pos.find_king(color)
        .is_some_and(|king| is_square_attacked(pos, king, color.opposite()))
}

// =============================================================================
// Shape checks
// =============================================================================

/// Pseudo-legal check of moving the piece on `from` to `to`: movement
/// geometry, blocking, and self-capture, but not whether the mover's own
/// king ends up in check (castling excepted, whose rules are all about
/// attacked squares).
pub fn check_shape(
    pos: &Position,
    from: Square,
    to: Square,
    promotion: Option<PieceType>,
) -> ChessResult<Move> {
    let piece = pos.piece_at(from).ok_or(ChessError::NoPieceAtOrigin(from))?;
    let illegal = ChessError::IllegalShape { from, to };
    if from == to {
        return Err(illegal);
    }

    let df = to.file() as i8 - from.file() as i8;
    let dr = to.rank() as i8 - from.rank() as i8;
    let target = pos.piece_at(to);

    let kind = match piece.piece_type {
        PieceType::Pawn => pawn_shape(pos, piece, from, to, df, dr)?,
        PieceType::Knight => {
            if !matches!((df.abs(), dr.abs()), (1, 2) | (2, 1)) {
                return Err(illegal);
            }
            capture_or_normal(target)
        }
        PieceType::Bishop | PieceType::Rook | PieceType::Queen => {
            if !slides_along(piece.piece_type, df, dr) {
                return Err(illegal);
            }
            if !path_clear(pos, from, to) {
                return Err(ChessError::BlockedPath { from, to });
            }
            capture_or_normal(target)
        }
        PieceType::King => {
            if df.abs() <= 1 && dr.abs() <= 1 {
                capture_or_normal(target)
            } else if dr == 0 && df.abs() == 2 {
                castle_shape(pos, piece, from, to)?
            } else {
                return Err(illegal);
            }
        }
    };

    let promotes = piece.piece_type == PieceType::Pawn && to.rank() == piece.color.promotion_rank();
    match promotion {
        None if promotes => return Err(illegal),
        Some(_) if !promotes => return Err(illegal),
        Some(pt) if !PieceType::PROMOTIONS.contains(&pt) => return Err(illegal),
        _ => {}
    }

    if target.is_some_and(|t| t.color == piece.color) {
        return Err(ChessError::SelfCapture(to));
    }
    // Kings are mated, never taken.
    if target.is_some_and(|t| t.piece_type == PieceType::King) {
        return Err(illegal);
    }

    Ok(Move::new(from, to, piece, promotion, kind))
}

fn capture_or_normal(target: Option<Piece>) -> MoveKind {
    if target.is_some() {
        MoveKind::Capture
    } else {
        MoveKind::Normal
    }
}

fn pawn_shape(
    pos: &Position,
    pawn: Piece,
    from: Square,
    to: Square,
    df: i8,
    dr: i8,
) -> ChessResult<MoveKind> {
    let dir = pawn.color.pawn_direction();
    let target = pos.piece_at(to);

    if df == 0 && dr == dir {
        return match target {
            Some(_) => Err(ChessError::BlockedPath { from, to }),
            None => Ok(MoveKind::Normal),
        };
    }

    if df == 0 && dr == 2 * dir && from.rank() == pawn.color.pawn_start_rank() {
        let between = Square::at(from.file(), (from.rank() + to.rank()) / 2);
        return if pos.piece_at(between).is_some() || target.is_some() {
            Err(ChessError::BlockedPath { from, to })
        } else {
            Ok(MoveKind::Normal)
        };
    }

    if df.abs() == 1 && dr == dir {
        if target.is_some() {
            return Ok(MoveKind::Capture);
        }
        let passed = Square::at(to.file(), from.rank());
        let en_passant = pawn.color == pos.side_to_move()
            && pos.en_passant_target() == Some(to)
            && pos.piece_at(passed) == Some(Piece::new(PieceType::Pawn, pawn.color.opposite()));
        if en_passant {
            return Ok(MoveKind::EnPassant);
        }
    }

    Err(ChessError::IllegalShape { from, to })
}

fn castle_shape(pos: &Position, king: Piece, from: Square, to: Square) -> ChessResult<MoveKind> {
    let color = king.color;
    let back = color.back_rank();
    let illegal = ChessError::IllegalShape { from, to };
    if from != Square::at(4, back) || to.rank() != back {
        return Err(illegal);
    }

    let rights = pos.castling_rights();
    let (allowed, rook_file) = match to.file() {
        6 => (rights.kingside(color), 7),
        2 => (rights.queenside(color), 0),
        _ => return Err(illegal),
    };
    let rook = Some(Piece::new(PieceType::Rook, color));
    if !allowed || pos.piece_at(Square::at(rook_file, back)) != rook {
        return Err(illegal);
    }

    let mut between = if rook_file == 7 { 5..=6 } else { 1..=3 };
    if between.any(|file| pos.piece_at(Square::at(file, back)).is_some()) {
        return Err(ChessError::BlockedPath { from, to });
    }

    // The king may not castle out of, through, or into check.
    let crossed = [from.file(), (from.file() + to.file()) / 2, to.file()];
    if crossed
        .iter()
        .any(|&file| is_square_attacked(pos, Square::at(file, back), color.opposite()))
    {
        return Err(ChessError::KingExposed { from, to });
    }

    Ok(MoveKind::Castle)
}

fn slides_along(piece_type: PieceType, df: i8, dr: i8) -> bool {
    let straight = df == 0 || dr == 0;
    let diagonal = df.abs() == dr.abs();
    match piece_type {
        PieceType::Bishop => diagonal,
        PieceType::Rook => straight,
        PieceType::Queen => straight || diagonal,
        _ => false,
    }
}

/// Whether every square strictly between two aligned squares is empty.
fn path_clear(pos: &Position, from: Square, to: Square) -> bool {
    let step_f = (to.file() as i8 - from.file() as i8).signum();
    let step_r = (to.rank() as i8 - from.rank() as i8).signum();
    let mut cur = from.offset(step_f, step_r);
    while let Some(sq) = cur {
        if sq == to {
            return true;
        }
        if pos.piece_at(sq).is_some() {
            return false;
        }
        cur = sq.offset(step_f, step_r);
    }
    true
}

// =============================================================================
// Enumeration
// =============================================================================

/// Squares the piece on `from` could geometrically reach. Sliders stop at
/// the first occupied square; everything else is left to [`check_shape`].
fn candidate_targets(pos: &Position, from: Square, piece: Piece) -> Vec<Square> {
    match piece.piece_type {
        PieceType::Pawn => {
            let dir = piece.color.pawn_direction();
            step_targets(from, &[(0, dir), (0, 2 * dir), (-1, dir), (1, dir)])
        }
        PieceType::Knight => step_targets(from, &KNIGHT_OFFSETS),
        PieceType::King => {
            let mut targets = step_targets(from, &KING_OFFSETS);
            targets.extend(step_targets(from, &[(2, 0), (-2, 0)]));
            targets
        }
        PieceType::Bishop => slide_targets(pos, from, &DIAGONAL_DIRS),
        PieceType::Rook => slide_targets(pos, from, &STRAIGHT_DIRS),
        PieceType::Queen => {
            let mut targets = slide_targets(pos, from, &STRAIGHT_DIRS);
            targets.extend(slide_targets(pos, from, &DIAGONAL_DIRS));
            targets
        }
    }
}

fn step_targets(from: Square, offsets: &[(i8, i8)]) -> Vec<Square> {
    offsets
        .iter()
        .filter_map(|&(df, dr)| from.offset(df, dr))
        .collect()
}

fn slide_targets(pos: &Position, from: Square, dirs: &[(i8, i8)]) -> Vec<Square> {
    let mut out = Vec::new();
    for &(df, dr) in dirs {
        let mut cur = from.offset(df, dr);
        while let Some(sq) = cur {
            out.push(sq);
            if pos.piece_at(sq).is_some() {
                break;
            }
            cur = sq.offset(df, dr);
        }
    }
    out
}

/// Moves of `color` that pass [`check_shape`], in enumeration order:
/// origin in scan order, then destination in scan order, then promotion
/// piece (queen, rook, bishop, knight).
pub fn pseudo_legal_moves(pos: &Position, color: Color) -> Vec<Move> {
    let mut moves = Vec::new();
    for (from, piece) in pos.pieces(color) {
        for to in candidate_targets(pos, from, piece) {
            if piece.piece_type == PieceType::Pawn && to.rank() == piece.color.promotion_rank() {
                moves.extend(
                    PieceType::PROMOTIONS
                        .iter()
                        .filter_map(|&pt| check_shape(pos, from, to, Some(pt)).ok()),
                );
            } else if let Ok(mv) = check_shape(pos, from, to, None) {
                moves.push(mv);
            }
        }
    }
    moves.sort_by_key(|m| m.order_key());
    moves
}

/// Every legal move of `color`, in the same order as [`pseudo_legal_moves`].
///
/// Each candidate is played on a scratch copy and kept only if the mover's
/// king is not left in check. The scratch copy is restored after every
/// candidate, and `pos` itself is never touched.
pub fn legal_moves(pos: &Position, color: Color) -> Vec<Move> {
    let mut scratch = pos.clone();
    let mut moves = pseudo_legal_moves(pos, color);
    moves.retain(|mv| {
        let after = scratch.scoped(mv);
        !is_in_check(&after, color)
    });
    moves
}

/// Fully validate a requested move for the side to move.
pub fn validate(pos: &Position, input: &MoveInput) -> ChessResult<Move> {
    let piece = pos
        .piece_at(input.from)
        .ok_or(ChessError::NoPieceAtOrigin(input.from))?;
    if piece.color != pos.side_to_move() {
        return Err(ChessError::WrongSideColor {
            square: input.from,
            owner: piece.color,
            to_move: pos.side_to_move(),
        });
    }

    let mv = check_shape(pos, input.from, input.to, input.promotion)?;

    let mut scratch = pos.clone();
    let after = scratch.scoped(&mv);
    if is_in_check(&after, piece.color) {
        return Err(ChessError::KingExposed {
            from: input.from,
            to: input.to,
        });
    }
    Ok(mv)
}

/// Number of leaf nodes of the legal move tree `depth` plies deep.
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(pos, pos.side_to_move());
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| {
            let mut child = pos.scoped(mv);
            perft(&mut child, depth - 1)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).expect("valid notation")
    }

    fn sq(s: &str) -> Square {
        s.parse().expect("valid square")
    }

    fn check(position: &Position, text: &str) -> ChessResult<Move> {
        validate(position, &text.parse().expect("valid move text"))
    }

    #[test]
    fn start_position_has_twenty_moves() {
        let start = Position::new();
        assert_eq!(legal_moves(&start, Color::White).len(), 20);
        assert_eq!(legal_moves(&start, Color::Black).len(), 20);
    }

    #[test]
    fn enumeration_follows_scan_order() {
        let moves: Vec<String> = legal_moves(&Position::new(), Color::White)
            .iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(&moves[..6], ["b1-a3", "b1-c3", "g1-f3", "g1-h3", "a2-a3", "a2-a4"]);
        assert_eq!(moves.last().map(String::as_str), Some("h2-h4"));
    }

    #[test]
    fn promotions_enumerate_queen_first() {
        let p = pos("7k/1P6/8/8/8/8/8/K7 w - - 0 1");
        let promos: Vec<Option<PieceType>> = legal_moves(&p, Color::White)
            .iter()
            .filter(|m| m.from() == sq("b7"))
            .map(|m| m.promotion())
            .collect();
        assert_eq!(
            promos,
            vec![
                Some(PieceType::Queen),
                Some(PieceType::Rook),
                Some(PieceType::Bishop),
                Some(PieceType::Knight)
            ]
        );
    }

    #[test]
    fn perft_start_position() {
        let mut p = pos(START_FEN);
        assert_eq!(perft(&mut p, 1), 20);
        assert_eq!(perft(&mut p, 2), 400);
        assert_eq!(perft(&mut p, 3), 8902);
        assert_eq!(p, Position::new(), "perft must leave the position untouched");
    }

    #[test]
    fn perft_castling_en_passant_and_promotion_heavy_position() {
        let mut p = pos(KIWIPETE);
        assert_eq!(perft(&mut p, 1), 48);
        assert_eq!(perft(&mut p, 2), 2039);
    }

    #[test]
    fn perft_rook_endgame() {
        let mut p = pos(ENDGAME);
        assert_eq!(perft(&mut p, 1), 14);
        assert_eq!(perft(&mut p, 2), 191);
        assert_eq!(perft(&mut p, 3), 2812);
    }

    #[test]
    fn generation_agrees_with_validation() {
        for fen in [START_FEN, KIWIPETE, ENDGAME, "r3k2r/1P6/8/3pP3/8/8/6p1/R3K2R w KQkq d6 0 1"] {
            let p = pos(fen);
            let generated = legal_moves(&p, p.side_to_move());
            let mut validated = Vec::new();
            for from in Square::all() {
                for to in Square::all() {
                    let promos = [None].into_iter().chain(PieceType::PROMOTIONS.map(Some));
                    for promotion in promos {
                        if let Ok(mv) = validate(&p, &MoveInput { from, to, promotion }) {
                            validated.push(mv);
                        }
                    }
                }
            }
            assert_eq!(generated, validated, "generation and validation disagree for {fen}");
        }
    }

    #[test]
    fn knights_jump_over_pieces() {
        let start = Position::new();
        assert_eq!(check(&start, "b1-c3").map(|m| m.kind()), Ok(MoveKind::Normal));
        assert_eq!(check(&start, "g1-h3").map(|m| m.kind()), Ok(MoveKind::Normal));
        assert_eq!(
            check(&start, "b1-b3"),
            Err(ChessError::IllegalShape { from: sq("b1"), to: sq("b3") })
        );
    }

    #[test]
    fn sliders_cannot_pass_occupied_squares() {
        let start = Position::new();
        for text in ["a1-a3", "f1-c4", "d1-h5", "d1-d4", "c1-h6"] {
            assert!(
                matches!(check(&start, text), Err(ChessError::BlockedPath { .. })),
                "{text} should be blocked"
            );
        }
        let open = pos("4k3/8/8/8/3p4/8/8/R2QK3 w - - 0 1");
        assert!(check(&open, "d1-d4").is_ok(), "capture at the end of a clear file");
        assert!(matches!(check(&open, "d1-d5"), Err(ChessError::BlockedPath { .. })));
        assert!(check(&open, "a1-a8").is_ok());
        assert!(matches!(check(&open, "a1-e1"), Err(ChessError::BlockedPath { .. })));
    }

    #[test]
    fn sliders_keep_their_directions() {
        let start = pos("4k3/8/8/8/8/8/8/R1B1K3 w - - 0 1");
        assert!(matches!(check(&start, "a1-b2"), Err(ChessError::IllegalShape { .. })));
        assert!(matches!(check(&start, "c1-c4"), Err(ChessError::IllegalShape { .. })));
        assert!(matches!(check(&start, "c1-d3"), Err(ChessError::IllegalShape { .. })));
    }

    #[test]
    fn self_capture_is_rejected_after_shape_and_path() {
        let start = Position::new();
        assert_eq!(check(&start, "d1-d2"), Err(ChessError::SelfCapture(sq("d2"))));
        assert_eq!(check(&start, "b1-d2"), Err(ChessError::SelfCapture(sq("d2"))));
        assert!(matches!(check(&start, "d1-d3"), Err(ChessError::BlockedPath { .. })));
    }

    #[test]
    fn origin_must_hold_a_piece_of_the_side_to_move() {
        let start = Position::new();
        assert_eq!(check(&start, "e4-e5"), Err(ChessError::NoPieceAtOrigin(sq("e4"))));
        assert!(matches!(
            check(&start, "e7-e5"),
            Err(ChessError::WrongSideColor { owner: Color::Black, to_move: Color::White, .. })
        ));
    }

    #[test]
    fn pawn_shapes() {
        let p = pos("4k3/8/8/8/4p3/2p5/3PP3/4K3 w - - 0 1");
        assert!(check(&p, "d2-d4").is_ok());
        assert!(check(&p, "d2-c3").is_ok(), "diagonal capture");
        assert!(
            matches!(check(&p, "d2-e3"), Err(ChessError::IllegalShape { .. })),
            "diagonal without capture"
        );
        assert!(
            matches!(check(&p, "e2-e4"), Err(ChessError::BlockedPath { .. })),
            "double push onto a piece"
        );
        assert!(matches!(check(&p, "d2-d5"), Err(ChessError::IllegalShape { .. })));
        assert!(matches!(check(&p, "d2-d1"), Err(ChessError::IllegalShape { .. })));

        let blocked = pos("4k3/8/8/8/8/3p4/3P4/4K3 w - - 0 1");
        assert!(
            matches!(check(&blocked, "d2-d3"), Err(ChessError::BlockedPath { .. })),
            "pawns never capture forward"
        );
        assert!(matches!(check(&blocked, "d2-d4"), Err(ChessError::BlockedPath { .. })));

        let advanced = pos("4k3/8/8/8/8/3P4/8/4K3 w - - 0 1");
        assert!(
            matches!(check(&advanced, "d3-d5"), Err(ChessError::IllegalShape { .. })),
            "double push only from the start rank"
        );
    }

    #[test]
    fn promotion_is_required_exactly_on_the_last_rank() {
        let p = pos("7k/1P6/8/8/8/8/4P3/K7 w - - 0 1");
        assert!(matches!(check(&p, "b7-b8"), Err(ChessError::IllegalShape { .. })));
        assert_eq!(check(&p, "b7-b8=R").map(|m| m.promotion()), Ok(Some(PieceType::Rook)));
        assert!(matches!(check(&p, "e2-e3=Q"), Err(ChessError::IllegalShape { .. })));
    }

    #[test]
    fn en_passant_only_right_after_the_double_push() {
        let p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        assert_eq!(check(&p, "e5-d6").map(|m| m.kind()), Ok(MoveKind::EnPassant));
        let stale = pos("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1");
        assert!(matches!(check(&stale, "e5-d6"), Err(ChessError::IllegalShape { .. })));
    }

    #[test]
    fn pinned_piece_cannot_expose_king() {
        let p = pos("4k3/4r3/8/8/8/8/4B3/4K3 w - - 0 1");
        assert_eq!(
            check(&p, "e2-d3"),
            Err(ChessError::KingExposed { from: sq("e2"), to: sq("d3") })
        );
        assert!(matches!(check(&p, "e1-e2"), Err(ChessError::SelfCapture(_))));
        assert!(check(&p, "e1-d1").is_ok());
    }

    #[test]
    fn king_cannot_step_into_attack() {
        let p = pos("4k3/8/8/8/8/8/3r4/4K3 w - - 0 1");
        assert!(matches!(check(&p, "e1-e2"), Err(ChessError::KingExposed { .. })));
        assert!(check(&p, "e1-d2").is_ok(), "capturing the undefended rook");
        assert!(check(&p, "e1-f1").is_ok());
        assert!(matches!(check(&p, "e1-d1"), Err(ChessError::KingExposed { .. })));
    }

    #[test]
    fn castling_rules() {
        let start = Position::new();
        assert!(matches!(check(&start, "e1-g1"), Err(ChessError::BlockedPath { .. })));

        let p = pos("4k3/8/8/8/8/8/5r2/R3K2R w KQ - 0 1");
        assert!(matches!(check(&p, "e1-g1"), Err(ChessError::KingExposed { .. })), "through f1");
        assert_eq!(check(&p, "e1-c1").map(|m| m.kind()), Ok(MoveKind::Castle));

        let in_check = pos("4k3/8/8/8/8/8/4r3/R3K2R w KQ - 0 1");
        assert!(matches!(check(&in_check, "e1-c1"), Err(ChessError::KingExposed { .. })));

        let no_rights = pos("4k3/8/8/8/8/8/8/R3K2R w - - 0 1");
        assert!(matches!(check(&no_rights, "e1-g1"), Err(ChessError::IllegalShape { .. })));
        assert!(matches!(check(&no_rights, "e1-e3"), Err(ChessError::IllegalShape { .. })));
    }

    #[test]
    fn kings_are_never_captured() {
        let mut p = Position::empty();
        p.set_piece(sq("e1"), Some(Piece::new(PieceType::King, Color::White)));
        p.set_piece(sq("e8"), Some(Piece::new(PieceType::King, Color::Black)));
        p.set_piece(sq("e4"), Some(Piece::new(PieceType::Rook, Color::White)));
        assert!(is_in_check(&p, Color::Black));
        assert!(matches!(
            check_shape(&p, sq("e4"), sq("e8"), None),
            Err(ChessError::IllegalShape { .. })
        ));
        assert!(!legal_moves(&p, Color::White).iter().any(|m| m.to() == sq("e8")));
    }

    #[test]
    fn pawns_attack_diagonally_only() {
        let p = pos("4k3/8/8/8/4p3/8/8/4K3 w - - 0 1");
        assert!(is_square_attacked(&p, sq("d3"), Color::Black));
        assert!(is_square_attacked(&p, sq("f3"), Color::Black));
        assert!(!is_square_attacked(&p, sq("e3"), Color::Black));
        assert!(!is_square_attacked(&p, sq("d5"), Color::Black));
    }

    #[test]
    fn attacks_stop_at_the_first_piece() {
        let p = pos("4k3/8/8/8/8/8/8/R2NK3 w - - 0 1");
        assert!(is_square_attacked(&p, sq("c1"), Color::White));
        assert!(is_square_attacked(&p, sq("a8"), Color::White));
        assert!(!is_square_attacked(&p, sq("h1"), Color::White), "the knight on d1 shields h1");
        assert!(is_in_check(&pos("4k3/8/8/8/8/8/8/4K2r w - - 0 1"), Color::White));
        assert!(!is_in_check(&pos("4k3/8/8/8/8/8/8/4KB1r w - - 0 1"), Color::White));
    }

    #[test]
    fn legal_enumeration_leaves_position_untouched() {
        let p = pos(KIWIPETE);
        let before = p.clone();
        let _ = legal_moves(&p, Color::White);
        let _ = legal_moves(&p, Color::Black);
        assert_eq!(p, before);
        let mut empty = Position::empty();
        empty.set_piece(sq("a1"), Some(Piece::new(PieceType::King, Color::White)));
        assert_eq!(legal_moves(&empty, Color::White).len(), 3);
        assert!(legal_moves(&empty, Color::Black).is_empty());
    }
}
