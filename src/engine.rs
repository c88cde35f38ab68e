// =============================================================================
// Search engine
//
// Minimax with alpha-beta pruning over the legal move tree, driven either to a
// fixed depth or by iterative deepening under a wall-clock budget. White
// maximizes and Black minimizes; every score is from White's point of view.
//
// The evaluation is modular: material, mobility, pawn structure, king safety
// and centre control are scored independently and toggled via SearchConfig.
// Scores are integer centipawns.
// =============================================================================

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::error::ConfigError;
use crate::moves::Move;
use crate::piece::{Color, PieceType};
use crate::position::Position;
use crate::rules::{is_in_check, is_square_attacked, legal_moves};
use crate::square::Square;

pub type Score = i32;

/// Score of a checkmate found at the root. Mates further down the tree are
/// shortened by one per ply, so a quicker mate always scores higher.
pub const CHECKMATE_SCORE: Score = 100_000;

/// Any score at least this far from zero is a forced mate.
const MATE_THRESHOLD: Score = CHECKMATE_SCORE - 1_000;

const INFINITY: Score = Score::MAX;

// =============================================================================
// Configuration
// =============================================================================

/// Tunable weights for the evaluation modules, in centipawns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    // --- Material ---
    pub pawn: Score,
    pub knight: Score,
    pub bishop: Score,
    pub rook: Score,
    pub queen: Score,

    // --- Mobility ---
    /// Per legal move more than the opponent has.
    pub mobility: Score,

    // --- Pawn structure ---
    /// Per extra pawn stacked on a file.
    pub doubled_pawn: Score,
    /// Per pawn with no friendly pawn on either adjacent file.
    pub isolated_pawn: Score,
    /// Flat bonus for a pawn with no enemy pawns ahead on its own or adjacent files.
    pub passed_pawn_base: Score,
    /// Passed pawn bonus scaled by advancement², so a pawn on the 7th rank is
    /// worth far more than one on the 3rd.
    pub passed_pawn_quadratic: Score,

    // --- King safety ---
    /// Per own pawn on the three squares directly in front of the king.
    pub pawn_shield: Score,
    /// Penalty when no own pawn stands on the king's file.
    pub open_king_file: Score,

    // --- Centre control ---
    /// Per d4/d5/e4/e5 square attacked.
    pub centre_attack: Score,
    /// Per piece standing on a centre square.
    pub centre_occupy: Score,
    /// Per c3–f6 ring square attacked.
    pub extended_centre_attack: Score,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            pawn: 100,
            knight: 320,
            bishop: 330,
            rook: 500,
            queen: 900,
            mobility: 5,
            doubled_pawn: 15,
            isolated_pawn: 12,
            passed_pawn_base: 20,
            passed_pawn_quadratic: 8,
            pawn_shield: 10,
            open_king_file: 25,
            centre_attack: 10,
            centre_occupy: 20,
            extended_centre_attack: 5,
        }
    }
}

impl Weights {
    fn piece_value(&self, pt: PieceType) -> Score {
        match pt {
            PieceType::Pawn => self.pawn,
            PieceType::Knight => self.knight,
            PieceType::Bishop => self.bishop,
            PieceType::Rook => self.rook,
            PieceType::Queen => self.queen,
            PieceType::King => 0,
        }
    }
}

/// Which evaluation modules are active, how deep iterative deepening may go,
/// and the weights the modules use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub material: bool,
    /// Legal move count differential.
    pub mobility: bool,
    pub pawn_structure: bool,
    pub king_safety: bool,
    pub centre: bool,
    /// Deepest ply iterative deepening will start, whatever the budget.
    pub max_depth: u32,
    pub weights: Weights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            material: true,
            mobility: true,
            pawn_structure: true,
            king_safety: true,
            centre: true,
            max_depth: 32,
            weights: Weights::default(),
        }
    }
}

impl SearchConfig {
    /// Parse a JSON document. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<SearchConfig, ConfigError> {
        let config: SearchConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<SearchConfig, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        SearchConfig::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::Invalid("max_depth must be at least 1".into()));
        }
        let w = &self.weights;
        let values = [
            ("pawn", w.pawn),
            ("knight", w.knight),
            ("bishop", w.bishop),
            ("rook", w.rook),
            ("queen", w.queen),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| *v < 0) {
            return Err(ConfigError::Invalid(format!(
                "piece value for {name} must not be negative, got {value}"
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Evaluation
// =============================================================================

/// Per-module contributions to a static evaluation, from White's point of
/// view. Disabled modules report 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalBreakdown {
    pub material: Score,
    pub mobility: Score,
    pub pawn_structure: Score,
    pub king_safety: Score,
    pub centre: Score,
    pub total: Score,
}

const CENTRE_SQUARES: [Square; 4] = [
    Square::at(3, 3),
    Square::at(4, 3),
    Square::at(3, 4),
    Square::at(4, 4),
];

/// The 12 squares ringing the centre, c3 to f6.
const EXTENDED_CENTRE: [Square; 12] = [
    Square::at(2, 2), Square::at(3, 2), Square::at(4, 2), Square::at(5, 2),
    Square::at(2, 3), Square::at(5, 3),
    Square::at(2, 4), Square::at(5, 4),
    Square::at(2, 5), Square::at(3, 5), Square::at(4, 5), Square::at(5, 5),
];

fn sign(color: Color) -> Score {
    match color {
        Color::White => 1,
        Color::Black => -1,
    }
}

/// Evaluate `pos` from White's point of view.
///
/// A mated side to move scores `∓CHECKMATE_SCORE`, stalemate scores 0, and any
/// other position is the sum of the enabled modules.
pub fn evaluate(pos: &Position, config: &SearchConfig) -> Score {
    let side = pos.side_to_move();
    let moves = legal_moves(pos, side).len();
    if moves == 0 {
        return terminal_score(pos, 0);
    }
    static_eval(pos, config, moves).total
}

/// The contribution of each enabled module. Terminal positions are not
/// special-cased here; use [`evaluate`] for the score the search sees.
pub fn evaluate_breakdown(pos: &Position, config: &SearchConfig) -> EvalBreakdown {
    let moves = legal_moves(pos, pos.side_to_move()).len();
    static_eval(pos, config, moves)
}

/// Score of a position whose side to move has no legal moves, reached `ply`
/// half-moves below the root.
fn terminal_score(pos: &Position, ply: u32) -> Score {
    let side = pos.side_to_move();
    if is_in_check(pos, side) {
        // Mated side loses; `ply` is small next to CHECKMATE_SCORE.
        -sign(side) * (CHECKMATE_SCORE - ply as Score)
    } else {
        0
    }
}

/// `side_moves` is the legal move count of the side to move, already known to
/// every caller.
fn static_eval(pos: &Position, config: &SearchConfig, side_moves: usize) -> EvalBreakdown {
    let w = &config.weights;
    let mut b = EvalBreakdown::default();
    if config.material {
        b.material = eval_material(pos, w);
    }
    if config.mobility {
        b.mobility = eval_mobility(pos, w, side_moves);
    }
    if config.pawn_structure {
        b.pawn_structure = eval_pawn_structure(pos, w);
    }
    if config.king_safety {
        b.king_safety = eval_king_safety(pos, w);
    }
    if config.centre {
        b.centre = eval_centre_control(pos, w);
    }
    b.total = b.material + b.mobility + b.pawn_structure + b.king_safety + b.centre;
    b
}

fn eval_material(pos: &Position, w: &Weights) -> Score {
    Square::all()
        .filter_map(|sq| pos.piece_at(sq))
        .map(|p| sign(p.color) * w.piece_value(p.piece_type))
        .sum()
}

fn eval_mobility(pos: &Position, w: &Weights, side_moves: usize) -> Score {
    let side = pos.side_to_move();
    let other_moves = legal_moves(pos, side.opposite()).len();
    let diff = side_moves as Score - other_moves as Score;
    sign(side) * diff * w.mobility
}

/// Pawns of `color` per file.
fn pawn_files(pos: &Position, color: Color) -> [u8; 8] {
    let mut files = [0u8; 8];
    for (sq, p) in pos.pieces(color) {
        if p.piece_type == PieceType::Pawn {
            files[sq.file() as usize] += 1;
        }
    }
    files
}

/// No enemy pawn stands ahead of the pawn on its own file or either
/// adjacent file.
fn is_passed_pawn(pos: &Position, sq: Square, color: Color) -> bool {
    let enemy = color.opposite();
    let dir = color.pawn_direction();
    let mut ahead = sq.offset(0, dir);
    while let Some(cur) = ahead {
        for df in -1..=1 {
            let blocker = cur
                .offset(df, 0)
                .and_then(|s| pos.piece_at(s))
                .is_some_and(|p| p.color == enemy && p.piece_type == PieceType::Pawn);
            if blocker {
                return false;
            }
        }
        ahead = cur.offset(0, dir);
    }
    true
}

/// Doubled and isolated pawns are penalized; passed pawns earn a bonus that
/// grows quadratically with their distance from the starting rank.
fn eval_pawn_structure(pos: &Position, w: &Weights) -> Score {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let files = pawn_files(pos, color);
        let mut side = 0;

        for &count in &files {
            if count > 1 {
                side -= Score::from(count - 1) * w.doubled_pawn;
            }
        }

        for (sq, p) in pos.pieces(color) {
            if p.piece_type != PieceType::Pawn {
                continue;
            }
            let file = sq.file() as usize;
            let left = file.checked_sub(1).map_or(0, |f| files[f]);
            let right = files.get(file + 1).copied().unwrap_or(0);
            if left == 0 && right == 0 {
                side -= w.isolated_pawn;
            }
            if is_passed_pawn(pos, sq, color) {
                let advancement = Score::from(sq.rank().abs_diff(color.pawn_start_rank()));
                side += w.passed_pawn_base + advancement * advancement * w.passed_pawn_quadratic;
            }
        }

        score += sign(color) * side;
    }
    score
}

fn eval_king_safety(pos: &Position, w: &Weights) -> Score {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let Some(king) = pos.find_king(color) else {
            continue;
        };
        let own_pawn = |sq: Square| {
            pos.piece_at(sq)
                .is_some_and(|p| p.color == color && p.piece_type == PieceType::Pawn)
        };

        let shield = (-1..=1)
            .filter_map(|df| king.offset(df, color.pawn_direction()))
            .filter(|&sq| own_pawn(sq))
            .count() as Score;
        let mut side = shield * w.pawn_shield;

        let file_open = !(0..8)
            .filter_map(|rank| Square::new(king.file(), rank).ok())
            .any(own_pawn);
        if file_open {
            side -= w.open_king_file;
        }

        score += sign(color) * side;
    }
    score
}

/// Attacking and occupying d4/d5/e4/e5, plus attacks on the ring around them.
fn eval_centre_control(pos: &Position, w: &Weights) -> Score {
    let mut score = 0;
    for color in [Color::White, Color::Black] {
        let s = sign(color);
        for &sq in &CENTRE_SQUARES {
            if is_square_attacked(pos, sq, color) {
                score += s * w.centre_attack;
            }
            if pos.piece_at(sq).is_some_and(|p| p.color == color) {
                score += s * w.centre_occupy;
            }
        }
        for &sq in &EXTENDED_CENTRE {
            if is_square_attacked(pos, sq, color) {
                score += s * w.extended_centre_attack;
            }
        }
    }
    score
}

// =============================================================================
// Search
// =============================================================================

/// Outcome of a search: the chosen move, its minimax score from White's
/// point of view, the depth that produced it, and the nodes visited.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: Score,
    pub depth: u32,
    pub nodes: u64,
}

impl SearchResult {
    /// Whether the score reports a forced mate for either side.
    pub fn is_mate(&self) -> bool {
        self.score.abs() >= MATE_THRESHOLD
    }
}

struct Search<'a> {
    config: &'a SearchConfig,
    nodes: u64,
}

impl Search<'_> {
    /// Minimax with alpha-beta bounds. `pos` is played forward through
    /// scoped guards, so it is back in its original state on return.
    fn minimax(
        &mut self,
        pos: &mut Position,
        depth: u32,
        ply: u32,
        mut alpha: Score,
        mut beta: Score,
    ) -> Score {
        self.nodes += 1;

        let side = pos.side_to_move();
        let moves = legal_moves(pos, side);
        if moves.is_empty() {
            return terminal_score(pos, ply);
        }
        if depth == 0 {
            return static_eval(pos, self.config, moves.len()).total;
        }

        if side == Color::White {
            let mut best = -INFINITY;
            for mv in &moves {
                let mut child = pos.scoped(mv);
                let score = self.minimax(&mut child, depth - 1, ply + 1, alpha, beta);
                best = best.max(score);
                alpha = alpha.max(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        } else {
            let mut best = INFINITY;
            for mv in &moves {
                let mut child = pos.scoped(mv);
                let score = self.minimax(&mut child, depth - 1, ply + 1, alpha, beta);
                best = best.min(score);
                beta = beta.min(score);
                if beta <= alpha {
                    break;
                }
            }
            best
        }
    }
}

/// Search every legal move of the side to move `depth` plies deep and pick
/// the best one for that side.
///
/// Ties go to the earliest move in enumeration order. Depth 0 returns the
/// first legal move with the static evaluation of `pos`. Returns `None` when
/// the side to move has no legal moves.
pub fn find_best_move(pos: &Position, depth: u32, config: &SearchConfig) -> Option<SearchResult> {
    let side = pos.side_to_move();
    let moves = legal_moves(pos, side);
    let first = *moves.first()?;

    if depth == 0 {
        return Some(SearchResult {
            best_move: first,
            score: static_eval(pos, config, moves.len()).total,
            depth: 0,
            nodes: 1,
        });
    }

    let mut search = Search { config, nodes: 0 };
    let mut scratch = pos.clone();
    let (mut alpha, mut beta) = (-INFINITY, INFINITY);
    let mut best: Option<(Move, Score)> = None;

    for mv in moves {
        let score = {
            let mut child = scratch.scoped(&mv);
            search.minimax(&mut child, depth - 1, 1, alpha, beta)
        };
        trace!(%mv, score, depth, "root move");

        let improves = match best {
            None => true,
            Some((_, current)) => match side {
                Color::White => score > current,
                Color::Black => score < current,
            },
        };
        if improves {
            best = Some((mv, score));
            match side {
                Color::White => alpha = score,
                Color::Black => beta = score,
            }
        }
    }

    let (best_move, score) = best?;
    Some(SearchResult {
        best_move,
        score,
        depth,
        nodes: search.nodes,
    })
}

/// Iterative deepening: search depth 1, 2, 3, … until the budget runs out,
/// `max_depth` is reached, or a forced mate is found.
///
/// The budget is only checked between depths; a depth that has started always
/// completes, and the result always comes from the deepest completed depth.
/// With a budget too small to start depth 1 the depth-0 result is returned.
pub fn search_with_time_budget(
    pos: &Position,
    max_millis: u64,
    config: &SearchConfig,
) -> Option<SearchResult> {
    let start = Instant::now();
    let budget = Duration::from_millis(max_millis);
    let mut result = find_best_move(pos, 0, config)?;

    for depth in 1..=config.max_depth {
        let elapsed = start.elapsed();
        if elapsed >= budget {
            debug!(depth, elapsed_ms = elapsed.as_millis() as u64, max_millis, "time budget spent");
            break;
        }

        let Some(next) = find_best_move(pos, depth, config) else {
            break;
        };
        info!(
            depth,
            score = next.score,
            nodes = next.nodes,
            mv = %next.best_move,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "depth complete"
        );
        result = next;

        if result.is_mate() {
            debug!(depth, score = result.score, "forced mate found");
            break;
        }
    }

    Some(result)
}
