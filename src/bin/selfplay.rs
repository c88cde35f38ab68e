//! Engine-vs-engine games from the standard position.
//!
//! Each finished game is printed to stdout as one JSON record; progress is
//! logged to stderr (set `RUST_LOG` to change the level).
//!
//! ```text
//! selfplay [--games N] [--millis MS] [--max-plies N] [--random-plies N]
//!          [--seed S] [--white CONFIG.json] [--black CONFIG.json]
//! ```

use std::error::Error;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chess_arbiter::engine::{evaluate_breakdown, search_with_time_budget, SearchConfig};
use chess_arbiter::{Color, Game, GameState};

struct Options {
    games: usize,
    millis: u64,
    max_plies: usize,
    random_plies: usize,
    seed: u64,
    white: SearchConfig,
    black: SearchConfig,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            games: 1,
            millis: 200,
            max_plies: 300,
            random_plies: 0,
            seed: 0,
            white: SearchConfig::default(),
            black: SearchConfig::default(),
        }
    }
}

fn parse_args() -> Result<Options, Box<dyn Error>> {
    let mut opts = Options::default();
    let mut args = std::env::args().skip(1);
    while let Some(flag) = args.next() {
        let value = args
            .next()
            .ok_or_else(|| format!("missing value for {flag}"))?;
        match flag.as_str() {
            "--games" => opts.games = value.parse()?,
            "--millis" => opts.millis = value.parse()?,
            "--max-plies" => opts.max_plies = value.parse()?,
            "--random-plies" => opts.random_plies = value.parse()?,
            "--seed" => opts.seed = value.parse()?,
            "--white" => opts.white = SearchConfig::load(&value)?,
            "--black" => opts.black = SearchConfig::load(&value)?,
            other => return Err(format!("unknown flag {other}").into()),
        }
    }
    Ok(opts)
}

#[derive(Serialize)]
struct GameRecord {
    game: usize,
    seed: u64,
    state: GameState,
    /// The ply cap ended the game before a result.
    capped: bool,
    moves: Vec<String>,
    final_position: String,
}

fn play_game(index: usize, opts: &Options) -> Result<GameRecord, Box<dyn Error>> {
    let seed = opts.seed.wrapping_add(index as u64);
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::new();

    while !game.state().is_terminal() && game.moves().len() < opts.max_plies {
        let side = game.position().side_to_move();

        let text = if game.moves().len() < opts.random_plies {
            let moves = game.legal_moves();
            match moves.choose(&mut rng) {
                Some(mv) => mv.to_string(),
                None => break,
            }
        } else {
            let config = match side {
                Color::White => &opts.white,
                Color::Black => &opts.black,
            };
            let Some(result) = search_with_time_budget(game.position(), opts.millis, config) else {
                break;
            };
            let losing = match side {
                Color::White => result.score < 0,
                Color::Black => result.score > 0,
            };
            if result.is_mate() && losing {
                info!(game = index, %side, score = result.score, "resigning against forced mate");
                game.resign();
                break;
            }
            result.best_move.to_string()
        };

        game.submit_move(&text)?;
    }

    let capped = !game.state().is_terminal();
    if capped {
        warn!(game = index, plies = game.moves().len(), "ply cap reached");
    }

    let breakdown = evaluate_breakdown(game.position(), &SearchConfig::default());
    info!(game = index, state = %game.state(), ?breakdown, "final evaluation");

    Ok(GameRecord {
        game: index,
        seed,
        state: game.state(),
        capped,
        moves: game.moves().iter().map(|m| m.to_string()).collect(),
        final_position: game.current_position(),
    })
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let opts = parse_args()?;
    info!(games = opts.games, millis = opts.millis, seed = opts.seed, "starting self-play");

    for index in 0..opts.games {
        let record = play_game(index, &opts)?;
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
