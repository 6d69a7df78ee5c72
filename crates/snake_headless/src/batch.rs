//! Batch demo runner.
//!
//! Plays many seeded autopilot games in parallel using rayon and collects
//! per-game metrics, an aggregate summary and a leaderboard.

use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use snake_core::config::GameConfig;
use snake_core::game::Game;
use snake_core::scores::{Leaderboard, ScoreEntry, ScoreService, ScoreSubmission, DEFAULT_TOP_N};
use tracing::{debug, info, warn};

use crate::metrics::{BatchSummary, GameMetrics, MetricsCollector};

/// Default clock budget per game: two minutes.
pub const DEFAULT_MAX_MS: u64 = 120_000;

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Number of games to run
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Seed of the first game; game `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Clock budget per game in milliseconds
    pub max_ms: u64,
    /// Game rules
    pub game: GameConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            game_count: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_ms: DEFAULT_MAX_MS,
            game: GameConfig::default(),
        }
    }
}

impl BatchConfig {
    /// Create config for a number of games
    pub fn new(game_count: u32) -> Self {
        Self {
            game_count,
            ..Default::default()
        }
    }

    /// Set output directory
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the game rules
    pub fn with_game(mut self, game: GameConfig) -> Self {
        self.game = game;
        self
    }

    /// Set the per-game clock budget
    pub fn with_max_ms(mut self, max_ms: u64) -> Self {
        self.max_ms = max_ms;
        self
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Best games
    pub leaderboard: Vec<ScoreEntry>,
    /// Total runtime
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Play one demo game until it finishes or the clock budget runs out.
///
/// The clock jumps from one timer deadline to the next, so the run costs
/// one `advance` per scheduled event.
pub fn run_demo_game(config: &GameConfig, seed: u64, max_ms: u64) -> GameMetrics {
    let mut game = Game::new(config.clone(), seed);
    game.start_demo();
    let start_length = game.session().snake().len() as u32;
    let mut collector = MetricsCollector::new(format!("demo_{seed}"), seed, start_length);

    for event in game.drain_events() {
        collector.record(&event);
    }
    while !collector.is_finished() {
        let Some(deadline) = game.next_deadline() else {
            break;
        };
        if deadline > max_ms {
            break;
        }
        for event in game.advance(deadline) {
            collector.record(&event);
        }
    }
    if !collector.is_finished() {
        game.advance(max_ms);
    }

    let metrics = collector.finish(game.now_ms(), game.state_hash());
    debug!(
        seed,
        score = metrics.score,
        level = metrics.level,
        end = ?metrics.end,
        "Demo game finished"
    );
    metrics
}

/// Run a batch of demo games.
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let started = Instant::now();
    info!(
        games = config.game_count,
        seed_start = config.seed_start,
        max_ms = config.max_ms,
        "Starting batch"
    );

    let seeds: Vec<u64> = (0..u64::from(config.game_count))
        .map(|i| config.seed_start.wrapping_add(i))
        .collect();
    let play = |seed: &u64| run_demo_game(&config.game, *seed, config.max_ms);

    let games: Vec<GameMetrics> = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(|| seeds.par_iter().map(play).collect()),
            Err(e) => {
                warn!("Failed to build thread pool ({e}); using the global pool");
                seeds.par_iter().map(play).collect()
            }
        }
    } else {
        seeds.par_iter().map(play).collect()
    };

    let summary = BatchSummary::from_games(&games);
    let leaderboard = rank_games(&games);
    let duration_seconds = started.elapsed().as_secs_f64();
    info!(
        games = summary.total_games,
        avg_score = summary.avg_score,
        max_score = summary.max_score,
        "Batch complete in {duration_seconds:.2}s"
    );

    BatchResults {
        config,
        games,
        summary,
        leaderboard,
        duration_seconds,
    }
}

/// Submit every game to a fresh leaderboard and return the top entries.
fn rank_games(games: &[GameMetrics]) -> Vec<ScoreEntry> {
    let mut board = Leaderboard::new();
    for game in games {
        let submission = ScoreSubmission {
            nickname: game.game_id.clone(),
            score: i64::from(game.score),
            level: i64::from(game.level),
        };
        if let Err(e) = board.submit(submission) {
            warn!(game = %game.game_id, "Score rejected: {e}");
        }
    }
    board.top(DEFAULT_TOP_N)
}

/// Check that a seed produces the same game every time.
pub fn verify_determinism(config: &GameConfig, seed: u64, runs: u32, max_ms: u64) -> bool {
    let results: Vec<GameMetrics> = (0..runs)
        .into_par_iter()
        .map(|_| run_demo_game(config, seed, max_ms))
        .collect();

    let Some(first) = results.first() else {
        return true;
    };
    match results.iter().position(|m| m != first) {
        None => true,
        Some(run) => {
            warn!(
                run,
                expected = first.final_state_hash,
                actual = results[run].final_state_hash,
                "Determinism check failed"
            );
            false
        }
    }
}
