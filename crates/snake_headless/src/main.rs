//! Headless snake runner.
//!
//! This binary runs the game without graphics, controlled via JSON on stdin/stdout.
//! Designed for scripted play, CI testing, and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode - read commands from stdin
//! cargo run -p snake_headless
//!
//! # Record the session to a replay file
//! cargo run -p snake_headless -- run --record session.replay
//!
//! # Watch one autopilot game
//! cargo run -p snake_headless -- demo --seed 7 --every 10
//!
//! # Run a batch of demo games
//! cargo run -p snake_headless -- batch --count 1000 --output results/
//!
//! # Verify a replay
//! cargo run -p snake_headless -- replay session.replay --verify
//! ```
//!
//! # Protocol
//!
//! Input (stdin): JSON commands, one per line
//! Output (stdout): JSON responses, one per line
//! Logs (stderr): Debug information
//!
//! See the protocol module for command/response format.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snake_core::config::GameConfig;
use snake_core::game::{Game, GameEvent};
use snake_core::replay::{Replay, ReplayPlayer};
use snake_headless::{
    ascii::{render_ascii, AsciiConfig},
    batch::{run_batch, run_demo_game, verify_determinism, BatchConfig, DEFAULT_MAX_MS},
    metrics::MetricsCollector,
    runner::{HeadlessConfig, HeadlessRunner},
    RunnerError,
};

#[derive(Parser)]
#[command(name = "snake_headless")]
#[command(about = "Headless wraparound snake runner for scripted play and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Game rules file (RON); defaults to the built-in rules
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single interactive game over JSON lines
    Run {
        /// Session seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Write a replay of the session to this file on exit
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Play one autopilot game and print it as ASCII frames
    Demo {
        /// Session seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Print a frame every N ticks (0 = final frame only)
        #[arg(long, default_value = "0")]
        every: u64,

        /// Clock budget in milliseconds
        #[arg(long, default_value_t = DEFAULT_MAX_MS)]
        max_ms: u64,
    },

    /// Run a batch of demo games in parallel
    Batch {
        /// Number of games to run
        #[arg(short = 'n', long, default_value = "100")]
        count: u32,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Seed of the first game
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Clock budget per game in milliseconds
        #[arg(long, default_value_t = DEFAULT_MAX_MS)]
        max_ms: u64,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Seed to use
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of runs to compare
        #[arg(short, long, default_value = "3")]
        runs: u32,

        /// Clock budget per run in milliseconds
        #[arg(long, default_value_t = DEFAULT_MAX_MS)]
        max_ms: u64,
    },

    /// Play back a recorded replay
    Replay {
        /// Replay file to load
        file: PathBuf,

        /// Only check the final hash
        #[arg(long)]
        verify: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for protocol)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Some(Commands::Run { seed, record }) => {
            let game = load_config(cli.config.as_deref());
            cmd_run(game, seed, record);
        }
        Some(Commands::Demo {
            seed,
            every,
            max_ms,
        }) => {
            let game = load_config(cli.config.as_deref());
            cmd_demo(&game, seed, every, max_ms);
        }
        Some(Commands::Batch {
            count,
            parallel,
            output,
            seed,
            max_ms,
        }) => {
            let game = load_config(cli.config.as_deref());
            cmd_batch(game, count, parallel, output, seed, max_ms);
        }
        Some(Commands::Verify { seed, runs, max_ms }) => {
            let game = load_config(cli.config.as_deref());
            cmd_verify(&game, seed, runs, max_ms);
        }
        Some(Commands::Replay { file, verify }) => {
            cmd_replay(&file, verify);
        }
        None => {
            // Default: interactive mode
            cmd_run(load_config(cli.config.as_deref()), 0, None);
        }
    }
}

/// Load and validate the rules, or exit.
fn load_config(path: Option<&Path>) -> GameConfig {
    let Some(path) = path else {
        return GameConfig::default();
    };
    match GameConfig::load(path) {
        Ok(config) => {
            tracing::info!("Loaded rules from {}", path.display());
            config
        }
        Err(e) => {
            eprintln!("Failed to load config {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

/// Run a single interactive game
fn cmd_run(game: GameConfig, seed: u64, record: Option<PathBuf>) {
    tracing::info!(seed, "Starting interactive session");

    let runner = HeadlessRunner::with_config(HeadlessConfig {
        game,
        seed,
        record_path: record,
    });
    if let Err(e) = runner.run() {
        eprintln!("Session failed: {e}");
        std::process::exit(1);
    }
}

/// Play one demo game, printing frames to stdout and a summary at the end
fn cmd_demo(config: &GameConfig, seed: u64, every: u64, max_ms: u64) {
    tracing::info!(seed, max_ms, "Playing demo game");

    let mut game = Game::new(config.clone(), seed);
    game.start_demo();
    let style = AsciiConfig::default();
    let mut collector =
        MetricsCollector::new(format!("demo_{seed}"), seed, game.session().snake().len() as u32);
    let mut last_frame = game.snapshot();

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
            if let GameEvent::Tick { tick, .. } = &event {
                if every > 0 && tick % every == 0 {
                    println!("t={}ms\n{}", deadline, render_ascii(&game.snapshot(), &style));
                }
            }
            collector.record(&event);
        }
        // The demo resets itself when it ends; keep the last live board.
        if !collector.is_finished() {
            last_frame = game.snapshot();
        }
    }

    println!("{}", render_ascii(&last_frame, &style));
    let metrics = collector.finish(game.now_ms(), game.state_hash());
    match serde_json::to_string_pretty(&metrics).map_err(RunnerError::from) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Failed to encode summary: {e}");
            std::process::exit(1);
        }
    }
}

/// Run batch of demo games
fn cmd_batch(
    game: GameConfig,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    max_ms: u64,
) {
    tracing::info!(
        "Running batch: {} games, seeds {}..{}",
        count,
        seed,
        seed.wrapping_add(u64::from(count))
    );

    let mut config = BatchConfig::new(count)
        .with_output(output.clone())
        .with_seed(seed)
        .with_game(game)
        .with_max_ms(max_ms);
    config.parallel_games = parallel;

    let results = run_batch(config);

    let path = output.join("batch_results.json");
    if let Err(e) = results.save(&path) {
        eprintln!("Failed to save results: {e}");
        std::process::exit(1);
    }

    let s = &results.summary;
    eprintln!("\n=== Batch Results ===");
    eprintln!("Games: {}", s.total_games);
    eprintln!(
        "Score: avg {:.1}, min {}, max {}",
        s.avg_score, s.min_score, s.max_score
    );
    eprintln!("Average level: {:.2}", s.avg_level);
    eprintln!("Average length: {:.0} ms", s.avg_duration_ms);
    eprintln!(
        "Endings: {} self-collision, {} hazard, {} level cap, {} timeout",
        s.self_collisions, s.hazard_deaths, s.level_caps, s.timeouts
    );
    eprintln!("Runtime: {:.2}s", results.duration_seconds);
    eprintln!("Results saved to: {}", path.display());
}

/// Verify determinism
fn cmd_verify(config: &GameConfig, seed: u64, runs: u32, max_ms: u64) {
    tracing::info!("Verifying determinism: seed {} ({} runs)", seed, runs);

    if verify_determinism(config, seed, runs, max_ms) {
        let hash = run_demo_game(config, seed, max_ms).final_state_hash;
        eprintln!("PASS: All {runs} runs produced identical results");
        eprintln!("  Hash: {hash:016x}");
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        std::process::exit(1);
    }
}

/// Replay a recorded game
fn cmd_replay(file: &Path, verify: bool) {
    if verify {
        tracing::info!("Verifying replay: {}", file.display());
    } else {
        tracing::info!("Playing replay: {}", file.display());
    }

    let replay = match Replay::load(file) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to load replay: {e}");
            std::process::exit(1);
        }
    };

    eprintln!("Loaded replay:");
    eprintln!("  Label: {}", replay.label);
    eprintln!("  Seed: {}", replay.seed);
    eprintln!("  Inputs: {}", replay.input_count());
    eprintln!("  Duration: {} ms", replay.final_ms);

    let mut player = ReplayPlayer::new(replay);

    if verify {
        eprintln!("Verifying replay...");
        if player.verify() {
            eprintln!("PASS: Replay verification successful");
            eprintln!("  Expected hash: {:016x}", player.replay().final_hash);
            eprintln!("  Actual hash:   {:016x}", player.game().state_hash());
        } else {
            eprintln!("FAIL: Replay produced different hash!");
            eprintln!("  Expected: {:016x}", player.replay().final_hash);
            eprintln!("  Actual:   {:016x}", player.game().state_hash());
            std::process::exit(1);
        }
    } else {
        let end = player.replay().final_ms;
        let step = (end / 10).max(1);
        let mut at = 0;
        while at < end {
            at = (at + step).min(end);
            for event in player.advance_to(at) {
                if let Ok(line) = serde_json::to_string(&event) {
                    println!("{line}");
                }
            }
            eprintln!("Progress: {}%", at * 100 / end);
        }

        eprintln!("Replay complete at {} ms", player.game().now_ms());
        eprintln!("Final state hash: {:016x}", player.game().state_hash());

        let snapshot = player.game().snapshot();
        eprintln!("\nFinal State:");
        eprintln!("{}", render_ascii(&snapshot, &AsciiConfig::default()));
    }
}
