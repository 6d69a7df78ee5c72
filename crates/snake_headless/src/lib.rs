//! Headless snake runner for scripted play and CI verification.
//!
//! This crate drives the deterministic core without a browser:
//!
//! - **Scripted play**: a controller process sends JSON commands on stdin
//!   and reads events and state on stdout
//! - **Batch demos**: many autopilot games in parallel with aggregate metrics
//! - **Determinism checks**: same seed, same game, same hash
//! - **Replay verification**: check that replays produce identical results
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (propose, advance, query, etc.)
//! - **stdout**: Events, state and responses (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See [`protocol`] module for the full command/response specification.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"propose","direction":"up"}' | cargo run -p snake_headless -- run
//!
//! # Watch a demo game
//! cargo run -p snake_headless -- demo --seed 7
//!
//! # Verify a recorded replay
//! cargo run -p snake_headless -- replay replay.bin --verify
//! ```

pub mod ascii;
pub mod batch;
pub mod error;
pub mod metrics;
pub mod protocol;
pub mod runner;

pub use ascii::{render_ascii, AsciiConfig};
pub use batch::{run_batch, run_demo_game, BatchConfig, BatchResults};
pub use error::{Result, RunnerError};
pub use metrics::{BatchSummary, GameEnd, GameMetrics, MetricsCollector};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner, MAX_ADVANCE_MS};
