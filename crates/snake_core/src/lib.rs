//! # Snake Core
//!
//! Deterministic simulation core for wraparound Snake.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No wall clock (time is whatever the host passes to [`game::Game::advance`])
//! - No system randomness (spawns draw from a seeded session RNG)
//! - No floating-point math in decisions (uses fixed-point)
//!
//! This separation enables:
//! - Headless runners and batch demo evaluation
//! - Replay recording and verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`grid`] - Toroidal grid, cells and directions
//! - [`snake`] - Snake body
//! - [`move_queue`] - Buffered directional input
//! - [`food`] / [`hazards`] - Consumables and timed bombs
//! - [`simulation`] - Per-tick state machine
//! - [`scheduler`] / [`game`] - Virtual-clock timers and the game controller
//! - [`autopilot`] - Demo-mode controller
//! - [`scores`] - Score submission and ranking
//! - [`replay`] - Recording and playback

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod autopilot;
pub mod config;
pub mod error;
pub mod food;
pub mod game;
pub mod grid;
pub mod hazards;
pub mod math;
pub mod move_queue;
pub mod replay;
pub mod rng;
pub mod scheduler;
pub mod scores;
pub mod simulation;
pub mod snake;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::autopilot::{choose_direction, MoveAssessment};
    pub use crate::config::{AutopilotConfig, GameConfig};
    pub use crate::error::{GameError, Result};
    pub use crate::food::{Food, FoodKind, FoodWeights};
    pub use crate::game::{ControlMode, DemoEnd, Game, GameEvent};
    pub use crate::grid::{Cell, Direction, Grid, Occupant};
    pub use crate::hazards::{Hazard, HazardConfig, HazardId, HazardState};
    pub use crate::math::Fixed;
    pub use crate::move_queue::MoveQueue;
    pub use crate::replay::{Replay, ReplayAction, ReplayPlayer, ReplayRecorder};
    pub use crate::scores::{Leaderboard, ScoreEntry, ScoreService, ScoreSubmission};
    pub use crate::simulation::{
        BoardSetup, FinalScore, GameOverCause, GamePhase, GameSession, Snapshot, TickEvents,
    };
    pub use crate::snake::Snake;
}
