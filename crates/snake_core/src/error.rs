//! Error types for the game core.
//!
//! Gameplay itself never fails: illegal moves are dropped and impossible
//! spawns are abandoned. Errors only surface at the edges of the core:
//! configuration, score submission, serialization and replay files.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for the game core.
#[derive(Debug, Error)]
pub enum GameError {
    /// Configuration values are out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to read a configuration file.
    #[error("Failed to read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),

    /// Failed to parse a RON configuration document.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Score submission carried an empty nickname.
    #[error("Invalid nickname")]
    InvalidNickname,

    /// Score submission carried a negative score.
    #[error("Invalid score: {0}")]
    InvalidScore(i64),

    /// Score submission carried a level below 1.
    #[error("Invalid level: {0}")]
    InvalidLevel(i64),

    /// Invalid game state.
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Replay file was written by an incompatible version.
    #[error("Replay version mismatch: expected {expected}, got {found}")]
    ReplayVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        found: u32,
    },
}
