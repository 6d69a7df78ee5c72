//! Errors raised by the headless tools.

use snake_core::error::GameError;
use thiserror::Error;

/// Result type alias using [`RunnerError`].
pub type Result<T> = std::result::Result<T, RunnerError>;

/// Failures outside the command protocol.
///
/// Bad command lines never end a session; they are answered with an
/// `error` response instead.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Reading commands or writing responses failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config loading or replay writing failed.
    #[error(transparent)]
    Game(#[from] GameError),

    /// A results file could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
