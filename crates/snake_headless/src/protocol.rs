//! JSON protocol for headless game communication.
//!
//! The headless runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the controlling process
//! **Output (stdout):** Events, state and responses
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs `{"type":"ready","version":"1.0","now_ms":0}`
//! 2. Controller sends commands as JSON lines
//! 3. Runner answers each command; clock moves only on `advance`
//! 4. On `quit` (or end of input), outputs `{"type":"bye"}`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","now_ms":0}
//! -> {"cmd":"propose","direction":"up"}
//! <- {"type":"proposed","accepted":true,"started":true}
//! <- {"type":"events","now_ms":0,"events":[{"event":"started","at_ms":0,"mode":"manual"}]}
//! -> {"cmd":"advance","by_ms":500}
//! <- {"type":"events","now_ms":500,"events":[{"event":"tick",...},...]}
//! -> {"cmd":"query"}
//! <- {"type":"state","now_ms":500,"mode":"manual","snapshot":{...},"hash":...}
//! ```

use serde::{Deserialize, Serialize};
use snake_core::game::{ControlMode, GameEvent};
use snake_core::grid::Direction;
use snake_core::scores::{ScoreEntry, DEFAULT_TOP_N};
use snake_core::simulation::Snapshot;

/// Protocol version reported in the `ready` line.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Controller -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Offer a direction to the move queue.
    Propose { direction: Direction },

    /// Move the virtual clock forward (default: 100 ms, at most one hour).
    Advance {
        #[serde(default = "default_advance_ms")]
        by_ms: u64,
    },

    /// Query current game state without advancing time.
    Query,

    /// Print the board as ASCII text.
    Render,

    /// Return to an idle manual game.
    Reset,

    /// Hand control to the autopilot.
    StartDemo,

    /// Stop the autopilot.
    StopDemo,

    /// Submit a score. Missing numbers are taken from the last finished game.
    Submit {
        nickname: String,
        #[serde(default)]
        score: Option<i64>,
        #[serde(default)]
        level: Option<i64>,
    },

    /// Best scores so far.
    Leaderboard {
        #[serde(default = "default_top")]
        top: usize,
    },

    /// Save current state hash (for determinism verification).
    Hash,

    /// Quit the session.
    Quit,
}

fn default_advance_ms() -> u64 {
    100
}

fn default_top() -> usize {
    DEFAULT_TOP_N
}

// ============================================================================
// Output Responses (Runner -> Controller)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready to accept commands.
    Ready { version: String, now_ms: u64 },

    /// Acknowledgment of a command.
    Ack { cmd: String },

    /// Error processing a command.
    Error {
        message: String,
        cmd: Option<String>,
    },

    /// Outcome of a `propose`.
    Proposed { accepted: bool, started: bool },

    /// Game events in the order they happened.
    Events {
        now_ms: u64,
        events: Vec<GameEvent>,
    },

    /// Current game state.
    State {
        now_ms: u64,
        mode: ControlMode,
        snapshot: Snapshot,
        hash: u64,
    },

    /// ASCII board.
    Frame { now_ms: u64, text: String },

    /// Accepted score.
    Submitted { entry: ScoreEntry },

    /// Ranked scores.
    Leaderboard { entries: Vec<ScoreEntry> },

    /// State hash for determinism verification.
    StateHash { now_ms: u64, hash: u64 },

    /// Goodbye message before shutdown.
    Bye,
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response.
    pub fn ready(now_ms: u64) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            now_ms,
        }
    }

    /// Create an acknowledgment.
    pub fn ack(cmd: &str) -> Self {
        Self::Ack {
            cmd: cmd.to_string(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}"}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Get command name for acknowledgment.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Propose { .. } => "propose",
            Self::Advance { .. } => "advance",
            Self::Query => "query",
            Self::Render => "render",
            Self::Reset => "reset",
            Self::StartDemo => "start_demo",
            Self::StopDemo => "stop_demo",
            Self::Submit { .. } => "submit",
            Self::Leaderboard { .. } => "leaderboard",
            Self::Hash => "hash",
            Self::Quit => "quit",
        }
    }
}
