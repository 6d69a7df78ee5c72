//! Score submission and ranking.
//!
//! The persistence backend is only a contract here: a [`ScoreService`]
//! validates submissions and ranks them. [`Leaderboard`] is the in-memory
//! implementation used by the headless tools and tests.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::simulation::FinalScore;

/// Number of entries a leaderboard query returns by default.
pub const DEFAULT_TOP_N: usize = 10;

/// A score as received from a client. Values are unvalidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    /// Player nickname.
    pub nickname: String,
    /// Points claimed.
    pub score: i64,
    /// Level claimed.
    pub level: i64,
}

impl ScoreSubmission {
    /// Build a submission from a finished game.
    #[must_use]
    pub fn from_final(nickname: impl Into<String>, final_score: FinalScore) -> Self {
        Self {
            nickname: nickname.into(),
            score: i64::from(final_score.score),
            level: i64::from(final_score.level),
        }
    }

    /// Check the submission and return the normalised nickname.
    pub fn validate(&self) -> Result<String> {
        let nickname = self.nickname.trim();
        if nickname.is_empty() {
            return Err(GameError::InvalidNickname);
        }
        if self.score < 0 {
            return Err(GameError::InvalidScore(self.score));
        }
        if self.level < 1 {
            return Err(GameError::InvalidLevel(self.level));
        }
        Ok(nickname.to_string())
    }
}

/// An accepted score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Submission order, starting at 1.
    pub id: u64,
    /// Trimmed nickname.
    pub nickname: String,
    /// Points.
    pub score: u64,
    /// Level reached.
    pub level: u64,
}

/// Score persistence contract.
pub trait ScoreService {
    /// Validate and store a submission.
    fn submit(&mut self, submission: ScoreSubmission) -> Result<ScoreEntry>;

    /// Best `n` entries: score descending, earlier submissions first on ties.
    fn top(&self, n: usize) -> Vec<ScoreEntry>;
}

/// In-memory [`ScoreService`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
    next_id: u64,
}

impl Leaderboard {
    /// Create an empty leaderboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been submitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ScoreService for Leaderboard {
    fn submit(&mut self, submission: ScoreSubmission) -> Result<ScoreEntry> {
        let nickname = submission.validate()?;
        self.next_id += 1;
        let entry = ScoreEntry {
            id: self.next_id,
            nickname,
            score: submission.score.unsigned_abs(),
            level: submission.level.unsigned_abs(),
        };
        tracing::info!(nickname = %entry.nickname, score = entry.score, level = entry.level, "Score submitted");
        self.entries.push(entry.clone());
        Ok(entry)
    }

    fn top(&self, n: usize) -> Vec<ScoreEntry> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));
        ranked.truncate(n);
        ranked
    }
}
