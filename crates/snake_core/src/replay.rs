//! Replay system for recording and playing back games.
//!
//! A replay stores the configuration, the seed and every external action
//! with the clock time it arrived at. Because the session RNG is seeded
//! and all timers run on the virtual clock, feeding the same actions at
//! the same times recreates the game exactly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::game::{Game, GameEvent};
use crate::grid::Direction;
use crate::simulation::ProposeOutcome;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// An external action on a [`Game`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayAction {
    /// Directional input.
    Propose(Direction),
    /// Demo mode requested.
    StartDemo,
    /// Demo mode cancelled.
    StopDemo,
    /// Session reset.
    Reset,
}

/// A single recorded action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayInput {
    /// Clock time the action was applied at.
    pub at_ms: u64,
    /// The action.
    pub action: ReplayAction,
}

/// Complete replay data structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Free-form label.
    pub label: String,
    /// Session seed.
    pub seed: u64,
    /// Configuration the game ran with.
    pub config: GameConfig,
    /// Actions in clock order.
    pub inputs: Vec<ReplayInput>,
    /// Clock time when recording stopped.
    pub final_ms: u64,
    /// Game state hash at `final_ms`.
    pub final_hash: u64,
}

impl Replay {
    /// Create an empty replay.
    #[must_use]
    pub fn new(label: impl Into<String>, seed: u64, config: GameConfig) -> Self {
        Self {
            version: REPLAY_VERSION,
            label: label.into(),
            seed,
            config,
            inputs: Vec::new(),
            final_ms: 0,
            final_hash: 0,
        }
    }

    /// Record an action.
    pub fn record(&mut self, at_ms: u64, action: ReplayAction) {
        self.inputs.push(ReplayInput { at_ms, action });
    }

    /// Finalize the replay with end-of-recording state.
    pub fn finalize(&mut self, final_ms: u64, final_hash: u64) {
        self.final_ms = final_ms;
        self.final_hash = final_hash;
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if reading or deserialization fails, or if the file
    /// was written by another format version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::ReplayVersion {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }

        Ok(replay)
    }

    /// Number of recorded actions.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }
}

/// Wraps a [`Game`] and records every external action.
#[derive(Debug)]
pub struct ReplayRecorder {
    game: Game,
    replay: Replay,
}

impl ReplayRecorder {
    /// Start recording a fresh game.
    #[must_use]
    pub fn new(label: impl Into<String>, config: GameConfig, seed: u64) -> Self {
        Self {
            game: Game::new(config.clone(), seed),
            replay: Replay::new(label, seed, config),
        }
    }

    /// See [`Game::advance`].
    pub fn advance(&mut self, now_ms: u64) -> Vec<GameEvent> {
        self.game.advance(now_ms)
    }

    /// See [`Game::propose`].
    pub fn propose(&mut self, direction: Direction) -> ProposeOutcome {
        self.replay
            .record(self.game.now_ms(), ReplayAction::Propose(direction));
        self.game.propose(direction)
    }

    /// See [`Game::start_demo`].
    pub fn start_demo(&mut self) {
        self.replay.record(self.game.now_ms(), ReplayAction::StartDemo);
        self.game.start_demo();
    }

    /// See [`Game::stop_demo`].
    pub fn stop_demo(&mut self) -> bool {
        self.replay.record(self.game.now_ms(), ReplayAction::StopDemo);
        self.game.stop_demo()
    }

    /// See [`Game::reset`].
    pub fn reset(&mut self) {
        self.replay.record(self.game.now_ms(), ReplayAction::Reset);
        self.game.reset();
    }

    /// The recorded game.
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// Take events without moving the clock.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.game.drain_events()
    }

    /// Stop recording and return the finalized replay.
    #[must_use]
    pub fn finish(self) -> Replay {
        let mut replay = self.replay;
        replay.finalize(self.game.now_ms(), self.game.state_hash());
        replay
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    game: Game,
    /// Index of the next input to apply.
    input_index: usize,
}

impl ReplayPlayer {
    /// Create a player positioned at time 0.
    #[must_use]
    pub fn new(replay: Replay) -> Self {
        let game = Game::new(replay.config.clone(), replay.seed);
        Self {
            replay,
            game,
            input_index: 0,
        }
    }

    /// Play forward to `target_ms`, applying recorded actions on the way.
    ///
    /// Returns the events produced.
    pub fn advance_to(&mut self, target_ms: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Some(input) = self.replay.inputs.get(self.input_index).copied() {
            if input.at_ms > target_ms {
                break;
            }
            events.extend(self.game.advance(input.at_ms));
            match input.action {
                ReplayAction::Propose(direction) => {
                    self.game.propose(direction);
                }
                ReplayAction::StartDemo => self.game.start_demo(),
                ReplayAction::StopDemo => {
                    self.game.stop_demo();
                }
                ReplayAction::Reset => self.game.reset(),
            }
            self.input_index += 1;
        }
        events.extend(self.game.advance(target_ms));
        events
    }

    /// Restart playback from time 0.
    pub fn rewind(&mut self) {
        self.game = Game::new(self.replay.config.clone(), self.replay.seed);
        self.input_index = 0;
    }

    /// The game being replayed.
    #[must_use]
    pub const fn game(&self) -> &Game {
        &self.game
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Check if every input has been applied and the clock reached the end.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.input_index >= self.replay.inputs.len() && self.game.now_ms() >= self.replay.final_ms
    }

    /// Replay from the start and compare the final hash.
    pub fn verify(&mut self) -> bool {
        self.rewind();
        self.advance_to(self.replay.final_ms);
        let actual = self.game.state_hash();
        if actual != self.replay.final_hash {
            tracing::warn!(
                expected = self.replay.final_hash,
                actual,
                "Replay diverged"
            );
        }
        actual == self.replay.final_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded() -> Replay {
        let mut recorder = ReplayRecorder::new("test", GameConfig::default(), 42);
        recorder.advance(300);
        recorder.propose(Direction::Up);
        recorder.advance(700);
        recorder.propose(Direction::Left);
        recorder.propose(Direction::Down);
        recorder.advance(2_000);
        recorder.start_demo();
        recorder.advance(6_000);
        recorder.finish()
    }

    #[test]
    fn test_recorder_captures_actions() {
        let replay = recorded();
        assert_eq!(replay.version, REPLAY_VERSION);
        assert_eq!(replay.input_count(), 4);
        assert_eq!(replay.inputs[0].at_ms, 300);
        assert_eq!(replay.inputs[3].action, ReplayAction::StartDemo);
        assert_eq!(replay.final_ms, 6_000);
    }

    #[test]
    fn test_player_verifies() {
        let mut player = ReplayPlayer::new(recorded());
        assert!(player.verify());
        assert!(player.is_finished());
    }

    #[test]
    fn test_tampered_replay_fails() {
        let mut replay = recorded();
        replay.seed += 1;
        let mut player = ReplayPlayer::new(replay);
        assert!(!player.verify());
    }

    #[test]
    fn test_partial_playback() {
        let mut player = ReplayPlayer::new(recorded());
        player.advance_to(1_000);
        assert_eq!(player.game().now_ms(), 1_000);
        assert!(!player.is_finished());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut replay = recorded();
        replay.version = REPLAY_VERSION + 1;
        let path = std::env::temp_dir().join("snake_core_replay_version_test.bin");
        replay.save(&path).unwrap();
        let loaded = Replay::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(loaded, Err(GameError::ReplayVersion { .. })));
    }
}
