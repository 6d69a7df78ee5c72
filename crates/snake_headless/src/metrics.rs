//! Demo game metrics collection.
//!
//! A [`MetricsCollector`] watches the [`GameEvent`] stream of one game and
//! turns it into a [`GameMetrics`] record; [`BatchSummary`] aggregates many.

use serde::{Deserialize, Serialize};
use snake_core::game::{DemoEnd, GameEvent};
use snake_core::simulation::GameOverCause;

/// How a measured game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEnd {
    /// Head ran into the body.
    SelfCollision,
    /// Caught by a detonation.
    Hazard,
    /// Demo level cap reached.
    LevelCap,
    /// Stopped from outside.
    Stopped,
    /// Time budget ran out first.
    Timeout,
}

/// Complete metrics for a single game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetrics {
    /// Unique game identifier.
    pub game_id: String,
    /// Session seed.
    pub seed: u64,
    /// Clock time when the game ended.
    pub duration_ms: u64,
    /// Ticks simulated.
    pub ticks: u64,
    /// Points scored.
    pub score: u32,
    /// Highest level reached.
    pub level: u32,
    /// Food items eaten.
    pub food_eaten: u32,
    /// Body length at the end.
    pub length: u32,
    /// Hazards placed on the board.
    pub hazards_spawned: u32,
    /// Detonations.
    pub detonations: u32,
    /// How it ended.
    pub end: GameEnd,
    /// Final controller state hash (for determinism validation).
    pub final_state_hash: u64,
}

/// Builds [`GameMetrics`] from events.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    metrics: GameMetrics,
    finished: bool,
}

impl MetricsCollector {
    /// Start collecting for a game that begins with a snake of `start_length`.
    #[must_use]
    pub fn new(game_id: impl Into<String>, seed: u64, start_length: u32) -> Self {
        Self {
            metrics: GameMetrics {
                game_id: game_id.into(),
                seed,
                duration_ms: 0,
                ticks: 0,
                score: 0,
                level: 1,
                food_eaten: 0,
                length: start_length,
                hazards_spawned: 0,
                detonations: 0,
                end: GameEnd::Timeout,
                final_state_hash: 0,
            },
            finished: false,
        }
    }

    /// Fold one event in. Events after the game finished are ignored.
    pub fn record(&mut self, event: &GameEvent) {
        if self.finished {
            return;
        }
        let m = &mut self.metrics;
        match event {
            GameEvent::Tick { at_ms, tick, ate, .. } => {
                m.duration_ms = *at_ms;
                m.ticks = *tick;
                if let Some(kind) = ate {
                    m.food_eaten += 1;
                    m.score += kind.points();
                    m.length += kind.growth();
                }
            }
            GameEvent::LevelUp { level, .. } => m.level = m.level.max(*level),
            GameEvent::HazardsSpawned { ids, .. } => m.hazards_spawned += ids.len() as u32,
            GameEvent::HazardDetonated { .. } => m.detonations += 1,
            GameEvent::GameOver {
                at_ms,
                final_score,
                cause,
            } => {
                m.duration_ms = *at_ms;
                m.score = final_score.score;
                m.level = final_score.level;
                m.end = match cause {
                    GameOverCause::SelfCollision => GameEnd::SelfCollision,
                    GameOverCause::Hazard(_) => GameEnd::Hazard,
                };
                self.finished = true;
            }
            GameEvent::DemoFinished { at_ms, reason } => {
                m.duration_ms = *at_ms;
                m.end = match reason {
                    DemoEnd::Died => m.end,
                    DemoEnd::LevelCap => GameEnd::LevelCap,
                    DemoEnd::Stopped => GameEnd::Stopped,
                };
                self.finished = true;
            }
            GameEvent::Started { .. }
            | GameEvent::HazardWarning { .. }
            | GameEvent::HazardCleared { .. }
            | GameEvent::Reset { .. } => {}
        }
    }

    /// Check if an ending event was seen.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }

    /// Close the record.
    #[must_use]
    pub fn finish(mut self, now_ms: u64, final_state_hash: u64) -> GameMetrics {
        if !self.finished {
            self.metrics.duration_ms = now_ms;
        }
        self.metrics.final_state_hash = final_state_hash;
        self.metrics
    }
}

/// Aggregate statistics over a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Total games.
    pub total_games: u32,
    /// Mean score.
    pub avg_score: f64,
    /// Best score.
    pub max_score: u32,
    /// Worst score.
    pub min_score: u32,
    /// Mean level reached.
    pub avg_level: f64,
    /// Mean food eaten.
    pub avg_food_eaten: f64,
    /// Mean game length in clock time.
    pub avg_duration_ms: f64,
    /// Games lost to self-collision.
    pub self_collisions: u32,
    /// Games lost to hazards.
    pub hazard_deaths: u32,
    /// Games that hit the demo level cap.
    pub level_caps: u32,
    /// Games cut off by the time budget.
    pub timeouts: u32,
}

impl BatchSummary {
    /// Calculate summary from a list of game metrics.
    #[must_use]
    pub fn from_games(games: &[GameMetrics]) -> Self {
        if games.is_empty() {
            return Self::default();
        }

        let n = games.len() as f64;
        let mut summary = Self {
            total_games: games.len() as u32,
            min_score: u32::MAX,
            ..Default::default()
        };

        let mut score_sum = 0u64;
        let mut level_sum = 0u64;
        let mut eaten_sum = 0u64;
        let mut duration_sum = 0u64;

        for game in games {
            score_sum += u64::from(game.score);
            level_sum += u64::from(game.level);
            eaten_sum += u64::from(game.food_eaten);
            duration_sum += game.duration_ms;
            summary.max_score = summary.max_score.max(game.score);
            summary.min_score = summary.min_score.min(game.score);

            match game.end {
                GameEnd::SelfCollision => summary.self_collisions += 1,
                GameEnd::Hazard => summary.hazard_deaths += 1,
                GameEnd::LevelCap => summary.level_caps += 1,
                GameEnd::Timeout | GameEnd::Stopped => summary.timeouts += 1,
            }
        }

        summary.avg_score = score_sum as f64 / n;
        summary.avg_level = level_sum as f64 / n;
        summary.avg_food_eaten = eaten_sum as f64 / n;
        summary.avg_duration_ms = duration_sum as f64 / n;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_core::food::FoodKind;
    use snake_core::grid::Cell;
    use snake_core::hazards::HazardId;
    use snake_core::simulation::FinalScore;

    fn tick(at_ms: u64, tick: u64, ate: Option<FoodKind>) -> GameEvent {
        GameEvent::Tick {
            at_ms,
            tick,
            head: Some(Cell::new(0, 0)),
            ate,
        }
    }

    #[test]
    fn test_collector_counts_food() {
        let mut collector = MetricsCollector::new("g", 1, 1);
        collector.record(&tick(100, 1, Some(FoodKind::Standard)));
        collector.record(&tick(200, 2, Some(FoodKind::DoubleGrowth)));
        collector.record(&tick(300, 3, None));

        let m = collector.finish(350, 9);
        assert_eq!(m.food_eaten, 2);
        assert_eq!(m.score, 30);
        assert_eq!(m.length, 4);
        assert_eq!(m.ticks, 3);
        assert_eq!(m.end, GameEnd::Timeout);
        assert_eq!(m.duration_ms, 350);
        assert_eq!(m.final_state_hash, 9);
    }

    #[test]
    fn test_game_over_wins_over_later_events() {
        let mut collector = MetricsCollector::new("g", 1, 1);
        collector.record(&GameEvent::GameOver {
            at_ms: 500,
            final_score: FinalScore { score: 60, level: 2 },
            cause: GameOverCause::Hazard(HazardId(3)),
        });
        collector.record(&GameEvent::DemoFinished {
            at_ms: 500,
            reason: DemoEnd::Died,
        });
        collector.record(&tick(600, 9, Some(FoodKind::Bonus)));

        assert!(collector.is_finished());
        let m = collector.finish(700, 0);
        assert_eq!(m.end, GameEnd::Hazard);
        assert_eq!(m.score, 60);
        assert_eq!(m.level, 2);
        assert_eq!(m.duration_ms, 500);
    }

    #[test]
    fn test_summary() {
        let mut a = MetricsCollector::new("a", 1, 1).finish(1000, 0);
        a.score = 10;
        a.end = GameEnd::SelfCollision;
        let mut b = MetricsCollector::new("b", 2, 1).finish(3000, 0);
        b.score = 30;
        b.level = 3;
        b.end = GameEnd::LevelCap;

        let summary = BatchSummary::from_games(&[a, b]);
        assert_eq!(summary.total_games, 2);
        assert_eq!(summary.max_score, 30);
        assert_eq!(summary.min_score, 10);
        assert!((summary.avg_score - 20.0).abs() < f64::EPSILON);
        assert!((summary.avg_level - 2.0).abs() < f64::EPSILON);
        assert!((summary.avg_duration_ms - 2000.0).abs() < f64::EPSILON);
        assert_eq!(summary.self_collisions, 1);
        assert_eq!(summary.level_caps, 1);
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(BatchSummary::from_games(&[]), BatchSummary::default());
    }
}
