//! Game controller: a session driven by a virtual clock.
//!
//! [`Game`] owns a [`GameSession`] and a [`Scheduler`] and runs every
//! timer the game needs: the tick timer, the autopilot decision timer and
//! the per-hazard lifecycle timers. The host calls [`Game::advance`] with
//! the current time in milliseconds and receives the [`GameEvent`]s that
//! happened up to that instant, in order.
//!
//! Invariants kept here:
//!
//! - at most one tick timer is pending; a level-up replaces it,
//! - game over, reset and stopping the demo cancel every timer,
//! - hazard timers are judged against the snake at the moment they fire.

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::autopilot;
use crate::config::GameConfig;
use crate::food::FoodKind;
use crate::grid::{Cell, Direction};
use crate::hazards::{HazardId, HazardState};
use crate::scheduler::{DueEvent, Scheduler, TimerEvent, TimerId};
use crate::simulation::{
    FinalScore, GameOverCause, GamePhase, GameSession, ProposeOutcome, Snapshot,
};

/// Who steers the snake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Human input through [`Game::propose`].
    Manual,
    /// Demo mode; human input is ignored.
    Autopilot,
}

/// Why a demo ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoEnd {
    /// The snake died.
    Died,
    /// The level passed the demo cap.
    LevelCap,
    /// Stopped from outside.
    Stopped,
}

/// Something the rendering collaborator may want to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    /// The session started running.
    Started {
        /// Clock time.
        at_ms: u64,
        /// Controller in charge.
        mode: ControlMode,
    },
    /// One simulation step.
    Tick {
        /// Clock time.
        at_ms: u64,
        /// Tick number.
        tick: u64,
        /// New head position.
        head: Option<Cell>,
        /// Food eaten on this step.
        ate: Option<FoodKind>,
    },
    /// Level increased and the tick timer was replaced.
    LevelUp {
        /// Clock time.
        at_ms: u64,
        /// New level.
        level: u32,
        /// New tick interval.
        tick_interval_ms: u64,
    },
    /// A hazard wave was placed.
    HazardsSpawned {
        /// Clock time.
        at_ms: u64,
        /// Placed hazards; may be fewer than requested.
        ids: Vec<HazardId>,
    },
    /// A hazard entered its warning phase.
    HazardWarning {
        /// Clock time.
        at_ms: u64,
        /// Hazard.
        id: HazardId,
    },
    /// A hazard exploded.
    HazardDetonated {
        /// Clock time.
        at_ms: u64,
        /// Hazard.
        id: HazardId,
        /// The blast caught the snake.
        lethal: bool,
    },
    /// A detonated hazard left the board.
    HazardCleared {
        /// Clock time.
        at_ms: u64,
        /// Hazard.
        id: HazardId,
    },
    /// The game ended.
    GameOver {
        /// Clock time.
        at_ms: u64,
        /// Final numbers for score submission.
        final_score: FinalScore,
        /// What ended it.
        cause: GameOverCause,
    },
    /// Demo mode ended and the session was reset.
    DemoFinished {
        /// Clock time.
        at_ms: u64,
        /// Why it ended.
        reason: DemoEnd,
    },
    /// The session was reset to idle.
    Reset {
        /// Clock time.
        at_ms: u64,
    },
}

/// A session plus its timers.
#[derive(Debug, Clone)]
pub struct Game {
    session: GameSession,
    scheduler: Scheduler,
    mode: ControlMode,
    tick_timer: Option<TimerId>,
    autopilot_timer: Option<TimerId>,
    hazard_timers: BTreeMap<HazardId, TimerId>,
    outbox: Vec<GameEvent>,
}

impl Game {
    /// Create an idle game at time 0.
    #[must_use]
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self::from_session(GameSession::new(config, seed))
    }

    /// Wrap an existing session at time 0.
    ///
    /// A running session gets its tick timer; hazards already on the board
    /// get the timer for their next transition.
    #[must_use]
    pub fn from_session(session: GameSession) -> Self {
        let mut game = Self {
            session,
            scheduler: Scheduler::new(),
            mode: ControlMode::Manual,
            tick_timer: None,
            autopilot_timer: None,
            hazard_timers: BTreeMap::new(),
            outbox: Vec::new(),
        };
        if game.session.phase() == GamePhase::Running {
            game.schedule_tick(0);
            let hazards: Vec<_> = game.session.hazards().iter().copied().collect();
            let timings = game.session.config().hazards;
            for hazard in hazards {
                let (delay, event) = match hazard.state {
                    HazardState::Armed => {
                        (timings.armed_ms(), TimerEvent::HazardWarning(hazard.id))
                    }
                    HazardState::Warning => {
                        (timings.warning_ms, TimerEvent::HazardDetonation(hazard.id))
                    }
                    HazardState::Detonated => {
                        (timings.cleanup_ms, TimerEvent::HazardCleanup(hazard.id))
                    }
                };
                let timer = game.scheduler.schedule_at(delay, event);
                game.hazard_timers.insert(hazard.id, timer);
            }
        }
        game
    }

    /// Advance the clock to `now_ms`, firing every timer due on the way.
    ///
    /// Returns all events produced since the previous call, including
    /// those caused by [`propose`](Self::propose) and friends.
    pub fn advance(&mut self, now_ms: u64) -> Vec<GameEvent> {
        while let Some(due) = self.scheduler.pop_due(now_ms) {
            self.fire(due);
        }
        self.scheduler.advance_to(now_ms);
        std::mem::take(&mut self.outbox)
    }

    /// Take pending events without moving the clock.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.outbox)
    }

    /// Forward a human direction.
    ///
    /// Ignored while the autopilot drives. The first accepted direction in
    /// idle starts the game.
    pub fn propose(&mut self, direction: Direction) -> ProposeOutcome {
        if self.mode == ControlMode::Autopilot {
            tracing::trace!(?direction, "Input ignored during demo");
            return ProposeOutcome {
                accepted: false,
                started: false,
            };
        }
        let outcome = self.session.propose(direction);
        if outcome.started {
            let now = self.scheduler.now_ms();
            self.schedule_tick(now);
            self.outbox.push(GameEvent::Started {
                at_ms: now,
                mode: ControlMode::Manual,
            });
        }
        outcome
    }

    /// Cancel every timer and return to an idle manual game.
    pub fn reset(&mut self) {
        self.cancel_timers();
        self.mode = ControlMode::Manual;
        self.session.reset();
        self.outbox.push(GameEvent::Reset {
            at_ms: self.scheduler.now_ms(),
        });
    }

    /// Reset and hand control to the autopilot.
    pub fn start_demo(&mut self) {
        self.cancel_timers();
        self.session.start_demo();
        self.mode = ControlMode::Autopilot;
        let now = self.scheduler.now_ms();
        self.autopilot_timer = Some(self.scheduler.schedule_at(now, TimerEvent::Autopilot));
        self.schedule_tick(now);
        self.outbox.push(GameEvent::Started {
            at_ms: now,
            mode: ControlMode::Autopilot,
        });
    }

    /// Stop a running demo. Returns `false` if no demo was running.
    pub fn stop_demo(&mut self) -> bool {
        if self.mode != ControlMode::Autopilot {
            return false;
        }
        let now = self.scheduler.now_ms();
        self.finish_demo(now, DemoEnd::Stopped);
        true
    }

    fn fire(&mut self, due: DueEvent) {
        let at = due.due_ms;
        match due.event {
            TimerEvent::Tick => self.on_tick(due.id, at),
            TimerEvent::Autopilot => self.on_autopilot(due.id, at),
            TimerEvent::HazardWarning(id) => {
                self.hazard_timers.remove(&id);
                if self.session.warn_hazard(id) {
                    tracing::debug!(id = id.0, at, "Hazard warning");
                    self.outbox.push(GameEvent::HazardWarning { at_ms: at, id });
                    let delay = self.session.config().hazards.warning_ms;
                    let due = at.checked_add(delay);
                    self.schedule_hazard(id, due, TimerEvent::HazardDetonation(id));
                }
            }
            TimerEvent::HazardDetonation(id) => {
                self.hazard_timers.remove(&id);
                if let Some(lethal) = self.session.detonate_hazard(id) {
                    self.outbox.push(GameEvent::HazardDetonated {
                        at_ms: at,
                        id,
                        lethal,
                    });
                    if lethal {
                        self.on_game_over(at);
                    } else {
                        let delay = self.session.config().hazards.cleanup_ms;
                        let due = at.checked_add(delay);
                        self.schedule_hazard(id, due, TimerEvent::HazardCleanup(id));
                    }
                }
            }
            TimerEvent::HazardCleanup(id) => {
                self.hazard_timers.remove(&id);
                if self.session.clear_hazard(id) {
                    self.outbox.push(GameEvent::HazardCleared { at_ms: at, id });
                }
            }
        }
    }

    fn on_tick(&mut self, timer: TimerId, at: u64) {
        if self.tick_timer == Some(timer) {
            self.tick_timer = None;
        }
        let events = self.session.tick();
        self.outbox.push(GameEvent::Tick {
            at_ms: at,
            tick: events.tick,
            head: events.head,
            ate: events.ate,
        });

        if events.game_over.is_some() {
            self.on_game_over(at);
            return;
        }

        if let Some(level_up) = events.level_up {
            self.outbox.push(GameEvent::LevelUp {
                at_ms: at,
                level: level_up.level,
                tick_interval_ms: level_up.tick_interval_ms,
            });
        }

        if events.hazard_wave.is_some() {
            let ids = self.session.spawn_hazard_wave(at);
            let armed = self.session.config().hazards.armed_ms();
            for &id in &ids {
                self.schedule_hazard(id, at.checked_add(armed), TimerEvent::HazardWarning(id));
            }
            self.outbox.push(GameEvent::HazardsSpawned { at_ms: at, ids });
        }

        if self.mode == ControlMode::Autopilot {
            let cap = self.session.config().autopilot.max_level;
            if cap.is_some_and(|max| self.session.level() > max) {
                self.finish_demo(at, DemoEnd::LevelCap);
                return;
            }
        }

        self.schedule_tick(at);
    }

    fn on_autopilot(&mut self, timer: TimerId, at: u64) {
        if self.autopilot_timer == Some(timer) {
            self.autopilot_timer = None;
        }
        if self.mode != ControlMode::Autopilot || self.session.phase() != GamePhase::Running {
            return;
        }
        let direction = autopilot::choose_direction(&self.session);
        self.session.override_move(direction);
        let interval = self.session.config().autopilot.decision_interval_ms;
        self.autopilot_timer = at
            .checked_add(interval)
            .map(|due| self.scheduler.schedule_at(due, TimerEvent::Autopilot));
    }

    fn on_game_over(&mut self, at: u64) {
        self.cancel_timers();
        if let (Some(final_score), Some(cause)) =
            (self.session.final_score(), self.session.game_over_cause())
        {
            self.outbox.push(GameEvent::GameOver {
                at_ms: at,
                final_score,
                cause,
            });
        }
        if self.mode == ControlMode::Autopilot {
            self.finish_demo(at, DemoEnd::Died);
        }
    }

    fn finish_demo(&mut self, at: u64, reason: DemoEnd) {
        self.cancel_timers();
        self.mode = ControlMode::Manual;
        self.session.reset();
        tracing::info!(?reason, "Demo finished");
        self.outbox.push(GameEvent::DemoFinished { at_ms: at, reason });
    }

    /// Install the tick timer one interval after `from_ms`, replacing any
    /// pending one. Nothing is scheduled past the end of the clock range.
    fn schedule_tick(&mut self, from_ms: u64) {
        if let Some(old) = self.tick_timer.take() {
            self.scheduler.cancel(old);
        }
        self.tick_timer = from_ms
            .checked_add(self.session.tick_interval_ms())
            .map(|due| self.scheduler.schedule_at(due, TimerEvent::Tick));
    }

    /// `due_ms` is `None` when the deadline overflowed the clock.
    fn schedule_hazard(&mut self, id: HazardId, due_ms: Option<u64>, event: TimerEvent) {
        if let Some(old) = self.hazard_timers.remove(&id) {
            self.scheduler.cancel(old);
        }
        if let Some(due) = due_ms {
            let timer = self.scheduler.schedule_at(due, event);
            self.hazard_timers.insert(id, timer);
        }
    }

    fn cancel_timers(&mut self) {
        self.scheduler.cancel_all();
        self.tick_timer = None;
        self.autopilot_timer = None;
        self.hazard_timers.clear();
    }

    /// The underlying session.
    #[must_use]
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    /// Current controller.
    #[must_use]
    pub const fn mode(&self) -> ControlMode {
        self.mode
    }

    /// Current clock time.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.scheduler.now_ms()
    }

    /// When the next timer fires, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        self.scheduler.next_due()
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending_count()
    }

    /// Whether a tick timer is pending.
    #[must_use]
    pub fn has_tick_timer(&self) -> bool {
        self.tick_timer.is_some_and(|t| self.scheduler.is_pending(t))
    }

    /// Read-only board view.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.session.snapshot()
    }

    /// Session hash combined with the clock and control mode.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.session.state_hash().hash(&mut hasher);
        self.scheduler.now_ms().hash(&mut hasher);
        self.mode.hash(&mut hasher);
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::food::Food;
    use crate::simulation::BoardSetup;

    fn manual_game() -> Game {
        Game::new(GameConfig::classic(), 5)
    }

    #[test]
    fn test_idle_game_has_no_timers() {
        let mut game = manual_game();
        assert!(game.advance(10_000).is_empty());
        assert_eq!(game.pending_timers(), 0);
        assert_eq!(game.session().tick_count(), 0);
    }

    #[test]
    fn test_first_input_starts_ticking() {
        let mut game = manual_game();
        game.advance(1_000);
        let outcome = game.propose(Direction::Up);
        assert!(outcome.started);
        assert!(game.has_tick_timer());
        assert_eq!(game.next_deadline(), Some(1_142));

        let events = game.advance(1_142);
        assert!(matches!(events[0], GameEvent::Started { at_ms: 1_000, .. }));
        assert!(matches!(events[1], GameEvent::Tick { at_ms: 1_142, tick: 1, .. }));
        assert_eq!(game.session().snake().head(), Cell::new(10, 9));
    }

    #[test]
    fn test_one_tick_per_interval() {
        let mut game = manual_game();
        game.propose(Direction::Right);
        let events = game.advance(142 * 5 + 10);
        let ticks = events
            .iter()
            .filter(|e| matches!(e, GameEvent::Tick { .. }))
            .count();
        assert_eq!(ticks, 5);
        assert_eq!(game.pending_timers(), 1);
    }

    #[test]
    fn test_no_timer_past_end_of_clock() {
        let mut game = manual_game();
        game.advance(u64::MAX - 100);
        assert!(game.propose(Direction::Right).started);
        assert!(!game.has_tick_timer());

        let events = game.advance(u64::MAX);
        assert!(events.iter().all(|e| !matches!(e, GameEvent::Tick { .. })));
        assert_eq!(game.now_ms(), u64::MAX);
        assert_eq!(game.pending_timers(), 0);
    }

    #[test]
    fn test_level_up_replaces_tick_timer() {
        let session = GameSession::from_setup(
            GameConfig::classic(),
            1,
            BoardSetup {
                snake: vec![Cell::new(5, 5)],
                direction: Some(Direction::Right),
                food: Some(Food::standard(Cell::new(6, 5))),
                food_eaten: 9,
                ..BoardSetup::default()
            },
        );
        let mut game = Game::from_session(session);
        let events = game.advance(142);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::LevelUp { level: 2, tick_interval_ms: 111, .. })));
        assert_eq!(game.pending_timers(), 1);
        assert_eq!(game.next_deadline(), Some(142 + 111));
    }

    #[test]
    fn test_hazard_lifecycle_timers() {
        let session = GameSession::from_setup(
            GameConfig::default(),
            1,
            BoardSetup {
                snake: vec![Cell::new(0, 0)],
                direction: Some(Direction::Down),
                food: Some(Food::standard(Cell::new(15, 15))),
                hazards: vec![(Cell::new(10, 10), HazardState::Armed)],
                ..BoardSetup::default()
            },
        );
        let mut game = Game::from_session(session);
        let id = game.session().hazards().iter().next().unwrap().id;

        let events = game.advance(9_000);
        assert!(events.contains(&GameEvent::HazardWarning { at_ms: 9_000, id }));

        let events = game.advance(10_000);
        assert!(events.contains(&GameEvent::HazardDetonated {
            at_ms: 10_000,
            id,
            lethal: false
        }));

        let events = game.advance(10_500);
        assert!(events.contains(&GameEvent::HazardCleared { at_ms: 10_500, id }));
        assert!(game.session().hazards().is_empty());
    }

    #[test]
    fn test_detonation_between_ticks_uses_current_position() {
        // Snake walks down column 10; the bomb below it goes off at 300 ms,
        // after two ticks have carried the head into the footprint.
        let mut config = GameConfig::default();
        config.hazards.fuse_ms = 300;
        config.hazards.warning_ms = 100;
        let session = GameSession::from_setup(
            config,
            1,
            BoardSetup {
                snake: vec![Cell::new(10, 10)],
                direction: Some(Direction::Down),
                food: Some(Food::standard(Cell::new(3, 3))),
                hazards: vec![(Cell::new(10, 13), HazardState::Armed)],
                ..BoardSetup::default()
            },
        );
        let mut game = Game::from_session(session);
        let events = game.advance(1_000);

        let lethal = events
            .iter()
            .any(|e| matches!(e, GameEvent::HazardDetonated { lethal: true, .. }));
        assert!(lethal);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { cause: GameOverCause::Hazard(_), .. })));
        assert_eq!(game.session().phase(), GamePhase::Over);
        assert_eq!(game.pending_timers(), 0);
    }

    #[test]
    fn test_reset_cancels_everything() {
        let mut game = manual_game();
        game.propose(Direction::Right);
        game.advance(500);
        game.reset();
        assert_eq!(game.pending_timers(), 0);
        let events = game.advance(5_000);
        assert!(matches!(events.as_slice(), [GameEvent::Reset { at_ms: 500 }]));
        assert_eq!(game.session().phase(), GamePhase::Idle);
    }

    #[test]
    fn test_demo_ignores_input_and_stops() {
        let mut game = Game::new(GameConfig::default(), 3);
        game.start_demo();
        assert_eq!(game.mode(), ControlMode::Autopilot);
        assert_eq!(game.session().snake().head(), Cell::new(5, 5));
        assert!(!game.propose(Direction::Up).accepted);

        game.advance(1_000);
        assert!(game.stop_demo());
        assert!(!game.stop_demo());
        assert_eq!(game.mode(), ControlMode::Manual);
        assert_eq!(game.pending_timers(), 0);
        assert_eq!(game.session().phase(), GamePhase::Idle);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::DemoFinished {
            at_ms: 1_000,
            reason: DemoEnd::Stopped
        }));
    }

    #[test]
    fn test_same_seed_same_hash() {
        let run = || {
            let mut game = Game::new(GameConfig::default(), 77);
            game.start_demo();
            game.advance(20_000);
            game.state_hash()
        };
        assert_eq!(run(), run());
    }
}
