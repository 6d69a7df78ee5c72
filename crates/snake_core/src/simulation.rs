//! Core simulation: one game session and its per-tick state machine.
//!
//! A [`GameSession`] owns everything a game needs: the snake, the move
//! queue, the food, the hazards, the score and its seeded RNG. It knows
//! nothing about time; the [`Game`](crate::game::Game) controller decides
//! when ticks happen and when hazards change state, and calls into the
//! session to apply them.
//!
//! # Phases
//!
//! ```text
//! Idle --first input--> Running --self-collision / hazard--> Over --reset--> Idle
//! ```
//!
//! # Example
//!
//! ```
//! use snake_core::config::GameConfig;
//! use snake_core::grid::Direction;
//! use snake_core::simulation::{GamePhase, GameSession};
//!
//! let mut session = GameSession::new(GameConfig::default(), 7);
//! assert_eq!(session.phase(), GamePhase::Idle);
//!
//! session.propose(Direction::Right);
//! assert_eq!(session.phase(), GamePhase::Running);
//!
//! session.tick();
//! assert_eq!(session.snake().head().x, 11);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{GameError, Result};
use crate::food::{find_free_cell, Food, FoodKind};
use crate::grid::{Cell, Direction, Grid, Occupant};
use crate::hazards::{Hazard, HazardField, HazardId, HazardState};
use crate::move_queue::MoveQueue;
use crate::rng::SessionRng;
use crate::snake::Snake;

/// Phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Waiting for the first directional input.
    Idle,
    /// Ticking.
    Running,
    /// Finished; only a reset leaves this phase.
    Over,
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverCause {
    /// The head ran into the body.
    SelfCollision,
    /// A detonation caught the snake.
    Hazard(HazardId),
}

/// Final numbers of a finished game, as handed to the score service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinalScore {
    /// Points scored.
    pub score: u32,
    /// Level reached.
    pub level: u32,
}

/// A level-up produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelUp {
    /// New level.
    pub level: u32,
    /// Tick interval the timer owner must switch to.
    pub tick_interval_ms: u64,
}

/// A request to place a wave of hazards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardWave {
    /// Level that triggered the wave.
    pub level: u32,
    /// Number of hazards to place.
    pub count: u32,
}

/// Everything that happened during one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick number after this tick.
    pub tick: u64,
    /// Where the head moved, if it moved.
    pub head: Option<Cell>,
    /// Food consumed this tick.
    pub ate: Option<FoodKind>,
    /// Level change, if any.
    pub level_up: Option<LevelUp>,
    /// Hazard wave the controller should spawn.
    pub hazard_wave: Option<HazardWave>,
    /// Set when this tick ended the game.
    pub game_over: Option<GameOverCause>,
}

/// Result of a directional proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposeOutcome {
    /// The direction entered the move queue.
    pub accepted: bool,
    /// The proposal moved the session from idle to running.
    pub started: bool,
}

/// Initial board for hand-built sessions (tests, puzzles, tooling).
///
/// # Example
///
/// ```
/// use snake_core::config::GameConfig;
/// use snake_core::food::Food;
/// use snake_core::grid::{Cell, Direction};
/// use snake_core::simulation::{BoardSetup, GameSession};
///
/// let session = GameSession::from_setup(
///     GameConfig::default(),
///     1,
///     BoardSetup {
///         snake: vec![Cell::new(3, 3), Cell::new(2, 3)],
///         direction: Some(Direction::Right),
///         food: Some(Food::standard(Cell::new(8, 3))),
///         ..Default::default()
///     },
/// );
/// assert_eq!(session.snake().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BoardSetup {
    /// Snake cells, head first. Empty means the configured start cell.
    pub snake: Vec<Cell>,
    /// Current direction. `Some` starts the session running.
    pub direction: Option<Direction>,
    /// Food item. `None` places one randomly.
    pub food: Option<Food>,
    /// Hazards as `(cell, state)`.
    pub hazards: Vec<(Cell, HazardState)>,
    /// Food already eaten, which fixes the starting level.
    pub food_eaten: u32,
    /// Starting score.
    pub score: u32,
}

/// Read-only view handed to the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Board width.
    pub width: u32,
    /// Board height.
    pub height: u32,
    /// Snake cells, head first.
    pub snake: Vec<Cell>,
    /// Active food.
    pub food: Option<Food>,
    /// Active hazards.
    pub hazards: Vec<Hazard>,
    /// Session phase.
    pub phase: GamePhase,
    /// Convenience flag for `phase == Over`.
    pub game_over: bool,
    /// Current score.
    pub score: u32,
    /// Current level.
    pub level: u32,
    /// Food eaten so far.
    pub food_eaten: u32,
    /// Ticks simulated.
    pub tick: u64,
}

/// One game session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSession {
    config: GameConfig,
    grid: Grid,
    snake: Snake,
    direction: Option<Direction>,
    queue: MoveQueue,
    food: Option<Food>,
    hazards: HazardField,
    score: u32,
    food_eaten: u32,
    level: u32,
    phase: GamePhase,
    cause: Option<GameOverCause>,
    tick: u64,
    /// Level whose hazard wave is requested but not yet placed.
    pending_wave: Option<u32>,
    /// Highest level that already produced a wave.
    last_wave_level: u32,
    rng: SessionRng,
}

impl GameSession {
    /// Create an idle session with the snake on the configured start cell.
    ///
    /// The config is expected to be valid (see
    /// [`GameConfig::validate`]).
    #[must_use]
    pub fn new(config: GameConfig, seed: u64) -> Self {
        let grid = config.grid();
        let start = config.start_cell;
        let mut session = Self {
            grid,
            snake: Snake::new(start),
            direction: None,
            queue: MoveQueue::new(),
            food: None,
            hazards: HazardField::new(),
            score: 0,
            food_eaten: 0,
            level: 1,
            phase: GamePhase::Idle,
            cause: None,
            tick: 0,
            pending_wave: None,
            last_wave_level: 0,
            rng: SessionRng::new(seed),
            config,
        };
        session.respawn_food();
        session
    }

    /// Create a session from a hand-built board.
    #[must_use]
    pub fn from_setup(config: GameConfig, seed: u64, setup: BoardSetup) -> Self {
        let mut session = Self::new(config, seed);
        if let Some(snake) = Snake::from_cells(setup.snake) {
            session.snake = snake;
        }
        session.direction = setup.direction;
        if session.direction.is_some() {
            session.phase = GamePhase::Running;
        }
        for (cell, state) in setup.hazards {
            let id = session.hazards.insert(cell, 0);
            match state {
                HazardState::Armed => {}
                HazardState::Warning => {
                    session.hazards.warn(id);
                }
                HazardState::Detonated => {
                    session.hazards.detonate(id);
                }
            }
        }
        session.food_eaten = setup.food_eaten;
        session.score = setup.score;
        session.level = session.config.level_for(setup.food_eaten);
        session.last_wave_level = session.level;
        session.food = setup.food;
        if session.food.is_none() || session.food.is_some_and(|f| session.is_food_blocked(f.cell))
        {
            session.respawn_food();
        }
        session
    }

    /// Return to idle with a fresh board. The RNG keeps its position, so
    /// consecutive games on one session differ.
    pub fn reset(&mut self) {
        self.snake = Snake::new(self.config.start_cell);
        self.direction = None;
        self.queue.clear();
        self.hazards.clear();
        self.score = 0;
        self.food_eaten = 0;
        self.level = 1;
        self.phase = GamePhase::Idle;
        self.cause = None;
        self.tick = 0;
        self.pending_wave = None;
        self.last_wave_level = 0;
        self.respawn_food();
        tracing::debug!("Session reset");
    }

    /// Reset and start running immediately from the demo start cell,
    /// heading right.
    pub fn start_demo(&mut self) {
        self.reset();
        self.snake = Snake::new(self.config.demo_start_cell);
        if self.food.is_some_and(|f| self.snake.occupies(f.cell)) {
            self.respawn_food();
        }
        self.direction = Some(Direction::Right);
        self.phase = GamePhase::Running;
        tracing::info!("Demo started");
    }

    /// Offer a direction from the input collaborator.
    ///
    /// The first accepted proposal in idle starts the game. Proposals
    /// after game over are ignored.
    pub fn propose(&mut self, direction: Direction) -> ProposeOutcome {
        if self.phase == GamePhase::Over {
            return ProposeOutcome {
                accepted: false,
                started: false,
            };
        }
        let accepted = self.queue.propose(direction, self.direction);
        let started = accepted && self.phase == GamePhase::Idle;
        if started {
            self.phase = GamePhase::Running;
            tracing::info!(?direction, "Game started");
        }
        ProposeOutcome { accepted, started }
    }

    /// Replace any pending turns with `direction`.
    ///
    /// Used by the autopilot, whose latest decision supersedes older ones.
    /// Still refuses a reversal of the current direction.
    pub fn override_move(&mut self, direction: Direction) -> bool {
        if self.phase != GamePhase::Running {
            return false;
        }
        self.queue.clear();
        self.queue.propose(direction, self.direction)
    }

    /// Advance one tick.
    ///
    /// Does nothing unless the session is running.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents {
            tick: self.tick,
            ..TickEvents::default()
        };
        if self.phase != GamePhase::Running {
            return events;
        }

        // 1. Apply queued intent
        if let Some(next) = self.queue.drain() {
            self.direction = Some(next);
        }
        let Some(direction) = self.direction else {
            return events;
        };

        // 2. New head on the torus
        let target = self.grid.step(self.snake.head(), direction);
        let eats = self.food.filter(|f| f.cell == target);

        // 3. Collisions
        if self.snake.would_collide(target, eats.is_some()) {
            self.finish(GameOverCause::SelfCollision);
            events.game_over = self.cause;
            return events;
        }
        if let Some(id) = self.hazards.lethal_at(self.grid, target) {
            self.finish(GameOverCause::Hazard(id));
            events.game_over = self.cause;
            return events;
        }

        // 4. Move
        self.snake.push_head(target);
        events.head = Some(target);

        // 5. Consume or shrink back
        if let Some(food) = eats {
            self.score += food.kind.points();
            self.food_eaten += 1;
            for _ in 1..food.kind.growth() {
                self.snake.extend_tail();
            }
            events.ate = Some(food.kind);
            self.respawn_food();
        } else {
            self.snake.pop_tail();
        }

        // 6. Level and speed
        let level = self.config.level_for(self.food_eaten);
        if level > self.level {
            self.level = level;
            let tick_interval_ms = self.config.tick_interval_ms(level);
            tracing::info!(level, tick_interval_ms, "Level up");
            events.level_up = Some(LevelUp {
                level,
                tick_interval_ms,
            });

            // 7. Hazard wave, at most one per level
            if self.pending_wave.is_none() && level > self.last_wave_level {
                if let Some(count) = self.config.hazards.wave_size(level) {
                    self.pending_wave = Some(level);
                    events.hazard_wave = Some(HazardWave { level, count });
                }
            }
        }

        self.tick += 1;
        events.tick = self.tick;

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::debug!(tick = self.tick, state_hash = hash, "Session state hash");
        }

        events
    }

    /// Place the pending hazard wave, if any.
    ///
    /// Each hazard avoids the snake, the food and other hazards; a hazard
    /// that finds no cell within the attempt cap is skipped.
    pub fn spawn_hazard_wave(&mut self, now_ms: u64) -> Vec<HazardId> {
        let Some(level) = self.pending_wave.take() else {
            return Vec::new();
        };
        self.last_wave_level = self.last_wave_level.max(level);
        let count = self.config.hazards.wave_size(level).unwrap_or(0);

        let mut placed = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let snake = &self.snake;
            let food = self.food;
            let id = self.hazards.place(
                self.grid,
                &mut self.rng,
                self.config.spawn_attempts,
                now_ms,
                |cell| snake.occupies(cell) || food.is_some_and(|f| f.cell == cell),
            );
            placed.extend(id);
        }
        tracing::debug!(level, requested = count, placed = placed.len(), "Hazard wave");
        placed
    }

    /// Put a hazard into its warning phase.
    pub fn warn_hazard(&mut self, id: HazardId) -> bool {
        self.hazards.warn(id)
    }

    /// Detonate a hazard and judge it against the snake as it is now.
    ///
    /// Returns `Some(true)` if the blast ended the game, `Some(false)` if
    /// it missed, `None` if the hazard is unknown or already detonated.
    pub fn detonate_hazard(&mut self, id: HazardId) -> Option<bool> {
        let hazard = self.hazards.detonate(id)?;
        let hit = self.snake.cells().any(|&c| hazard.covers(self.grid, c));
        tracing::debug!(id = id.0, x = hazard.cell.x, y = hazard.cell.y, hit, "Hazard detonated");
        if hit && self.phase == GamePhase::Running {
            self.finish(GameOverCause::Hazard(id));
            return Some(true);
        }
        Some(false)
    }

    /// Remove a hazard after its detonation has been displayed.
    pub fn clear_hazard(&mut self, id: HazardId) -> bool {
        self.hazards.remove(id).is_some()
    }

    fn finish(&mut self, cause: GameOverCause) {
        self.phase = GamePhase::Over;
        self.cause = Some(cause);
        self.queue.clear();
        tracing::info!(?cause, score = self.score, level = self.level, "Game over");
    }

    fn is_food_blocked(&self, cell: Cell) -> bool {
        self.snake.occupies(cell) || self.hazards.occupies(cell)
    }

    fn respawn_food(&mut self) {
        let kind = self.config.food_weights.choose(&mut self.rng);
        let snake = &self.snake;
        let hazards = &self.hazards;
        let cell = find_free_cell(
            self.grid,
            self.config.food_margin,
            self.config.spawn_attempts,
            &mut self.rng,
            |c| snake.occupies(c) || hazards.occupies(c),
        );
        if cell.is_none() {
            tracing::warn!("Board is full, no food placed");
        }
        self.food = cell.map(|c| Food::new(c, kind));
    }

    /// Classify a cell. Snake wins over food, food over hazard.
    #[must_use]
    pub fn occupied_by(&self, cell: Cell) -> Occupant {
        if self.snake.occupies(cell) {
            Occupant::Snake
        } else if self.food.is_some_and(|f| f.cell == cell) {
            Occupant::Food
        } else if self.hazards.occupies(cell) {
            Occupant::Hazard
        } else {
            Occupant::Empty
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Board dimensions.
    #[must_use]
    pub const fn grid(&self) -> Grid {
        self.grid
    }

    /// The snake.
    #[must_use]
    pub const fn snake(&self) -> &Snake {
        &self.snake
    }

    /// Current direction (`None` before the first move).
    #[must_use]
    pub const fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Pending turns.
    #[must_use]
    pub const fn move_queue(&self) -> &MoveQueue {
        &self.queue
    }

    /// Active food.
    #[must_use]
    pub const fn food(&self) -> Option<Food> {
        self.food
    }

    /// Active hazards.
    #[must_use]
    pub const fn hazards(&self) -> &HazardField {
        &self.hazards
    }

    /// Current score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// Food eaten so far.
    #[must_use]
    pub const fn food_eaten(&self) -> u32 {
        self.food_eaten
    }

    /// Current level.
    #[must_use]
    pub const fn level(&self) -> u32 {
        self.level
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Why the game ended, once over.
    #[must_use]
    pub const fn game_over_cause(&self) -> Option<GameOverCause> {
        self.cause
    }

    /// Ticks simulated since the last reset.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Tick interval for the current level.
    #[must_use]
    pub fn tick_interval_ms(&self) -> u64 {
        self.config.tick_interval_ms(self.level)
    }

    /// Final score and level, available once the game is over.
    #[must_use]
    pub fn final_score(&self) -> Option<FinalScore> {
        (self.phase == GamePhase::Over).then_some(FinalScore {
            score: self.score,
            level: self.level,
        })
    }

    /// Read-only snapshot for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            width: self.grid.width(),
            height: self.grid.height(),
            snake: self.snake.cells().copied().collect(),
            food: self.food,
            hazards: self.hazards.iter().copied().collect(),
            phase: self.phase,
            game_over: self.phase == GamePhase::Over,
            score: self.score,
            level: self.level,
            food_eaten: self.food_eaten,
            tick: self.tick,
        }
    }

    /// Deterministic hash of the whole session state.
    ///
    /// Two sessions built from the same config and seed and fed the same
    /// inputs produce the same hash.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.grid.hash(&mut hasher);
        self.snake.hash(&mut hasher);
        self.direction.hash(&mut hasher);
        self.queue.hash(&mut hasher);
        self.food.hash(&mut hasher);
        self.hazards.hash(&mut hasher);
        self.score.hash(&mut hasher);
        self.food_eaten.hash(&mut hasher);
        self.level.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.cause.hash(&mut hasher);
        self.tick.hash(&mut hasher);
        self.pending_wave.hash(&mut hasher);
        self.last_wave_level.hash(&mut hasher);
        self.rng.hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the session.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize session: {e}")))
    }

    /// Deserialize a session.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize session: {e}")))
    }
}
