//! Test fixtures and helpers.
//!
//! Pre-built boards and scripted games for consistent testing.

use fixed::types::I32F32;
use snake_core::config::GameConfig;
use snake_core::food::Food;
use snake_core::game::Game;
use snake_core::grid::{Cell, Direction, Grid};
use snake_core::hazards::HazardState;
use snake_core::simulation::{BoardSetup, GameSession};

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Turn `(x, y)` pairs into cells.
#[must_use]
pub fn cells(list: &[(u32, u32)]) -> Vec<Cell> {
    list.iter().map(|&c| Cell::from(c)).collect()
}

/// A straight snake of `len` cells whose head is at `head`, moving
/// `heading`. The body trails behind, wrapping around the grid.
#[must_use]
pub fn straight_snake(grid: Grid, head: Cell, heading: Direction, len: usize) -> Vec<Cell> {
    let back = heading.reverse();
    let mut body = Vec::with_capacity(len);
    let mut cell = head;
    for _ in 0..len {
        body.push(cell);
        cell = grid.step(cell, back);
    }
    body
}

/// Fluent builder for hand-made boards.
#[derive(Debug, Clone)]
pub struct BoardBuilder {
    config: GameConfig,
    seed: u64,
    setup: BoardSetup,
}

impl BoardBuilder {
    /// Start from the classic rules on a 20x20 board.
    #[must_use]
    pub fn classic() -> Self {
        Self::with_config(GameConfig::classic())
    }

    /// Start from a custom configuration.
    #[must_use]
    pub fn with_config(config: GameConfig) -> Self {
        Self {
            config,
            seed: 1,
            setup: BoardSetup::default(),
        }
    }

    /// Session seed.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Snake cells, head first.
    #[must_use]
    pub fn snake(mut self, body: &[(u32, u32)]) -> Self {
        self.setup.snake = cells(body);
        self
    }

    /// Snake from explicit cells.
    #[must_use]
    pub fn snake_cells(mut self, body: Vec<Cell>) -> Self {
        self.setup.snake = body;
        self
    }

    /// Current direction; the session starts running.
    #[must_use]
    pub fn moving(mut self, direction: Direction) -> Self {
        self.setup.direction = Some(direction);
        self
    }

    /// Standard food at `(x, y)`.
    #[must_use]
    pub fn food(mut self, x: u32, y: u32) -> Self {
        self.setup.food = Some(Food::standard(Cell::new(x, y)));
        self
    }

    /// Any food item.
    #[must_use]
    pub fn food_item(mut self, food: Food) -> Self {
        self.setup.food = Some(food);
        self
    }

    /// Hazard centred on `(x, y)`.
    #[must_use]
    pub fn hazard(mut self, x: u32, y: u32, state: HazardState) -> Self {
        self.setup.hazards.push((Cell::new(x, y), state));
        self
    }

    /// Food already eaten.
    #[must_use]
    pub fn food_eaten(mut self, count: u32) -> Self {
        self.setup.food_eaten = count;
        self
    }

    /// Build the session.
    #[must_use]
    pub fn session(self) -> GameSession {
        GameSession::from_setup(self.config, self.seed, self.setup)
    }

    /// Build a game controller around the session at time 0.
    #[must_use]
    pub fn game(self) -> Game {
        Game::from_session(self.session())
    }
}

/// Run a manual game: apply each `(at_ms, direction)` in order, then
/// advance the clock to `until_ms`.
#[must_use]
pub fn scripted_game(config: GameConfig, seed: u64, inputs: &[(u64, Direction)], until_ms: u64) -> Game {
    let mut game = Game::new(config, seed);
    for &(at, direction) in inputs {
        game.advance(at);
        game.propose(direction);
    }
    game.advance(until_ms);
    game
}

/// Run one demo game from time 0 to `until_ms`.
#[must_use]
pub fn demo_game(config: GameConfig, seed: u64, until_ms: u64) -> Game {
    let mut game = Game::new(config, seed);
    game.start_demo();
    game.advance(until_ms);
    game
}
