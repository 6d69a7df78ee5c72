//! Game configuration.
//!
//! Every tunable of a session lives in [`GameConfig`]. Configurations are
//! plain serde data and are usually loaded from RON:
//!
//! ```
//! use snake_core::config::GameConfig;
//!
//! let config = GameConfig::from_ron_str("(grid_width: 30, grid_height: 30)").unwrap();
//! assert_eq!(config.grid_width, 30);
//! assert_eq!(config.base_speed, 7);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::food::FoodWeights;
use crate::grid::{Cell, Grid};
use crate::hazards::HazardConfig;
use crate::math::{fixed_serde, ratio, Fixed};

/// Autopilot (demo mode) tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutopilotConfig {
    /// Delay between two autopilot decisions.
    pub decision_interval_ms: u64,
    /// A move is "super-safe" when its reachable space exceeds
    /// `space_factor * snake length`.
    #[serde(with = "fixed_serde")]
    pub space_factor: Fixed,
    /// The demo stops once the level climbs above this cap.
    pub max_level: Option<u32>,
}

impl Default for AutopilotConfig {
    fn default() -> Self {
        Self {
            decision_interval_ms: 100,
            space_factor: ratio(3, 2),
            max_level: Some(5),
        }
    }
}

/// Complete configuration of a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Board width in cells.
    pub grid_width: u32,
    /// Board height in cells.
    pub grid_height: u32,
    /// Head position of a fresh manual game.
    pub start_cell: Cell,
    /// Head position when the demo starts.
    pub demo_start_cell: Cell,
    /// Ticks per second at level 1.
    pub base_speed: u32,
    /// Extra ticks per second gained per level.
    pub speed_per_level: u32,
    /// Lower bound on the tick interval.
    pub min_tick_interval_ms: u64,
    /// Food items needed per level.
    pub food_per_level: u32,
    /// Food keeps this many cells away from the edges when it can.
    pub food_margin: u32,
    /// Random draws before a spawn falls back or gives up.
    pub spawn_attempts: u32,
    /// Odds of each food category.
    pub food_weights: FoodWeights,
    /// Hazard spawning and lifecycle.
    pub hazards: HazardConfig,
    /// Demo-mode autopilot.
    pub autopilot: AutopilotConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            start_cell: Cell::new(10, 10),
            demo_start_cell: Cell::new(5, 5),
            base_speed: 7,
            speed_per_level: 2,
            min_tick_interval_ms: 40,
            food_per_level: 10,
            food_margin: 1,
            spawn_attempts: 100,
            food_weights: FoodWeights::default(),
            hazards: HazardConfig::default(),
            autopilot: AutopilotConfig::default(),
        }
    }
}

impl GameConfig {
    /// The original rules: standard food only, no hazards.
    #[must_use]
    pub fn classic() -> Self {
        Self {
            food_weights: FoodWeights::classic(),
            hazards: HazardConfig {
                min_level: u32::MAX,
                ..HazardConfig::default()
            },
            ..Self::default()
        }
    }

    /// Load and validate a configuration from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Parse and validate a configuration from a RON string.
    ///
    /// Missing fields take their default values.
    pub fn from_ron_str(ron: &str) -> Result<Self> {
        let config: Self = ron::from_str(ron)?;
        config.validate()?;
        Ok(config)
    }

    /// The board described by this configuration.
    ///
    /// # Panics
    ///
    /// Panics on a zero dimension; [`validate`](Self::validate) rejects those.
    #[must_use]
    pub fn grid(&self) -> Grid {
        Grid::new(self.grid_width, self.grid_height)
    }

    /// Check that all values are usable.
    pub fn validate(&self) -> Result<()> {
        if self.grid_width < 3 || self.grid_height < 3 {
            return Err(GameError::InvalidConfig(format!(
                "grid must be at least 3x3, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        let grid = self.grid();
        if !grid.contains(self.start_cell) {
            return Err(GameError::InvalidConfig(format!(
                "start cell ({}, {}) is outside the grid",
                self.start_cell.x, self.start_cell.y
            )));
        }
        if !grid.contains(self.demo_start_cell) {
            return Err(GameError::InvalidConfig(format!(
                "demo start cell ({}, {}) is outside the grid",
                self.demo_start_cell.x, self.demo_start_cell.y
            )));
        }
        if self.base_speed == 0 {
            return Err(GameError::InvalidConfig("base_speed must be positive".into()));
        }
        if self.food_per_level == 0 {
            return Err(GameError::InvalidConfig(
                "food_per_level must be positive".into(),
            ));
        }
        if self.food_weights.total() == 0 {
            return Err(GameError::InvalidConfig(
                "at least one food weight must be positive".into(),
            ));
        }
        if self.hazards.warning_ms >= self.hazards.fuse_ms {
            return Err(GameError::InvalidConfig(format!(
                "hazard warning ({} ms) must be shorter than the fuse ({} ms)",
                self.hazards.warning_ms, self.hazards.fuse_ms
            )));
        }
        if self.autopilot.decision_interval_ms == 0 {
            return Err(GameError::InvalidConfig(
                "autopilot decision interval must be positive".into(),
            ));
        }
        if self.autopilot.space_factor < Fixed::ZERO {
            return Err(GameError::InvalidConfig(
                "autopilot space factor must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Level reached after eating `food_eaten` items. Starts at 1.
    #[must_use]
    pub fn level_for(&self, food_eaten: u32) -> u32 {
        food_eaten / self.food_per_level + 1
    }

    /// Tick interval at `level`.
    ///
    /// `1000 / (base_speed + (level - 1) * speed_per_level)`, never below
    /// `min_tick_interval_ms`. Non-increasing in `level`.
    #[must_use]
    pub fn tick_interval_ms(&self, level: u32) -> u64 {
        let ticks_per_second = u64::from(self.base_speed)
            + u64::from(level.saturating_sub(1)) * u64::from(self.speed_per_level);
        (1000 / ticks_per_second.max(1)).max(self.min_tick_interval_ms.max(1))
    }
}
