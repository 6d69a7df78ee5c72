//! Food categories and placement.

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Grid};
use crate::rng::SessionRng;

/// Category of a food item. Each has fixed points and growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    /// 10 points, grows by one.
    Standard,
    /// 20 points, grows by two.
    DoubleGrowth,
    /// 50 points, grows by one.
    Bonus,
}

impl FoodKind {
    /// Points awarded on consumption.
    #[must_use]
    pub const fn points(self) -> u32 {
        match self {
            Self::Standard => 10,
            Self::DoubleGrowth => 20,
            Self::Bonus => 50,
        }
    }

    /// Net number of segments gained on consumption. Always at least 1.
    #[must_use]
    pub const fn growth(self) -> u32 {
        match self {
            Self::Standard => 1,
            Self::DoubleGrowth => 2,
            Self::Bonus => 1,
        }
    }
}

/// The single active food item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Food {
    /// Where it sits.
    pub cell: Cell,
    /// What it is worth.
    pub kind: FoodKind,
}

impl Food {
    /// Create a food item.
    #[must_use]
    pub const fn new(cell: Cell, kind: FoodKind) -> Self {
        Self { cell, kind }
    }

    /// A standard food item at `cell`.
    #[must_use]
    pub const fn standard(cell: Cell) -> Self {
        Self::new(cell, FoodKind::Standard)
    }
}

/// Relative odds of each food category on respawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FoodWeights {
    /// Weight of [`FoodKind::Standard`].
    pub standard: u32,
    /// Weight of [`FoodKind::DoubleGrowth`].
    pub double_growth: u32,
    /// Weight of [`FoodKind::Bonus`].
    pub bonus: u32,
}

impl Default for FoodWeights {
    fn default() -> Self {
        Self {
            standard: 8,
            double_growth: 1,
            bonus: 1,
        }
    }
}

impl FoodWeights {
    /// Only standard food, as in the classic game.
    #[must_use]
    pub const fn classic() -> Self {
        Self {
            standard: 1,
            double_growth: 0,
            bonus: 0,
        }
    }

    /// Sum of all weights.
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.standard + self.double_growth + self.bonus
    }

    /// Draw a category. Falls back to standard if every weight is zero.
    pub fn choose(&self, rng: &mut SessionRng) -> FoodKind {
        let total = self.total();
        if total == 0 {
            return FoodKind::Standard;
        }
        let roll = rng.next_below(total);
        if roll < self.standard {
            FoodKind::Standard
        } else if roll < self.standard + self.double_growth {
            FoodKind::DoubleGrowth
        } else {
            FoodKind::Bonus
        }
    }
}

/// Pick a free cell with bounded random retries, then a deterministic scan.
///
/// Random draws stay `margin` cells away from the edges when the grid is
/// wide enough. After `attempts` misses the grid is scanned row-major,
/// first inside the margin and then everywhere. Returns `None` only when
/// no free cell exists at all.
pub fn find_free_cell(
    grid: Grid,
    margin: u32,
    attempts: u32,
    rng: &mut SessionRng,
    is_blocked: impl Fn(Cell) -> bool,
) -> Option<Cell> {
    let (x_range, y_range) = margin_ranges(grid, margin);

    for _ in 0..attempts {
        let cell = Cell::new(
            rng.next_range(x_range.0, x_range.1),
            rng.next_range(y_range.0, y_range.1),
        );
        if !is_blocked(cell) {
            return Some(cell);
        }
    }

    let inside_margin = (y_range.0..y_range.1)
        .flat_map(|y| (x_range.0..x_range.1).map(move |x| Cell::new(x, y)))
        .find(|&c| !is_blocked(c));

    let fallback = inside_margin.or_else(|| grid.cells().find(|&c| !is_blocked(c)));
    if let Some(cell) = fallback {
        tracing::warn!(x = cell.x, y = cell.y, "Random placement exhausted, used scan fallback");
    }
    fallback
}

/// Half-open column and row ranges honouring `margin` where possible.
fn margin_ranges(grid: Grid, margin: u32) -> ((u32, u32), (u32, u32)) {
    let axis = |len: u32| {
        if len > margin * 2 {
            (margin, len - margin)
        } else {
            (0, len)
        }
    };
    (axis(grid.width()), axis(grid.height()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_effects() {
        assert_eq!(FoodKind::Standard.points(), 10);
        assert_eq!(FoodKind::Standard.growth(), 1);
        assert_eq!(FoodKind::DoubleGrowth.growth(), 2);
        assert_eq!(FoodKind::Bonus.points(), 50);
    }

    #[test]
    fn test_classic_weights_only_standard() {
        let mut rng = SessionRng::new(3);
        let weights = FoodWeights::classic();
        for _ in 0..200 {
            assert_eq!(weights.choose(&mut rng), FoodKind::Standard);
        }
    }

    #[test]
    fn test_zero_weights_fall_back_to_standard() {
        let mut rng = SessionRng::new(3);
        let weights = FoodWeights {
            standard: 0,
            double_growth: 0,
            bonus: 0,
        };
        assert_eq!(weights.choose(&mut rng), FoodKind::Standard);
    }

    #[test]
    fn test_every_kind_reachable() {
        let mut rng = SessionRng::new(11);
        let weights = FoodWeights {
            standard: 1,
            double_growth: 1,
            bonus: 1,
        };
        let kinds: Vec<FoodKind> = (0..300).map(|_| weights.choose(&mut rng)).collect();
        assert!(kinds.contains(&FoodKind::Standard));
        assert!(kinds.contains(&FoodKind::DoubleGrowth));
        assert!(kinds.contains(&FoodKind::Bonus));
    }

    #[test]
    fn test_random_cells_respect_margin() {
        let grid = Grid::new(20, 20);
        let mut rng = SessionRng::new(5);
        for _ in 0..200 {
            let cell = find_free_cell(grid, 1, 100, &mut rng, |_| false).unwrap();
            assert!((1..19).contains(&cell.x));
            assert!((1..19).contains(&cell.y));
        }
    }

    #[test]
    fn test_fallback_finds_last_free_cell() {
        let grid = Grid::new(5, 5);
        let free = Cell::new(0, 4);
        let mut rng = SessionRng::new(5);
        let cell = find_free_cell(grid, 1, 10, &mut rng, |c| c != free);
        assert_eq!(cell, Some(free));
    }

    #[test]
    fn test_full_board_gives_none() {
        let grid = Grid::new(3, 3);
        let mut rng = SessionRng::new(5);
        assert_eq!(find_free_cell(grid, 0, 10, &mut rng, |_| true), None);
    }
}
