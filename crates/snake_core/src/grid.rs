//! Toroidal grid model.
//!
//! The board wraps on both axes: a coordinate that leaves `[0, N)` re-enters
//! from the opposite edge. This is the wall policy of the game, so nothing
//! ever dies by hitting an edge and every positional helper here works
//! modulo the grid dimensions.

use serde::{Deserialize, Serialize};

/// A board cell in grid coordinates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Cell {
    /// Column, in `[0, width)`.
    pub x: u32,
    /// Row, in `[0, height)`, growing downwards.
    pub y: u32,
}

impl Cell {
    /// Create a cell from raw coordinates.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

impl From<(u32, u32)> for Cell {
    fn from((x, y): (u32, u32)) -> Self {
        Self::new(x, y)
    }
}

/// One of the four unit movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `(1, 0)`
    Right,
    /// `(0, 1)`
    Down,
    /// `(-1, 0)`
    Left,
    /// `(0, -1)`
    Up,
}

impl Direction {
    /// All directions in canonical enumeration order.
    ///
    /// This order doubles as the deterministic tie-break wherever
    /// directions are ranked.
    pub const ALL: [Self; 4] = [Self::Right, Self::Down, Self::Left, Self::Up];

    /// Unit offset `(dx, dy)` for this direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Up => (0, -1),
        }
    }

    /// The opposite direction.
    #[must_use]
    pub const fn reverse(self) -> Self {
        match self {
            Self::Right => Self::Left,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Up => Self::Down,
        }
    }

    /// Returns true if `other` points exactly the opposite way.
    #[must_use]
    pub fn is_reverse_of(self, other: Self) -> bool {
        self.reverse() == other
    }

    /// Look up a direction from a unit offset.
    #[must_use]
    pub fn from_offset(dx: i32, dy: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.offset() == (dx, dy))
    }
}

/// What a cell currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occupant {
    /// Nothing.
    Empty,
    /// A snake segment.
    Snake,
    /// The active food item.
    Food,
    /// A hazard (bomb) cell.
    Hazard,
}

/// Dimensions of the toroidal board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Grid {
    /// Width in cells.
    width: u32,
    /// Height in cells.
    height: u32,
}

impl Grid {
    /// Create a grid.
    ///
    /// # Panics
    ///
    /// Panics if `width` or `height` is zero.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0, "Grid width must be positive");
        assert!(height > 0, "Grid height must be positive");
        Self { width, height }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells.
    #[must_use]
    pub const fn area(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Check if a cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.x < self.width && cell.y < self.height
    }

    /// Wrap an arbitrary column into `[0, width)`.
    #[must_use]
    pub fn wrap_x(&self, x: i64) -> u32 {
        x.rem_euclid(i64::from(self.width)) as u32
    }

    /// Wrap an arbitrary row into `[0, height)`.
    #[must_use]
    pub fn wrap_y(&self, y: i64) -> u32 {
        y.rem_euclid(i64::from(self.height)) as u32
    }

    /// Wrap arbitrary signed coordinates onto the torus.
    #[must_use]
    pub fn wrap(&self, x: i64, y: i64) -> Cell {
        Cell::new(self.wrap_x(x), self.wrap_y(y))
    }

    /// Offset a cell by `(dx, dy)` with wraparound.
    #[must_use]
    pub fn offset(&self, cell: Cell, dx: i32, dy: i32) -> Cell {
        self.wrap(
            i64::from(cell.x) + i64::from(dx),
            i64::from(cell.y) + i64::from(dy),
        )
    }

    /// The neighbouring cell one step in `direction`.
    #[must_use]
    pub fn step(&self, cell: Cell, direction: Direction) -> Cell {
        let (dx, dy) = direction.offset();
        self.offset(cell, dx, dy)
    }

    /// The four orthogonal neighbours, in [`Direction::ALL`] order.
    #[must_use]
    pub fn neighbors(&self, cell: Cell) -> [Cell; 4] {
        Direction::ALL.map(|d| self.step(cell, d))
    }

    /// Manhattan distance accounting for wraparound on both axes.
    #[must_use]
    pub fn distance(&self, a: Cell, b: Cell) -> u32 {
        let dx = a.x.abs_diff(b.x);
        let dy = a.y.abs_diff(b.y);
        dx.min(self.width - dx) + dy.min(self.height - dy)
    }

    /// Row-major index of a cell.
    #[inline]
    #[must_use]
    pub fn index(&self, cell: Cell) -> usize {
        (cell.y as usize) * (self.width as usize) + (cell.x as usize)
    }

    /// Cell at a row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> Cell {
        let width = self.width as usize;
        Cell::new((index % width) as u32, (index / width) as u32)
    }

    /// Iterate every cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.area()).map(|i| self.cell_at(i))
    }
}

impl Default for Grid {
    /// The classic 20x20 board.
    fn default() -> Self {
        Self::new(20, 20)
    }
}

/// Dense per-cell flag set, used for occupancy and flood-fill bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMask {
    grid: Grid,
    bits: Vec<bool>,
}

impl CellMask {
    /// Create an all-clear mask for `grid`.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            bits: vec![false; grid.area()],
        }
    }

    /// Set a cell.
    pub fn insert(&mut self, cell: Cell) {
        let index = self.grid.index(cell);
        self.bits[index] = true;
    }

    /// Check a cell.
    #[must_use]
    pub fn contains(&self, cell: Cell) -> bool {
        self.bits[self.grid.index(cell)]
    }

    /// Number of set cells.
    #[must_use]
    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}
