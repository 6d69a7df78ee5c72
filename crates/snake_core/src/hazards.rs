//! Timed hazards (bombs).
//!
//! A hazard is placed **armed**, turns to **warning** shortly before its
//! fuse runs out, **detonates** with a plus-shaped lethal footprint and is
//! removed after a short cleanup delay. Transitions are driven by the
//! scheduler's clock, not by simulation ticks, so detonation can land
//! between two ticks and must be judged against the snake as it is at
//! that instant.

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, Grid};
use crate::rng::SessionRng;

/// Stable identifier of a hazard within a session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct HazardId(pub u32);

/// Lifecycle of a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardState {
    /// Placed, countdown running.
    Armed,
    /// Final stretch of the fuse.
    Warning,
    /// Exploded; the footprint is lethal until cleanup.
    Detonated,
}

/// Hazard spawn policy and lifecycle timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HazardConfig {
    /// First level at which level-ups spawn hazards.
    pub min_level: u32,
    /// A wave at level `L` places `L - level_offset` hazards.
    pub level_offset: u32,
    /// Time from placement to detonation.
    pub fuse_ms: u64,
    /// Length of the warning window at the end of the fuse.
    pub warning_ms: u64,
    /// Time a detonation stays on the board before removal.
    pub cleanup_ms: u64,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            min_level: 3,
            level_offset: 2,
            fuse_ms: 10_000,
            warning_ms: 1_000,
            cleanup_ms: 500,
        }
    }
}

impl HazardConfig {
    /// Number of hazards a level-up to `level` should spawn.
    #[must_use]
    pub fn wave_size(&self, level: u32) -> Option<u32> {
        if level < self.min_level {
            return None;
        }
        match level.saturating_sub(self.level_offset) {
            0 => None,
            n => Some(n),
        }
    }

    /// Delay from placement until the warning phase starts.
    #[must_use]
    pub const fn armed_ms(&self) -> u64 {
        self.fuse_ms.saturating_sub(self.warning_ms)
    }
}

/// A single hazard on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hazard {
    /// Identifier.
    pub id: HazardId,
    /// Centre cell.
    pub cell: Cell,
    /// Current lifecycle state.
    pub state: HazardState,
    /// Clock time (ms) the hazard was placed.
    pub created_at_ms: u64,
}

impl Hazard {
    /// The plus-shaped footprint: centre, up, right, down, left.
    #[must_use]
    pub fn footprint(&self, grid: Grid) -> [Cell; 5] {
        [
            self.cell,
            grid.offset(self.cell, 0, -1),
            grid.offset(self.cell, 1, 0),
            grid.offset(self.cell, 0, 1),
            grid.offset(self.cell, -1, 0),
        ]
    }

    /// Check if `cell` is inside the footprint.
    #[must_use]
    pub fn covers(&self, grid: Grid, cell: Cell) -> bool {
        self.footprint(grid).contains(&cell)
    }

    /// Only a detonated hazard kills.
    #[must_use]
    pub const fn is_lethal(&self) -> bool {
        matches!(self.state, HazardState::Detonated)
    }
}

/// All active hazards of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HazardField {
    hazards: Vec<Hazard>,
    next_id: u32,
}

impl HazardField {
    /// Create an empty field.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hazards: Vec::new(),
            next_id: 1,
        }
    }

    /// Try to place one hazard on a free cell.
    ///
    /// Makes up to `attempts` random draws; gives up (returns `None`) if
    /// none of them is free. Cells already holding a hazard are always
    /// treated as blocked.
    pub fn place(
        &mut self,
        grid: Grid,
        rng: &mut SessionRng,
        attempts: u32,
        now_ms: u64,
        is_blocked: impl Fn(Cell) -> bool,
    ) -> Option<HazardId> {
        for _ in 0..attempts {
            let cell = Cell::new(
                rng.next_below(grid.width()),
                rng.next_below(grid.height()),
            );
            if is_blocked(cell) || self.occupies(cell) {
                continue;
            }
            return Some(self.insert(cell, now_ms));
        }
        tracing::warn!(attempts, "Abandoned hazard placement, no free cell found");
        None
    }

    /// Insert an armed hazard at `cell` without checks.
    pub fn insert(&mut self, cell: Cell, now_ms: u64) -> HazardId {
        let id = HazardId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.hazards.push(Hazard {
            id,
            cell,
            state: HazardState::Armed,
            created_at_ms: now_ms,
        });
        id
    }

    /// Look up a hazard.
    #[must_use]
    pub fn get(&self, id: HazardId) -> Option<&Hazard> {
        self.hazards.iter().find(|h| h.id == id)
    }

    /// Move an armed hazard into its warning phase.
    ///
    /// Returns `false` if the hazard is gone or not armed.
    pub fn warn(&mut self, id: HazardId) -> bool {
        self.transition(id, HazardState::Armed, HazardState::Warning)
    }

    /// Detonate a hazard that is armed or warning.
    ///
    /// Returns the detonated hazard, or `None` if it is gone or already
    /// detonated.
    pub fn detonate(&mut self, id: HazardId) -> Option<Hazard> {
        let hazard = self.hazards.iter_mut().find(|h| h.id == id)?;
        if hazard.is_lethal() {
            return None;
        }
        hazard.state = HazardState::Detonated;
        Some(*hazard)
    }

    /// Remove a hazard from the field.
    pub fn remove(&mut self, id: HazardId) -> Option<Hazard> {
        let index = self.hazards.iter().position(|h| h.id == id)?;
        Some(self.hazards.remove(index))
    }

    fn transition(&mut self, id: HazardId, from: HazardState, to: HazardState) -> bool {
        match self.hazards.iter_mut().find(|h| h.id == id) {
            Some(hazard) if hazard.state == from => {
                hazard.state = to;
                true
            }
            _ => false,
        }
    }

    /// Check if a hazard sits exactly on `cell`.
    #[must_use]
    pub fn occupies(&self, cell: Cell) -> bool {
        self.hazards.iter().any(|h| h.cell == cell)
    }

    /// Check if `cell` is inside any hazard's footprint, whatever its state.
    #[must_use]
    pub fn threatens(&self, grid: Grid, cell: Cell) -> bool {
        self.hazards.iter().any(|h| h.covers(grid, cell))
    }

    /// The first detonated hazard whose footprint covers `cell`.
    #[must_use]
    pub fn lethal_at(&self, grid: Grid, cell: Cell) -> Option<HazardId> {
        self.hazards
            .iter()
            .find(|h| h.is_lethal() && h.covers(grid, cell))
            .map(|h| h.id)
    }

    /// Iterate hazards in placement order.
    pub fn iter(&self) -> impl Iterator<Item = &Hazard> + '_ {
        self.hazards.iter()
    }

    /// Number of active hazards.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hazards.len()
    }

    /// Check if there are no hazards.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty()
    }

    /// Remove every hazard. Ids keep counting up.
    pub fn clear(&mut self) {
        self.hazards.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_footprint_is_plus_shaped() {
        let grid = Grid::new(20, 20);
        let mut field = HazardField::new();
        let id = field.insert(Cell::new(5, 5), 0);
        let hazard = field.get(id).unwrap();

        let expected = [
            Cell::new(5, 5),
            Cell::new(5, 4),
            Cell::new(6, 5),
            Cell::new(5, 6),
            Cell::new(4, 5),
        ];
        assert_eq!(hazard.footprint(grid), expected);
        assert!(!hazard.covers(grid, Cell::new(6, 6)));
        assert!(!hazard.covers(grid, Cell::new(4, 4)));
        assert!(!hazard.covers(grid, Cell::new(7, 5)));
    }

    #[test]
    fn test_footprint_wraps_at_corner() {
        let grid = Grid::new(10, 10);
        let mut field = HazardField::new();
        let id = field.insert(Cell::new(0, 0), 0);
        let hazard = field.get(id).unwrap();
        assert!(hazard.covers(grid, Cell::new(0, 9)));
        assert!(hazard.covers(grid, Cell::new(9, 0)));
        assert!(!hazard.covers(grid, Cell::new(9, 9)));
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut field = HazardField::new();
        let id = field.insert(Cell::new(1, 1), 100);
        assert_eq!(field.get(id).unwrap().state, HazardState::Armed);
        assert_eq!(field.get(id).unwrap().created_at_ms, 100);

        assert!(field.warn(id));
        assert!(!field.warn(id));
        assert_eq!(field.get(id).unwrap().state, HazardState::Warning);

        assert!(field.detonate(id).is_some());
        assert!(field.detonate(id).is_none());
        assert!(field.get(id).unwrap().is_lethal());

        assert!(field.remove(id).is_some());
        assert!(field.get(id).is_none());
        assert!(field.is_empty());
    }

    #[test]
    fn test_only_detonated_is_lethal() {
        let grid = Grid::new(20, 20);
        let mut field = HazardField::new();
        let id = field.insert(Cell::new(5, 5), 0);
        assert!(field.threatens(grid, Cell::new(5, 4)));
        assert_eq!(field.lethal_at(grid, Cell::new(5, 4)), None);
        field.detonate(id);
        assert_eq!(field.lethal_at(grid, Cell::new(5, 4)), Some(id));
    }

    #[test]
    fn test_ids_are_unique_after_removal() {
        let mut field = HazardField::new();
        let a = field.insert(Cell::new(1, 1), 0);
        field.remove(a);
        let b = field.insert(Cell::new(2, 2), 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_place_avoids_blocked_and_existing() {
        let grid = Grid::new(3, 1);
        let mut field = HazardField::new();
        let mut rng = SessionRng::new(9);
        field.insert(Cell::new(0, 0), 0);

        let id = field
            .place(grid, &mut rng, 200, 0, |c| c == Cell::new(1, 0))
            .unwrap();
        assert_eq!(field.get(id).unwrap().cell, Cell::new(2, 0));

        assert!(field.place(grid, &mut rng, 50, 0, |_| false).is_none());
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn test_wave_size() {
        let config = HazardConfig::default();
        assert_eq!(config.wave_size(2), None);
        assert_eq!(config.wave_size(3), Some(1));
        assert_eq!(config.wave_size(5), Some(3));
        assert_eq!(config.armed_ms(), 9_000);
    }
}
