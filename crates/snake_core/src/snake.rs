//! The snake body.
//!
//! Head at index 0, tail at the end. Growth is modelled by duplicating the
//! tail cell; the duplicate is the only time two segments may share a cell,
//! and it disappears again as the tail catches up.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::grid::Cell;

/// Ordered body cells of the snake. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Snake {
    body: VecDeque<Cell>,
}

impl Snake {
    /// A single-segment snake.
    #[must_use]
    pub fn new(head: Cell) -> Self {
        Self {
            body: VecDeque::from([head]),
        }
    }

    /// Build a snake from cells ordered head first.
    ///
    /// Returns `None` if `cells` is empty.
    #[must_use]
    pub fn from_cells(cells: impl IntoIterator<Item = Cell>) -> Option<Self> {
        let body: VecDeque<Cell> = cells.into_iter().collect();
        if body.is_empty() {
            None
        } else {
            Some(Self { body })
        }
    }

    /// The head cell.
    #[must_use]
    pub fn head(&self) -> Cell {
        self.body[0]
    }

    /// The tail cell.
    #[must_use]
    pub fn tail(&self) -> Cell {
        self.body[self.body.len() - 1]
    }

    /// Number of segments, including growth duplicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Always false; a snake has at least its head.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Iterate cells head first.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.body.iter()
    }

    /// Check whether any segment sits on `cell`.
    #[must_use]
    pub fn occupies(&self, cell: Cell) -> bool {
        self.body.contains(&cell)
    }

    /// Check whether moving the head onto `target` hits the body.
    ///
    /// When the tail is about to vacate (`grows == false`) the last segment
    /// is not an obstacle. A duplicated tail still counts because its copy
    /// stays behind.
    #[must_use]
    pub fn would_collide(&self, target: Cell, grows: bool) -> bool {
        let considered = if grows {
            self.body.len()
        } else {
            self.body.len() - 1
        };
        self.body.iter().take(considered).any(|&c| c == target)
    }

    /// Prepend a new head.
    pub fn push_head(&mut self, cell: Cell) {
        self.body.push_front(cell);
    }

    /// Drop the tail segment. The head is never removed.
    pub fn pop_tail(&mut self) -> Option<Cell> {
        if self.body.len() > 1 {
            self.body.pop_back()
        } else {
            None
        }
    }

    /// Duplicate the tail cell so the body grows by one on the next move.
    pub fn extend_tail(&mut self) {
        let tail = self.tail();
        self.body.push_back(tail);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snake(cells: &[(u32, u32)]) -> Snake {
        Snake::from_cells(cells.iter().map(|&c| Cell::from(c))).unwrap()
    }

    #[test]
    fn test_from_cells_rejects_empty() {
        assert!(Snake::from_cells(Vec::new()).is_none());
    }

    #[test]
    fn test_head_and_tail() {
        let s = snake(&[(3, 3), (2, 3), (1, 3)]);
        assert_eq!(s.head(), Cell::new(3, 3));
        assert_eq!(s.tail(), Cell::new(1, 3));
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_tail_is_not_obstacle_when_vacating() {
        let s = snake(&[(1, 0), (1, 1), (0, 1), (0, 0)]);
        assert!(!s.would_collide(Cell::new(0, 0), false));
        assert!(s.would_collide(Cell::new(0, 0), true));
        assert!(s.would_collide(Cell::new(0, 1), false));
    }

    #[test]
    fn test_duplicated_tail_still_blocks() {
        let mut s = snake(&[(1, 0), (0, 0)]);
        s.extend_tail();
        assert_eq!(s.len(), 3);
        assert!(s.would_collide(Cell::new(0, 0), false));
    }

    #[test]
    fn test_pop_tail_keeps_head() {
        let mut s = Snake::new(Cell::new(4, 4));
        assert_eq!(s.pop_tail(), None);
        assert_eq!(s.len(), 1);
        s.push_head(Cell::new(5, 4));
        assert_eq!(s.pop_tail(), Some(Cell::new(4, 4)));
        assert_eq!(s.head(), Cell::new(5, 4));
    }
}
