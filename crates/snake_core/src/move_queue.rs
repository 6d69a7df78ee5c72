//! Buffered directional input.
//!
//! Key presses arrive whenever the player hits them; the snake only turns
//! once per tick. The queue holds at most two pending turns so a quick
//! "up, left" double press survives until the next two ticks, and it
//! refuses any turn that would reverse the snake into its own neck.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::grid::Direction;

/// Maximum number of pending turns.
pub const MOVE_QUEUE_CAPACITY: usize = 2;

/// FIFO of pending directions, each legal relative to its predecessor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveQueue {
    pending: VecDeque<Direction>,
}

impl MoveQueue {
    /// Create an empty move queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: VecDeque::with_capacity(MOVE_QUEUE_CAPACITY),
        }
    }

    /// Offer a direction.
    ///
    /// `current` is the direction the snake is moving right now (`None`
    /// before the first move). The proposal is checked against the newest
    /// pending entry, or against `current` when nothing is pending. A
    /// repeat of the newest pending entry is dropped too, so key repeat
    /// cannot fill the queue. Returns `true` if the direction was queued;
    /// rejections are silent no-ops.
    pub fn propose(&mut self, direction: Direction, current: Option<Direction>) -> bool {
        if self.pending.len() >= MOVE_QUEUE_CAPACITY {
            return false;
        }

        let last = self.pending.back().copied();
        if last == Some(direction) {
            return false;
        }

        let predecessor = last.or(current);
        if predecessor.is_some_and(|p| direction.is_reverse_of(p)) {
            return false;
        }

        self.pending.push_back(direction);
        true
    }

    /// Remove and return the oldest pending direction.
    pub fn drain(&mut self) -> Option<Direction> {
        self.pending.pop_front()
    }

    /// Newest pending direction, if any.
    #[must_use]
    pub fn last_pending(&self) -> Option<Direction> {
        self.pending.back().copied()
    }

    /// Drop all pending directions.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Check if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of pending directions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Iterate pending directions oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Direction> + '_ {
        self.pending.iter()
    }
}
