//! Virtual-clock timer queue.
//!
//! The game loop has several independent clocks: the tick timer, the
//! autopilot decision timer and three timers per hazard. Instead of real
//! timers the controller keeps them in a [`Scheduler`] and drains whatever
//! is due when the host advances the clock. Timers are cancellable by id,
//! and events due at the same instant fire in scheduling order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use serde::{Deserialize, Serialize};

use crate::hazards::HazardId;

/// Handle returned by [`Scheduler::schedule_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(pub u64);

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerEvent {
    /// Advance the simulation one tick.
    Tick,
    /// Let the autopilot decide its next move.
    Autopilot,
    /// Hazard enters its warning phase.
    HazardWarning(HazardId),
    /// Hazard explodes.
    HazardDetonation(HazardId),
    /// Detonated hazard leaves the board.
    HazardCleanup(HazardId),
}

/// A fired timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueEvent {
    /// Timer that fired.
    pub id: TimerId,
    /// Scheduled time in ms.
    pub due_ms: u64,
    /// Payload.
    pub event: TimerEvent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    due_ms: u64,
    id: TimerId,
    event: TimerEvent,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse so the earliest timer pops first.
        match other.due_ms.cmp(&self.due_ms) {
            // Same instant: the timer scheduled first fires first.
            Ordering::Equal => other.id.cmp(&self.id),
            ord => ord,
        }
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cancellable one-shot timers on a monotonic millisecond clock.
#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_id: u64,
    heap: BinaryHeap<Entry>,
    /// Timers that are scheduled and not cancelled or fired.
    live: HashSet<TimerId>,
}

impl Scheduler {
    /// Create an empty scheduler at time 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock time.
    #[must_use]
    pub const fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Schedule `event` at absolute time `due_ms`. Times in the past fire
    /// on the next drain.
    pub fn schedule_at(&mut self, due_ms: u64, event: TimerEvent) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Entry { due_ms, id, event });
        self.live.insert(id);
        id
    }

    /// Schedule `event` `delay_ms` after the current time.
    pub fn schedule_in(&mut self, delay_ms: u64, event: TimerEvent) -> TimerId {
        self.schedule_at(self.now_ms.saturating_add(delay_ms), event)
    }

    /// Cancel a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.live.remove(&id)
    }

    /// Cancel every pending timer.
    pub fn cancel_all(&mut self) {
        self.heap.clear();
        self.live.clear();
    }

    /// Check whether a timer is still pending.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.live.contains(&id)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.live.len()
    }

    /// Due time of the earliest pending timer.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.heap
            .iter()
            .filter(|e| self.live.contains(&e.id))
            .map(|e| e.due_ms)
            .min()
    }

    /// Pop the earliest timer due at or before `until_ms`.
    ///
    /// The clock moves forward to the popped timer's due time (never
    /// backwards). Returns `None` once nothing else is due; callers then
    /// finish with [`advance_to`](Self::advance_to).
    pub fn pop_due(&mut self, until_ms: u64) -> Option<DueEvent> {
        loop {
            let top = self.heap.peek()?;
            if top.due_ms > until_ms {
                return None;
            }
            let entry = self.heap.pop()?;
            if !self.live.remove(&entry.id) {
                // Cancelled.
                continue;
            }
            self.now_ms = self.now_ms.max(entry.due_ms);
            return Some(DueEvent {
                id: entry.id,
                due_ms: entry.due_ms,
                event: entry.event,
            });
        }
    }

    /// Move the clock forward to `now_ms`. Earlier times are ignored.
    pub fn advance_to(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
