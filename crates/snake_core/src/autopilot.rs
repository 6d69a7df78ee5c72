//! Demo-mode autopilot.
//!
//! A greedy controller: head for the food along the shortest wraparound
//! distance, but prefer any move that keeps a comfortable amount of open
//! space reachable. Each decision is a pure function of the session, so
//! demos replay exactly.
//!
//! Decision procedure:
//!
//! 1. Try all four directions except the reverse of the current one.
//! 2. Drop moves whose new head hits the body (the tail counts as free
//!    when it is about to move away) or any hazard footprint.
//! 3. Rank the survivors by wraparound distance to the food. Ties keep
//!    the order of [`Direction::ALL`].
//! 4. Take the first survivor whose reachable space exceeds
//!    `space_factor * snake length`, else the first survivor, else keep
//!    going straight.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::grid::{Cell, CellMask, Direction, Grid};
use crate::math::Fixed;
use crate::simulation::GameSession;

/// Evaluation of one non-lethal candidate move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAssessment {
    /// Direction evaluated.
    pub direction: Direction,
    /// Head cell after the move.
    pub head: Cell,
    /// Wraparound distance from `head` to the food (0 without food).
    pub distance: u32,
    /// Cells reachable from `head`, `head` included.
    pub space: usize,
    /// Whether `space` clears the safety threshold.
    pub super_safe: bool,
}

/// Count cells reachable from `start` without entering `blocked` cells.
///
/// `start` itself is always counted.
#[must_use]
pub fn reachable_space(grid: Grid, start: Cell, blocked: &CellMask) -> usize {
    let mut visited = CellMask::new(grid);
    let mut frontier = VecDeque::new();
    visited.insert(start);
    frontier.push_back(start);

    while let Some(cell) = frontier.pop_front() {
        for next in grid.neighbors(cell) {
            if blocked.contains(next) || visited.contains(next) {
                continue;
            }
            visited.insert(next);
            frontier.push_back(next);
        }
    }

    visited.count()
}

/// Cells the autopilot refuses to walk through: the body and every hazard
/// footprint, whatever the hazard's state.
fn obstacle_mask(session: &GameSession) -> CellMask {
    let grid = session.grid();
    let mut mask = CellMask::new(grid);
    for &cell in session.snake().cells() {
        mask.insert(cell);
    }
    for hazard in session.hazards().iter() {
        for cell in hazard.footprint(grid) {
            mask.insert(cell);
        }
    }
    mask
}

/// Evaluate every legal, non-lethal move, nearest to the food first.
#[must_use]
pub fn assess_moves(session: &GameSession) -> Vec<MoveAssessment> {
    let grid = session.grid();
    let snake = session.snake();
    let food = session.food();
    let current = session.direction();
    let hazards = session.hazards();
    let blocked = obstacle_mask(session);

    let len = Fixed::from_num(snake.len());
    let threshold = session.config().autopilot.space_factor * len;

    let mut moves: Vec<MoveAssessment> = Direction::ALL
        .into_iter()
        .filter(|&d| !current.is_some_and(|c| d.is_reverse_of(c)))
        .filter_map(|direction| {
            let head = grid.step(snake.head(), direction);
            let eats = food.is_some_and(|f| f.cell == head);
            if snake.would_collide(head, eats) || hazards.threatens(grid, head) {
                return None;
            }
            let distance = food.map_or(0, |f| grid.distance(head, f.cell));
            let space = reachable_space(grid, head, &blocked);
            Some(MoveAssessment {
                direction,
                head,
                distance,
                space,
                super_safe: Fixed::from_num(space) > threshold,
            })
        })
        .collect();

    // Stable sort keeps Direction::ALL order between equal distances.
    moves.sort_by_key(|m| m.distance);
    moves
}

/// Pick the next direction. Always returns something.
#[must_use]
pub fn choose_direction(session: &GameSession) -> Direction {
    let moves = assess_moves(session);
    let choice = moves
        .iter()
        .find(|m| m.super_safe)
        .or_else(|| moves.first())
        .map(|m| m.direction);

    match choice {
        Some(direction) => direction,
        None => {
            tracing::debug!("Autopilot boxed in, keeping course");
            session.direction().unwrap_or(Direction::Right)
        }
    }
}
