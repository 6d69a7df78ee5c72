//! ASCII rendering of board snapshots.
//!
//! Stands in for the graphical renderer: the `demo` command prints these
//! frames, and the `render` protocol command returns one.
//!
//! ```text
//! +----------+
//! |..........|
//! |...@oo....|
//! |.......*..|
//! +----------+
//! score 10  level 1  eaten 1  running
//! ```

use snake_core::food::FoodKind;
use snake_core::grid::Grid;
use snake_core::hazards::HazardState;
use snake_core::simulation::{GamePhase, Snapshot};

/// Rendering options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AsciiConfig {
    /// Draw a frame around the board. The board wraps; the frame is cosmetic.
    pub border: bool,
    /// Append a status line with score, level and phase.
    pub status_line: bool,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            border: true,
            status_line: true,
        }
    }
}

const EMPTY: char = '.';
const HEAD: char = '@';
const BODY: char = 'o';
const BLAST: char = '#';

fn food_glyph(kind: FoodKind) -> char {
    match kind {
        FoodKind::Standard => '*',
        FoodKind::DoubleGrowth => '+',
        FoodKind::Bonus => '$',
    }
}

fn hazard_glyph(state: HazardState) -> char {
    match state {
        HazardState::Armed => 'b',
        HazardState::Warning => '!',
        HazardState::Detonated => BLAST,
    }
}

/// Render a snapshot.
///
/// Later layers win: blast arms, then food, then hazard centres, then the
/// snake body, then the head.
#[must_use]
pub fn render_ascii(snapshot: &Snapshot, config: &AsciiConfig) -> String {
    let grid = Grid::new(snapshot.width, snapshot.height);
    let width = snapshot.width as usize;
    let mut cells = vec![EMPTY; grid.area()];

    for hazard in snapshot.hazards.iter().filter(|h| h.is_lethal()) {
        for cell in hazard.footprint(grid) {
            cells[grid.index(cell)] = BLAST;
        }
    }
    if let Some(food) = snapshot.food {
        cells[grid.index(food.cell)] = food_glyph(food.kind);
    }
    for hazard in &snapshot.hazards {
        cells[grid.index(hazard.cell)] = hazard_glyph(hazard.state);
    }
    for cell in snapshot.snake.iter().skip(1) {
        cells[grid.index(*cell)] = BODY;
    }
    if let Some(head) = snapshot.snake.first() {
        cells[grid.index(*head)] = HEAD;
    }

    let mut out = String::with_capacity((width + 3) * (snapshot.height as usize + 3));
    let rule = format!("+{}+\n", "-".repeat(width));
    if config.border {
        out.push_str(&rule);
    }
    for row in cells.chunks(width.max(1)) {
        if config.border {
            out.push('|');
        }
        out.extend(row.iter());
        if config.border {
            out.push('|');
        }
        out.push('\n');
    }
    if config.border {
        out.push_str(&rule);
    }
    if config.status_line {
        let phase = match snapshot.phase {
            GamePhase::Idle => "idle",
            GamePhase::Running => "running",
            GamePhase::Over => "game over",
        };
        out.push_str(&format!(
            "score {}  level {}  eaten {}  {}\n",
            snapshot.score, snapshot.level, snapshot.food_eaten, phase
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use snake_core::food::Food;
    use snake_core::grid::Cell;
    use snake_core::hazards::{Hazard, HazardId};

    fn snapshot() -> Snapshot {
        Snapshot {
            width: 5,
            height: 3,
            snake: vec![Cell::new(1, 1), Cell::new(0, 1)],
            food: Some(Food::standard(Cell::new(4, 0))),
            hazards: Vec::new(),
            phase: GamePhase::Running,
            game_over: false,
            score: 0,
            level: 1,
            food_eaten: 0,
            tick: 0,
        }
    }

    #[test]
    fn test_plain_board() {
        let config = AsciiConfig {
            border: false,
            status_line: false,
        };
        let text = render_ascii(&snapshot(), &config);
        assert_eq!(text, "....*\no@...\n.....\n");
    }

    #[test]
    fn test_border_and_status() {
        let text = render_ascii(&snapshot(), &AsciiConfig::default());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "+-----+");
        assert_eq!(lines[2], "|o@...|");
        assert_eq!(lines[5], "score 0  level 1  eaten 0  running");
    }

    #[test]
    fn test_detonation_draws_plus_that_wraps() {
        let mut snap = snapshot();
        snap.snake = vec![Cell::new(2, 2)];
        snap.food = None;
        snap.hazards.push(Hazard {
            id: HazardId(1),
            cell: Cell::new(0, 0),
            state: HazardState::Detonated,
            created_at_ms: 0,
        });
        let config = AsciiConfig {
            border: false,
            status_line: false,
        };
        let text = render_ascii(&snap, &config);
        assert_eq!(text, "##..#\n#....\n#.@..\n");
    }
}
