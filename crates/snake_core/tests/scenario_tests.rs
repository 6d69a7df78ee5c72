//! End-to-end game scenarios.

use snake_core::autopilot;
use snake_core::config::GameConfig;
use snake_core::food::FoodKind;
use snake_core::game::{ControlMode, DemoEnd, GameEvent};
use snake_core::grid::{Cell, Direction, Grid};
use snake_core::hazards::HazardState;
use snake_core::move_queue::MoveQueue;
use snake_core::scores::{Leaderboard, ScoreService, ScoreSubmission, DEFAULT_TOP_N};
use snake_core::simulation::{GameOverCause, GamePhase};
use snake_test_utils::fixtures::{cells, fixed, straight_snake, BoardBuilder};

// =============================================================================
// Movement and consumption
// =============================================================================

#[test]
fn eating_standard_food_grows_and_scores() {
    let mut session = BoardBuilder::classic()
        .snake(&[(10, 10)])
        .moving(Direction::Right)
        .food(11, 10)
        .session();

    let events = session.tick();

    assert_eq!(events.ate, Some(FoodKind::Standard));
    assert_eq!(
        session.snake().cells().copied().collect::<Vec<_>>(),
        cells(&[(11, 10), (10, 10)])
    );
    assert_eq!(session.score(), 10);
    assert_eq!(session.food_eaten(), 1);
    let food = session.food().expect("new food placed");
    assert_ne!(food.cell, Cell::new(11, 10));
    assert!(!session.snake().occupies(food.cell));
}

#[test]
fn moving_off_the_right_edge_wraps() {
    let mut session = BoardBuilder::classic()
        .snake(&[(19, 10), (18, 10)])
        .moving(Direction::Right)
        .food(5, 5)
        .session();

    session.tick();

    assert_eq!(session.snake().head(), Cell::new(0, 10));
    assert_eq!(session.phase(), GamePhase::Running);
}

#[test]
fn every_step_stays_on_the_torus() {
    let grid = Grid::new(7, 4);
    for cell in grid.cells() {
        for direction in Direction::ALL {
            let next = grid.step(cell, direction);
            assert!(grid.contains(next));
            assert_eq!(grid.distance(cell, next), 1);
            assert_eq!(grid.step(next, direction.reverse()), cell);
        }
    }
    assert_eq!(grid.step(Cell::new(0, 2), Direction::Left), Cell::new(6, 2));
    assert_eq!(grid.step(Cell::new(3, 3), Direction::Down), Cell::new(3, 0));
}

#[test]
fn hitting_the_body_ends_the_game_on_the_next_tick() {
    // Head turns up into the third segment.
    let mut session = BoardBuilder::classic()
        .snake(&[(5, 6), (6, 6), (6, 5), (5, 5), (4, 5)])
        .moving(Direction::Left)
        .food(15, 15)
        .session();

    assert!(session.propose(Direction::Up).accepted);
    let events = session.tick();

    assert_eq!(events.game_over, Some(GameOverCause::SelfCollision));
    assert_eq!(session.phase(), GamePhase::Over);
}

#[test]
fn queued_repeat_of_pending_turn_is_rejected() {
    let mut queue = MoveQueue::new();
    assert!(queue.propose(Direction::Up, None));

    assert!(!queue.propose(Direction::Up, Some(Direction::Down)));
    assert_eq!(queue.len(), 1);
}

// =============================================================================
// Hazards
// =============================================================================

#[test]
fn detonation_next_to_the_snake_ends_the_game() {
    let mut session = BoardBuilder::with_config(GameConfig::default())
        .snake(&[(5, 4)])
        .moving(Direction::Right)
        .food(15, 15)
        .hazard(5, 5, HazardState::Warning)
        .session();
    let id = session.hazards().iter().next().map(|h| h.id).expect("hazard");

    assert_eq!(session.detonate_hazard(id), Some(true));
    assert_eq!(session.phase(), GamePhase::Over);
}

#[test]
fn detonation_footprint_excludes_diagonals() {
    let mut session = BoardBuilder::with_config(GameConfig::default())
        .snake(&[(6, 7)])
        .moving(Direction::Up)
        .food(15, 15)
        .hazard(5, 5, HazardState::Detonated)
        .session();

    // (6, 6) is diagonal to the blast centre.
    let events = session.tick();
    assert_eq!(events.head, Some(Cell::new(6, 6)));
    assert_eq!(session.phase(), GamePhase::Running);

    // (6, 5) is the right arm.
    let events = session.tick();
    assert!(matches!(events.game_over, Some(GameOverCause::Hazard(_))));
}

#[test]
fn hazard_waves_start_at_level_three() {
    let mut config = GameConfig::default();
    config.food_per_level = 1;
    let mut session = BoardBuilder::with_config(config)
        .snake(&[(5, 5)])
        .moving(Direction::Right)
        .food(6, 5)
        .food_eaten(1)
        .session();
    assert_eq!(session.level(), 2);

    let events = session.tick();
    let wave = events.hazard_wave.expect("wave at level 3");
    assert_eq!(wave.count, 1);
    assert_eq!(session.spawn_hazard_wave(0).len(), 1);
    assert_eq!(session.hazards().len(), 1);
}

// =============================================================================
// Autopilot
// =============================================================================

/// Head at (2, 2) heading right. The food sits in a one-cell pocket at
/// (3, 2) walled in by the body; up leads to the open board.
fn pocket_board(config: GameConfig) -> snake_core::simulation::GameSession {
    BoardBuilder::with_config(config)
        .snake(&[
            (2, 2),
            (1, 2),
            (1, 3),
            (1, 4),
            (2, 4),
            (3, 4),
            (3, 3),
            (4, 3),
            (4, 2),
            (4, 1),
            (3, 1),
        ])
        .moving(Direction::Right)
        .food(3, 2)
        .session()
}

#[test]
fn autopilot_prefers_open_space_over_nearer_food() {
    let session = pocket_board(GameConfig::default());

    let moves = autopilot::assess_moves(&session);
    assert_eq!(moves[0].direction, Direction::Right);
    assert_eq!(moves[0].distance, 0);
    assert!(!moves[0].super_safe);

    assert_eq!(autopilot::choose_direction(&session), Direction::Up);
}

#[test]
fn autopilot_falls_back_to_nearest_without_safe_moves() {
    let mut config = GameConfig::default();
    config.autopilot.space_factor = fixed(1_000);
    let session = pocket_board(config);

    assert_eq!(autopilot::choose_direction(&session), Direction::Right);
}

#[test]
fn autopilot_walks_around_a_long_body() {
    let config = GameConfig::default();
    let grid = config.grid();
    let mut session = BoardBuilder::with_config(config)
        .snake_cells(straight_snake(grid, Cell::new(10, 10), Direction::Right, 8))
        .moving(Direction::Right)
        .food(3, 12)
        .session();

    for _ in 0..40 {
        if session.phase() != GamePhase::Running || session.food_eaten() > 0 {
            break;
        }
        let direction = autopilot::choose_direction(&session);
        session.override_move(direction);
        session.tick();
    }
    assert_eq!(session.phase(), GamePhase::Running);
    assert!(session.food_eaten() >= 1);
}

// =============================================================================
// Controller flows
// =============================================================================

#[test]
fn manual_game_over_feeds_the_leaderboard() {
    let config = GameConfig::classic();
    let grid = config.grid();
    let mut game = BoardBuilder::with_config(config)
        .snake_cells(straight_snake(grid, Cell::new(10, 10), Direction::Right, 5))
        .moving(Direction::Right)
        .food(0, 0)
        .game();

    game.propose(Direction::Down);
    game.propose(Direction::Left);
    game.advance(284);
    game.propose(Direction::Up);
    let events = game.advance(426);

    let final_score = events
        .iter()
        .find_map(|e| match e {
            GameEvent::GameOver { final_score, .. } => Some(*final_score),
            _ => None,
        })
        .expect("game over event");
    assert_eq!(final_score.level, 1);
    assert_eq!(game.pending_timers(), 0);

    let mut board = Leaderboard::new();
    let entry = board
        .submit(ScoreSubmission::from_final("  tester  ", final_score))
        .unwrap();
    assert_eq!(entry.nickname, "tester");
    assert_eq!(board.top(DEFAULT_TOP_N).len(), 1);
}

#[test]
fn demo_stops_when_level_passes_cap() {
    let mut config = GameConfig::default();
    config.food_per_level = 1;
    config.autopilot.max_level = Some(1);
    let mut game = snake_core::game::Game::new(config, 21);
    game.start_demo();

    let events = game.advance(60_000);

    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::DemoFinished {
            reason: DemoEnd::LevelCap,
            ..
        }
    )));
    assert_eq!(game.mode(), ControlMode::Manual);
    assert_eq!(game.session().phase(), GamePhase::Idle);
    assert_eq!(game.pending_timers(), 0);
}

#[test]
fn reset_leaves_no_stale_timers() {
    let mut game = snake_core::game::Game::new(GameConfig::default(), 4);
    game.start_demo();
    game.advance(3_000);
    game.reset();

    assert_eq!(game.pending_timers(), 0);
    let before = game.session().state_hash();
    game.advance(60_000);
    assert_eq!(game.session().state_hash(), before);
}
