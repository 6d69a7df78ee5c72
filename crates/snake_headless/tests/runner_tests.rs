//! Headless runner sessions end to end.

use snake_core::config::GameConfig;
use snake_core::game::GameEvent;
use snake_core::grid::Direction;
use snake_core::replay::{Replay, ReplayPlayer};
use snake_headless::protocol::{Command, Response};
use snake_headless::runner::{HeadlessConfig, HeadlessRunner};
use snake_test_utils::fixtures::scripted_game;

fn script(commands: &[Command]) -> Vec<u8> {
    let mut input = Vec::new();
    for command in commands {
        input.extend(serde_json::to_vec(command).unwrap());
        input.push(b'\n');
    }
    input
}

fn responses(output: &[u8]) -> Vec<Response> {
    std::str::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn recorded_session_verifies_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.replay");
    let runner = HeadlessRunner::with_config(HeadlessConfig {
        game: GameConfig::default(),
        seed: 99,
        record_path: Some(path.clone()),
    });

    let input = script(&[
        Command::Propose {
            direction: Direction::Up,
        },
        Command::Advance { by_ms: 700 },
        Command::Propose {
            direction: Direction::Left,
        },
        Command::Advance { by_ms: 1_300 },
        Command::StartDemo,
        Command::Advance { by_ms: 5_000 },
        Command::Quit,
    ]);
    let mut output = Vec::new();
    let recorded = runner.run_with(&input[..], &mut output).unwrap();

    let loaded = Replay::load(&path).unwrap();
    assert_eq!(loaded.input_count(), 3);
    assert_eq!(loaded.final_ms, 7_000);
    assert_eq!(loaded.final_hash, recorded.final_hash);

    let mut player = ReplayPlayer::new(loaded);
    assert!(player.verify());
}

#[test]
fn headless_session_matches_direct_play() {
    let input = script(&[
        Command::Advance { by_ms: 300 },
        Command::Propose {
            direction: Direction::Right,
        },
        Command::Advance { by_ms: 500 },
        Command::Propose {
            direction: Direction::Down,
        },
        Command::Advance { by_ms: 1_000 },
        Command::Hash,
    ]);
    let mut output = Vec::new();
    let runner = HeadlessRunner::with_config(HeadlessConfig {
        game: GameConfig::classic(),
        seed: 5,
        record_path: None,
    });
    runner.run_with(&input[..], &mut output).unwrap();

    let direct = scripted_game(
        GameConfig::classic(),
        5,
        &[(300, Direction::Right), (800, Direction::Down)],
        1_800,
    );

    let hash = responses(&output)
        .into_iter()
        .find_map(|r| match r {
            Response::StateHash { hash, .. } => Some(hash),
            _ => None,
        })
        .expect("hash response");
    assert_eq!(hash, direct.state_hash());
}

#[test]
fn every_line_is_answered_in_order() {
    let input = script(&[
        Command::Query,
        Command::StopDemo,
        Command::Leaderboard { top: 5 },
        Command::Quit,
    ]);
    let mut output = Vec::new();
    HeadlessRunner::new()
        .run_with(&input[..], &mut output)
        .unwrap();

    let out = responses(&output);
    assert_eq!(out.len(), 5);
    assert!(matches!(out[0], Response::Ready { now_ms: 0, .. }));
    assert!(matches!(out[1], Response::State { .. }));
    assert!(matches!(out[2], Response::Error { .. }));
    assert!(matches!(&out[3], Response::Leaderboard { entries } if entries.is_empty()));
    assert_eq!(out[4], Response::Bye);
}

#[test]
fn demo_runs_until_stopped() {
    let input = script(&[
        Command::StartDemo,
        Command::Advance { by_ms: 2_000 },
        Command::StopDemo,
    ]);
    let mut output = Vec::new();
    HeadlessRunner::new()
        .run_with(&input[..], &mut output)
        .unwrap();

    let events: Vec<GameEvent> = responses(&output)
        .into_iter()
        .filter_map(|r| match r {
            Response::Events { events, .. } => Some(events),
            _ => None,
        })
        .flatten()
        .collect();
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::Tick { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, GameEvent::DemoFinished { .. })));
}
