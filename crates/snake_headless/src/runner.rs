//! Headless runner implementation.
//!
//! Plays the role of both outer collaborators: JSON commands in stand for
//! the keyboard and the wall clock, JSON responses out stand for the
//! renderer.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use snake_core::config::GameConfig;
use snake_core::game::{Game, GameEvent};
use snake_core::replay::{Replay, ReplayRecorder};
use snake_core::scores::{Leaderboard, ScoreService, ScoreSubmission};
use snake_core::simulation::FinalScore;

use crate::ascii::{render_ascii, AsciiConfig};
use crate::error::{Result, RunnerError};
use crate::protocol::{Command, Response};

/// Largest clock step a single `advance` command may request: one hour.
pub const MAX_ADVANCE_MS: u64 = 3_600_000;

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Game rules.
    pub game: GameConfig,
    /// Session seed.
    pub seed: u64,
    /// Write a replay here when the session ends.
    pub record_path: Option<PathBuf>,
}

/// Headless runner driven by JSON lines.
#[derive(Debug)]
pub struct HeadlessRunner {
    recorder: ReplayRecorder,
    leaderboard: Leaderboard,
    last_final: Option<FinalScore>,
    record_path: Option<PathBuf>,
    should_quit: bool,
}

impl HeadlessRunner {
    /// Create a runner with default config.
    pub fn new() -> Self {
        Self::with_config(HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(config: HeadlessConfig) -> Self {
        Self {
            recorder: ReplayRecorder::new("headless", config.game, config.seed),
            leaderboard: Leaderboard::new(),
            last_final: None,
            record_path: config.record_path,
            should_quit: false,
        }
    }

    /// The game being driven.
    pub fn game(&self) -> &Game {
        self.recorder.game()
    }

    /// Check if a `quit` command was received.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Parse and handle one input line.
    pub fn handle_line(&mut self, line: &str) -> Vec<Response> {
        match Command::from_json(line) {
            Ok(command) => self.handle(command),
            Err(e) => {
                tracing::warn!("Invalid command: {e}");
                vec![Response::error(format!("Invalid command: {e}"), None)]
            }
        }
    }

    /// Handle one command.
    pub fn handle(&mut self, command: Command) -> Vec<Response> {
        tracing::debug!(cmd = command.name(), "Command");
        let name = command.name();
        let mut out = Vec::new();

        match command {
            Command::Propose { direction } => {
                let outcome = self.recorder.propose(direction);
                out.push(Response::Proposed {
                    accepted: outcome.accepted,
                    started: outcome.started,
                });
            }
            Command::Advance { by_ms } if by_ms > MAX_ADVANCE_MS => {
                out.push(Response::error(
                    format!("by_ms {by_ms} exceeds the limit of {MAX_ADVANCE_MS}"),
                    Some(name),
                ));
            }
            Command::Advance { by_ms } => {
                let target = self.game().now_ms().saturating_add(by_ms);
                let events = self.recorder.advance(target);
                self.note_events(&events);
                out.push(Response::Events {
                    now_ms: target,
                    events,
                });
                return out;
            }
            Command::Query => {
                let game = self.game();
                out.push(Response::State {
                    now_ms: game.now_ms(),
                    mode: game.mode(),
                    snapshot: game.snapshot(),
                    hash: game.state_hash(),
                });
            }
            Command::Render => {
                let game = self.game();
                out.push(Response::Frame {
                    now_ms: game.now_ms(),
                    text: render_ascii(&game.snapshot(), &AsciiConfig::default()),
                });
            }
            Command::Reset => {
                self.recorder.reset();
                out.push(Response::ack(name));
            }
            Command::StartDemo => {
                self.recorder.start_demo();
                out.push(Response::ack(name));
            }
            Command::StopDemo => {
                if self.recorder.stop_demo() {
                    out.push(Response::ack(name));
                } else {
                    out.push(Response::error("No demo is running", Some(name)));
                }
            }
            Command::Submit {
                nickname,
                score,
                level,
            } => out.push(self.submit(nickname, score, level)),
            Command::Leaderboard { top } => {
                out.push(Response::Leaderboard {
                    entries: self.leaderboard.top(top),
                });
            }
            Command::Hash => {
                let game = self.game();
                out.push(Response::StateHash {
                    now_ms: game.now_ms(),
                    hash: game.state_hash(),
                });
            }
            Command::Quit => {
                self.should_quit = true;
                return vec![Response::Bye];
            }
        }

        let events = self.recorder.drain_events();
        if !events.is_empty() {
            self.note_events(&events);
            out.push(Response::Events {
                now_ms: self.game().now_ms(),
                events,
            });
        }
        out
    }

    fn submit(&mut self, nickname: String, score: Option<i64>, level: Option<i64>) -> Response {
        let last = self.last_final;
        let (Some(score), Some(level)) = (
            score.or(last.map(|f| i64::from(f.score))),
            level.or(last.map(|f| i64::from(f.level))),
        ) else {
            return Response::error("No finished game to submit", Some("submit"));
        };
        match self.leaderboard.submit(ScoreSubmission {
            nickname,
            score,
            level,
        }) {
            Ok(entry) => Response::Submitted { entry },
            Err(e) => Response::error(e.to_string(), Some("submit")),
        }
    }

    fn note_events(&mut self, events: &[GameEvent]) {
        for event in events {
            if let GameEvent::GameOver { final_score, .. } = event {
                self.last_final = Some(*final_score);
            }
        }
    }

    /// Run the command loop over arbitrary streams until `quit` or end of
    /// input. Returns the recorded replay.
    pub fn run_with<R: BufRead, W: Write>(mut self, input: R, mut output: W) -> Result<Replay> {
        output.write_all(Response::ready(self.game().now_ms()).to_json_line().as_bytes())?;
        output.flush()?;

        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            for response in self.handle_line(&line) {
                output.write_all(response.to_json_line().as_bytes())?;
            }
            output.flush()?;
            if self.should_quit {
                break;
            }
        }
        if !self.should_quit {
            output.write_all(Response::Bye.to_json_line().as_bytes())?;
            output.flush()?;
        }

        let record_path = self.record_path.take();
        let replay = self.recorder.finish();
        if let Some(path) = record_path {
            replay.save(&path).map_err(RunnerError::from)?;
            tracing::info!(
                path = %path.display(),
                inputs = replay.input_count(),
                "Replay written"
            );
        }
        Ok(replay)
    }

    /// Run the command loop on stdin/stdout.
    pub fn run(self) -> Result<Replay> {
        tracing::info!("Headless runner started, reading commands from stdin");
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }
}

impl Default for HeadlessRunner {
    fn default() -> Self {
        Self::new()
    }
}
