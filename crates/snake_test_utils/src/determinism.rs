//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a session or a whole game
//! produces identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and demo verification only work if the core is 100%
//! deterministic. Sources of non-determinism include:
//!
//! - **Floating-point math**: the autopilot's space threshold uses
//!   [`snake_core::math::Fixed`] instead of floats.
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Hazard timers live in a `BTreeMap` and the scheduler orders equal
//!   deadlines by sequence number.
//!
//! - **System randomness and wall clocks**: spawns draw from the seeded
//!   session RNG and time only moves when the host calls `advance`.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual modules (queue, hazards, autopilot)
//! 2. **Property tests**: random inputs must keep the game invariants
//! 3. **Integration tests**: full scripted games are reproducible
//! 4. **Parallel tests**: running N games on threads all match

use std::thread;

use snake_core::game::Game;
use snake_core::simulation::GameSession;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps simulated.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic game).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Game is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
///
/// # Example
///
/// ```
/// use snake_core::config::GameConfig;
/// use snake_core::grid::Direction;
/// use snake_core::simulation::GameSession;
/// use snake_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     3,
///     50,
///     || {
///         let mut session = GameSession::new(GameConfig::default(), 9);
///         session.propose(Direction::Left);
///         session
///     },
///     |session| {
///         session.tick();
///     },
///     GameSession::state_hash,
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Run a session twice for `num_ticks` ticks and compare the hashes.
pub fn verify_session_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> GameSession,
{
    verify_determinism(
        2,
        num_ticks,
        &setup_fn,
        |session| {
            session.tick();
        },
        GameSession::state_hash,
    )
    .is_deterministic
}

/// Run a game twice, advancing the clock in `step_ms` increments.
pub fn verify_game_determinism<F>(setup_fn: F, step_ms: u64, steps: u64) -> DeterminismResult
where
    F: Fn() -> Game,
{
    verify_determinism(
        2,
        steps,
        &setup_fn,
        |game| {
            let next = game.now_ms() + step_ms;
            game.advance(next);
        },
        Game::state_hash,
    )
}

/// Result of parallel game runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each game.
    pub hashes: Vec<u64>,
    /// Clock time each game ran to.
    pub until_ms: u64,
}

impl ParallelRunResult {
    /// Check if all games produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run N games on scoped threads and collect their final hashes.
///
/// Catches non-determinism that only shows up under thread scheduling
/// or memory layout differences.
pub fn run_parallel_games<F>(setup_fn: F, num_games: usize, until_ms: u64) -> ParallelRunResult
where
    F: Fn() -> Game + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_games)
            .map(|_| {
                s.spawn(|| {
                    let mut game = setup_fn();
                    game.advance(until_ms);
                    game.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("game thread panicked"))
            .collect()
    });

    ParallelRunResult { hashes, until_ms }
}

/// Compare two sessions tick by tick and report the first divergence.
///
/// `None` means they stayed identical; `Some(tick)` names the first tick
/// after which the hashes differed.
pub fn find_first_divergence<F>(setup_fn: F, num_ticks: u64) -> Option<u64>
where
    F: Fn() -> GameSession,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for tick in 1..=num_ticks {
        a.tick();
        b.tick();
        if a.state_hash() != b.state_hash() {
            return Some(tick);
        }
    }

    None
}

/// Verify that a bincode round trip preserves the session exactly.
pub fn verify_serialization_determinism<F>(setup_fn: F, num_ticks: u64) -> bool
where
    F: Fn() -> GameSession,
{
    let mut session = setup_fn();
    for _ in 0..num_ticks {
        session.tick();
    }

    let hash_before = session.state_hash();

    let Ok(bytes) = session.serialize() else {
        return false;
    };
    let Ok(restored) = GameSession::deserialize(&bytes) else {
        return false;
    };

    let mut original = session;
    let mut restored = restored;
    if restored.state_hash() != hash_before {
        return false;
    }

    // Both copies must also evolve identically, RNG included.
    for _ in 0..num_ticks {
        original.tick();
        restored.tick();
    }
    original.state_hash() == restored.state_hash()
}

/// Proptest strategies for game inputs.
pub mod strategies {
    use proptest::prelude::*;
    use snake_core::grid::{Cell, Direction};

    /// Any of the four directions.
    pub fn arb_direction() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Right),
            Just(Direction::Down),
            Just(Direction::Left),
            Just(Direction::Up),
        ]
    }

    /// A cell on a `width` x `height` board.
    pub fn arb_cell(width: u32, height: u32) -> impl Strategy<Value = Cell> {
        (0..width, 0..height).prop_map(|(x, y)| Cell::new(x, y))
    }

    /// Input script: each step proposes zero to two directions.
    pub fn arb_input_script(max_len: usize) -> impl Strategy<Value = Vec<Vec<Direction>>> {
        proptest::collection::vec(proptest::collection::vec(arb_direction(), 0..3), 1..max_len)
    }

    /// Timed inputs `(delay_ms, direction)` for a game controller.
    pub fn arb_timed_inputs(max_len: usize) -> impl Strategy<Value = Vec<(u64, Direction)>> {
        proptest::collection::vec((0u64..400, arb_direction()), 1..max_len)
    }

    /// Board dimensions from 5x5 to 30x30.
    pub fn arb_grid_size() -> impl Strategy<Value = (u32, u32)> {
        (5u32..=30, 5u32..=30)
    }
}
