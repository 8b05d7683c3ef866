use crate::board::{Side, Strength};
use crate::game::{Action, GameState};
use crate::geometry::attack_squares;
use crate::resolver::{AttackMap, DESTRUCTION_THRESHOLD};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Duration;

/// A player the arena can seat on either side of a Sa-Jin game.
pub trait Bot: Send {
    /// Display name used in match reports.
    fn name(&self) -> &str;

    /// Choose an action for the side to act, within `time_limit`. Returning
    /// `None` ends the match as a draw.
    fn get_action(&mut self, state: &GameState, time_limit: Duration) -> Option<Action>;

    /// Called once with the side this bot plays, before placement.
    fn game_start(&mut self, _side: Side) {}

    /// Called after every accepted action, whichever side submitted it.
    fn notify_action(&mut self, _side: Side, _action: Action) {}

    /// Called once when the match is over, however it ended.
    fn game_end(&mut self) {}
}

/// Picks uniformly among the legal actions.
pub struct RandomBot {
    name: String,
    rng: StdRng,
}

impl RandomBot {
    pub fn new(name: String) -> Self {
        RandomBot {
            name,
            rng: StdRng::from_entropy(),
        }
    }

    /// A bot that replays the same choices for the same seed.
    pub fn with_seed(name: String, seed: u64) -> Self {
        RandomBot {
            name,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Bot for RandomBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_action(&mut self, state: &GameState, _time_limit: Duration) -> Option<Action> {
        state.legal_actions().choose(&mut self.rng).copied()
    }
}

const WIN_SCORE: i32 = 100_000;
const LIVE_COUNTER: i32 = 400;
const DESTRUCTION_BONUS: i32 = 500;
const PRESSURE: i32 = 40;
const EXPOSURE: i32 = 60;
const COVERAGE: i32 = 8;
const STAGING: i32 = 15;
const REACH: i32 = 1;

/// Score a position from `side`'s point of view. Higher is better.
///
/// Counts live counters, how hard each side's coverage presses on the
/// other's strong counters (a double-covered one is as good as gone), how
/// far a side missing one counter has got towards its resurrection rank, and
/// the raw reach of every counter.
pub fn evaluate(state: &GameState, side: Side) -> i32 {
    if let Some(winner) = state.winner() {
        return if winner == side { WIN_SCORE } else { -WIN_SCORE };
    }
    let board = state.board();
    let enemy = side.opponent();

    let own_map = AttackMap::compute(board, side);
    let enemy_map = AttackMap::compute(board, enemy);

    let mut score = (board.live_count(side) as i32 - board.live_count(enemy) as i32) * LIVE_COUNTER;

    for (square, counter) in board.counters() {
        if counter.strength != Strength::Strong {
            continue;
        }
        let (map, sign) = if counter.owner == side {
            (&enemy_map, -1)
        } else {
            (&own_map, 1)
        };
        let coverage = map.coverage(square) as i32;
        score += sign * coverage * COVERAGE;
        if coverage >= DESTRUCTION_THRESHOLD as i32 {
            // Falls as soon as the covering side acts.
            score += sign * LIVE_COUNTER;
        } else if coverage == DESTRUCTION_THRESHOLD as i32 - 1 {
            score += sign * if sign > 0 { PRESSURE } else { EXPOSURE };
        }
    }

    let occupied = board.occupancy();
    for (square, counter) in board.counters_of(side) {
        score += attack_squares(counter.shape, side, square, occupied).len() as i32 * REACH;
        if state.reserve().count(side) == 1 {
            score += side.ranks_advanced(square) as i32 * STAGING;
        }
    }

    score
}

/// Score `action` by playing it on a copy. `None` if the action is illegal.
pub fn score_action(state: &GameState, action: Action) -> Option<i32> {
    let side = state.active_side();
    let mut next = state.clone();
    next.apply(side, action).ok()?;

    let inflicted = next.destroyed_by(side) as i32 - state.destroyed_by(side) as i32;
    Some(evaluate(&next, side) + inflicted * DESTRUCTION_BONUS)
}

/// One-ply greedy choice for the side to act. Ties go to the action listed
/// first by `GameState::legal_actions`.
pub fn best_action(state: &GameState) -> Option<Action> {
    let mut best: Option<(i32, Action)> = None;
    for action in state.legal_actions() {
        let Some(score) = score_action(state, action) else {
            continue;
        };
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, action));
        }
    }
    best.map(|(_, action)| action)
}

/// The computer's action, when the configured CPU side is the one to act.
pub fn compute_ai_action(state: &GameState) -> Option<Action> {
    if !state.is_cpu_turn() {
        return None;
    }
    best_action(state)
}

/// The greedy evaluator as a bot.
pub struct GreedyBot {
    name: String,
}

impl GreedyBot {
    pub fn new(name: String) -> Self {
        GreedyBot { name }
    }
}

impl Bot for GreedyBot {
    fn name(&self) -> &str {
        &self.name
    }

    fn get_action(&mut self, state: &GameState, _time_limit: Duration) -> Option<Action> {
        best_action(state)
    }
}
