//! Strong/weak transitions, destruction and the return of destroyed counters.
//!
//! The board holds the live counters; `Reserve` holds the destroyed ones.
//! Together with the shapes still waiting to be placed they account for
//! exactly one counter per shape per side.

use crate::board::{Board, Counter, Shape, Side, Square, Strength};
use crate::error::{GameError, GameResult};
use crate::resurrection;
use serde::{Deserialize, Serialize};

/// Live counters a side must keep to stay in the game.
pub const MIN_LIVE_COUNTERS: usize = 2;

/// Strong counters each side designates at the start of play.
pub const INITIAL_STRONG: usize = 2;

/// Destroyed counters awaiting resurrection, per side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserve {
    destroyed: [[bool; 3]; 2],
}

impl Reserve {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, side: Side, shape: Shape) -> bool {
        self.destroyed[side.index()][shape.index()]
    }

    pub fn shapes(&self, side: Side) -> Vec<Shape> {
        Shape::ALL
            .into_iter()
            .filter(|&shape| self.contains(side, shape))
            .collect()
    }

    pub fn count(&self, side: Side) -> usize {
        self.destroyed[side.index()].iter().filter(|&&d| d).count()
    }

    pub(crate) fn insert(&mut self, side: Side, shape: Shape) {
        debug_assert!(!self.contains(side, shape), "{side} {shape} destroyed twice");
        self.destroyed[side.index()][shape.index()] = true;
    }

    fn take(&mut self, side: Side, shape: Shape) -> bool {
        std::mem::replace(&mut self.destroyed[side.index()][shape.index()], false)
    }
}

/// Initial strength designations, one per counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignments {
    assigned: [[Option<Strength>; 3]; 2],
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, side: Side, shape: Shape) -> Option<Strength> {
        self.assigned[side.index()][shape.index()]
    }

    pub fn is_complete(&self, side: Side) -> bool {
        self.assigned[side.index()].iter().all(Option::is_some)
    }

    /// Shapes of `side` that still need a designation.
    pub fn pending(&self, side: Side) -> Vec<Shape> {
        Shape::ALL
            .into_iter()
            .filter(|&shape| self.get(side, shape).is_none())
            .collect()
    }

    fn count(&self, side: Side, strength: Strength) -> usize {
        self.assigned[side.index()]
            .iter()
            .filter(|&&s| s == Some(strength))
            .count()
    }

    /// Check a designation without recording it.
    pub fn check(&self, board: &Board, side: Side, shape: Shape, strength: Strength) -> GameResult<Square> {
        let square = board.find(side, shape).ok_or_else(|| {
            GameError::IllegalAction(format!("{side} {shape} is not on the board"))
        })?;
        if self.get(side, shape).is_some() {
            return Err(GameError::IllegalAction(format!(
                "{side} {shape} already has its strength"
            )));
        }
        let limit = match strength {
            Strength::Strong => INITIAL_STRONG,
            Strength::Weak => Shape::ALL.len() - INITIAL_STRONG,
        };
        if self.count(side, strength) >= limit {
            return Err(GameError::IllegalAction(format!(
                "{side} may designate only {limit} {} counter(s)",
                match strength {
                    Strength::Strong => "strong",
                    Strength::Weak => "weak",
                }
            )));
        }
        Ok(square)
    }

    /// Record a designation and turn the counter on the board accordingly.
    pub fn assign(&mut self, board: &mut Board, side: Side, shape: Shape, strength: Strength) -> GameResult<()> {
        let square = self.check(board, side, shape, strength)?;
        self.assigned[side.index()][shape.index()] = Some(strength);
        board.set_strength(square, strength);
        Ok(())
    }
}

/// A side reduced to two live counters fights with both strong.
///
/// Returns the squares whose counters were flipped.
pub fn restore_forced_strength(board: &mut Board, side: Side) -> Vec<Square> {
    if board.live_count(side) != MIN_LIVE_COUNTERS {
        return Vec::new();
    }
    let weak: Vec<Square> = board
        .counters_of(side)
        .filter(|(_, c)| !c.is_strong())
        .map(|(sq, _)| sq)
        .collect();
    for &square in &weak {
        board.set_strength(square, Strength::Strong);
        log::debug!("{side} counter on {square} forced strong");
    }
    weak
}

/// Take the counter on `square` off the board and into its owner's reserve,
/// then restore the forced-strong rule for that side.
pub fn destroy(board: &mut Board, reserve: &mut Reserve, square: Square) -> Option<Counter> {
    let counter = board.remove(square)?;
    reserve.insert(counter.owner, counter.shape);
    log::debug!("{counter} destroyed on {square}");
    restore_forced_strength(board, counter.owner);
    Some(counter)
}

/// Check a resurrection without performing it.
pub fn check_resurrection(
    board: &Board,
    reserve: &Reserve,
    side: Side,
    shape: Shape,
    target: Square,
) -> GameResult<()> {
    match resurrection::eligible_shape(board, reserve, side) {
        Some(eligible) if eligible == shape => {}
        Some(eligible) => {
            return Err(GameError::IllegalResurrection(format!(
                "{side} can only bring back its {eligible}"
            )));
        }
        None => {
            return Err(GameError::IllegalResurrection(format!(
                "{side} is not eligible to resurrect"
            )));
        }
    }
    if !side.owns_square(target) || board.is_occupied(target) {
        return Err(GameError::InvalidTarget(target));
    }
    Ok(())
}

/// Return a destroyed counter to an empty square of its owner's half, weak
/// side up.
pub fn resurrect(
    board: &mut Board,
    reserve: &mut Reserve,
    side: Side,
    shape: Shape,
    target: Square,
) -> GameResult<Counter> {
    check_resurrection(board, reserve, side, shape, target)?;
    let counter = Counter::new(side, shape, Strength::Weak);
    board.place(counter, target)?;
    let was_reserved = reserve.take(side, shape);
    debug_assert!(was_reserved);
    log::debug!("{counter} resurrected on {target}");
    Ok(counter)
}
