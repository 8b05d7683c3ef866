//! Eligibility for bringing a destroyed counter back.
//!
//! A side qualifies when it has lost exactly one counter and both survivors
//! stand on its resurrection rank (the opponent's back rank). Qualifying lets
//! the side spend its next action returning the lost counter, weak side up,
//! to any empty square of its own half.

use crate::board::{Board, Shape, Side, Square};
use crate::lifecycle::{MIN_LIVE_COUNTERS, Reserve};

/// The shape `side` may bring back right now, if any.
pub fn eligible_shape(board: &Board, reserve: &Reserve, side: Side) -> Option<Shape> {
    if reserve.count(side) != 1 || board.live_count(side) != MIN_LIVE_COUNTERS {
        return None;
    }
    let staged = board
        .counters_of(side)
        .all(|(square, _)| square.rank() == side.resurrection_rank());
    if !staged {
        return None;
    }
    reserve.shapes(side).first().copied()
}

pub fn is_eligible(board: &Board, reserve: &Reserve, side: Side) -> bool {
    eligible_shape(board, reserve, side).is_some()
}

/// Empty squares of `side`'s half a resurrected counter could land on; empty
/// when the side is not eligible.
pub fn resurrection_targets(board: &Board, reserve: &Reserve, side: Side) -> Vec<Square> {
    if !is_eligible(board, reserve, side) {
        return Vec::new();
    }
    Square::all()
        .filter(|&sq| side.owns_square(sq) && !board.is_occupied(sq))
        .collect()
}
