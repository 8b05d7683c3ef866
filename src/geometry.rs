//! Attack shapes.
//!
//! Each shape has one pure function from (owner, position, occupancy) to the
//! set of squares it attacks. Occupied squares inside a line of attack are
//! attacked themselves and shadow everything behind them on that line. The
//! square shape ignores occupancy entirely.
//!
//! Off-board positions cannot reach these functions: `Square` is only
//! constructible on the board and rejects anything else with
//! `GameError::InvalidPosition`.

use crate::board::{BOARD_SIZE, Board, Counter, Shape, Side, Square, SquareSet};

/// Reach of the square shape in king steps.
pub const SQUARE_REACH: i32 = 2;

/// Longest line a rectangle can project in either direction.
pub const RECTANGLE_REACH: i32 = BOARD_SIZE as i32 - 1;

pub fn attack_squares(shape: Shape, owner: Side, from: Square, occupied: SquareSet) -> SquareSet {
    match shape {
        Shape::Triangle => triangle_attacks(owner, from, occupied),
        Shape::Rectangle => rectangle_attacks(owner, from, occupied),
        Shape::Square => square_attacks(from),
    }
}

/// Squares attacked by the counter standing on `from`, or an empty set when
/// the square is empty.
pub fn counter_attacks(board: &Board, from: Square) -> SquareSet {
    match board.occupant(from) {
        Some(Counter { owner, shape, .. }) => attack_squares(shape, owner, from, board.occupancy()),
        None => SquareSet::EMPTY,
    }
}

/// How many forward steps a triangle's wedge reaches from `from`: one on its
/// own back rank, one more for every rank it has advanced.
pub fn triangle_depth(owner: Side, from: Square) -> usize {
    owner.ranks_advanced(from) + 1
}

/// A wedge opening forward: `k` steps ahead it spans `k` files either side.
/// Each file is a separate lane for blocking.
pub fn triangle_attacks(owner: Side, from: Square, occupied: SquareSet) -> SquareSet {
    let mut attacked = SquareSet::EMPTY;
    let mut blocked_files = [false; BOARD_SIZE];

    for step in 1..=triangle_depth(owner, from) as i32 {
        let rank = from.rank() as i32 + step * owner.forward();
        if !(0..BOARD_SIZE as i32).contains(&rank) {
            break;
        }
        for file in (from.file() as i32 - step)..=(from.file() as i32 + step) {
            let Ok(target) = Square::from_coords(file, rank) else {
                continue;
            };
            if blocked_files[target.file()] {
                continue;
            }
            attacked.insert(target);
            if occupied.contains(target) {
                blocked_files[target.file()] = true;
            }
        }
    }

    attacked
}

/// Straight lines forward and backward along the file, each stopping on the
/// first occupied square.
pub fn rectangle_attacks(owner: Side, from: Square, occupied: SquareSet) -> SquareSet {
    let mut attacked = SquareSet::EMPTY;

    for direction in [owner.forward(), -owner.forward()] {
        for step in 1..=RECTANGLE_REACH {
            let Some(target) = from.offset(0, step * direction) else {
                break;
            };
            attacked.insert(target);
            if occupied.contains(target) {
                break;
            }
        }
    }

    attacked
}

/// Everything within two king steps.
pub fn square_attacks(from: Square) -> SquareSet {
    let mut attacked = SquareSet::EMPTY;
    for d_rank in -SQUARE_REACH..=SQUARE_REACH {
        for d_file in -SQUARE_REACH..=SQUARE_REACH {
            if d_rank == 0 && d_file == 0 {
                continue;
            }
            if let Some(target) = from.offset(d_file, d_rank) {
                attacked.insert(target);
            }
        }
    }
    attacked
}
