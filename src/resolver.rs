//! Coverage maps and the double-coverage destruction rule.

use crate::board::{BOARD_SIZE, Board, Counter, Side, Square, SquareSet};
use crate::geometry::attack_squares;
use crate::lifecycle::{Reserve, destroy};
use serde::{Deserialize, Serialize};

/// Coverage needed to destroy a strong counter.
pub const DESTRUCTION_THRESHOLD: u8 = 2;

/// How many of one side's strong counters attack each square.
///
/// Weak counters add nothing here; they only matter as blockers through the
/// occupancy the map is computed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackMap {
    side: Side,
    coverage: [[u8; BOARD_SIZE]; BOARD_SIZE],
}

impl AttackMap {
    pub fn compute(board: &Board, side: Side) -> Self {
        Self::compute_with(board, side, board.occupancy())
    }

    /// Compute against an explicit occupancy snapshot.
    pub fn compute_with(board: &Board, side: Side, occupied: SquareSet) -> Self {
        let mut coverage = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        for (from, counter) in board.counters_of(side) {
            if !counter.is_strong() {
                continue;
            }
            for target in attack_squares(counter.shape, side, from, occupied).iter() {
                coverage[target.rank()][target.file()] += 1;
            }
        }
        log::trace!("recomputed {side} attack map");
        AttackMap { side, coverage }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn coverage(&self, square: Square) -> u8 {
        self.coverage[square.rank()][square.file()]
    }
}

/// A counter removed by resolution, and where it stood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destruction {
    pub square: Square,
    pub counter: Counter,
}

/// Strong counters of `side` the opponent covers at least twice.
pub fn threatened(board: &Board, side: Side, enemy: &AttackMap) -> Vec<Square> {
    debug_assert_eq!(enemy.side(), side.opponent());
    board
        .counters_of(side)
        .filter(|(square, counter)| {
            counter.is_strong() && enemy.coverage(*square) >= DESTRUCTION_THRESHOLD
        })
        .map(|(square, _)| square)
        .collect()
}

/// Apply the destruction rule after `attacker` has acted.
///
/// Only the attacker's coverage counts and only the defender's strong
/// counters can fall. The map is computed from the occupancy as it stands
/// before anything is removed, so every doomed counter is chosen before the
/// first one leaves the board and a removal never opens a line
/// mid-resolution.
pub fn resolve(board: &mut Board, reserve: &mut Reserve, attacker: Side) -> Vec<Destruction> {
    let snapshot = board.occupancy();
    let coverage = AttackMap::compute_with(board, attacker, snapshot);
    let doomed = threatened(board, attacker.opponent(), &coverage);

    let mut destroyed = Vec::with_capacity(doomed.len());
    for square in doomed {
        if let Some(counter) = destroy(board, reserve, square) {
            destroyed.push(Destruction { square, counter });
        }
    }
    destroyed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Shape, Strength};

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn put(board: &mut Board, side: Side, shape: Shape, strength: Strength, at: &str) {
        board.set(sq(at), Some(Counter::new(side, shape, strength)));
    }

    #[test]
    fn test_weak_counters_add_no_coverage() {
        let mut board = Board::new();
        put(&mut board, Side::North, Shape::Square, Strength::Weak, "D6");
        put(&mut board, Side::North, Shape::Rectangle, Strength::Strong, "A8");
        let map = AttackMap::compute(&board, Side::North);
        assert_eq!(map.coverage(sq("D5")), 0);
        assert_eq!(map.coverage(sq("A1")), 1);
    }

    #[test]
    fn test_weak_counter_still_blocks() {
        let mut board = Board::new();
        put(&mut board, Side::North, Shape::Rectangle, Strength::Strong, "A8");
        put(&mut board, Side::South, Shape::Triangle, Strength::Weak, "A5");
        let map = AttackMap::compute(&board, Side::North);
        assert_eq!(map.coverage(sq("A5")), 1);
        assert_eq!(map.coverage(sq("A4")), 0);
    }

    #[test]
    fn test_double_coverage_destroys_strong_counter() {
        let mut board = Board::new();
        put(&mut board, Side::North, Shape::Rectangle, Strength::Strong, "D8");
        put(&mut board, Side::North, Shape::Square, Strength::Strong, "E5");
        put(&mut board, Side::South, Shape::Square, Strength::Strong, "D4");
        put(&mut board, Side::South, Shape::Triangle, Strength::Strong, "A1");
        put(&mut board, Side::South, Shape::Rectangle, Strength::Weak, "H1");
        let mut reserve = Reserve::new();

        let destroyed = resolve(&mut board, &mut reserve, Side::North);
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].square, sq("D4"));
        assert!(!board.is_occupied(sq("D4")));
        assert!(reserve.contains(Side::South, Shape::Square));
        // The survivors are forced strong.
        assert!(board.occupant(sq("H1")).unwrap().is_strong());
    }

    #[test]
    fn test_weak_counter_survives_any_coverage() {
        let mut board = Board::new();
        put(&mut board, Side::North, Shape::Rectangle, Strength::Strong, "D8");
        put(&mut board, Side::North, Shape::Square, Strength::Strong, "E5");
        put(&mut board, Side::North, Shape::Triangle, Strength::Weak, "H8");
        put(&mut board, Side::South, Shape::Square, Strength::Weak, "D4");
        let mut reserve = Reserve::new();

        let map = AttackMap::compute(&board, Side::North);
        assert_eq!(map.coverage(sq("D4")), 2);
        assert!(resolve(&mut board, &mut reserve, Side::North).is_empty());
        assert!(board.is_occupied(sq("D4")));
    }

    #[test]
    fn test_single_coverage_is_harmless() {
        let mut board = Board::new();
        put(&mut board, Side::North, Shape::Rectangle, Strength::Strong, "D8");
        put(&mut board, Side::South, Shape::Square, Strength::Strong, "D4");
        let mut reserve = Reserve::new();
        assert!(resolve(&mut board, &mut reserve, Side::North).is_empty());
    }

    #[test]
    fn test_simultaneous_destruction_uses_one_snapshot() {
        let mut board = Board::new();
        put(&mut board, Side::North, Shape::Rectangle, Strength::Strong, "C8");
        put(&mut board, Side::North, Shape::Square, Strength::Strong, "D6");
        put(&mut board, Side::South, Shape::Rectangle, Strength::Strong, "C7");
        put(&mut board, Side::South, Shape::Square, Strength::Strong, "C5");
        put(&mut board, Side::South, Shape::Triangle, Strength::Weak, "H1");
        let mut reserve = Reserve::new();

        // C7 is covered by the rectangle (first blocker) and the square.
        // C5 lies behind C7 on the rectangle's file, so it has coverage 1.
        let north = AttackMap::compute(&board, Side::North);
        assert_eq!(north.coverage(sq("C7")), 2);
        assert_eq!(north.coverage(sq("C5")), 1);

        let destroyed = resolve(&mut board, &mut reserve, Side::North);
        // Removing C7 would open the file onto C5, but the snapshot rule
        // keeps C5 alive this step.
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].square, sq("C7"));
        assert!(board.is_occupied(sq("C5")));
    }

    #[test]
    fn test_two_targets_destroyed_in_one_step() {
        let mut board = Board::new();
        put(&mut board, Side::North, Shape::Square, Strength::Strong, "D6");
        put(&mut board, Side::North, Shape::Triangle, Strength::Strong, "D7");
        put(&mut board, Side::South, Shape::Rectangle, Strength::Strong, "C5");
        put(&mut board, Side::South, Shape::Square, Strength::Strong, "E5");
        put(&mut board, Side::South, Shape::Triangle, Strength::Weak, "H1");
        let mut reserve = Reserve::new();

        let destroyed = resolve(&mut board, &mut reserve, Side::North);
        let squares: Vec<Square> = destroyed.iter().map(|d| d.square).collect();
        assert!(squares.contains(&sq("C5")));
        assert!(squares.contains(&sq("E5")));
        assert_eq!(board.live_count(Side::South), 1);
    }

    #[test]
    fn test_only_the_attacker_destroys() {
        let mut board = Board::new();
        put(&mut board, Side::North, Shape::Rectangle, Strength::Strong, "D8");
        put(&mut board, Side::North, Shape::Square, Strength::Strong, "F6");
        put(&mut board, Side::South, Shape::Square, Strength::Strong, "D4");
        put(&mut board, Side::South, Shape::Rectangle, Strength::Strong, "H1");
        let mut reserve = Reserve::new();

        // South stands under double coverage, but South is the side acting.
        assert_eq!(AttackMap::compute(&board, Side::North).coverage(sq("D4")), 2);
        assert!(resolve(&mut board, &mut reserve, Side::South).is_empty());
        assert!(board.is_occupied(sq("D4")));

        let destroyed = resolve(&mut board, &mut reserve, Side::North);
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].square, sq("D4"));
    }

    #[test]
    fn test_threatened_lists_double_covered_strong_counters() {
        let mut board = Board::new();
        put(&mut board, Side::South, Shape::Rectangle, Strength::Strong, "D1");
        put(&mut board, Side::South, Shape::Square, Strength::Strong, "C3");
        put(&mut board, Side::North, Shape::Rectangle, Strength::Strong, "D5");
        put(&mut board, Side::North, Shape::Square, Strength::Weak, "B5");
        let south = AttackMap::compute(&board, Side::South);
        assert_eq!(south.coverage(sq("B5")), 1);
        assert_eq!(threatened(&board, Side::North, &south), vec![sq("D5")]);
    }
}
