use crate::error::{GameError, GameResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const BOARD_SIZE: usize = 8;

/// A square on the 8x8 board. Files run A..H (0..7), ranks 1..8 (0..7).
///
/// Squares can only be built through validating constructors, so every
/// `Square` in circulation is on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    rank: u8,
    file: u8,
}

impl Square {
    pub fn new(file: usize, rank: usize) -> GameResult<Self> {
        if file < BOARD_SIZE && rank < BOARD_SIZE {
            Ok(Square {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            Err(GameError::InvalidPosition {
                file: i32::try_from(file).unwrap_or(i32::MAX),
                rank: i32::try_from(rank).unwrap_or(i32::MAX),
            })
        }
    }

    /// Build a square from signed coordinates, as produced by offset arithmetic.
    pub fn from_coords(file: i32, rank: i32) -> GameResult<Self> {
        if (0..BOARD_SIZE as i32).contains(&file) && (0..BOARD_SIZE as i32).contains(&rank) {
            Ok(Square {
                file: file as u8,
                rank: rank as u8,
            })
        } else {
            Err(GameError::InvalidPosition { file, rank })
        }
    }

    pub fn file(&self) -> usize {
        self.file as usize
    }

    pub fn rank(&self) -> usize {
        self.rank as usize
    }

    /// The square `d_file`/`d_rank` away, if it is still on the board.
    pub fn offset(&self, d_file: i32, d_rank: i32) -> Option<Square> {
        Square::from_coords(self.file as i32 + d_file, self.rank as i32 + d_rank).ok()
    }

    /// Chebyshev distance: the number of king steps between two squares.
    pub fn distance(&self, other: Square) -> usize {
        let df = (self.file as i32 - other.file as i32).unsigned_abs();
        let dr = (self.rank as i32 - other.rank as i32).unsigned_abs();
        df.max(dr) as usize
    }

    /// The up-to-eight squares one step away.
    pub fn neighbors(&self) -> impl Iterator<Item = Square> + '_ {
        DIRECTIONS
            .iter()
            .filter_map(move |&(df, dr)| self.offset(df, dr))
    }

    /// All 64 squares, rank-major from A1.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|rank| {
            (0..BOARD_SIZE).map(move |file| Square {
                file: file as u8,
                rank: rank as u8,
            })
        })
    }

    fn index(&self) -> usize {
        self.rank as usize * BOARD_SIZE + self.file as usize
    }
}

/// The eight king-step directions as (file, rank) deltas.
pub const DIRECTIONS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.file) as char, self.rank + 1)
    }
}

impl FromStr for Square {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let letter = chars.next().ok_or(GameError::InvalidPosition { file: -1, rank: -1 })?;
        let file = letter.to_ascii_uppercase() as i32 - 'A' as i32;
        let rank = chars
            .as_str()
            .parse::<i32>()
            .map_err(|_| GameError::InvalidPosition { file, rank: -1 })?
            - 1;
        Square::from_coords(file, rank)
    }
}

impl TryFrom<String> for Square {
    type Error = GameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

/// A set of squares packed into one bit per square.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SquareSet(u64);

impl SquareSet {
    pub const EMPTY: SquareSet = SquareSet(0);

    pub fn insert(&mut self, square: Square) {
        self.0 |= 1u64 << square.index();
    }

    pub fn contains(&self, square: Square) -> bool {
        self.0 & (1u64 << square.index()) != 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn is_subset(&self, other: SquareSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Square> + '_ {
        Square::all().filter(move |&sq| self.contains(sq))
    }
}

impl FromIterator<Square> for SquareSet {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        let mut set = SquareSet::EMPTY;
        for square in iter {
            set.insert(square);
        }
        set
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    South,
    North,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::South, Side::North];

    pub fn opponent(&self) -> Side {
        match self {
            Side::South => Side::North,
            Side::North => Side::South,
        }
    }

    /// Rank delta of one step forward.
    pub fn forward(&self) -> i32 {
        match self {
            Side::South => 1,
            Side::North => -1,
        }
    }

    /// The board edge this side starts from.
    pub fn back_rank(&self) -> usize {
        match self {
            Side::South => 0,
            Side::North => BOARD_SIZE - 1,
        }
    }

    /// The rank nearest the opponent's edge, i.e. the opponent's back rank.
    pub fn resurrection_rank(&self) -> usize {
        self.opponent().back_rank()
    }

    /// Whether `square` lies in this side's half of the board.
    pub fn owns_square(&self, square: Square) -> bool {
        match self {
            Side::South => square.rank() < BOARD_SIZE / 2,
            Side::North => square.rank() >= BOARD_SIZE / 2,
        }
    }

    /// How many ranks `square` lies in front of this side's back rank.
    pub fn ranks_advanced(&self, square: Square) -> usize {
        square.rank().abs_diff(self.back_rank())
    }

    pub fn index(&self) -> usize {
        match self {
            Side::South => 0,
            Side::North => 1,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Side::South => "South",
            Side::North => "North",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The three counter shapes. Each side owns exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shape {
    Triangle,
    Rectangle,
    Square,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Triangle, Shape::Rectangle, Shape::Square];

    pub fn index(&self) -> usize {
        match self {
            Shape::Triangle => 0,
            Shape::Rectangle => 1,
            Shape::Square => 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Shape::Triangle => "triangle",
            Shape::Rectangle => "rectangle",
            Shape::Square => "square",
        }
    }

    fn letter(&self) -> char {
        match self {
            Shape::Triangle => 't',
            Shape::Rectangle => 'r',
            Shape::Square => 's',
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strength {
    Strong,
    Weak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Counter {
    pub owner: Side,
    pub shape: Shape,
    pub strength: Strength,
}

impl Counter {
    pub fn new(owner: Side, shape: Shape, strength: Strength) -> Self {
        Counter {
            owner,
            shape,
            strength,
        }
    }

    pub fn is_strong(&self) -> bool {
        self.strength == Strength::Strong
    }

    /// Two-character label: side initial, then the shape letter
    /// (upper-case when strong).
    pub fn label(&self) -> String {
        let side = match self.owner {
            Side::South => 'S',
            Side::North => 'N',
        };
        let shape = if self.is_strong() {
            self.shape.letter().to_ascii_uppercase()
        } else {
            self.shape.letter()
        };
        format!("{side}{shape}")
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let strength = match self.strength {
            Strength::Strong => "strong",
            Strength::Weak => "weak",
        };
        write!(f, "{} {} {}", self.owner, strength, self.shape)
    }
}

/// The 8x8 grid. Holds only live counters; destroyed and unplaced counters
/// are tracked elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    cells: [[Option<Counter>; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn occupant(&self, square: Square) -> Option<Counter> {
        self.cells[square.rank()][square.file()]
    }

    pub fn is_occupied(&self, square: Square) -> bool {
        self.occupant(square).is_some()
    }

    /// Put a counter on an empty square of its owner's half.
    pub fn place(&mut self, counter: Counter, square: Square) -> GameResult<()> {
        if !counter.owner.owns_square(square) {
            return Err(GameError::IllegalPlacement(format!(
                "{square} is outside {}'s half",
                counter.owner
            )));
        }
        if self.is_occupied(square) {
            return Err(GameError::OccupiedSquare(square));
        }
        debug_assert!(
            self.find(counter.owner, counter.shape).is_none(),
            "{} already on the board",
            counter
        );
        self.cells[square.rank()][square.file()] = Some(counter);
        Ok(())
    }

    /// Move `side`'s counter one step from `from` to `to`.
    pub fn move_counter(&mut self, side: Side, from: Square, to: Square) -> GameResult<Counter> {
        let counter = match self.occupant(from) {
            Some(counter) if counter.owner == side => counter,
            _ => return Err(GameError::OutOfTurn(from)),
        };
        if from.distance(to) != 1 {
            return Err(GameError::NotAdjacent { from, to });
        }
        if self.is_occupied(to) {
            return Err(GameError::OccupiedSquare(to));
        }
        self.cells[from.rank()][from.file()] = None;
        self.cells[to.rank()][to.file()] = Some(counter);
        Ok(counter)
    }

    pub fn remove(&mut self, square: Square) -> Option<Counter> {
        self.cells[square.rank()][square.file()].take()
    }

    /// Write a cell directly, bypassing every rule.
    #[cfg(test)]
    pub(crate) fn set(&mut self, square: Square, counter: Option<Counter>) {
        self.cells[square.rank()][square.file()] = counter;
    }

    pub(crate) fn set_strength(&mut self, square: Square, strength: Strength) {
        if let Some(counter) = self.cells[square.rank()][square.file()].as_mut() {
            counter.strength = strength;
        }
    }

    /// Every live counter with its square, rank-major from A1.
    pub fn counters(&self) -> impl Iterator<Item = (Square, Counter)> + '_ {
        Square::all().filter_map(move |sq| self.occupant(sq).map(|c| (sq, c)))
    }

    pub fn counters_of(&self, side: Side) -> impl Iterator<Item = (Square, Counter)> + '_ {
        self.counters().filter(move |(_, c)| c.owner == side)
    }

    /// Where `side`'s counter of `shape` stands, if it is on the board.
    pub fn find(&self, side: Side, shape: Shape) -> Option<Square> {
        self.counters_of(side)
            .find(|(_, c)| c.shape == shape)
            .map(|(sq, _)| sq)
    }

    pub fn live_count(&self, side: Side) -> usize {
        self.counters_of(side).count()
    }

    pub fn occupancy(&self) -> SquareSet {
        self.counters().map(|(sq, _)| sq).collect()
    }

    /// Rank 8 at the top, file letters underneath.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for rank in (0..BOARD_SIZE).rev() {
            out.push_str(&format!("{} |", rank + 1));
            for file in 0..BOARD_SIZE {
                match self.cells[rank][file] {
                    Some(counter) => out.push_str(&format!(" {}", counter.label())),
                    None => out.push_str("  ."),
                }
            }
            out.push('\n');
        }
        out.push_str("   ");
        for file in 0..BOARD_SIZE {
            out.push_str(&format!("  {}", (b'A' + file as u8) as char));
        }
        out.push('\n');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    #[test]
    fn test_algebraic_notation() {
        assert_eq!(sq("A1"), Square::new(0, 0).unwrap());
        assert_eq!(sq("h8"), Square::new(7, 7).unwrap());
        assert_eq!(sq("D5").to_string(), "D5");
        assert!("I1".parse::<Square>().is_err());
        assert!("A9".parse::<Square>().is_err());
        assert!("".parse::<Square>().is_err());
    }

    #[test]
    fn test_off_board_coordinates_rejected() {
        assert_eq!(
            Square::from_coords(8, 0),
            Err(GameError::InvalidPosition { file: 8, rank: 0 })
        );
        assert!(Square::from_coords(-1, 3).is_err());
        assert_eq!(
            Square::new(usize::MAX, 2),
            Err(GameError::InvalidPosition {
                file: i32::MAX,
                rank: 2
            })
        );
        assert_eq!(
            Square::new(3, 9),
            Err(GameError::InvalidPosition { file: 3, rank: 9 })
        );
        assert!(sq("A1").offset(-1, 0).is_none());
    }

    #[test]
    fn test_sides_and_halves() {
        assert!(Side::South.owns_square(sq("C4")));
        assert!(!Side::South.owns_square(sq("C5")));
        assert!(Side::North.owns_square(sq("C5")));
        assert_eq!(Side::South.resurrection_rank(), 7);
        assert_eq!(Side::North.resurrection_rank(), 0);
        assert_eq!(Side::North.ranks_advanced(sq("B6")), 2);
    }

    #[test]
    fn test_place_checks_half_and_occupancy() {
        let mut board = Board::new();
        let triangle = Counter::new(Side::South, Shape::Triangle, Strength::Weak);
        assert!(matches!(
            board.place(triangle, sq("A5")),
            Err(GameError::IllegalPlacement(_))
        ));
        board.place(triangle, sq("A2")).unwrap();

        let square = Counter::new(Side::South, Shape::Square, Strength::Weak);
        assert_eq!(
            board.place(square, sq("A2")),
            Err(GameError::OccupiedSquare(sq("A2")))
        );
        assert_eq!(board.find(Side::South, Shape::Triangle), Some(sq("A2")));
    }

    #[test]
    fn test_move_one_step_in_any_direction() {
        let mut board = Board::new();
        let rect = Counter::new(Side::North, Shape::Rectangle, Strength::Strong);
        board.place(rect, sq("D5")).unwrap();

        assert_eq!(
            board.move_counter(Side::North, sq("D5"), sq("D7")),
            Err(GameError::NotAdjacent {
                from: sq("D5"),
                to: sq("D7")
            })
        );
        assert_eq!(
            board.move_counter(Side::South, sq("D5"), sq("D4")),
            Err(GameError::OutOfTurn(sq("D5")))
        );

        board.move_counter(Side::North, sq("D5"), sq("C4")).unwrap();
        assert_eq!(board.occupant(sq("C4")), Some(rect));
        assert!(!board.is_occupied(sq("D5")));
    }

    #[test]
    fn test_move_onto_occupied_square() {
        let mut board = Board::new();
        board
            .place(Counter::new(Side::South, Shape::Square, Strength::Strong), sq("E3"))
            .unwrap();
        board
            .place(Counter::new(Side::South, Shape::Triangle, Strength::Weak), sq("E4"))
            .unwrap();
        assert_eq!(
            board.move_counter(Side::South, sq("E3"), sq("E4")),
            Err(GameError::OccupiedSquare(sq("E4")))
        );
    }

    #[test]
    fn test_square_set_basics() {
        let set: SquareSet = [sq("A1"), sq("H8"), sq("A1")].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains(sq("H8")));
        assert!(!set.contains(sq("B1")));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![sq("A1"), sq("H8")]);
    }

    #[test]
    fn test_serde_square_as_string() {
        let json = serde_json::to_string(&sq("F6")).unwrap();
        assert_eq!(json, "\"F6\"");
        let back: Square = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sq("F6"));
        assert!(serde_json::from_str::<Square>("\"Z0\"").is_err());
    }
}
