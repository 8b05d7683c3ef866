//! Error types for the rules engine.

use crate::board::Square;
use thiserror::Error;

/// Every way a submitted command can be rejected.
///
/// All of these are local validation failures: the engine checks a command
/// completely before touching its state, so an `Err` leaves the game exactly
/// as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("position ({file}, {rank}) is off the board")]
    InvalidPosition { file: i32, rank: i32 },
    #[error("square {0} is already occupied")]
    OccupiedSquare(Square),
    #[error("{from} -> {to} is not a one-step move")]
    NotAdjacent { from: Square, to: Square },
    #[error("illegal placement: {0}")]
    IllegalPlacement(String),
    #[error("illegal action: {0}")]
    IllegalAction(String),
    #[error("illegal resurrection: {0}")]
    IllegalResurrection(String),
    #[error("invalid resurrection target {0}")]
    InvalidTarget(Square),
    #[error("no counter of the acting side on {0}")]
    OutOfTurn(Square),
}

pub type GameResult<T> = Result<T, GameError>;
