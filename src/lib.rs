pub mod arena;
pub mod board;
pub mod bot;
pub mod error;
pub mod game;
pub mod geometry;
pub mod lifecycle;
pub mod resolver;
pub mod resurrection;

pub use arena::*;
pub use board::*;
pub use bot::*;
pub use error::*;
pub use game::*;
