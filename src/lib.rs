pub mod board;
pub mod coords;
pub mod quadtree;
pub mod rule_set;

mod parse_util;

pub use board::GameBoard;

/// Depth of a node in the tree. A node at level `n` is `2^n` cells on a side.
pub type Level = u8;

/// A cell coordinate, or a block dimension, along one axis of the board.
pub type BoardOffset = u64;
