use std::collections::HashSet;
use std::fmt;

use tracing::trace;

use crate::BoardOffset;

/// One cell on the board, or inside a block, depending on who is asking.
///
/// `x` grows to the east and `y` grows to the south, with `(0, 0)` at the northwest corner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoardCoordinate {
    pub x: BoardOffset,
    pub y: BoardOffset,
}

impl BoardCoordinate {
    pub const fn new(x: BoardOffset, y: BoardOffset) -> Self {
        Self { x, y }
    }
}

impl From<(BoardOffset, BoardOffset)> for BoardCoordinate {
    fn from((x, y): (BoardOffset, BoardOffset)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for BoardCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Parse a list of coordinates, one `(x,y)` per line.
///
/// Parentheses are optional and whitespace around the numbers is ignored. Only the first two
/// comma separated fields are read. Lines whose first two fields aren't non-negative integers are
/// skipped, and repeated coordinates are only kept the first time they appear.
pub fn parse_coordinates(source: &str) -> Vec<BoardCoordinate> {
    let mut seen = HashSet::new();
    let mut coordinates = Vec::new();

    for line in source.lines() {
        let Some(coordinate) = parse_line(line) else {
            if !line.trim().is_empty() {
                trace!(line, "Skipping unparseable coordinate");
            }

            continue;
        };

        if seen.insert(coordinate) {
            coordinates.push(coordinate);
        }
    }

    coordinates
}

fn parse_line(line: &str) -> Option<BoardCoordinate> {
    let line = line.replace(['(', ')'], " ");
    let mut fields = line.split(',');

    let x = fields.next()?.trim().parse().ok()?;
    let y = fields.next()?.trim().parse().ok()?;

    Some(BoardCoordinate::new(x, y))
}
