use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::parse_util;
use crate::parse_util::ParseError;

/// The 3x3 neighborhood of bit 5 in a row-major 4x4 block, without bit 5 itself.
const NBHD_MASK: u16 = 0b0000_0111_0101_0111;
const CELL_MASK: u16 = 0b0000_0000_0010_0000;

/// Offsets from `CELL_MASK` of the four interior cells of a 4x4 block.
///
/// Goes: bottom right, bottom left, top right, top left
const INTERIOR_SHIFTS: [u16; 4] = [0, 1, 4, 5];

/// Rules of Conway's Game of Life.
pub const B3S23: RuleSet = RuleSet::new(0b1000, 0b1100);

/// # Representation
/// Life rules are represented as
/// ```notrust
/// |------birth------|
/// 0000_0000_0000_0000_0000_0000_0000_0000
///                     |----survival-----|
/// ```
///
/// # Examples
/// ```notrust
/// b3s23:                0000_0000_0000_1000_0000_0000_0000_1100
///
/// b0s0:                 0000_0000_0000_0000_0000_0000_0000_0000
/// b012345678s012345678: 0000_0001_1111_1111_0000_0001_1111_1111
/// ```
///
/// See: https://conwaylife.com/wiki/Rulestring
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleSet {
    rule: u32,
}

impl Default for RuleSet {
    fn default() -> Self {
        B3S23
    }
}

impl RuleSet {
    /// Create a new `RuleSet` for the given births and survivals. For both `b` and
    /// `s`, numbers are set on a bit basis. For instance if bit `i` in `b` is on, it
    /// means `i` is included in the set of births. Any bit past the 8th is ignored.
    pub const fn new(b: u16, s: u16) -> Self {
        let b = b & 0x1FF;
        let s = s & 0x1FF;

        Self {
            rule: (b as u32) << 16 | s as u32,
        }
    }

    pub fn births(&self) -> u16 {
        ((self.rule & 0x1FF0000) >> 0x10) as u16
    }

    pub fn survivals(&self) -> u16 {
        (self.rule & 0x1FF) as u16
    }

    /// Whether a cell is alive in the next generation, given its current state and the number
    /// of live cells among its eight neighbors.
    pub fn is_alive_next(&self, alive: bool, neighbors: u32) -> bool {
        let mask = if alive {
            self.survivals()
        } else {
            self.births()
        };

        neighbors <= 8 && mask & (1 << neighbors) != 0
    }

    /// Advance the interior 2x2 of a 4x4 block by one generation.
    ///
    /// `block` holds the 16 cells in row-major order starting from the northwest corner, so
    /// cell `(x, y)` lives at bit `15 - (4 * y + x)`. The result uses the same layout, with
    /// only the bits of the four interior cells (10, 9, 6 and 5) possibly set.
    pub fn next(&self, block: u16) -> u16 {
        let mut res: u16 = 0;

        for shift in INTERIOR_SHIFTS {
            let nbhd_mask = NBHD_MASK << shift;
            let cell_mask = CELL_MASK << shift;

            let alive = block & cell_mask != 0;
            let neighbors = (block & nbhd_mask).count_ones();

            if self.is_alive_next(alive, neighbors) {
                res |= cell_mask;
            }
        }

        res
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RuleSet({self})")
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let digits = |mask: u16| -> String {
            (0..=8)
                .filter(|n| mask & (1 << n) != 0)
                .map(|n| char::from(b'0' + n as u8))
                .collect()
        };

        write!(f, "B{}/S{}", digits(self.births()), digits(self.survivals()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rule must start with 'B' followed by the birth counts")]
    MissingBirths,

    #[error("Rule must contain 'S' followed by the survival counts")]
    MissingSurvivals,

    #[error("Neighbor count {count} is out of range, expected 0 through 8")]
    InvalidCount { count: u8 },

    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),
}

/// Parses rulestrings such as `B3/S23`, `b36/s23` or `b3s23`.
impl FromStr for RuleSet {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = parse_util::take_ws(s.as_bytes());

        let (Some(b'b' | b'B'), bytes) = parse_util::take_1(bytes) else {
            return Err(RuleError::MissingBirths);
        };
        let (b, bytes) = parse_util::take_while_fn(|b| b.is_ascii_digit(), bytes);

        let bytes = parse_util::skip(b'/', bytes);

        let (Some(b's' | b'S'), bytes) = parse_util::take_1(bytes) else {
            return Err(RuleError::MissingSurvivals);
        };
        let (s, bytes) = parse_util::take_while_fn(|b| b.is_ascii_digit(), bytes);

        parse_util::expect_end(bytes)?;

        Ok(RuleSet::new(bytes_to_num(b)?, bytes_to_num(s)?))
    }
}

/// Convert the human readable birth/survival counts to a packed bit representation
fn bytes_to_num(bytes: &[u8]) -> Result<u16, RuleError> {
    let mut n = 0;

    for &b in bytes {
        let count = b - b'0';
        if count > 8 {
            return Err(RuleError::InvalidCount { count });
        }

        n |= 1 << count;
    }

    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pack a 4x4 picture (`#` alive) into the row-major layout used by `RuleSet::next`.
    fn block(rows: [&str; 4]) -> u16 {
        rows.iter()
            .flat_map(|row| row.bytes())
            .fold(0, |acc, b| (acc << 1) | u16::from(b == b'#'))
    }

    #[test]
    fn parse_common_forms() {
        assert_eq!("B3/S23".parse::<RuleSet>(), Ok(B3S23));
        assert_eq!("b3s23".parse::<RuleSet>(), Ok(B3S23));
        assert_eq!(" b3/s23\n".parse::<RuleSet>(), Ok(B3S23));

        let highlife: RuleSet = "B36/S23".parse().unwrap();
        assert_eq!(highlife.births(), 0b100_1000);
        assert_eq!(highlife.survivals(), 0b1100);
    }

    #[test]
    fn parse_empty_counts() {
        let rule: RuleSet = "B/S".parse().unwrap();

        assert_eq!(rule.births(), 0);
        assert_eq!(rule.survivals(), 0);
    }

    #[test]
    fn parse_errors() {
        assert_eq!("S23".parse::<RuleSet>(), Err(RuleError::MissingBirths));
        assert_eq!("B3".parse::<RuleSet>(), Err(RuleError::MissingSurvivals));
        assert_eq!(
            "B9/S23".parse::<RuleSet>(),
            Err(RuleError::InvalidCount { count: 9 })
        );
        assert!(matches!(
            "B3/S23x".parse::<RuleSet>(),
            Err(RuleError::ParseError(_))
        ));
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(B3S23.to_string(), "B3/S23");

        let rule: RuleSet = "b36s23".parse().unwrap();
        assert_eq!(rule.to_string(), "B36/S23");
    }

    #[test]
    fn conway_rule() {
        assert!(B3S23.is_alive_next(false, 3));
        assert!(B3S23.is_alive_next(true, 2));
        assert!(B3S23.is_alive_next(true, 3));
        assert!(!B3S23.is_alive_next(false, 2));
        assert!(!B3S23.is_alive_next(true, 4));
        assert!(!B3S23.is_alive_next(true, 1));
    }

    #[test]
    fn next_empty_block() {
        assert_eq!(B3S23.next(0), 0);
    }

    #[test]
    fn next_keeps_square() {
        let square = block(["....", ".##.", ".##.", "...."]);

        assert_eq!(B3S23.next(square), square);
    }

    #[test]
    fn next_rotates_bar() {
        let vertical = block(["..#.", "..#.", "..#.", "...."]);

        // Only the interior cells are computed: (1, 1) is born, (2, 1) survives
        let want = block(["....", ".##.", "....", "...."]);

        assert_eq!(B3S23.next(vertical), want);
    }

    #[test]
    fn next_only_sets_interior_bits() {
        let interior = block(["....", ".##.", ".##.", "...."]);

        for cells in [u16::MAX, 0b1010_0101_1010_0101, 0b0001_0000_0000_1000] {
            assert_eq!(B3S23.next(cells) & !interior, 0);
        }
    }
}
