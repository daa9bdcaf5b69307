use std::sync::Arc;

use thiserror::Error;

use crate::BoardOffset;
use crate::Level;

pub use crate::quadtree::node::Node;
pub use crate::quadtree::step::StepOptions;

mod node;
mod render;
mod step;

/// The deepest level a node can have. A node at this level is `2^63` cells on a side, the largest
/// power of two a [`BoardOffset`] can hold.
pub const MAX_LEVEL: Level = 63;

/// One of the four children of a [`Node`].
///
/// North is toward `y = 0` and west is toward `x = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Quadrant {
    Northwest = 0,
    Northeast = 1,
    Southwest = 2,
    Southeast = 3,
}

impl Quadrant {
    /// Every quadrant, in child order
    pub const ALL: [Quadrant; 4] = [
        Quadrant::Northwest,
        Quadrant::Northeast,
        Quadrant::Southwest,
        Quadrant::Southeast,
    ];

    /// The quadrant to the left or right of this one.
    pub const fn horizontal_opposite(self) -> Self {
        match self {
            Quadrant::Northwest => Quadrant::Northeast,
            Quadrant::Northeast => Quadrant::Northwest,
            Quadrant::Southwest => Quadrant::Southeast,
            Quadrant::Southeast => Quadrant::Southwest,
        }
    }

    /// The quadrant above or below this one.
    pub const fn vertical_opposite(self) -> Self {
        match self {
            Quadrant::Northwest => Quadrant::Southwest,
            Quadrant::Northeast => Quadrant::Southeast,
            Quadrant::Southwest => Quadrant::Northwest,
            Quadrant::Southeast => Quadrant::Northeast,
        }
    }

    /// The quadrant across the center from this one.
    pub const fn diagonal_opposite(self) -> Self {
        match self {
            Quadrant::Northwest => Quadrant::Southeast,
            Quadrant::Northeast => Quadrant::Southwest,
            Quadrant::Southwest => Quadrant::Northeast,
            Quadrant::Southeast => Quadrant::Northwest,
        }
    }

    /// Local coordinate of this quadrant's northwest corner, for quadrants `half` cells wide.
    pub const fn origin(self, half: BoardOffset) -> (BoardOffset, BoardOffset) {
        match self {
            Quadrant::Northwest => (0, 0),
            Quadrant::Northeast => (half, 0),
            Quadrant::Southwest => (0, half),
            Quadrant::Southeast => (half, half),
        }
    }
}

/// Resolve which quadrant of a `2^level` block holds the local coordinate `(x, y)`, along with
/// the coordinate translated into that quadrant's own frame.
///
/// Every descent through the tree goes through here, so that all of them agree on where the
/// quadrant boundaries are.
pub fn locate(level: Level, x: BoardOffset, y: BoardOffset) -> (Quadrant, BoardOffset, BoardOffset) {
    debug_assert!(level > 0, "a leaf has no quadrants");

    let half: BoardOffset = 1 << (level - 1);

    match (x < half, y < half) {
        (true, true) => (Quadrant::Northwest, x, y),
        (false, true) => (Quadrant::Northeast, x - half, y),
        (true, false) => (Quadrant::Southwest, x, y - half),
        (false, false) => (Quadrant::Southeast, x - half, y - half),
    }
}

/// Compute `f` for every quadrant. With `parallel`, the four calls are forked onto the rayon pool
/// and joined before returning; otherwise they run in order on the current thread. The result is
/// the same either way.
pub(crate) fn fan_out<F>(parallel: bool, f: F) -> [Arc<Node>; 4]
where
    F: Fn(Quadrant) -> Arc<Node> + Sync,
{
    if !parallel {
        return Quadrant::ALL.map(&f);
    }

    let ((nw, ne), (sw, se)) = rayon::join(
        || rayon::join(|| f(Quadrant::Northwest), || f(Quadrant::Northeast)),
        || rayon::join(|| f(Quadrant::Southwest), || f(Quadrant::Southeast)),
    );

    [nw, ne, sw, se]
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    #[error("A level 0 node is a leaf and cannot have children")]
    LeafWithChildren,

    #[error("Level {level} is deeper than the maximum level {max}")]
    LevelTooDeep { level: Level, max: Level },

    #[error("{quadrant:?} child is at level {found}, expected level {expected}")]
    LevelMismatch {
        quadrant: Quadrant,
        expected: Level,
        found: Level,
    },

    #[error("Block dimension {dimension} is not a power of two")]
    NotPowerOfTwo { dimension: u64 },

    #[error("Block dimension {dimension} exceeds the node dimension {node_dimension}")]
    BlockTooLarge { dimension: u64, node_dimension: u64 },

    #[error("A level {level} node is too small to advance, at least level 2 is required")]
    TooShallow { level: Level },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locate_splits_on_half() {
        // 8x8 block, quadrants are 4x4
        assert_eq!(locate(3, 0, 0), (Quadrant::Northwest, 0, 0));
        assert_eq!(locate(3, 3, 3), (Quadrant::Northwest, 3, 3));
        assert_eq!(locate(3, 4, 0), (Quadrant::Northeast, 0, 0));
        assert_eq!(locate(3, 2, 5), (Quadrant::Southwest, 2, 1));
        assert_eq!(locate(3, 7, 7), (Quadrant::Southeast, 3, 3));
    }

    #[test]
    fn locate_inverts_origin() {
        for quadrant in Quadrant::ALL {
            let (x, y) = quadrant.origin(4);

            assert_eq!(locate(3, x + 1, y + 2), (quadrant, 1, 2));
        }
    }

    #[test]
    fn opposites_are_involutions() {
        for quadrant in Quadrant::ALL {
            assert_eq!(quadrant.horizontal_opposite().horizontal_opposite(), quadrant);
            assert_eq!(quadrant.vertical_opposite().vertical_opposite(), quadrant);
            assert_eq!(quadrant.diagonal_opposite().diagonal_opposite(), quadrant);

            assert_eq!(
                quadrant.horizontal_opposite().vertical_opposite(),
                quadrant.diagonal_opposite()
            );
        }
    }

    #[test]
    fn fan_out_is_order_independent() {
        let f = |q: Quadrant| Node::leaf(matches!(q, Quadrant::Northeast | Quadrant::Southwest));

        let sequential = fan_out(false, f);
        let parallel = fan_out(true, f);

        for (a, b) in sequential.iter().zip(&parallel) {
            assert!(Arc::ptr_eq(a, b));
        }
        assert!(sequential[1].is_alive());
        assert!(!sequential[3].is_alive());
    }
}
