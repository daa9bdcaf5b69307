use std::fmt;
use std::sync::Arc;
use std::sync::LazyLock;

use tracing::warn;

use crate::BoardOffset;
use crate::Level;
use crate::quadtree::MAX_LEVEL;
use crate::quadtree::NodeError;
use crate::quadtree::Quadrant;
use crate::quadtree::locate;

/// The canonical live cell. Every live leaf in every tree is this one allocation.
static LIVE_LEAF: LazyLock<Arc<Node>> =
    LazyLock::new(|| Arc::new(Node(Repr::Leaf { alive: true })));

/// The canonical dead cell.
static DEAD_LEAF: LazyLock<Arc<Node>> =
    LazyLock::new(|| Arc::new(Node(Repr::Leaf { alive: false })));

/// An immutable square block of cells, `2^level` on a side.
///
/// Nodes are only ever handed out behind an [`Arc`] and never change once built. Updates create
/// new nodes along the path to the change and share everything else, so any number of trees (and
/// threads) can hold on to the same subtrees.
///
/// The only ways to get a node are [`Node::leaf`], [`Node::empty`] and [`Node::with_children`]:
///
/// ```compile_fail
/// use quadlife::quadtree::Node;
///
/// let leaf = Node::Leaf { alive: true };
/// ```
pub struct Node(Repr);

enum Repr {
    /// A single cell. There are only two of these, see [`Node::leaf`].
    Leaf { alive: bool },

    /// A block split into four blocks one level down, indexed by [`Quadrant`].
    Branch {
        level: Level,

        /// Whether any cell inside this block is alive
        alive: bool,

        children: [Arc<Node>; 4],
    },
}

impl Node {
    /// Return the canonical leaf for `alive`. This never allocates.
    pub fn leaf(alive: bool) -> Arc<Node> {
        if alive {
            Arc::clone(&*LIVE_LEAF)
        } else {
            Arc::clone(&*DEAD_LEAF)
        }
    }

    /// Create a node full of dead cells at level `levels`.
    ///
    /// All four children of every node in the result are the same instance, so this allocates
    /// one node per level.
    pub fn empty(levels: Level) -> Result<Arc<Node>, NodeError> {
        if levels > MAX_LEVEL {
            return Err(NodeError::LevelTooDeep {
                level: levels,
                max: MAX_LEVEL,
            });
        }

        Ok(Node::blank(levels))
    }

    /// Like [`Node::empty`], for callers that already know `levels` is in range.
    pub(crate) fn blank(levels: Level) -> Arc<Node> {
        debug_assert!(levels <= MAX_LEVEL, "level {levels} is too deep");

        let mut node = Node::leaf(false);

        for level in 1..=levels {
            node = Node::join(level, [node.clone(), node.clone(), node.clone(), node]);
        }

        node
    }

    /// Create a node at `level` out of four children at `level - 1`.
    pub fn with_children(
        level: Level,
        nw: Arc<Node>,
        ne: Arc<Node>,
        sw: Arc<Node>,
        se: Arc<Node>,
    ) -> Result<Arc<Node>, NodeError> {
        if level == 0 {
            return Err(NodeError::LeafWithChildren);
        }

        if level > MAX_LEVEL {
            return Err(NodeError::LevelTooDeep {
                level,
                max: MAX_LEVEL,
            });
        }

        let children = [nw, ne, sw, se];

        for (quadrant, child) in Quadrant::ALL.into_iter().zip(&children) {
            if child.level() != level - 1 {
                return Err(NodeError::LevelMismatch {
                    quadrant,
                    expected: level - 1,
                    found: child.level(),
                });
            }
        }

        Ok(Node::join(level, children))
    }

    /// Like [`Node::with_children`], for callers that already know the levels line up.
    pub(crate) fn join(level: Level, children: [Arc<Node>; 4]) -> Arc<Node> {
        debug_assert!(
            level > 0 && children.iter().all(|child| child.level() + 1 == level),
            "children of a level {level} node must be at level {}",
            level.wrapping_sub(1)
        );

        let alive = children.iter().any(|child| child.is_alive());

        Arc::new(Node(Repr::Branch {
            level,
            alive,
            children,
        }))
    }

    pub fn level(&self) -> Level {
        match &self.0 {
            Repr::Leaf { .. } => 0,
            Repr::Branch { level, .. } => *level,
        }
    }

    /// For a leaf, whether the cell is alive. Otherwise, whether any cell in the block is alive.
    pub fn is_alive(&self) -> bool {
        match &self.0 {
            Repr::Leaf { alive } | Repr::Branch { alive, .. } => *alive,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.0, Repr::Leaf { .. })
    }

    /// Side length of the block
    pub fn dimension(&self) -> BoardOffset {
        1 << self.level()
    }

    /// The four children in [`Quadrant`] order, or `None` for a leaf.
    pub fn children(&self) -> Option<&[Arc<Node>; 4]> {
        match &self.0 {
            Repr::Leaf { .. } => None,
            Repr::Branch { children, .. } => Some(children),
        }
    }

    pub fn child(&self, quadrant: Quadrant) -> Option<&Arc<Node>> {
        self.children().map(|children| &children[quadrant as usize])
    }

    /// The child at `quadrant`. Only meaningful on branches; a leaf answers with a dead cell.
    pub(crate) fn quadrant(&self, quadrant: Quadrant) -> &Arc<Node> {
        debug_assert!(!self.is_leaf(), "a leaf has no {quadrant:?} child");

        match &self.0 {
            Repr::Branch { children, .. } => &children[quadrant as usize],
            Repr::Leaf { .. } => {
                warn!(?quadrant, "Asked a leaf for a child");
                &*DEAD_LEAF
            }
        }
    }

    /// Whether the cell at local coordinate `(x, y)` is alive.
    ///
    /// A leaf answers with its own state whatever the coordinate, so queries are total.
    pub fn is_cell_alive(&self, x: BoardOffset, y: BoardOffset) -> bool {
        let (mut node, mut x, mut y) = (self, x, y);

        loop {
            match &node.0 {
                Repr::Leaf { alive } => return *alive,

                // nothing alive down there
                Repr::Branch { alive: false, .. } => return false,

                Repr::Branch {
                    level, children, ..
                } => {
                    let (quadrant, cx, cy) = locate(*level, x, y);

                    node = children[quadrant as usize].as_ref();
                    (x, y) = (cx, cy);
                }
            }
        }
    }

    /// Returns a node that is the same as this one, but with the cell at local coordinate
    /// `(x, y)` alive.
    ///
    /// Only the nodes on the path down to the cell are rebuilt. Every other subtree of the
    /// result is shared with `self`.
    pub fn set_cell_alive(&self, x: BoardOffset, y: BoardOffset) -> Arc<Node> {
        match &self.0 {
            Repr::Leaf { .. } => {
                if x != 0 || y != 0 {
                    warn!(x, y, "Setting a cell at a non-zero coordinate of a leaf");
                }

                Node::leaf(true)
            }
            Repr::Branch {
                level, children, ..
            } => {
                let (quadrant, cx, cy) = locate(*level, x, y);

                let mut children = children.clone();
                let i = quadrant as usize;
                children[i] = children[i].set_cell_alive(cx, cy);

                Node::join(*level, children)
            }
        }
    }

    /// Returns the block `dimension` cells on a side that contains local coordinate `(x, y)`.
    ///
    /// The block is one of the nodes of this tree, not a copy.
    pub fn block_containing(
        self: &Arc<Self>,
        dimension: BoardOffset,
        x: BoardOffset,
        y: BoardOffset,
    ) -> Result<Arc<Node>, NodeError> {
        if !dimension.is_power_of_two() {
            return Err(NodeError::NotPowerOfTwo { dimension });
        }

        if dimension > self.dimension() {
            return Err(NodeError::BlockTooLarge {
                dimension,
                node_dimension: self.dimension(),
            });
        }

        let target = dimension.trailing_zeros() as Level;
        let (mut node, mut x, mut y) = (self, x, y);

        while node.level() > target {
            let (quadrant, cx, cy) = locate(node.level(), x, y);

            node = node.quadrant(quadrant);
            (x, y) = (cx, cy);
        }

        Ok(Arc::clone(node))
    }
}

impl PartialEq for Node {
    /// Two nodes are equal when they hold the same cells at the same level.
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }

        match (&self.0, &other.0) {
            (Repr::Leaf { alive: a }, Repr::Leaf { alive: b }) => a == b,
            (
                Repr::Branch {
                    level: la,
                    alive: aa,
                    children: ca,
                },
                Repr::Branch {
                    level: lb,
                    alive: ab,
                    children: cb,
                },
            ) => la == lb && aa == ab && (!*aa || ca == cb),
            _ => false,
        }
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Leaf { alive } => write!(f, "Leaf({})", if *alive { 'A' } else { '.' }),
            Repr::Branch { level, alive, .. } => {
                write!(f, "[level: {level}, alive: {alive}]")
            }
        }
    }
}
