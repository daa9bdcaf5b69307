use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;
use tracing::trace;

use crate::BoardOffset;
use crate::Level;
use crate::coords::BoardCoordinate;
use crate::quadtree;
use crate::quadtree::MAX_LEVEL;
use crate::quadtree::Node;
use crate::quadtree::NodeError;
use crate::quadtree::Quadrant;
use crate::quadtree::Quadrant::Northeast as NE;
use crate::quadtree::Quadrant::Northwest as NW;
use crate::quadtree::Quadrant::Southeast as SE;
use crate::quadtree::Quadrant::Southwest as SW;
use crate::quadtree::StepOptions;
use crate::rule_set::RuleError;
use crate::rule_set::RuleSet;

/// The smallest board that can be advanced. The step bottoms out on 4x4 blocks, which needs
/// three levels under the root.
pub const MIN_BOARD_DIMENSION: BoardOffset = 8;

/// The largest board a [`BoardOffset`] can address.
pub const MAX_BOARD_DIMENSION: BoardOffset = 1 << MAX_LEVEL;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("Board dimension {dimension} is not a power of two")]
    NotPowerOfTwo { dimension: BoardOffset },

    #[error("Board dimension {dimension} is smaller than the minimum of {min}")]
    TooSmall {
        dimension: BoardOffset,
        min: BoardOffset,
    },

    #[error("Coordinate {coordinate} is outside of the {dimension}x{dimension} board")]
    OutOfBounds {
        coordinate: BoardCoordinate,
        dimension: BoardOffset,
    },

    #[error("Invalid block: {0}")]
    Block(#[from] NodeError),

    #[error("Invalid rule: {0}")]
    Rule(#[from] RuleError),
}

/// A square Game of Life board, `dimension` cells on a side.
///
/// The board wraps around: cells on the east edge neighbor cells on the west edge, and cells on
/// the north edge neighbor cells on the south edge.
pub struct GameBoard {
    /// Side length. Always a power of two
    dimension: BoardOffset,

    /// Level of `root`, `log2(dimension)`
    max_level: Level,

    /// The whole board. Replaced, never modified, by every update
    root: Arc<Node>,

    options: StepOptions,

    /// Number of generations simulated so far
    generation: u64,
}

impl GameBoard {
    /// Create an empty board `dimension` cells on a side, running Conway's Game of Life.
    pub fn new(dimension: BoardOffset) -> Result<Self, BoardError> {
        Self::with_options(dimension, StepOptions::default())
    }

    /// Create an empty board running the life-like rule described by `rule`, such as `"B36/S23"`.
    pub fn with_rule(dimension: BoardOffset, rule: &str) -> Result<Self, BoardError> {
        let rule: RuleSet = rule.parse()?;

        Self::with_options(
            dimension,
            StepOptions {
                rule,
                ..StepOptions::default()
            },
        )
    }

    pub fn with_options(dimension: BoardOffset, options: StepOptions) -> Result<Self, BoardError> {
        if !dimension.is_power_of_two() {
            return Err(BoardError::NotPowerOfTwo { dimension });
        }

        if dimension < MIN_BOARD_DIMENSION {
            return Err(BoardError::TooSmall {
                dimension,
                min: MIN_BOARD_DIMENSION,
            });
        }

        Ok(Self::build(dimension, options))
    }

    /// Create an empty board of [`MAX_BOARD_DIMENSION`].
    pub fn max_size() -> Self {
        Self::build(MAX_BOARD_DIMENSION, StepOptions::default())
    }

    fn build(dimension: BoardOffset, options: StepOptions) -> Self {
        let max_level = dimension.trailing_zeros() as Level;

        debug!(dimension, max_level, rule = %options.rule, "Creating board");

        Self {
            dimension,
            max_level,
            root: Node::blank(max_level),
            options,
            generation: 0,
        }
    }

    pub fn dimension(&self) -> BoardOffset {
        self.dimension
    }

    pub fn max_level(&self) -> Level {
        self.max_level
    }

    /// The current state of the whole board. Holding on to it keeps this generation around.
    pub fn root(&self) -> &Arc<Node> {
        &self.root
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn rule(&self) -> RuleSet {
        self.options.rule
    }

    /// Choose whether generations are computed on the rayon thread pool. The result is the same
    /// either way.
    pub fn set_parallel(&mut self, parallel: bool) {
        self.options.parallel = parallel;
    }

    /// Whether every cell on the board is dead
    pub fn is_empty(&self) -> bool {
        !self.root.is_alive()
    }

    pub fn set_cell_alive(&mut self, coordinate: BoardCoordinate) -> Result<(), BoardError> {
        self.check_bounds(coordinate)?;

        trace!(%coordinate, "Setting cell alive");
        self.root = self.root.set_cell_alive(coordinate.x, coordinate.y);

        Ok(())
    }

    /// Set every cell in `cells` alive. If any of them is off the board, none are set.
    pub fn set_cells<I>(&mut self, cells: I) -> Result<(), BoardError>
    where
        I: IntoIterator<Item = BoardCoordinate>,
    {
        let mut root = Arc::clone(&self.root);

        for coordinate in cells {
            self.check_bounds(coordinate)?;
            root = root.set_cell_alive(coordinate.x, coordinate.y);
        }

        self.root = root;

        Ok(())
    }

    pub fn is_cell_alive(&self, coordinate: BoardCoordinate) -> Result<bool, BoardError> {
        self.check_bounds(coordinate)?;

        Ok(self.root.is_cell_alive(coordinate.x, coordinate.y))
    }

    /// The block `dimension` cells on a side containing `coordinate`.
    pub fn block_containing(
        &self,
        dimension: BoardOffset,
        coordinate: BoardCoordinate,
    ) -> Result<Arc<Node>, BoardError> {
        self.check_bounds(coordinate)?;

        let block = self
            .root
            .block_containing(dimension, coordinate.x, coordinate.y)?;

        Ok(block)
    }

    /// Every live cell of the block `dimension` cells on a side containing `coordinate`, in the
    /// block's own coordinates.
    pub fn live_cells_in_block(
        &self,
        dimension: BoardOffset,
        coordinate: BoardCoordinate,
    ) -> Result<Vec<BoardCoordinate>, BoardError> {
        Ok(self.block_containing(dimension, coordinate)?.live_cells())
    }

    /// Draw the block `dimension` cells on a side containing `coordinate`. See [`Node`]'s
    /// `Display` for the format.
    pub fn block_string(
        &self,
        dimension: BoardOffset,
        coordinate: BoardCoordinate,
    ) -> Result<String, BoardError> {
        Ok(self.block_containing(dimension, coordinate)?.to_string())
    }

    /// Draw the whole board.
    pub fn board_string(&self) -> String {
        self.root.to_string()
    }

    /// Advance the whole board by one generation.
    ///
    /// A node can only advance its own center. So for each quadrant of the board we build a
    /// board-sized tree with that quadrant in the middle, advance that, and put the four
    /// results back together.
    pub fn simulate_next_generation(&mut self) {
        if self.root.is_alive() {
            let options = self.options;
            let next = quadtree::fan_out(options.parallel, |quadrant| {
                self.centered_on(quadrant).step(&options)
            });

            self.root = Node::join(self.max_level, next);
        }

        self.generation += 1;

        debug!(
            generation = self.generation,
            alive = self.root.is_alive(),
            "Advanced board"
        );
    }

    /// Advance the whole board by `n` generations.
    pub fn simulate_generations(&mut self, n: u64) {
        for _ in 0..n {
            self.simulate_next_generation();
        }
    }

    /// Constructs a board-sized tree with the root's `target` quadrant at its center.
    ///
    /// The ring around it is made of the neighboring quadrants, wrapped around the edges of the
    /// board: the horizontal opposite of `target` supplies its east and west neighbors, the
    /// vertical opposite its north and south neighbors, and the diagonal opposite its corners.
    pub fn centered_on(&self, target: Quadrant) -> Arc<Node> {
        let root = &self.root;

        let main = root.quadrant(target);
        let horizontal = root.quadrant(target.horizontal_opposite());
        let vertical = root.quadrant(target.vertical_opposite());
        let diagonal = root.quadrant(target.diagonal_opposite());

        let level = self.max_level - 1;

        let nw = Node::join(
            level,
            [
                diagonal.quadrant(SE).clone(),
                vertical.quadrant(SW).clone(),
                horizontal.quadrant(NE).clone(),
                main.quadrant(NW).clone(),
            ],
        );

        let ne = Node::join(
            level,
            [
                vertical.quadrant(SE).clone(),
                diagonal.quadrant(SW).clone(),
                main.quadrant(NE).clone(),
                horizontal.quadrant(NW).clone(),
            ],
        );

        let sw = Node::join(
            level,
            [
                horizontal.quadrant(SE).clone(),
                main.quadrant(SW).clone(),
                diagonal.quadrant(NE).clone(),
                vertical.quadrant(NW).clone(),
            ],
        );

        let se = Node::join(
            level,
            [
                main.quadrant(SE).clone(),
                horizontal.quadrant(SW).clone(),
                vertical.quadrant(NE).clone(),
                diagonal.quadrant(NW).clone(),
            ],
        );

        Node::join(self.max_level, [nw, ne, sw, se])
    }

    fn check_bounds(&self, coordinate: BoardCoordinate) -> Result<(), BoardError> {
        if coordinate.x >= self.dimension || coordinate.y >= self.dimension {
            return Err(BoardError::OutOfBounds {
                coordinate,
                dimension: self.dimension,
            });
        }

        Ok(())
    }
}

impl fmt::Display for GameBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.root, f)
    }
}

impl fmt::Debug for GameBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameBoard")
            .field("dimension", &self.dimension)
            .field("max_level", &self.max_level)
            .field("rule", &self.options.rule)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}
