use std::fmt;
use std::fmt::Write;

use crate::BoardOffset;
use crate::coords::BoardCoordinate;
use crate::quadtree::Node;
use crate::quadtree::Quadrant;

const ALIVE: char = 'A';
const DEAD: char = '.';

impl Node {
    /// Local coordinates of every live cell in this block, in row-major order.
    ///
    /// Dead subtrees are skipped entirely, so this is cheap on sparse blocks.
    pub fn live_cells(&self) -> Vec<BoardCoordinate> {
        let mut cells = Vec::new();
        self.collect_live_cells(0, 0, &mut cells);

        cells.sort_by_key(|c| (c.y, c.x));
        cells
    }

    fn collect_live_cells(&self, dx: BoardOffset, dy: BoardOffset, cells: &mut Vec<BoardCoordinate>) {
        if !self.is_alive() {
            return;
        }

        let Some(children) = self.children() else {
            cells.push(BoardCoordinate::new(dx, dy));
            return;
        };

        let half = self.dimension() / 2;

        for quadrant in Quadrant::ALL {
            let (x, y) = quadrant.origin(half);
            children[quadrant as usize].collect_live_cells(dx + x, dy + y, cells);
        }
    }
}

/// Draws the block as a grid, one line per row from north to south. Live cells are `A` and dead
/// cells are `.`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.dimension();

        for y in 0..n {
            for x in 0..n {
                f.write_char(if self.is_cell_alive(x, y) { ALIVE } else { DEAD })?;
            }

            f.write_char('\n')?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn leaf_strings() {
        assert_eq!(Node::leaf(true).to_string(), "A\n");
        assert_eq!(Node::leaf(false).to_string(), ".\n");
    }

    #[test]
    fn draw_4x4() {
        let node = Node::empty(2).unwrap().set_cell_alive(1, 0).set_cell_alive(3, 2);

        assert_eq!(node.to_string(), ".A..\n....\n...A\n....\n");
    }

    #[test]
    fn live_cells_are_row_major() {
        let node: Arc<Node> = [(6, 1), (1, 6), (2, 1), (5, 5)]
            .iter()
            .fold(Node::empty(3).unwrap(), |node, &(x, y)| node.set_cell_alive(x, y));

        let want: Vec<_> = [(2, 1), (6, 1), (5, 5), (1, 6)]
            .iter()
            .map(|&(x, y)| BoardCoordinate::new(x, y))
            .collect();

        assert_eq!(node.live_cells(), want);
    }

    #[test]
    fn live_cells_of_empty() {
        assert!(Node::empty(10).unwrap().live_cells().is_empty());
        assert_eq!(Node::leaf(true).live_cells(), vec![BoardCoordinate::new(0, 0)]);
    }
}
