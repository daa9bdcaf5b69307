use std::sync::Arc;

use crate::Level;
use crate::quadtree::Node;
use crate::quadtree::NodeError;
use crate::quadtree::Quadrant::Northeast as NE;
use crate::quadtree::Quadrant::Northwest as NW;
use crate::quadtree::Quadrant::Southeast as SE;
use crate::quadtree::Quadrant::Southwest as SW;
use crate::quadtree::fan_out;
use crate::rule_set::RuleSet;

/// Below this level, splitting the work across threads costs more than it saves.
const PARALLEL_MIN_LEVEL: Level = 6;

/// How a generation is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOptions {
    pub rule: RuleSet,

    /// Advance independent quadrants on the rayon thread pool
    pub parallel: bool,
}

impl Default for StepOptions {
    fn default() -> Self {
        Self {
            rule: RuleSet::default(),
            parallel: true,
        }
    }
}

impl Node {
    /// Returns a node representing how the centered `2^(level - 1)` block of this node looks one
    /// generation from now, under the rules of Conway's Game of Life.
    ///
    /// Everything needed to compute the centered block is inside this node, so no neighbors are
    /// involved. Nodes below level 2 have no such block to compute.
    pub fn next_generation(&self) -> Result<Arc<Node>, NodeError> {
        self.next_generation_with(&StepOptions::default())
    }

    /// Like [`Node::next_generation`], with a custom rule and threading.
    pub fn next_generation_with(&self, options: &StepOptions) -> Result<Arc<Node>, NodeError> {
        if self.level() < 2 {
            return Err(NodeError::TooShallow {
                level: self.level(),
            });
        }

        Ok(self.step(options))
    }

    /// Constructs a node one level down out of the cells at the center of this node.
    pub fn centered_child(&self) -> Result<Arc<Node>, NodeError> {
        if self.level() < 2 {
            return Err(NodeError::TooShallow {
                level: self.level(),
            });
        }

        Ok(self.center())
    }

    /// Advance the centered block by one generation. `self` is at level 2 or more.
    pub(crate) fn step(&self, options: &StepOptions) -> Arc<Node> {
        let level = self.level();
        debug_assert!(level >= 2, "cannot step a level {level} node");

        // A dead neighborhood stays dead
        if !self.is_alive() {
            return Node::blank(level - 1);
        }

        if level == 2 {
            return self.step_4x4(&options.rule);
        }

        let (nw, ne, sw, se) = (
            self.quadrant(NW),
            self.quadrant(NE),
            self.quadrant(SW),
            self.quadrant(SE),
        );

        // Nine overlapping blocks at level - 2, covering everything but the outer ring of
        // `level - 3` blocks:
        //
        //  n00 n01 n02
        //  n10 n11 n12
        //  n20 n21 n22
        let n00 = nw.center();
        let n01 = h_center(nw, ne);
        let n02 = ne.center();
        let n10 = v_center(nw, sw);
        let n11 = self.super_center();
        let n12 = v_center(ne, se);
        let n20 = sw.center();
        let n21 = h_center(sw, se);
        let n22 = se.center();

        // Each of these has one quadrant of the result at its center
        let windows = [
            Node::join(level - 1, [n00, n01.clone(), n10.clone(), n11.clone()]),
            Node::join(level - 1, [n01, n02, n11.clone(), n12.clone()]),
            Node::join(level - 1, [n10, n11.clone(), n20, n21.clone()]),
            Node::join(level - 1, [n11, n12, n21, n22]),
        ];

        let parallel = options.parallel && level >= PARALLEL_MIN_LEVEL;
        let next = fan_out(parallel, |quadrant| windows[quadrant as usize].step(options));

        Node::join(level - 1, next)
    }

    /// Brute force the next generation of the inner 2x2 of a 4x4 node.
    fn step_4x4(&self, rule: &RuleSet) -> Arc<Node> {
        debug_assert_eq!(self.level(), 2);

        // Row-major from the northwest corner, so (x, y) ends up at bit 15 - (4y + x)
        let mut block: u16 = 0;
        for y in 0..4 {
            for x in 0..4 {
                block = (block << 1) | u16::from(self.is_cell_alive(x, y));
            }
        }

        let next = rule.next(block);
        let cell = |bit: u32| Node::leaf(next & (1 << bit) != 0);

        Node::join(1, [cell(10), cell(9), cell(6), cell(5)])
    }

    /// Given a `2^n` node, returns the `2^(n - 1)` node at its center
    fn center(&self) -> Arc<Node> {
        Node::join(
            self.level() - 1,
            [
                self.quadrant(NW).quadrant(SE).clone(),
                self.quadrant(NE).quadrant(SW).clone(),
                self.quadrant(SW).quadrant(NE).clone(),
                self.quadrant(SE).quadrant(NW).clone(),
            ],
        )
    }

    /// On a `2^n` node, this is its `2^(n - 2)` center
    fn super_center(&self) -> Arc<Node> {
        Node::join(
            self.level() - 2,
            [
                self.quadrant(NW).quadrant(SE).quadrant(SE).clone(),
                self.quadrant(NE).quadrant(SW).quadrant(SW).clone(),
                self.quadrant(SW).quadrant(NE).quadrant(NE).clone(),
                self.quadrant(SE).quadrant(NW).quadrant(NW).clone(),
            ],
        )
    }
}

/// Given two `2^n` nodes with `w` to the left and `e` to the right, this returns the
/// `2^(n - 1)` node centered on their boundary
fn h_center(w: &Node, e: &Node) -> Arc<Node> {
    Node::join(
        w.level() - 1,
        [
            w.quadrant(NE).quadrant(SE).clone(),
            e.quadrant(NW).quadrant(SW).clone(),
            w.quadrant(SE).quadrant(NE).clone(),
            e.quadrant(SW).quadrant(NW).clone(),
        ],
    )
}

/// Given two `2^n` nodes with `n` above and `s` below, this returns the `2^(n - 1)` node
/// centered on their boundary
fn v_center(n: &Node, s: &Node) -> Arc<Node> {
    Node::join(
        n.level() - 1,
        [
            n.quadrant(SW).quadrant(SE).clone(),
            n.quadrant(SE).quadrant(SW).clone(),
            s.quadrant(NW).quadrant(NE).clone(),
            s.quadrant(NE).quadrant(NW).clone(),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::coords::BoardCoordinate;

    fn node_with(level: Level, cells: &[(u64, u64)]) -> Arc<Node> {
        cells
            .iter()
            .fold(Node::empty(level).unwrap(), |node, &(x, y)| node.set_cell_alive(x, y))
    }

    /// Live cells of `node`, moved from its own frame into the frame of its centered block.
    fn centered_cells(node: &Node, cells: &[(u64, u64)]) -> Vec<BoardCoordinate> {
        let offset = node.dimension() / 4;
        let mut cells: Vec<_> = cells
            .iter()
            .map(|&(x, y)| BoardCoordinate::new(x - offset, y - offset))
            .collect();

        cells.sort_by_key(|c| (c.y, c.x));
        cells
    }

    #[test]
    fn too_shallow() {
        assert_eq!(
            Node::leaf(true).next_generation(),
            Err(NodeError::TooShallow { level: 0 })
        );
        assert_eq!(
            Node::empty(1).unwrap().next_generation(),
            Err(NodeError::TooShallow { level: 1 })
        );
        assert_eq!(
            Node::empty(1).unwrap().centered_child(),
            Err(NodeError::TooShallow { level: 1 })
        );
    }

    #[test]
    fn empty_stays_empty() {
        let next = Node::empty(5).unwrap().next_generation().unwrap();

        assert_eq!(next.level(), 4);
        assert!(!next.is_alive());
    }

    #[test]
    fn lone_cell_dies() {
        let node = node_with(3, &[(3, 4)]);

        let next = node.next_generation().unwrap();

        assert_eq!(next.level(), 2);
        assert!(!next.is_alive());
    }

    #[test]
    fn square_4x4() {
        let node = node_with(2, &[(1, 1), (2, 1), (1, 2), (2, 2)]);

        let next = node.next_generation().unwrap();

        assert_eq!(next.level(), 1);
        assert!(next.is_cell_alive(0, 0));
        assert!(next.is_cell_alive(1, 0));
        assert!(next.is_cell_alive(0, 1));
        assert!(next.is_cell_alive(1, 1));
    }

    #[test]
    fn blinker_in_16x16() {
        let vertical = [(7, 6), (7, 7), (7, 8)];
        let horizontal = [(6, 7), (7, 7), (8, 7)];
        let node = node_with(4, &vertical);

        let next = node.next_generation().unwrap();

        assert_eq!(next.level(), 3);
        assert_eq!(next.live_cells(), centered_cells(&node, &horizontal));
    }

    #[test]
    fn blinker_across_quadrants() {
        // straddles the vertical and horizontal center lines of the node
        let horizontal = [(15, 16), (16, 16), (17, 16)];
        let vertical = [(16, 15), (16, 16), (16, 17)];
        let node = node_with(5, &horizontal);

        let next = node.next_generation().unwrap();

        assert_eq!(next.live_cells(), centered_cells(&node, &vertical));
    }

    #[test]
    fn sequential_matches_parallel() {
        let cells = [(30, 30), (31, 31), (29, 32), (30, 32), (31, 32), (40, 20), (41, 20)];
        let node = node_with(6, &cells);

        let sequential = StepOptions {
            parallel: false,
            ..Default::default()
        };

        let a = node.next_generation_with(&sequential).unwrap();
        let b = node.next_generation().unwrap();

        assert_eq!(a, b);
        assert!(a.is_alive());
    }

    #[test]
    fn custom_rule() {
        // B1/S: every dead cell touching a live one is born, and nothing survives
        let rule = RuleSet::new(0b10, 0);
        let options = StepOptions {
            rule,
            parallel: false,
        };
        let node = node_with(3, &[(4, 4)]);

        let next = node.next_generation_with(&options).unwrap();

        let want = centered_cells(
            &node,
            &[
                (3, 3),
                (4, 3),
                (5, 3),
                (3, 4),
                (5, 4),
                (3, 5),
                (4, 5),
                (5, 5),
            ],
        );
        assert_eq!(next.live_cells(), want);
    }

    #[test]
    fn centered_child_picks_middle() {
        let node = node_with(3, &[(2, 2), (5, 5), (0, 0), (7, 7)]);

        let center = node.centered_child().unwrap();

        assert_eq!(center.level(), 2);
        assert_eq!(
            center.live_cells(),
            vec![BoardCoordinate::new(0, 0), BoardCoordinate::new(3, 3)]
        );
    }

    #[test]
    fn grandchildren_line_up() {
        // Every cell of a 16x16 node is alive iff x + 2y is a multiple of 3, a pattern that is
        // different in every neighboring block.
        let cells: Vec<(u64, u64)> = (0..16)
            .flat_map(|y| (0..16).map(move |x| (x, y)))
            .filter(|(x, y)| (x + 2 * y) % 3 == 0)
            .collect();
        let node = node_with(4, &cells);
        let [nw, ne, sw, se] = node.children().unwrap();

        let check = |block: Arc<Node>, dx: u64, dy: u64| {
            for y in 0..block.dimension() {
                for x in 0..block.dimension() {
                    assert_eq!(
                        block.is_cell_alive(x, y),
                        node.is_cell_alive(x + dx, y + dy),
                        "({x}, {y}) offset by ({dx}, {dy})"
                    );
                }
            }
        };

        check(h_center(nw, ne), 6, 2);
        check(h_center(sw, se), 6, 10);
        check(v_center(nw, sw), 2, 6);
        check(v_center(ne, se), 10, 6);
        check(node.super_center(), 6, 6);
        check(nw.center(), 2, 2);
        check(se.center(), 10, 10);
    }
}
