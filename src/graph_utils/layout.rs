use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::graph::{EdgeStyle, LayoutKind, MindGraph, Position};

/// Horizontal distance between a parent and its new children.
pub const CHILD_OFFSET_X: f64 = 250.0;
/// Vertical step between siblings in a stacked list.
pub const STACK_SPACING_Y: f64 = 60.0;
/// Vertical step between free-form branch children.
pub const BRANCH_SPACING_Y: f64 = 100.0;
/// Half-width of the random x jitter applied to branch children.
pub const BRANCH_JITTER_X: f64 = 30.0;
/// Offset of a loose node from the most recently added one.
pub const LOOSE_OFFSET: f64 = 50.0;

// Approximate node footprint, used to center the first node in the viewport
const NODE_WIDTH: f64 = 150.0;
const NODE_HEIGHT: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self { Self { width: 1280.0, height: 720.0 } }
}

impl Viewport {
    pub fn center(&self) -> Position {
        Position::new(self.width / 2.0 - NODE_WIDTH / 2.0, self.height / 2.0 - NODE_HEIGHT / 2.0)
    }
}

/// Source of the x jitter for branch children. Seed it for reproducible layouts.
#[derive(Debug)]
pub struct Jitter {
    rng: StdRng,
}

impl Jitter {
    pub fn from_entropy() -> Self { Self { rng: StdRng::from_entropy() } }
    pub fn seeded(seed: u64) -> Self { Self { rng: StdRng::seed_from_u64(seed) } }

    pub fn sample(&mut self) -> f64 {
        self.rng.gen_range(-BRANCH_JITTER_X..=BRANCH_JITTER_X)
    }
}

/// Where a new node goes, given its parent (if any) and layout.
pub fn place_new_node(
    graph: &MindGraph,
    parent_id: Option<&str>,
    layout: LayoutKind,
    viewport: &Viewport,
    jitter: &mut Jitter,
) -> Position {
    let parent = parent_id.and_then(|id| graph.get_node(id));
    let Some(parent) = parent else {
        return match graph.nodes.last() {
            Some(last) => last.position.offset(LOOSE_OFFSET, LOOSE_OFFSET),
            None => viewport.center(),
        };
    };
    match layout {
        LayoutKind::Stacked => {
            let index = graph
                .outgoing_edges(&parent.id)
                .filter(|e| e.style == EdgeStyle::Stacked)
                .count();
            parent.position.offset(CHILD_OFFSET_X, index as f64 * STACK_SPACING_Y)
        }
        LayoutKind::Default | LayoutKind::Structure => {
            let count = graph.outgoing_edges(&parent.id).count();
            parent
                .position
                .offset(CHILD_OFFSET_X + jitter.sample(), count as f64 * BRANCH_SPACING_Y)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::graph::{Edge, EdgeDefaults, Node};

    #[test]
    fn empty_canvas_uses_viewport_center() {
        let g = MindGraph::default();
        let vp = Viewport { width: 1000.0, height: 600.0 };
        let p = place_new_node(&g, None, LayoutKind::Default, &vp, &mut Jitter::seeded(1));
        assert_eq!(p, Position::new(425.0, 275.0));
    }

    #[test]
    fn loose_node_offsets_from_last() {
        let mut g = MindGraph::with_root();
        g.nodes[0].position = Position::new(10.0, 20.0);
        let p = place_new_node(&g, None, LayoutKind::Default, &Viewport::default(), &mut Jitter::seeded(1));
        assert_eq!(p, Position::new(60.0, 70.0));
    }

    #[test]
    fn stacked_children_form_a_column() {
        let mut g = MindGraph::with_root();
        let first = place_new_node(&g, Some("root"), LayoutKind::Stacked, &Viewport::default(), &mut Jitter::seeded(1));
        assert_eq!(first, Position::new(CHILD_OFFSET_X, 0.0));
        g.nodes.push(Node { id: "a".into(), position: first, ..Node::root() });
        g.edges.push(Edge::new("root", "a", EdgeStyle::Stacked, &EdgeDefaults::default()));
        let second = place_new_node(&g, Some("root"), LayoutKind::Stacked, &Viewport::default(), &mut Jitter::seeded(1));
        assert_eq!(second, Position::new(CHILD_OFFSET_X, STACK_SPACING_Y));
    }

    #[test]
    fn branch_child_is_right_of_parent_within_jitter() {
        let g = MindGraph::with_root();
        let mut jitter = Jitter::seeded(7);
        for _ in 0..20 {
            let p = place_new_node(&g, Some("root"), LayoutKind::Default, &Viewport::default(), &mut jitter);
            assert!(p.x >= CHILD_OFFSET_X - BRANCH_JITTER_X && p.x <= CHILD_OFFSET_X + BRANCH_JITTER_X);
            assert!(p.x > 0.0);
        }
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let mut a = Jitter::seeded(42);
        let mut b = Jitter::seeded(42);
        assert_eq!(a.sample(), b.sample());
    }
}
