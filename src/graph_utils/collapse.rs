use std::collections::{BTreeSet, HashMap};

use super::graph::{Edge, EdgeStyle, MindGraph, NodeId};

/// Nodes whose visibility follows the collapse state of `node_id`.
///
/// Direct children only qualify when linked by a stacked edge; free-form
/// branch children stay visible. Below a qualifying child every descendant is
/// included whatever its own layout. Cycles are tolerated.
pub fn collapse_targets(node_id: &str, edges: &[Edge]) -> BTreeSet<NodeId> {
    let mut by_source: HashMap<&str, Vec<&Edge>> = HashMap::new();
    for edge in edges {
        by_source.entry(edge.source.as_str()).or_default().push(edge);
    }
    let mut out = BTreeSet::new();
    let mut stack = vec![(node_id, true)];
    while let Some((id, first_level)) = stack.pop() {
        for edge in by_source.get(id).into_iter().flatten() {
            if first_level && edge.style != EdgeStyle::Stacked {
                continue;
            }
            if out.insert(edge.target.clone()) {
                stack.push((edge.target.as_str(), false));
            }
        }
    }
    // a cycle can lead back to the toggled node; it never hides itself
    out.remove(node_id);
    out
}

/// Write `hidden` onto every target node and every edge leading into one.
/// Returns the number of nodes touched.
pub fn apply_hidden(graph: &mut MindGraph, targets: &BTreeSet<NodeId>, hidden: bool) -> usize {
    let mut touched = 0;
    for node in graph.nodes.iter_mut().filter(|n| targets.contains(&n.id)) {
        node.hidden = hidden;
        touched += 1;
    }
    for edge in graph.edges.iter_mut().filter(|e| targets.contains(&e.target)) {
        edge.hidden = hidden;
    }
    touched
}
