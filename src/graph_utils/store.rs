use time::OffsetDateTime;
use uuid::Uuid;

use super::collapse;
use super::graph::{
    Edge, EdgeDefaults, EdgeId, EdgeStyle, LayoutKind, LineStyle, MindGraph, Node, NodeData,
    NodeDataPatch, NodeId, NodeKind, Position, ROOT_ID,
};
use super::history::{History, Snapshot};
use super::layout::{self, Jitter, Viewport};
use crate::persistence::repository::SavedMap;

pub const DEFAULT_MAP_NAME: &str = "Untitled Mind Map";

pub fn new_map_id() -> String { Uuid::now_v7().to_string() }

/// Authoritative editor state for one open map, plus the saved-map list.
///
/// Every operation runs to completion synchronously. Guards (unknown ids,
/// attempts on the root) are silent no-ops; operations that create something
/// return the new id so callers can tell.
#[derive(Debug)]
pub struct GraphStore {
    pub(crate) graph: MindGraph,
    pub(crate) selected: Option<NodeId>,
    pub(crate) map_name: String,
    pub(crate) map_id: String,
    pub(crate) edge_defaults: EdgeDefaults,
    pub(crate) saved_maps: Vec<SavedMap>,
    pub(crate) history: History,
    pub(crate) default_map_name: String,
    node_seq: u64,
    jitter: Jitter,
    viewport: Viewport,
    revision: u64,
}

impl Default for GraphStore {
    fn default() -> Self { Self::new() }
}

impl GraphStore {
    pub fn new() -> Self { Self::with_jitter(Jitter::from_entropy()) }

    /// A store whose branch-child jitter is reproducible.
    pub fn with_seed(seed: u64) -> Self { Self::with_jitter(Jitter::seeded(seed)) }

    fn with_jitter(jitter: Jitter) -> Self {
        GraphStore {
            graph: MindGraph::with_root(),
            selected: None,
            map_name: DEFAULT_MAP_NAME.to_string(),
            map_id: new_map_id(),
            edge_defaults: EdgeDefaults::default(),
            saved_maps: Vec::new(),
            history: History::new(),
            default_map_name: DEFAULT_MAP_NAME.to_string(),
            node_seq: 0,
            jitter,
            viewport: Viewport::default(),
            revision: 0,
        }
    }

    // Configuration
    pub fn set_viewport(&mut self, viewport: Viewport) { self.viewport = viewport; }
    pub fn set_history_limit(&mut self, limit: Option<usize>) { self.history.set_limit(limit); }
    pub fn set_default_map_name(&mut self, name: impl Into<String>) { self.default_map_name = name.into(); }

    // Read side for the renderer
    pub fn graph(&self) -> &MindGraph { &self.graph }
    pub fn nodes(&self) -> &[Node] { &self.graph.nodes }
    pub fn edges(&self) -> &[Edge] { &self.graph.edges }
    pub fn node(&self, id: &str) -> Option<&Node> { self.graph.get_node(id) }
    pub fn selected_node_id(&self) -> Option<&str> { self.selected.as_deref() }
    pub fn map_name(&self) -> &str { &self.map_name }
    pub fn map_id(&self) -> &str { &self.map_id }
    pub fn edge_defaults(&self) -> &EdgeDefaults { &self.edge_defaults }
    pub fn saved_maps(&self) -> &[SavedMap] { &self.saved_maps }
    pub fn can_undo(&self) -> bool { self.history.can_undo() }
    pub fn can_redo(&self) -> bool { self.history.can_redo() }
    pub fn past_len(&self) -> usize { self.history.past_len() }
    pub fn future_len(&self) -> usize { self.history.future_len() }

    /// Bumped by every state change; observers compare it to detect edits.
    pub fn revision(&self) -> u64 { self.revision }

    pub fn visible_nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph.nodes.iter().filter(|n| !n.hidden)
    }

    pub fn visible_edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edges.iter().filter(|e| !e.hidden)
    }

    pub fn children_of(&self, id: &str) -> Vec<&Node> { self.graph.children_of(id) }

    pub(crate) fn touch(&mut self) { self.revision += 1; }

    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot { graph: self.graph.clone(), edge_defaults: self.edge_defaults.clone() }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.graph = snapshot.graph;
        self.edge_defaults = snapshot.edge_defaults;
        let stale = self.selected.as_deref().is_some_and(|sel| !self.graph.contains_node(sel));
        if stale {
            self.selected = None;
        }
        self.touch();
    }

    pub(crate) fn reset_node_counter(&mut self) { self.node_seq = 0; }

    // Millisecond timestamp plus a per-store sequence; skips ids already taken
    // (imported or loaded maps may carry ids from another session).
    fn next_node_id(&mut self) -> NodeId {
        loop {
            self.node_seq += 1;
            let ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
            let id = format!("node-{}-{}", ms, self.node_seq);
            if !self.graph.contains_node(&id) {
                return id;
            }
        }
    }

    // ---- history ----

    /// Record the current state as an undo step. Interactive text fields call
    /// this when editing starts, since label/description updates do not.
    pub fn checkpoint(&mut self) {
        let snap = self.snapshot();
        self.history.record(snap);
    }

    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(prev) => {
                self.restore(prev);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    // ---- nodes ----

    /// Add a node, optionally as a child of `parent_id`, and select it.
    /// Returns `None` when the parent does not exist.
    pub fn add_node(&mut self, parent_id: Option<&str>, kind: NodeKind, layout: LayoutKind) -> Option<NodeId> {
        if let Some(p) = parent_id
            && !self.graph.contains_node(p)
        {
            log::debug!("add_node: unknown parent {}", p);
            return None;
        }
        self.checkpoint();
        Some(self.insert_node(parent_id, kind, layout))
    }

    fn insert_node(&mut self, parent_id: Option<&str>, kind: NodeKind, layout_kind: LayoutKind) -> NodeId {
        let id = self.next_node_id();
        let position = layout::place_new_node(&self.graph, parent_id, layout_kind, &self.viewport, &mut self.jitter);
        let stacked = parent_id.is_some() && layout_kind == LayoutKind::Stacked;
        let order = match parent_id {
            Some(p) if stacked => Some(self.graph.max_stacked_order(p) + 1),
            _ => None,
        };
        let label = match kind {
            NodeKind::Text => "New Topic",
            NodeKind::Image => "Image",
        };
        let data = NodeData {
            order,
            layout: (layout_kind != LayoutKind::Default).then_some(layout_kind),
            image_url: (kind == NodeKind::Image).then(String::new),
            ..NodeData::with_label(label)
        };
        // born inside a collapsed subtree: below a hidden node, or stacked under a collapsed one
        let hidden = parent_id
            .and_then(|p| self.graph.get_node(p))
            .is_some_and(|p| p.hidden || (stacked && p.data.is_collapsed()));
        self.graph.nodes.push(Node { id: id.clone(), kind, position, data, hidden });
        if let Some(p) = parent_id {
            let style = if stacked { EdgeStyle::Stacked } else { self.edge_defaults.style };
            let mut edge = Edge::new(p, &id, style, &self.edge_defaults);
            edge.hidden = hidden;
            self.graph.edges.push(edge);
        }
        self.selected = Some(id.clone());
        self.touch();
        log::debug!("added node {} (parent {:?}, {:?})", id, parent_id, layout_kind);
        id
    }

    /// Add a node next to `node_id`: under the same parent, or loose when
    /// `node_id` has no parent. The root has no siblings.
    pub fn add_sibling(&mut self, node_id: &str) -> Option<NodeId> {
        if node_id == ROOT_ID || !self.graph.contains_node(node_id) {
            return None;
        }
        let incoming = self.graph.incoming_edge(node_id).map(|e| (e.source.clone(), e.style));
        let kind = self.graph.get_node(node_id).map(|n| n.kind).unwrap_or_default();
        self.checkpoint();
        let id = match incoming {
            Some((parent, style)) => {
                let layout = if style == EdgeStyle::Stacked { LayoutKind::Stacked } else { LayoutKind::Default };
                self.insert_node(Some(parent.as_str()), kind, layout)
            }
            None => self.insert_node(None, kind, LayoutKind::Default),
        };
        Some(id)
    }

    /// Shallow-merge `patch` into the node's data. Label/description-only
    /// edits skip the history snapshot; see [`GraphStore::checkpoint`].
    pub fn update_node_data(&mut self, node_id: &str, patch: &NodeDataPatch) -> bool {
        if patch.is_empty() || !self.graph.contains_node(node_id) {
            return false;
        }
        if !patch.is_text_entry_only() {
            self.checkpoint();
        }
        self.apply_patch(node_id, patch)
    }

    pub(crate) fn apply_patch(&mut self, node_id: &str, patch: &NodeDataPatch) -> bool {
        let Some(node) = self.graph.get_node_mut(node_id) else { return false };
        node.data = patch.apply_to(&node.data);
        self.touch();
        true
    }

    /// Commit a dragged node's final position.
    pub fn update_node_position(&mut self, node_id: &str, position: Position) -> bool {
        match self.graph.get_node(node_id) {
            Some(n) if n.position != position => {}
            _ => return false,
        }
        self.checkpoint();
        if let Some(node) = self.graph.get_node_mut(node_id) {
            node.position = position;
        }
        self.touch();
        true
    }

    /// Remove a node and every edge touching it. The root is never deleted.
    pub fn delete_node(&mut self, node_id: &str) -> bool {
        if node_id == ROOT_ID {
            log::debug!("delete_node: refusing to delete root");
            return false;
        }
        if !self.graph.contains_node(node_id) {
            return false;
        }
        self.checkpoint();
        self.graph.remove_node(node_id);
        self.selected = None;
        self.touch();
        true
    }

    pub fn select_node(&mut self, node_id: Option<&str>) {
        let next = match node_id {
            Some(id) if self.graph.contains_node(id) => Some(id.to_string()),
            Some(id) => {
                log::debug!("select_node: unknown node {}", id);
                return;
            }
            None => None,
        };
        if next != self.selected {
            self.selected = next;
            self.touch();
        }
    }

    pub fn rename_map(&mut self, name: impl Into<String>) {
        self.map_name = name.into();
        self.touch();
    }

    // ---- edges ----

    /// Connect two existing nodes with the map's current edge defaults.
    /// Connecting an already linked pair returns the existing edge id unchanged.
    pub fn connect(&mut self, source: &str, target: &str) -> Option<EdgeId> {
        if !self.graph.contains_node(source) || !self.graph.contains_node(target) {
            log::warn!("connect: rejected dangling edge {} -> {}", source, target);
            return None;
        }
        let id = Edge::id_for(source, target);
        if self.graph.contains_edge(&id) {
            return Some(id);
        }
        self.checkpoint();
        let edge = Edge::new(source, target, self.edge_defaults.style, &self.edge_defaults);
        self.graph.edges.push(edge);
        self.touch();
        Some(id)
    }

    pub fn delete_edge(&mut self, edge_id: &str) -> bool {
        if !self.graph.contains_edge(edge_id) {
            return false;
        }
        self.checkpoint();
        self.graph.remove_edge(edge_id);
        self.touch();
        true
    }

    /// Change the map-wide edge style and rewrite every existing edge except
    /// stacked ones, which keep `Stacked` since collapse walks them. `Stacked`
    /// itself is rejected as a map default.
    pub fn set_edge_style(&mut self, style: EdgeStyle) -> bool {
        if !style.is_map_default_choice() {
            log::warn!("set_edge_style: {:?} cannot be a map default", style);
            return false;
        }
        self.checkpoint();
        self.edge_defaults.style = style;
        for edge in self.graph.edges.iter_mut().filter(|e| e.style != EdgeStyle::Stacked) {
            edge.style = style;
        }
        self.touch();
        true
    }

    pub fn set_edge_color(&mut self, color: impl Into<String>) {
        let color = color.into();
        self.checkpoint();
        for edge in self.graph.edges.iter_mut() {
            edge.color = color.clone();
        }
        self.edge_defaults.color = color;
        self.touch();
    }

    pub fn set_edge_line_style(&mut self, line_style: LineStyle) {
        self.checkpoint();
        self.edge_defaults.line_style = line_style;
        for edge in self.graph.edges.iter_mut() {
            edge.line_style = line_style;
        }
        self.touch();
    }

    // ---- collapse ----

    /// Flip `collapsed` on the node and hide (or reveal) its stacked subtree.
    pub fn toggle_collapse(&mut self, node_id: &str) -> bool {
        let Some(node) = self.graph.get_node(node_id) else { return false };
        let collapsed = !node.data.is_collapsed();
        self.checkpoint();
        if let Some(node) = self.graph.get_node_mut(node_id) {
            node.data.collapsed = Some(collapsed);
        }
        let targets = collapse::collapse_targets(node_id, &self.graph.edges);
        let touched = collapse::apply_hidden(&mut self.graph, &targets, collapsed);
        log::debug!("toggle_collapse {}: collapsed={} affected={}", node_id, collapsed, touched);
        self.touch();
        true
    }
}
