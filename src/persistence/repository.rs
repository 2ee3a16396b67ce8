use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::graph_utils::graph::{Edge, MindGraph, Node};
use crate::graph_utils::store::{new_map_id, GraphStore};

/// A named, timestamped map kept in the saved-map list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedMap {
    pub id: String,
    pub name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphStore {
    pub fn saved_map(&self, id: &str) -> Option<&SavedMap> {
        self.saved_maps.iter().find(|m| m.id == id)
    }

    /// Upsert the open map into the saved list under its map id. An update
    /// keeps the original creation time.
    pub fn save_current_map(&mut self) {
        let now = OffsetDateTime::now_utc();
        let nodes = self.graph.nodes.clone();
        let edges = self.graph.edges.clone();
        match self.saved_maps.iter_mut().find(|m| m.id == self.map_id) {
            Some(existing) => {
                existing.name = self.map_name.clone();
                existing.updated_at = now;
                existing.nodes = nodes;
                existing.edges = edges;
            }
            None => self.saved_maps.push(SavedMap {
                id: self.map_id.clone(),
                name: self.map_name.clone(),
                created_at: now,
                updated_at: now,
                nodes,
                edges,
            }),
        }
        log::info!("saved map {} ({})", self.map_name, self.map_id);
        self.touch();
    }

    /// Replace the open map with a saved one. Unknown ids are ignored.
    ///
    /// History covers the graph and edge defaults only, so undoing a load
    /// brings back the previous nodes and edges under the loaded map's id and
    /// name; a later [`GraphStore::save_current_map`] writes them into the
    /// loaded entry.
    pub fn load_map(&mut self, id: &str) -> bool {
        let Some(saved) = self.saved_map(id).cloned() else {
            log::debug!("load_map: no saved map {}", id);
            return false;
        };
        self.checkpoint();
        self.graph = MindGraph { nodes: saved.nodes, edges: saved.edges };
        self.map_name = saved.name;
        self.map_id = saved.id;
        self.selected = None;
        self.touch();
        true
    }

    /// Remove a saved entry. The open map is left alone even if it is the one removed.
    pub fn delete_map(&mut self, id: &str) -> bool {
        let before = self.saved_maps.len();
        self.saved_maps.retain(|m| m.id != id);
        let removed = self.saved_maps.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Start over with a lone root under a fresh map id and the default name.
    pub fn create_new_map(&mut self) {
        self.checkpoint();
        self.graph = MindGraph::with_root();
        self.map_id = new_map_id();
        self.map_name = self.default_map_name.clone();
        self.selected = None;
        self.touch();
    }

    /// Like [`GraphStore::create_new_map`], and also restarts node id numbering.
    pub fn clear_map(&mut self) {
        self.create_new_map();
        self.reset_node_counter();
    }
}

#[cfg(test)]
mod tests {
    use crate::graph_utils::graph::{LayoutKind, NodeKind, ROOT_ID};
    use crate::graph_utils::store::GraphStore;

    #[test]
    fn save_upserts_and_keeps_created_at() {
        let mut s = GraphStore::with_seed(1);
        s.save_current_map();
        let created = s.saved_maps()[0].created_at;
        s.add_node(Some(ROOT_ID), NodeKind::Text, LayoutKind::Default);
        s.rename_map("Renamed");
        s.save_current_map();
        assert_eq!(s.saved_maps().len(), 1);
        let m = &s.saved_maps()[0];
        assert_eq!(m.created_at, created);
        assert!(m.updated_at >= created);
        assert_eq!(m.name, "Renamed");
        assert_eq!(m.nodes.len(), 2);
    }

    #[test]
    fn new_map_then_load_restores_saved() {
        let mut s = GraphStore::with_seed(1);
        s.add_node(Some(ROOT_ID), NodeKind::Text, LayoutKind::Default);
        s.rename_map("First");
        s.save_current_map();
        let first_id = s.map_id().to_string();

        s.create_new_map();
        assert_ne!(s.map_id(), first_id);
        assert_eq!(s.nodes().len(), 1);
        assert!(s.edges().is_empty());
        assert_eq!(s.map_name(), "Untitled Mind Map");

        assert!(s.load_map(&first_id));
        assert_eq!(s.map_id(), first_id);
        assert_eq!(s.map_name(), "First");
        assert_eq!(s.nodes().len(), 2);
        assert!(!s.load_map("ghost"));
    }

    #[test]
    fn delete_map_leaves_open_map() {
        let mut s = GraphStore::with_seed(1);
        s.add_node(None, NodeKind::Text, LayoutKind::Default);
        s.save_current_map();
        let id = s.map_id().to_string();
        assert!(s.delete_map(&id));
        assert!(s.saved_maps().is_empty());
        assert_eq!(s.map_id(), id);
        assert_eq!(s.nodes().len(), 2);
        assert!(!s.delete_map(&id));
    }

    #[test]
    fn clear_map_is_undoable_and_uses_default_name() {
        let mut s = GraphStore::with_seed(1);
        s.set_default_map_name("Blank");
        s.add_node(None, NodeKind::Text, LayoutKind::Default);
        s.clear_map();
        assert_eq!(s.map_name(), "Blank");
        assert_eq!(s.nodes().len(), 1);
        assert!(s.undo());
        assert_eq!(s.nodes().len(), 2);
    }

    #[test]
    fn clear_map_restarts_node_numbering_but_new_map_does_not() {
        let mut s = GraphStore::with_seed(1);
        let first = s.add_node(None, NodeKind::Text, LayoutKind::Default).unwrap();
        assert!(first.ends_with("-1"));
        s.add_node(None, NodeKind::Text, LayoutKind::Default);
        s.clear_map();
        let after_clear = s.add_node(None, NodeKind::Text, LayoutKind::Default).unwrap();
        assert!(after_clear.ends_with("-1"), "{}", after_clear);
        s.create_new_map();
        let after_new = s.add_node(None, NodeKind::Text, LayoutKind::Default).unwrap();
        assert!(after_new.ends_with("-2"), "{}", after_new);
    }

    #[test]
    fn undo_after_load_keeps_loaded_identity() {
        let mut s = GraphStore::with_seed(1);
        s.rename_map("Saved");
        s.save_current_map();
        let saved_id = s.map_id().to_string();
        s.create_new_map();
        let scratch_id = s.map_id().to_string();
        s.add_node(None, NodeKind::Text, LayoutKind::Default);

        assert!(s.load_map(&saved_id));
        assert!(s.undo());
        assert_eq!(s.nodes().len(), 2);
        assert_eq!(s.map_id(), saved_id);
        assert_ne!(s.map_id(), scratch_id);
        assert_eq!(s.map_name(), "Saved");
    }
}
