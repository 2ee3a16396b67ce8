use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::graph_utils::graph::{Edge, EdgeDefaults, EdgeStyle, LineStyle, MindGraph, Node, ThemeColor, ROOT_ID};
use crate::graph_utils::store::GraphStore;

pub const IMPORTED_MAP_NAME: &str = "Imported Mind Map";

fn default_map_name() -> String { IMPORTED_MAP_NAME.to_string() }
fn default_edge_color() -> String { ThemeColor::default().hex().to_string() }

/// The export/import file. `nodes` and `edges` are mandatory on import; the
/// remaining keys fall back to defaults when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default = "default_map_name")]
    pub map_name: String,
    #[serde(default)]
    pub edge_style: EdgeStyle,
    #[serde(default = "default_edge_color")]
    pub edge_color: String,
    #[serde(default)]
    pub edge_line_style: LineStyle,
}

impl ExportDocument {
    pub fn from_store(store: &GraphStore) -> Self {
        let defaults = store.edge_defaults();
        ExportDocument {
            nodes: store.nodes().to_vec(),
            edges: store.edges().to_vec(),
            map_name: store.map_name().to_string(),
            edge_style: defaults.style,
            edge_color: defaults.color.clone(),
            edge_line_style: defaults.line_style,
        }
    }

    pub fn parse(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("malformed mind map document")
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn edge_defaults(&self) -> EdgeDefaults {
        let style = if self.edge_style.is_map_default_choice() { self.edge_style } else { EdgeStyle::default() };
        EdgeDefaults { style, color: self.edge_color.clone(), line_style: self.edge_line_style }
    }
}

impl GraphStore {
    pub fn export_to_json(&self) -> anyhow::Result<String> {
        ExportDocument::from_store(self).to_json_pretty()
    }

    /// Replace the open map with an exported document. A malformed payload is
    /// logged and leaves the store untouched; returns whether anything was applied.
    pub fn import_from_json(&mut self, json: &str) -> bool {
        match ExportDocument::parse(json) {
            Ok(doc) => self.apply_import(doc),
            Err(e) => {
                log::warn!("import rejected: {:#}", e);
                false
            }
        }
    }

    /// Install a parsed document. Duplicate node ids reject the whole document
    /// with the store untouched; duplicate edges are dropped.
    pub fn apply_import(&mut self, doc: ExportDocument) -> bool {
        let edge_defaults = doc.edge_defaults();
        let mut graph = MindGraph { nodes: doc.nodes, edges: doc.edges };
        let dup_nodes = graph.dedup_nodes();
        if dup_nodes > 0 {
            log::warn!("import rejected: {} duplicate node ids", dup_nodes);
            return false;
        }
        let dup_edges = graph.dedup_edges();
        if dup_edges > 0 {
            log::warn!("dropped {} duplicate imported edges", dup_edges);
        }
        if !graph.contains_node(ROOT_ID) {
            log::warn!("imported map has no root node; adding one");
            graph.nodes.insert(0, Node::root());
        }
        let pruned = graph.prune_dangling_edges();
        if pruned > 0 {
            log::warn!("dropped {} imported edges with missing endpoints", pruned);
        }
        self.checkpoint();
        self.graph = graph;
        self.map_name = doc.map_name;
        self.edge_defaults = edge_defaults;
        self.selected = None;
        self.touch();
        true
    }
}

pub fn export_to_path(store: &GraphStore, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut s = store.export_to_json()?;
    // newline at end
    s.push('\n');
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

pub fn read_document(path: &Path) -> anyhow::Result<ExportDocument> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    ExportDocument::parse(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph_utils::graph::{LayoutKind, NodeKind};

    fn populated() -> GraphStore {
        let mut s = GraphStore::with_seed(9);
        let a = s.add_node(Some(ROOT_ID), NodeKind::Text, LayoutKind::Stacked).unwrap();
        s.add_node(Some(a.as_str()), NodeKind::Image, LayoutKind::Default);
        s.set_edge_line_style(LineStyle::Dashed);
        s.rename_map("Trip");
        s.add_topic(ROOT_ID, "Packing");
        s.toggle_collapse(ROOT_ID);
        s
    }

    #[test]
    fn round_trip_reproduces_content_and_resets_selection() {
        let src = populated();
        let json = src.export_to_json().unwrap();
        assert!(json.contains("\n  \"nodes\""));

        let mut dst = GraphStore::with_seed(1);
        dst.select_node(Some(ROOT_ID));
        assert!(dst.import_from_json(&json));
        assert_eq!(dst.nodes(), src.nodes());
        assert_eq!(dst.edges(), src.edges());
        assert_eq!(dst.map_name(), "Trip");
        assert_eq!(dst.edge_defaults(), src.edge_defaults());
        assert_eq!(dst.selected_node_id(), None);
        assert!(dst.can_undo());
    }

    #[test]
    fn malformed_import_changes_nothing() {
        let mut s = populated();
        let nodes = s.nodes().to_vec();
        let past = s.past_len();
        assert!(!s.import_from_json("{not json"));
        assert!(!s.import_from_json(r#"{"nodes": []}"#));
        assert!(!s.import_from_json(r#"{"edges": []}"#));
        assert_eq!(s.nodes(), nodes.as_slice());
        assert_eq!(s.past_len(), past);
    }

    #[test]
    fn missing_optional_keys_get_defaults() {
        let mut s = GraphStore::with_seed(1);
        let json = r#"{
            "nodes": [{"id": "root", "position": {"x": 0, "y": 0}, "data": {"label": "Hi"}}],
            "edges": []
        }"#;
        assert!(s.import_from_json(json));
        assert_eq!(s.map_name(), IMPORTED_MAP_NAME);
        assert_eq!(s.edge_defaults().style, EdgeStyle::Smoothstep);
        assert_eq!(s.edge_defaults().line_style, LineStyle::Solid);
        assert_eq!(s.edge_defaults().color, ThemeColor::Blue.hex());
        assert_eq!(s.node(ROOT_ID).unwrap().data.label, "Hi");
    }

    #[test]
    fn import_repairs_missing_root_and_dangling_edges() {
        let mut s = GraphStore::with_seed(1);
        let json = r##"{
            "nodes": [{"id": "a", "position": {"x": 1, "y": 2}, "data": {"label": "A"}}],
            "edges": [{"id": "edge-a-zz", "source": "a", "target": "zz", "type": "straight", "color": "#000"}]
        }"##;
        assert!(s.import_from_json(json));
        assert!(s.node(ROOT_ID).is_some());
        assert!(s.edges().is_empty());
    }

    #[test]
    fn duplicate_node_ids_reject_the_document() {
        let mut s = populated();
        let nodes = s.nodes().to_vec();
        let past = s.past_len();
        let json = r#"{
            "nodes": [
                {"id": "root", "position": {"x": 0, "y": 0}, "data": {"label": "One"}},
                {"id": "root", "position": {"x": 5, "y": 5}, "data": {"label": "Two"}}
            ],
            "edges": []
        }"#;
        assert!(!s.import_from_json(json));
        assert_eq!(s.nodes(), nodes.as_slice());
        assert_eq!(s.past_len(), past);
    }

    #[test]
    fn duplicate_edges_collapse_to_one() {
        let mut s = GraphStore::with_seed(1);
        let json = r##"{
            "nodes": [
                {"id": "root", "position": {"x": 0, "y": 0}, "data": {"label": "R"}},
                {"id": "a", "position": {"x": 1, "y": 2}, "data": {"label": "A"}}
            ],
            "edges": [
                {"id": "edge-root-a", "source": "root", "target": "a", "type": "straight", "color": "#000"},
                {"id": "edge-root-a", "source": "root", "target": "a", "type": "step", "color": "#111"}
            ]
        }"##;
        assert!(s.import_from_json(json));
        assert_eq!(s.nodes().iter().filter(|n| n.id == ROOT_ID).count(), 1);
        assert_eq!(s.edges().len(), 1);
        assert_eq!(s.edges()[0].style, EdgeStyle::Straight);
    }

    #[test]
    fn export_to_path_writes_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("map.json");
        let s = populated();
        export_to_path(&s, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("}\n"));
        let doc = read_document(&path).unwrap();
        assert_eq!(doc.map_name, "Trip");
    }
}
