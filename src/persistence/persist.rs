use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use time::macros::format_description;
use time::OffsetDateTime;

use super::repository::SavedMap;
use super::settings::AppSettings;
use crate::graph_utils::graph::{
    Edge, EdgeDefaults, EdgeStyle, LineStyle, MindGraph, Node, NodeId, ThemeColor, ROOT_ID,
};
use crate::graph_utils::store::{new_map_id, GraphStore, DEFAULT_MAP_NAME};

pub const STATE_FILE: &str = "state.json";

fn default_map_name() -> String { DEFAULT_MAP_NAME.to_string() }
fn default_edge_color() -> String { ThemeColor::default().hex().to_string() }

/// Everything the editor keeps between sessions: the open map, its style
/// defaults and the saved-map list. Undo history is not persisted. Keys
/// missing from an older or hand-edited file fall back to defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub selected_node_id: Option<NodeId>,
    #[serde(default = "default_map_name")]
    pub map_name: String,
    #[serde(default = "new_map_id")]
    pub map_id: String,
    #[serde(default)]
    pub edge_style: EdgeStyle,
    #[serde(default = "default_edge_color")]
    pub edge_color: String,
    #[serde(default)]
    pub edge_line_style: LineStyle,
    #[serde(default)]
    pub saved_maps: Vec<SavedMap>,
}

impl PersistedState {
    pub fn from_store(store: &GraphStore) -> Self {
        let d = store.edge_defaults();
        Self {
            nodes: store.nodes().to_vec(),
            edges: store.edges().to_vec(),
            selected_node_id: store.selected_node_id().map(str::to_string),
            map_name: store.map_name().to_string(),
            map_id: store.map_id().to_string(),
            edge_style: d.style,
            edge_color: d.color.clone(),
            edge_line_style: d.line_style,
            saved_maps: store.saved_maps().to_vec(),
        }
    }

    /// Load this state into `store` as the start of a fresh session.
    pub fn restore_into(self, store: &mut GraphStore) {
        let mut graph = MindGraph { nodes: self.nodes, edges: self.edges };
        let dups = graph.dedup_nodes() + graph.dedup_edges();
        if dups > 0 {
            log::warn!("dropped {} persisted nodes/edges with duplicate ids", dups);
        }
        let pruned = graph.prune_dangling_edges();
        if pruned > 0 {
            log::warn!("dropped {} persisted edges with missing endpoints", pruned);
        }
        if !graph.contains_node(ROOT_ID) {
            graph.nodes.insert(0, Node::root());
        }
        store.selected = self.selected_node_id.filter(|id| graph.contains_node(id));
        store.graph = graph;
        store.map_name = self.map_name;
        store.map_id = self.map_id;
        let style = if self.edge_style.is_map_default_choice() { self.edge_style } else { EdgeStyle::default() };
        store.edge_defaults = EdgeDefaults {
            style,
            color: self.edge_color,
            line_style: self.edge_line_style,
        };
        store.saved_maps = self.saved_maps;
        store.history.clear();
        store.touch();
    }
}

static STATE_DIR_OVERRIDE: OnceCell<PathBuf> = OnceCell::new();

/// Point persistence at an explicit directory for the rest of the process.
pub fn set_state_dir_override(dir: PathBuf) {
    let _ = STATE_DIR_OVERRIDE.set(dir);
}

pub fn state_dir() -> PathBuf {
    if let Some(dir) = STATE_DIR_OVERRIDE.get() {
        return dir.clone();
    }
    // Load settings if present; else use defaults
    let settings = AppSettings::load().unwrap_or_default();
    settings.autosave_dir()
}

pub fn active_state_path(dir: &Path) -> PathBuf {
    dir.join(STATE_FILE)
}

pub fn versioned_state_path_now(dir: &Path) -> PathBuf {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = now.format(fmt).unwrap_or_else(|_| "unknown".to_string());
    dir.join(format!("state_{}.json", stamp))
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

fn write_state(path: &Path, state: &PersistedState) -> anyhow::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let s = serde_json::to_string_pretty(state)?;
    atomic_write(path, s.as_bytes()).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

pub fn save_active(dir: &Path, state: &PersistedState) -> anyhow::Result<PathBuf> {
    let path = active_state_path(dir);
    write_state(&path, state)?;
    log::debug!("saved state to {}", path.display());
    Ok(path)
}

/// Write a timestamped backup next to the active state.
pub fn save_versioned(dir: &Path, state: &PersistedState) -> anyhow::Result<PathBuf> {
    let path = versioned_state_path_now(dir);
    write_state(&path, state)?;
    log::info!("saved state version {}", path.display());
    Ok(path)
}

pub fn load_active(dir: &Path) -> anyhow::Result<Option<PersistedState>> {
    let path = active_state_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    load_from_path(&path).map(Some)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<PersistedState> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let state: PersistedState = serde_json::from_str(&buf)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(state)
}

/// Backups in `dir`, newest first.
pub fn list_versions(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = Vec::new();
    if dir.exists() {
        for e in fs::read_dir(dir)? {
            let p = e?.path();
            if let Some(name) = p.file_name().and_then(|s| s.to_str())
                && name.starts_with("state_") && name.ends_with(".json")
            {
                entries.push(p);
            }
        }
    }
    // sort descending by filename (timestamp)
    entries.sort();
    entries.reverse();
    Ok(entries)
}
