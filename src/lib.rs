//! Mind-map editor core: a mutable node/edge store with linear undo/redo,
//! collapse cascades over stacked subtrees, JSON exchange and a repository of
//! named maps. Rendering is left to whatever front end drives the store.

pub mod graph_utils;
pub mod persistence;
pub mod shell;

pub use graph_utils::graph::{Edge, EdgeStyle, LayoutKind, LineStyle, Node, NodeDataPatch, NodeKind, ROOT_ID};
pub use graph_utils::store::GraphStore;
