use serde::{Deserialize, Serialize};

// Basic type aliases for clarity
pub type NodeId = String;
pub type EdgeId = String;

pub const ROOT_ID: &str = "root";
pub const ROOT_LABEL: &str = "Main Topic";

fn is_false(b: &bool) -> bool { !*b }

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self { Self { x, y } }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Text,
    Image,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    #[default]
    Default,
    Stacked,
    Structure,
}

/// Fixed node palette. `Transparent` renders without a fill.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    #[default]
    Blue,
    Green,
    Purple,
    Pink,
    Orange,
    Yellow,
    Red,
    Gray,
    Teal,
    Transparent,
}

impl ThemeColor {
    pub fn hex(self) -> &'static str {
        match self {
            ThemeColor::Blue => "#3b82f6",
            ThemeColor::Green => "#22c55e",
            ThemeColor::Purple => "#a855f7",
            ThemeColor::Pink => "#ec4899",
            ThemeColor::Orange => "#f97316",
            ThemeColor::Yellow => "#eab308",
            ThemeColor::Red => "#ef4444",
            ThemeColor::Gray => "#6b7280",
            ThemeColor::Teal => "#14b8a6",
            ThemeColor::Transparent => "transparent",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextColor {
    #[default]
    Black,
    White,
    Gray,
    Blue,
    Red,
    Green,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Sans,
    Serif,
    Mono,
    Handwritten,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextSize {
    Small,
    #[default]
    Medium,
    Large,
    ExtraLarge,
}

/// Edge rendering style. `Stacked` is reserved for parent/child links of the
/// stacked (tree list) layout and is never a map-wide default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    Default,
    Straight,
    Step,
    #[default]
    Smoothstep,
    SimpleBezier,
    Stacked,
}

impl EdgeStyle {
    pub fn is_map_default_choice(self) -> bool { self != EdgeStyle::Stacked }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

impl LineStyle {
    /// SVG dash pattern for the renderer; solid lines have none.
    pub fn dash_array(self) -> Option<&'static str> {
        match self {
            LineStyle::Solid => None,
            LineStyle::Dashed => Some("5,5"),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_style: Option<BorderStyle>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubTopic {
    pub id: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub sub_topics: Vec<SubTopic>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TopicStyle>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    #[serde(default)]
    pub color: ThemeColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<TextColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<FontFamily>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_size: Option<TextSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<Topic>>,
    // sibling rank, only for children of a stacked parent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collapsed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_background: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_border: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl NodeData {
    pub fn with_label(label: impl Into<String>) -> Self {
        Self { label: label.into(), ..Default::default() }
    }

    pub fn is_collapsed(&self) -> bool { self.collapsed.unwrap_or(false) }

    /// Background the renderer should paint: the custom color wins over the theme.
    pub fn effective_background(&self) -> &str {
        self.custom_background.as_deref().unwrap_or(self.color.hex())
    }
}

/// Shallow update for [`NodeData`]. `None` leaves a field untouched; for
/// optional fields `Some(None)` clears the value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeDataPatch {
    pub label: Option<String>,
    pub color: Option<ThemeColor>,
    pub description: Option<Option<String>>,
    pub text_color: Option<Option<TextColor>>,
    pub font_family: Option<Option<FontFamily>>,
    pub text_size: Option<Option<TextSize>>,
    pub topics: Option<Option<Vec<Topic>>>,
    pub order: Option<Option<u32>>,
    pub collapsed: Option<Option<bool>>,
    pub layout: Option<Option<LayoutKind>>,
    pub custom_background: Option<Option<String>>,
    pub custom_border: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

impl NodeDataPatch {
    pub fn label(label: impl Into<String>) -> Self {
        Self { label: Some(label.into()), ..Default::default() }
    }

    pub fn description(description: Option<String>) -> Self {
        Self { description: Some(description), ..Default::default() }
    }

    pub fn color(color: ThemeColor) -> Self {
        Self { color: Some(color), ..Default::default() }
    }

    pub fn topics(topics: Vec<Topic>) -> Self {
        Self { topics: Some(Some(topics)), ..Default::default() }
    }

    pub fn is_empty(&self) -> bool { *self == Self::default() }

    /// True when the patch only touches free-text fields (label/description).
    /// Such edits arrive per keystroke and do not earn their own undo step.
    pub fn is_text_entry_only(&self) -> bool {
        let stripped = Self { label: None, description: None, ..self.clone() };
        stripped.is_empty() && !self.is_empty()
    }

    pub fn apply_to(&self, data: &NodeData) -> NodeData {
        let mut out = data.clone();
        if let Some(v) = &self.label { out.label = v.clone(); }
        if let Some(v) = self.color { out.color = v; }
        if let Some(v) = &self.description { out.description = v.clone(); }
        if let Some(v) = self.text_color { out.text_color = v; }
        if let Some(v) = self.font_family { out.font_family = v; }
        if let Some(v) = self.text_size { out.text_size = v; }
        if let Some(v) = &self.topics { out.topics = v.clone(); }
        if let Some(v) = self.order { out.order = v; }
        if let Some(v) = self.collapsed { out.collapsed = v; }
        if let Some(v) = self.layout { out.layout = v; }
        if let Some(v) = &self.custom_background { out.custom_background = v.clone(); }
        if let Some(v) = &self.custom_border { out.custom_border = v.clone(); }
        if let Some(v) = &self.image_url { out.image_url = v.clone(); }
        out
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    pub position: Position,
    pub data: NodeData,
    // derived from ancestor collapse state, never set by the user
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl Node {
    pub fn root() -> Self {
        Node {
            id: ROOT_ID.to_string(),
            kind: NodeKind::Text,
            position: Position::new(0.0, 0.0),
            data: NodeData::with_label(ROOT_LABEL),
            hidden: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    #[serde(rename = "type", default)]
    pub style: EdgeStyle,
    pub color: String,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl Edge {
    pub fn id_for(source: &str, target: &str) -> EdgeId {
        format!("edge-{}-{}", source, target)
    }

    pub fn new(source: &str, target: &str, style: EdgeStyle, defaults: &EdgeDefaults) -> Self {
        Edge {
            id: Edge::id_for(source, target),
            source: source.to_string(),
            target: target.to_string(),
            style,
            color: defaults.color.clone(),
            line_style: defaults.line_style,
            hidden: false,
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// Map-wide edge style defaults applied to new edges and rewritten onto
/// existing ones by the style setters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EdgeDefaults {
    pub style: EdgeStyle,
    pub color: String,
    pub line_style: LineStyle,
}

impl Default for EdgeDefaults {
    fn default() -> Self {
        Self {
            style: EdgeStyle::Smoothstep,
            color: ThemeColor::default().hex().to_string(),
            line_style: LineStyle::Solid,
        }
    }
}

/// Ordered node and edge lists of one map. Order matters: the last node is the
/// most recently added one.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MindGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl MindGraph {
    // A fresh map: a single root node and no edges
    pub fn with_root() -> Self {
        MindGraph { nodes: vec![Node::root()], edges: Vec::new() }
    }

    pub fn get_node(&self, id: &str) -> Option<&Node> { self.nodes.iter().find(|n| n.id == id) }
    pub fn get_node_mut(&mut self, id: &str) -> Option<&mut Node> { self.nodes.iter_mut().find(|n| n.id == id) }
    pub fn get_edge(&self, id: &str) -> Option<&Edge> { self.edges.iter().find(|e| e.id == id) }
    pub fn contains_node(&self, id: &str) -> bool { self.get_node(id).is_some() }
    pub fn contains_edge(&self, id: &str) -> bool { self.get_edge(id).is_some() }
    pub fn node_count(&self) -> usize { self.nodes.len() }
    pub fn edge_count(&self) -> usize { self.edges.len() }

    /// The edge pointing at `id`, which identifies its parent.
    pub fn incoming_edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.target == id)
    }

    pub fn outgoing_edges<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Children of `id` in edge order; stacked children are sorted by `order`.
    pub fn children_of(&self, id: &str) -> Vec<&Node> {
        let mut out: Vec<&Node> = self
            .outgoing_edges(id)
            .filter_map(|e| self.get_node(&e.target))
            .collect();
        out.sort_by_key(|n| n.data.order.unwrap_or(0));
        out
    }

    /// Highest `order` among children hanging off `parent` via stacked edges.
    pub fn max_stacked_order(&self, parent: &str) -> u32 {
        self.outgoing_edges(parent)
            .filter(|e| e.style == EdgeStyle::Stacked)
            .filter_map(|e| self.get_node(&e.target))
            .filter_map(|n| n.data.order)
            .max()
            .unwrap_or(0)
    }

    // Remove a node and cascade to every incident edge
    pub fn remove_node(&mut self, id: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| n.id != id);
        if self.nodes.len() == before {
            return false;
        }
        self.edges.retain(|e| !e.touches(id));
        true
    }

    pub fn remove_edge(&mut self, id: &str) -> bool {
        let before = self.edges.len();
        self.edges.retain(|e| e.id != id);
        self.edges.len() != before
    }

    /// Keep the first node for each id. Returns how many duplicates were removed.
    pub fn dedup_nodes(&mut self) -> usize {
        let before = self.nodes.len();
        let mut seen = std::collections::HashSet::new();
        self.nodes.retain(|n| seen.insert(n.id.clone()));
        before - self.nodes.len()
    }

    /// Keep the first edge for each id. Returns how many duplicates were removed.
    pub fn dedup_edges(&mut self) -> usize {
        let before = self.edges.len();
        let mut seen = std::collections::HashSet::new();
        self.edges.retain(|e| seen.insert(e.id.clone()));
        before - self.edges.len()
    }

    /// Drop edges whose endpoints do not exist. Returns how many were removed.
    pub fn prune_dangling_edges(&mut self) -> usize {
        let ids: std::collections::HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let keep: Vec<Edge> = self
            .edges
            .iter()
            .filter(|e| ids.contains(e.source.as_str()) && ids.contains(e.target.as_str()))
            .cloned()
            .collect();
        let removed = self.edges.len() - keep.len();
        self.edges = keep;
        removed
    }
}
