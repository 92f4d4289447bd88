//! Node graph data model handed to the host store.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::ops::Add;
use std::path::PathBuf;

use super::sockets;
use crate::classify::TextureRole;
use crate::error::GraphError;
use crate::host::ImageHandle;

/// 2-D editor position of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, rhs: Position) -> Position {
        Position::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Coordinate channel driving the mapping node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureMapping {
    #[default]
    #[serde(alias = "UV")]
    Uv,
    #[serde(alias = "Object")]
    Object,
}

impl TextureMapping {
    /// Output socket on the coordinate node.
    pub fn socket(self) -> &'static str {
        match self {
            TextureMapping::Uv => sockets::UV,
            TextureMapping::Object => sockets::OBJECT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    #[default]
    Managed,
    NonColor,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Projection {
    #[default]
    Flat,
    Box,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    #[default]
    Linear,
    Smart,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplacementMethod {
    #[default]
    Bump,
    Both,
}

/// Image texture node payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextureSample {
    /// Classified role of the file, possibly a sub-role.
    pub role: TextureRole,
    pub image: ImageHandle,
    pub color_space: ColorSpace,
    pub projection: Projection,
    pub projection_blend: f32,
    pub interpolation: Interpolation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Output,
    Principled,
    Mapping,
    Coordinate,
    TextureSample(TextureSample),
    NormalMap,
    Bump,
    Invert,
    ColorRamp,
    Displacement { scale: f32 },
    Value { value: f32 },
    Reroute,
    Frame { label: String },
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Output => "output",
            NodeKind::Principled => "principled",
            NodeKind::Mapping => "mapping",
            NodeKind::Coordinate => "coordinate",
            NodeKind::TextureSample(_) => "texture_sample",
            NodeKind::NormalMap => "normal_map",
            NodeKind::Bump => "bump",
            NodeKind::Invert => "invert",
            NodeKind::ColorRamp => "color_ramp",
            NodeKind::Displacement { .. } => "displacement",
            NodeKind::Value { .. } => "value",
            NodeKind::Reroute => "reroute",
            NodeKind::Frame { .. } => "frame",
        }
    }

    pub fn inputs(&self) -> &'static [&'static str] {
        use sockets::*;
        match self {
            NodeKind::Output => &[SURFACE, DISPLACEMENT],
            NodeKind::Principled => &[BASE_COLOR, SUBSURFACE, METALLIC, SPECULAR, ROUGHNESS, EMISSION, ALPHA, NORMAL],
            NodeKind::Mapping => &[VECTOR, SCALE],
            NodeKind::Coordinate => &[],
            NodeKind::TextureSample(_) => &[VECTOR],
            NodeKind::NormalMap => &[COLOR],
            NodeKind::Bump => &[HEIGHT],
            NodeKind::Invert => &[FAC, COLOR],
            NodeKind::ColorRamp => &[FAC],
            NodeKind::Displacement { .. } => &[HEIGHT, SCALE],
            NodeKind::Value { .. } => &[],
            NodeKind::Reroute => &[INPUT],
            NodeKind::Frame { .. } => &[],
        }
    }

    pub fn outputs(&self) -> &'static [&'static str] {
        use sockets::*;
        match self {
            NodeKind::Output => &[],
            NodeKind::Principled => &[BSDF],
            NodeKind::Mapping => &[VECTOR],
            NodeKind::Coordinate => &[UV, OBJECT],
            NodeKind::TextureSample(_) => &[COLOR],
            NodeKind::NormalMap | NodeKind::Bump => &[NORMAL],
            NodeKind::Invert | NodeKind::ColorRamp => &[COLOR],
            NodeKind::Displacement { .. } => &[DISPLACEMENT],
            NodeKind::Value { .. } => &[VALUE],
            NodeKind::Reroute => &[OUTPUT],
            NodeKind::Frame { .. } => &[],
        }
    }

    pub fn is_texture_sample(&self) -> bool {
        matches!(self, NodeKind::TextureSample(_))
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, NodeKind::Frame { .. })
    }
}

/// Index of a node within its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub position: Position,
    pub parent: Option<NodeId>,
}

/// Directed link `from.from_socket → to.to_socket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub from_socket: String,
    pub to: NodeId,
    pub to_socket: String,
}

/// Per-material flags applied by the host store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialSettings {
    pub fake_user: bool,
    pub displacement_method: DisplacementMethod,
}

/// Non-fatal problem met while building a graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildNotice {
    /// The slot's image could not be loaded; the slot was left out.
    ImageLoadFailed {
        role: TextureRole,
        path: PathBuf,
        reason: String,
    },
    /// A normal-slot file matched neither the normal nor the bump keywords
    /// as a whole word; its sample is placed but not connected.
    NormalUnresolved { path: PathBuf },
}

impl fmt::Display for BuildNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildNotice::ImageLoadFailed { role, path, reason } => {
                write!(f, "{} texture {} skipped: {}", role, path.display(), reason)
            }
            BuildNotice::NormalUnresolved { path } => {
                write!(f, "{} is neither a normal nor a bump map, left unconnected", path.display())
            }
        }
    }
}

/// A fully wired material graph, ready to be committed to a host store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialGraphSpec {
    pub name: String,
    pub settings: MaterialSettings,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(default)]
    notices: Vec<BuildNotice>,
}

impl MaterialGraphSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: MaterialSettings::default(),
            nodes: Vec::new(),
            edges: Vec::new(),
            notices: Vec::new(),
        }
    }

    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind, position: Position) -> NodeId {
        self.nodes.push(Node {
            name: name.into(),
            kind,
            position,
            parent: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn link(&mut self, from: NodeId, from_socket: &str, to: NodeId, to_socket: &str) {
        self.edges.push(Edge {
            from,
            from_socket: from_socket.to_string(),
            to,
            to_socket: to_socket.to_string(),
        });
    }

    /// Panics if `id` was not handed out by this graph.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Unknown ids are ignored.
    pub fn set_position(&mut self, id: NodeId, position: Position) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.position = position;
        }
    }

    /// Unknown ids are ignored. A parent that is not a frame is caught by
    /// [`validate`](Self::validate).
    pub fn set_parent(&mut self, id: NodeId, frame: NodeId) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            node.parent = Some(frame);
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn notices(&self) -> &[BuildNotice] {
        &self.notices
    }

    pub fn push_notice(&mut self, notice: BuildNotice) {
        self.notices.push(notice);
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        (0..self.nodes.len()).map(NodeId)
    }

    /// Ids of nodes whose kind matches `pred`, in creation order.
    pub fn find_all(&self, pred: impl Fn(&NodeKind) -> bool) -> Vec<NodeId> {
        self.node_ids().filter(|id| pred(&self.node(*id).kind)).collect()
    }

    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.node_ids().find(|id| self.node(*id).name == name)
    }

    pub fn count(&self, type_name: &str) -> usize {
        self.nodes.iter().filter(|n| n.kind.type_name() == type_name).count()
    }

    pub fn texture_sample_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind.is_texture_sample()).count()
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.from == id)
    }

    /// The edge feeding `socket` on `id`, if any.
    pub fn incoming(&self, id: NodeId, socket: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.to == id && e.to_socket == socket)
    }

    /// Check the structural invariants of a material graph.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (kind, count) in [("output", self.count("output")), ("principled", self.count("principled"))] {
            if count != 1 {
                return Err(GraphError::BaseNodeCount { kind, count });
            }
        }

        let mut linked_inputs: HashMap<(NodeId, &str), usize> = HashMap::new();
        for (index, edge) in self.edges.iter().enumerate() {
            let (Some(from), Some(to)) = (self.nodes.get(edge.from.0), self.nodes.get(edge.to.0)) else {
                return Err(GraphError::DanglingEdge { index });
            };
            if !from.kind.outputs().contains(&edge.from_socket.as_str()) {
                return Err(GraphError::UnknownSocket {
                    node: from.name.clone(),
                    socket: edge.from_socket.clone(),
                });
            }
            if !to.kind.inputs().contains(&edge.to_socket.as_str()) {
                return Err(GraphError::UnknownSocket {
                    node: to.name.clone(),
                    socket: edge.to_socket.clone(),
                });
            }
            let seen = linked_inputs.entry((edge.to, edge.to_socket.as_str())).or_insert(0);
            *seen += 1;
            if *seen > 1 {
                return Err(GraphError::InputLinkedTwice {
                    node: to.name.clone(),
                    socket: edge.to_socket.clone(),
                });
            }
        }

        for id in self.node_ids() {
            let node = self.node(id);
            if node.kind.is_texture_sample() {
                let count = self.outgoing(id).count();
                if count > 1 {
                    return Err(GraphError::SampleFanOut {
                        node: node.name.clone(),
                        count,
                    });
                }
            }
            if let Some(parent) = node.parent {
                if !self.nodes.get(parent.0).is_some_and(|p| p.kind.is_frame()) {
                    return Err(GraphError::ParentNotFrame { node: node.name.clone() });
                }
            }
        }

        if self.has_cycle() {
            return Err(GraphError::Cycle);
        }
        Ok(())
    }

    fn has_cycle(&self) -> bool {
        let mut in_degree = vec![0usize; self.nodes.len()];
        for edge in &self.edges {
            in_degree[edge.to.0] += 1;
        }
        let mut queue: VecDeque<usize> = (0..self.nodes.len()).filter(|i| in_degree[*i] == 0).collect();
        let mut visited = 0;
        while let Some(i) = queue.pop_front() {
            visited += 1;
            for edge in self.edges.iter().filter(|e| e.from.0 == i) {
                in_degree[edge.to.0] -= 1;
                if in_degree[edge.to.0] == 0 {
                    queue.push_back(edge.to.0);
                }
            }
        }
        visited != self.nodes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_graph() -> (MaterialGraphSpec, NodeId, NodeId) {
        let mut g = MaterialGraphSpec::new("test");
        let out = g.add_node("output", NodeKind::Output, Position::default());
        let bsdf = g.add_node("principled", NodeKind::Principled, Position::default());
        g.link(bsdf, sockets::BSDF, out, sockets::SURFACE);
        (g, out, bsdf)
    }

    #[test]
    fn minimal_graph_is_valid() {
        let (g, _, _) = base_graph();
        assert!(g.validate().is_ok());
    }

    #[test]
    fn rejects_missing_principled() {
        let mut g = MaterialGraphSpec::new("test");
        g.add_node("output", NodeKind::Output, Position::default());
        assert!(matches!(
            g.validate(),
            Err(GraphError::BaseNodeCount { kind: "principled", count: 0 })
        ));
    }

    #[test]
    fn rejects_unknown_socket() {
        let (mut g, out, bsdf) = base_graph();
        g.link(bsdf, sockets::BSDF, out, "Volume");
        assert!(matches!(g.validate(), Err(GraphError::UnknownSocket { .. })));
    }

    #[test]
    fn rejects_cycles() {
        let (mut g, _, _) = base_graph();
        let a = g.add_node("a", NodeKind::Reroute, Position::default());
        let b = g.add_node("b", NodeKind::Reroute, Position::default());
        g.link(a, sockets::OUTPUT, b, sockets::INPUT);
        g.link(b, sockets::OUTPUT, a, sockets::INPUT);
        assert!(matches!(g.validate(), Err(GraphError::Cycle)));
    }

    #[test]
    fn rejects_double_linked_input() {
        let (mut g, out, _) = base_graph();
        let invert = g.add_node("invert", NodeKind::Invert, Position::default());
        g.link(invert, sockets::COLOR, out, sockets::SURFACE);
        assert!(matches!(g.validate(), Err(GraphError::InputLinkedTwice { .. })));
    }

    #[test]
    fn parent_must_be_a_frame() {
        let (mut g, out, bsdf) = base_graph();
        g.set_parent(bsdf, out);
        assert!(matches!(g.validate(), Err(GraphError::ParentNotFrame { .. })));
    }

    #[test]
    fn unknown_ids_are_ignored_by_setters_and_caught_by_validate() {
        let (mut g, out, _) = base_graph();
        g.set_position(NodeId(99), Position::new(1.0, 1.0));
        assert!(g.get(NodeId(99)).is_none());
        g.set_parent(out, NodeId(99));
        assert!(matches!(g.validate(), Err(GraphError::ParentNotFrame { .. })));
    }
}
