use std::path::PathBuf;
use thiserror::Error;

use crate::host::MaterialId;

/// Image loader failure. The affected slot is left out of the graph.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("image not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read image {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {} rejected: {reason}", path.display())]
    Rejected { path: PathBuf, reason: String },
}

/// The host store refused an operation.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown material {0:?}")]
    UnknownMaterial(MaterialId),
    #[error("material '{material}' has no node #{node}")]
    UnknownNode { material: String, node: usize },
    #[error("node '{node}' has no socket '{socket}'")]
    NoSuchSocket { node: String, socket: String },
    #[error("input '{socket}' on node '{node}' is already linked")]
    InputOccupied { node: String, socket: String },
    #[error("node '{node}' is not a frame")]
    NotAFrame { node: String },
    #[error("{0}")]
    Rejected(String),
}

/// A synthesized graph broke one of its structural invariants.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("expected exactly one {kind} node, found {count}")]
    BaseNodeCount { kind: &'static str, count: usize },
    #[error("edge #{index} references a missing node")]
    DanglingEdge { index: usize },
    #[error("node '{node}' has no socket '{socket}'")]
    UnknownSocket { node: String, socket: String },
    #[error("input '{socket}' on node '{node}' is linked more than once")]
    InputLinkedTwice { node: String, socket: String },
    #[error("texture node '{node}' has {count} outgoing links")]
    SampleFanOut { node: String, count: usize },
    #[error("parent of node '{node}' is not a frame")]
    ParentNotFrame { node: String },
    #[error("graph contains a cycle")]
    Cycle,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("material name is empty")]
    EmptyName,
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Failure confined to one batch item. The batch carries on.
#[derive(Debug, Error)]
pub enum ItemFailure {
    #[error("failed to list {}: {source}", path.display())]
    Listing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build material '{name}': {source}")]
    Build {
        name: String,
        #[source]
        source: BuildError,
    },
    #[error("host store rejected material '{name}': {source}")]
    Host {
        name: String,
        #[source]
        source: HostError,
    },
}

/// Failure that stops a whole batch.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to list import root {}: {source}", path.display())]
    ListRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
