//! Interfaces to the outside world: image loading, file enumeration and the
//! host graph store that owns materials once they are built.

pub mod fs;

pub use fs::{FsEnumerator, FsImageLoader};

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{HostError, LoadError};
use crate::graph::{MaterialGraphSpec, MaterialSettings, NodeId, NodeKind, Position};
use crate::texture_set::RawFile;

/// A loaded image as seen by the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageHandle {
    pub name: String,
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

pub trait ImageLoader {
    fn load(&self, path: &Path) -> Result<ImageHandle, LoadError>;
}

/// Lists directory contents one level deep.
///
/// Order must be stable between calls but is not assumed to be sorted.
pub trait FileEnumerator {
    fn subdirectories(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
    fn files(&self, dir: &Path) -> io::Result<Vec<RawFile>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(pub u64);

/// Host-side handle of a node inside one material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostNode(pub usize);

/// Mutation primitives of the host asset store.
pub trait HostGraphStore {
    /// Names of all materials currently in the store.
    fn material_names(&self) -> Vec<String>;
    fn create_material(&mut self, name: &str) -> Result<MaterialId, HostError>;
    fn configure_material(&mut self, material: MaterialId, settings: &MaterialSettings) -> Result<(), HostError>;
    fn create_node(&mut self, material: MaterialId, name: &str, kind: &NodeKind) -> Result<HostNode, HostError>;
    fn link(
        &mut self,
        material: MaterialId,
        from: HostNode,
        from_socket: &str,
        to: HostNode,
        to_socket: &str,
    ) -> Result<(), HostError>;
    fn set_position(&mut self, material: MaterialId, node: HostNode, position: Position) -> Result<(), HostError>;
    fn set_parent(&mut self, material: MaterialId, node: HostNode, frame: HostNode) -> Result<(), HostError>;
    fn remove_material(&mut self, material: MaterialId) -> Result<(), HostError>;
}

/// Write a built graph into the store as a new material.
///
/// Either the whole graph lands or nothing does: if any call is rejected the
/// half-written material is removed again before the error is returned.
pub fn commit<S>(store: &mut S, spec: &MaterialGraphSpec) -> Result<MaterialId, HostError>
where
    S: HostGraphStore + ?Sized,
{
    let material = store.create_material(&spec.name)?;
    match write_graph(store, material, spec) {
        Ok(()) => Ok(material),
        Err(err) => {
            if let Err(cleanup) = store.remove_material(material) {
                log::warn!("Failed to remove partial material '{}': {}", spec.name, cleanup);
            }
            Err(err)
        }
    }
}

fn write_graph<S>(store: &mut S, material: MaterialId, spec: &MaterialGraphSpec) -> Result<(), HostError>
where
    S: HostGraphStore + ?Sized,
{
    store.configure_material(material, &spec.settings)?;

    let mut handles = Vec::with_capacity(spec.nodes().len());
    for node in spec.nodes() {
        let handle = store.create_node(material, &node.name, &node.kind)?;
        store.set_position(material, handle, node.position)?;
        handles.push(handle);
    }

    let handle = |id: NodeId| {
        handles.get(id.0).copied().ok_or_else(|| HostError::UnknownNode {
            material: spec.name.clone(),
            node: id.0,
        })
    };

    for (node, own) in spec.nodes().iter().zip(&handles) {
        if let Some(frame) = node.parent {
            store.set_parent(material, *own, handle(frame)?)?;
        }
    }

    for edge in spec.edges() {
        store.link(
            material,
            handle(edge.from)?,
            &edge.from_socket,
            handle(edge.to)?,
            &edge.to_socket,
        )?;
    }
    Ok(())
}
