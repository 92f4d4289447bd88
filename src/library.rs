//! In-memory material store, persisted by the CLI as JSON.

use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::graph::{DisplacementMethod, MaterialSettings, NodeKind, Position};
use crate::host::{HostGraphStore, HostNode, MaterialId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredNode {
    pub name: String,
    pub kind: NodeKind,
    pub position: Position,
    pub parent: Option<HostNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredLink {
    pub from: HostNode,
    pub from_socket: String,
    pub to: HostNode,
    pub to_socket: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMaterial {
    pub id: MaterialId,
    pub name: String,
    pub settings: MaterialSettings,
    pub nodes: Vec<StoredNode>,
    pub links: Vec<StoredLink>,
}

impl StoredMaterial {
    pub fn texture_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.kind.is_texture_sample()).count()
    }

    fn node(&self, node: HostNode) -> Result<&StoredNode, HostError> {
        self.nodes.get(node.0).ok_or_else(|| HostError::UnknownNode {
            material: self.name.clone(),
            node: node.0,
        })
    }
}

/// A flat collection of materials implementing [`HostGraphStore`].
///
/// Names are unique: creating a material under a taken name stores it as
/// `name.001`, `name.002` and so on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialLibrary {
    materials: Vec<StoredMaterial>,
    next_id: u64,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn materials(&self) -> &[StoredMaterial] {
        &self.materials
    }

    pub fn get(&self, name: &str) -> Option<&StoredMaterial> {
        self.materials.iter().find(|m| m.name == name)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Switch every material to true displacement. Returns how many changed.
    pub fn enable_real_displacement(&mut self) -> usize {
        let mut changed = 0;
        for material in &mut self.materials {
            if material.settings.displacement_method != DisplacementMethod::Both {
                material.settings.displacement_method = DisplacementMethod::Both;
                changed += 1;
            }
        }
        changed
    }

    /// Set the scale of every displacement node. Returns the node count.
    pub fn set_displacement_scale(&mut self, new_scale: f32) -> usize {
        let mut changed = 0;
        for node in self.materials.iter_mut().flat_map(|m| m.nodes.iter_mut()) {
            if let NodeKind::Displacement { scale } = &mut node.kind {
                *scale = new_scale;
                changed += 1;
            }
        }
        changed
    }

    fn unique_name(&self, name: &str) -> String {
        if self.get(name).is_none() {
            return name.to_string();
        }
        (1..)
            .map(|i| format!("{}.{:03}", name, i))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    fn material_mut(&mut self, id: MaterialId) -> Result<&mut StoredMaterial, HostError> {
        self.materials
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(HostError::UnknownMaterial(id))
    }
}

impl HostGraphStore for MaterialLibrary {
    fn material_names(&self) -> Vec<String> {
        self.materials.iter().map(|m| m.name.clone()).collect()
    }

    fn create_material(&mut self, name: &str) -> Result<MaterialId, HostError> {
        if name.is_empty() {
            return Err(HostError::Rejected("material name is empty".into()));
        }
        let id = MaterialId(self.next_id);
        self.next_id += 1;
        let name = self.unique_name(name);
        log::debug!("Creating material '{}' ({:?})", name, id);
        self.materials.push(StoredMaterial {
            id,
            name,
            settings: MaterialSettings::default(),
            nodes: Vec::new(),
            links: Vec::new(),
        });
        Ok(id)
    }

    fn configure_material(&mut self, material: MaterialId, settings: &MaterialSettings) -> Result<(), HostError> {
        self.material_mut(material)?.settings = *settings;
        Ok(())
    }

    fn create_node(&mut self, material: MaterialId, name: &str, kind: &NodeKind) -> Result<HostNode, HostError> {
        let material = self.material_mut(material)?;
        material.nodes.push(StoredNode {
            name: name.to_string(),
            kind: kind.clone(),
            position: Position::default(),
            parent: None,
        });
        Ok(HostNode(material.nodes.len() - 1))
    }

    fn link(
        &mut self,
        material: MaterialId,
        from: HostNode,
        from_socket: &str,
        to: HostNode,
        to_socket: &str,
    ) -> Result<(), HostError> {
        let material = self.material_mut(material)?;
        let source = material.node(from)?;
        if !source.kind.outputs().contains(&from_socket) {
            return Err(HostError::NoSuchSocket {
                node: source.name.clone(),
                socket: from_socket.to_string(),
            });
        }
        let target = material.node(to)?;
        if !target.kind.inputs().contains(&to_socket) {
            return Err(HostError::NoSuchSocket {
                node: target.name.clone(),
                socket: to_socket.to_string(),
            });
        }
        if material.links.iter().any(|l| l.to == to && l.to_socket == to_socket) {
            return Err(HostError::InputOccupied {
                node: target.name.clone(),
                socket: to_socket.to_string(),
            });
        }
        material.links.push(StoredLink {
            from,
            from_socket: from_socket.to_string(),
            to,
            to_socket: to_socket.to_string(),
        });
        Ok(())
    }

    fn set_position(&mut self, material: MaterialId, node: HostNode, position: Position) -> Result<(), HostError> {
        let material = self.material_mut(material)?;
        material.node(node)?;
        material.nodes[node.0].position = position;
        Ok(())
    }

    fn set_parent(&mut self, material: MaterialId, node: HostNode, frame: HostNode) -> Result<(), HostError> {
        let material = self.material_mut(material)?;
        material.node(node)?;
        let parent = material.node(frame)?;
        if !parent.kind.is_frame() {
            return Err(HostError::NotAFrame {
                node: parent.name.clone(),
            });
        }
        material.nodes[node.0].parent = Some(frame);
        Ok(())
    }

    fn remove_material(&mut self, material: MaterialId) -> Result<(), HostError> {
        let index = self
            .materials
            .iter()
            .position(|m| m.id == material)
            .ok_or(HostError::UnknownMaterial(material))?;
        let removed = self.materials.remove(index);
        log::debug!("Removed material '{}'", removed.name);
        Ok(())
    }
}
