use super::{
    layout, sockets, BuildNotice, ColorSpace, DisplacementMethod, Interpolation, MaterialGraphSpec, MaterialSettings,
    NodeId, NodeKind, Position, Projection, TextureMapping, TextureSample,
};
use crate::classify::{RoleKeywordTable, TextureRole};
use crate::error::BuildError;
use crate::host::{ImageHandle, ImageLoader};
use crate::options::ImportOptions;
use crate::texture_set::{TextureEntry, TextureSet};

/// Slots in the order their samples are emitted.
const EMIT_ORDER: [TextureRole; 10] = [
    TextureRole::BaseColor,
    TextureRole::Subsurface,
    TextureRole::Metallic,
    TextureRole::Specular,
    TextureRole::Roughness,
    TextureRole::Emission,
    TextureRole::Alpha,
    TextureRole::Normal,
    TextureRole::Displacement,
    TextureRole::AmbientOcclusion,
];

/// How a slot's sample is wired into the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wiring {
    /// Color output straight into a principled input.
    Principled(&'static str),
    /// Direct, through a color ramp, or through an invert for gloss maps.
    Roughness,
    /// Through a normal map or bump node.
    Normal,
    /// Through a displacement node into the material output.
    Displacement,
    /// Stacked first, never connected.
    AmbientOcclusion,
}

fn wiring(slot: TextureRole) -> Wiring {
    match slot {
        TextureRole::BaseColor => Wiring::Principled(sockets::BASE_COLOR),
        TextureRole::Subsurface => Wiring::Principled(sockets::SUBSURFACE),
        TextureRole::Metallic => Wiring::Principled(sockets::METALLIC),
        TextureRole::Specular => Wiring::Principled(sockets::SPECULAR),
        TextureRole::Emission => Wiring::Principled(sockets::EMISSION),
        TextureRole::Alpha => Wiring::Principled(sockets::ALPHA),
        TextureRole::Roughness | TextureRole::Gloss => Wiring::Roughness,
        TextureRole::Normal | TextureRole::Bump => Wiring::Normal,
        TextureRole::Displacement => Wiring::Displacement,
        TextureRole::AmbientOcclusion => Wiring::AmbientOcclusion,
    }
}

/// Synthesizes a principled material graph from a [`TextureSet`].
pub struct ShaderGraphBuilder<'a> {
    loader: &'a dyn ImageLoader,
    keywords: &'a RoleKeywordTable,
}

impl<'a> ShaderGraphBuilder<'a> {
    pub fn new(loader: &'a dyn ImageLoader, keywords: &'a RoleKeywordTable) -> Self {
        Self { loader, keywords }
    }

    pub fn build(&self, name: &str, set: &TextureSet, options: &ImportOptions) -> Result<MaterialGraphSpec, BuildError> {
        if name.trim().is_empty() {
            return Err(BuildError::EmptyName);
        }

        let mut draft = Draft::new(name, options);
        for slot in EMIT_ORDER {
            let Some(entry) = set.get(slot) else {
                continue;
            };
            if !options.imports(slot) {
                log::debug!("{}: {} import disabled, skipping {}", name, slot, entry.file.name);
                continue;
            }
            let image = match self.loader.load(&entry.file.path) {
                Ok(image) => image,
                Err(err) => {
                    log::warn!("{}: dropping {} texture: {}", name, slot, err);
                    draft.graph.push_notice(BuildNotice::ImageLoadFailed {
                        role: entry.role,
                        path: entry.file.path.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };
            let sample = draft.add_sample(slot, entry, image);
            draft.wire(wiring(slot), sample, entry, self.keywords);
        }
        draft.finish()
    }
}

/// Graph under construction plus the bookkeeping needed for layout.
struct Draft<'o> {
    graph: MaterialGraphSpec,
    options: &'o ImportOptions,
    output: NodeId,
    principled: NodeId,
    mapping: NodeId,
    coordinate: NodeId,
    value: Option<NodeId>,
    emitted: usize,
    stack: Vec<NodeId>,
    ambient_occlusion: Option<NodeId>,
    displacement: Option<NodeId>,
    /// (sample, intermediate node processing it)
    followers: Vec<(NodeId, NodeId)>,
}

impl<'o> Draft<'o> {
    fn new(name: &str, options: &'o ImportOptions) -> Self {
        let mut graph = MaterialGraphSpec::new(name);
        graph.settings = MaterialSettings {
            fake_user: options.use_fake_user,
            displacement_method: if options.use_real_displacement {
                DisplacementMethod::Both
            } else {
                DisplacementMethod::Bump
            },
        };

        let output = graph.add_node("output", NodeKind::Output, layout::OUTPUT);
        let principled = graph.add_node("principled", NodeKind::Principled, layout::PRINCIPLED);
        graph.link(principled, sockets::BSDF, output, sockets::SURFACE);

        let mapping_at = layout::PRINCIPLED + layout::MAPPING_OFFSET;
        let mapping = graph.add_node("mapping", NodeKind::Mapping, mapping_at);
        let coordinate_at = mapping_at + layout::COORDINATE_OFFSET;
        let coordinate = graph.add_node("coordinate", NodeKind::Coordinate, coordinate_at);
        graph.link(coordinate, options.texture_mapping.socket(), mapping, sockets::VECTOR);

        let value = if options.add_utility_nodes {
            let value = graph.add_node(
                "scale_value",
                NodeKind::Value { value: 1.0 },
                coordinate_at + layout::VALUE_OFFSET,
            );
            graph.link(value, sockets::VALUE, mapping, sockets::SCALE);
            Some(value)
        } else {
            None
        };

        Self {
            graph,
            options,
            output,
            principled,
            mapping,
            coordinate,
            value,
            emitted: 0,
            stack: Vec::new(),
            ambient_occlusion: None,
            displacement: None,
            followers: Vec::new(),
        }
    }

    fn add_sample(&mut self, slot: TextureRole, entry: &TextureEntry, image: ImageHandle) -> NodeId {
        let (projection, projection_blend) = match self.options.texture_mapping {
            TextureMapping::Uv => (Projection::Flat, 0.0),
            TextureMapping::Object => (Projection::Box, 1.0),
        };
        let sample = TextureSample {
            role: entry.role,
            image,
            color_space: if slot.is_color() {
                ColorSpace::Managed
            } else {
                ColorSpace::NonColor
            },
            projection,
            projection_blend,
            interpolation: if slot == TextureRole::Displacement {
                Interpolation::Smart
            } else {
                Interpolation::Linear
            },
        };
        let at = layout::emitted(self.emitted);
        self.emitted += 1;
        self.graph
            .add_node(format!("tex_{}", slot), NodeKind::TextureSample(sample), at)
    }

    fn wire(&mut self, wiring: Wiring, sample: NodeId, entry: &TextureEntry, keywords: &RoleKeywordTable) {
        let at = self.graph.node(sample).position;
        match wiring {
            Wiring::Principled(socket) => {
                self.graph.link(sample, sockets::COLOR, self.principled, socket);
                self.stack.push(sample);
            }
            Wiring::Roughness => {
                if is_gloss(entry, keywords) {
                    let invert = self.graph.add_node("invert_gloss", NodeKind::Invert, at);
                    self.graph.link(sample, sockets::COLOR, invert, sockets::COLOR);
                    self.graph.link(invert, sockets::COLOR, self.principled, sockets::ROUGHNESS);
                    self.followers.push((sample, invert));
                } else if self.options.add_utility_nodes {
                    let ramp = self.graph.add_node("roughness_ramp", NodeKind::ColorRamp, at);
                    self.graph.link(sample, sockets::COLOR, ramp, sockets::FAC);
                    self.graph.link(ramp, sockets::COLOR, self.principled, sockets::ROUGHNESS);
                    self.followers.push((sample, ramp));
                } else {
                    self.graph.link(sample, sockets::COLOR, self.principled, sockets::ROUGHNESS);
                }
                self.stack.push(sample);
            }
            Wiring::Normal => {
                let name = entry.file.name.as_str();
                let converter = if keywords.token_match(TextureRole::Normal, name) {
                    Some(("normal_map", NodeKind::NormalMap, sockets::COLOR))
                } else if keywords.token_match(TextureRole::Bump, name) {
                    Some(("bump", NodeKind::Bump, sockets::HEIGHT))
                } else {
                    None
                };
                match converter {
                    Some((node_name, kind, input)) => {
                        let node = self.graph.add_node(node_name, kind, at);
                        self.graph.link(sample, sockets::COLOR, node, input);
                        self.graph.link(node, sockets::NORMAL, self.principled, sockets::NORMAL);
                        self.followers.push((sample, node));
                    }
                    None => {
                        log::warn!(
                            "{}: '{}' is neither a normal nor a bump map by name, leaving it unconnected",
                            self.graph.name,
                            name
                        );
                        self.graph.push_notice(BuildNotice::NormalUnresolved {
                            path: entry.file.path.clone(),
                        });
                    }
                }
                self.stack.push(sample);
            }
            Wiring::Displacement => {
                let node = self.graph.add_node(
                    "displacement",
                    NodeKind::Displacement {
                        scale: self.options.displacement_scale,
                    },
                    layout::PRINCIPLED + layout::DISPLACEMENT_OFFSET,
                );
                self.graph.link(sample, sockets::COLOR, node, sockets::HEIGHT);
                self.graph.link(node, sockets::DISPLACEMENT, self.output, sockets::DISPLACEMENT);
                self.displacement = Some(sample);
            }
            Wiring::AmbientOcclusion => {
                self.ambient_occlusion = Some(sample);
            }
        }
    }

    fn finish(mut self) -> Result<MaterialGraphSpec, BuildError> {
        let mut order: Vec<NodeId> = Vec::with_capacity(self.stack.len() + 2);
        order.extend(self.ambient_occlusion);
        order.extend(self.stack.iter().copied());
        order.extend(self.displacement);

        let anchor = self.graph.node(self.principled).position;
        layout::reflow(&mut self.graph, anchor, &order, &self.followers);

        let mut texture_frame_members = order.clone();
        match order.as_slice() {
            [] => {}
            [only] => {
                self.graph.link(self.mapping, sockets::VECTOR, *only, sockets::VECTOR);
            }
            samples => {
                let at = layout::reroute(&self.graph, samples);
                let reroute = self.graph.add_node("reroute", NodeKind::Reroute, at);
                self.graph.link(self.mapping, sockets::VECTOR, reroute, sockets::INPUT);
                for sample in samples {
                    self.graph.link(reroute, sockets::OUTPUT, *sample, sockets::VECTOR);
                }
                texture_frame_members.push(reroute);
            }
        }

        let mut mapping_members = vec![self.mapping, self.coordinate];
        mapping_members.extend(self.value);
        self.add_frame("frame_mapping", "Mapping", &mapping_members);
        if !texture_frame_members.is_empty() {
            self.add_frame("frame_textures", "Textures", &texture_frame_members);
        }

        self.graph.validate()?;
        log::debug!(
            "Built '{}': {} nodes, {} links, {} textures",
            self.graph.name,
            self.graph.nodes().len(),
            self.graph.edges().len(),
            self.graph.texture_sample_count()
        );
        Ok(self.graph)
    }

    fn add_frame(&mut self, name: &str, label: &str, members: &[NodeId]) -> NodeId {
        let at: Position = layout::frame(&self.graph, members);
        let frame = self.graph.add_node(
            name,
            NodeKind::Frame {
                label: label.to_string(),
            },
            at,
        );
        for member in members {
            self.graph.set_parent(*member, frame);
        }
        frame
    }
}

/// Decide between roughness and gloss by whole-word match, falling back to
/// the role the file was classified as.
fn is_gloss(entry: &TextureEntry, keywords: &RoleKeywordTable) -> bool {
    let name = entry.file.name.as_str();
    if keywords.token_match(TextureRole::Roughness, name) {
        false
    } else if keywords.token_match(TextureRole::Gloss, name) {
        true
    } else {
        entry.role == TextureRole::Gloss
    }
}
