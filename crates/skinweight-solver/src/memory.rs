//! In-memory scene host.
//!
//! [`MemoryScene`] implements every port with a translation-only skeleton and
//! a linear-blend skin. It backs the CLI and the test suite where no DCC
//! application is available.
//!
//! Scenes are described by a [`SceneFile`]:
//!
//! ```json
//! {
//!   "nodes": [
//!     { "name": "root", "kind": "joint", "translation": [0, 0, 0] },
//!     { "name": "child", "kind": "joint", "parent": "root", "translation": [0, 1, 0] },
//!     { "name": "body", "kind": "mesh",
//!       "mesh": { "vertices": [[0, 1, 0]],
//!                 "skin": { "name": "skinCluster1", "influences": ["root", "child"],
//!                           "weights": { "0": [["child", 1.0]] } } } }
//!   ]
//! }
//! ```
//!
//! `translation` is the world translation at bind time. Parents must be
//! declared before their children, which keeps every scene acyclic.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use glam::DVec3;
use serde::{Deserialize, Serialize};
use skinweight_data::{parse_vertex_id, WeightEntry};

use crate::error::{AssignmentError, HostError, HostResult, SolverError, SolverResult};
use crate::ports::{DeformerHandle, DeformerPort, GeometryPort, NodeHandle, PosePort, SceneResolver};

/// Kind of scene node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Joint,
    Transform,
    Mesh,
}

/// Serializable scene description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneFile {
    pub nodes: Vec<SceneNode>,
}

/// One node of a [`SceneFile`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneNode {
    pub name: String,
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// World translation.
    #[serde(default)]
    pub translation: DVec3,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshData>,
}

/// Rest geometry of a mesh node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MeshData {
    pub vertices: Vec<DVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<SkinData>,
}

/// Skin deformer bound to a mesh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkinData {
    pub name: String,
    /// Bones bound to the skin. Weights may only reference these.
    pub influences: Vec<String>,
    /// Whether the skin renormalizes a vertex after each assignment.
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    /// Vertex id -> weights.
    #[serde(default)]
    pub weights: BTreeMap<String, Vec<WeightEntry>>,
}

fn default_normalize() -> bool {
    true
}

impl SceneFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a scene description from JSON.
    pub fn from_json(json: &str) -> SolverResult<Self> {
        serde_json::from_str(json).map_err(|e| SolverError::scene(e.to_string()))
    }

    /// Serializes the scene description to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> SolverResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SolverError::scene(e.to_string()))
    }

    /// Appends a joint.
    pub fn joint(self, name: &str, parent: Option<&str>, translation: [f64; 3]) -> Self {
        self.node(name, NodeKind::Joint, parent, translation)
    }

    /// Appends a non-joint transform.
    pub fn transform(self, name: &str, parent: Option<&str>, translation: [f64; 3]) -> Self {
        self.node(name, NodeKind::Transform, parent, translation)
    }

    /// Appends a mesh with the given rest vertices.
    pub fn mesh(mut self, name: &str, vertices: &[[f64; 3]]) -> Self {
        self.nodes.push(SceneNode {
            name: name.to_string(),
            kind: NodeKind::Mesh,
            parent: None,
            translation: DVec3::ZERO,
            mesh: Some(MeshData {
                vertices: vertices.iter().map(|v| DVec3::from_array(*v)).collect(),
                skin: None,
            }),
        });
        self
    }

    /// Binds a skin to a previously added mesh.
    pub fn skin(mut self, mesh: &str, skin_name: &str, influences: &[&str]) -> Self {
        if let Some(data) = self.mesh_data_mut(mesh) {
            data.skin = Some(SkinData {
                name: skin_name.to_string(),
                influences: influences.iter().map(|s| s.to_string()).collect(),
                normalize: true,
                weights: BTreeMap::new(),
            });
        }
        self
    }

    /// Sets bind weights of one vertex of a previously skinned mesh.
    pub fn bind_weights(mut self, mesh: &str, vertex: usize, weights: &[(&str, f64)]) -> Self {
        if let Some(skin) = self.mesh_data_mut(mesh).and_then(|m| m.skin.as_mut()) {
            skin.weights.insert(
                vertex.to_string(),
                weights
                    .iter()
                    .map(|(bone, weight)| WeightEntry::new(*bone, *weight))
                    .collect(),
            );
        }
        self
    }

    fn node(
        mut self,
        name: &str,
        kind: NodeKind,
        parent: Option<&str>,
        translation: [f64; 3],
    ) -> Self {
        self.nodes.push(SceneNode {
            name: name.to_string(),
            kind,
            parent: parent.map(str::to_string),
            translation: DVec3::from_array(translation),
            mesh: None,
        });
        self
    }

    fn mesh_data_mut(&mut self, mesh: &str) -> Option<&mut MeshData> {
        self.nodes
            .iter_mut()
            .find(|n| n.name == mesh)
            .and_then(|n| n.mesh.as_mut())
    }
}

#[derive(Debug, Clone)]
struct RuntimeNode {
    name: String,
    kind: NodeKind,
    parent: Option<usize>,
    children: Vec<usize>,
    local: DVec3,
    bind_world: DVec3,
    mesh: Option<RuntimeMesh>,
}

#[derive(Debug, Clone)]
struct RuntimeMesh {
    vertices: Vec<DVec3>,
    skin: Option<RuntimeSkin>,
}

#[derive(Debug, Clone)]
struct RuntimeSkin {
    name: String,
    influences: Vec<String>,
    normalize: bool,
    weights: Vec<BTreeMap<String, f64>>,
}

impl RuntimeSkin {
    fn renormalize(&mut self, vertex: usize) {
        let map = &mut self.weights[vertex];
        let total: f64 = map.values().sum();
        if total > 0.0 {
            for weight in map.values_mut() {
                *weight /= total;
            }
        }
    }
}

/// Translation-only scene with linear-blend skinned meshes.
#[derive(Debug, Clone)]
pub struct MemoryScene {
    nodes: Vec<RuntimeNode>,
    names: HashMap<String, usize>,
}

impl MemoryScene {
    /// Builds a scene from its description.
    pub fn from_scene_file(file: &SceneFile) -> SolverResult<Self> {
        let mut nodes: Vec<RuntimeNode> = Vec::with_capacity(file.nodes.len());
        let mut names = HashMap::with_capacity(file.nodes.len());

        for node in &file.nodes {
            if names.contains_key(&node.name) {
                return Err(SolverError::scene(format!(
                    "duplicate node name '{}'",
                    node.name
                )));
            }

            let parent = match &node.parent {
                Some(parent_name) => Some(*names.get(parent_name).ok_or_else(|| {
                    SolverError::scene(format!(
                        "parent '{}' of '{}' must be declared before it",
                        parent_name, node.name
                    ))
                })?),
                None => None,
            };
            let parent_world = parent.map_or(DVec3::ZERO, |p: usize| nodes[p].bind_world);

            let mesh = match (node.kind, &node.mesh) {
                (NodeKind::Mesh, Some(data)) => Some(RuntimeMesh {
                    vertices: data.vertices.clone(),
                    skin: None,
                }),
                (NodeKind::Mesh, None) => {
                    return Err(SolverError::scene(format!(
                        "mesh node '{}' has no mesh data",
                        node.name
                    )))
                }
                (_, Some(_)) => {
                    return Err(SolverError::scene(format!(
                        "node '{}' carries mesh data but is not a mesh",
                        node.name
                    )))
                }
                (_, None) => None,
            };

            let index = nodes.len();
            if let Some(p) = parent {
                nodes[p].children.push(index);
            }
            names.insert(node.name.clone(), index);
            nodes.push(RuntimeNode {
                name: node.name.clone(),
                kind: node.kind,
                parent,
                children: Vec::new(),
                local: node.translation - parent_world,
                bind_world: node.translation,
                mesh,
            });
        }

        let mut scene = Self { nodes, names };
        for node in &file.nodes {
            if let Some(skin) = node.mesh.as_ref().and_then(|m| m.skin.as_ref()) {
                scene.bind_skin(&node.name, skin)?;
            }
        }
        Ok(scene)
    }

    /// Parses and builds a scene from JSON.
    pub fn from_json(json: &str) -> SolverResult<Self> {
        Self::from_scene_file(&SceneFile::from_json(json)?)
    }

    /// Reads and builds a scene from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> SolverResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SolverError::scene(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }

    /// Writes the current scene state to a JSON file.
    pub fn write_file(&self, path: impl AsRef<Path>) -> SolverResult<()> {
        let path = path.as_ref();
        let json = self.to_scene_file().to_json_pretty()?;
        std::fs::write(path, json).map_err(|e| {
            SolverError::scene(format!("failed to write {}: {}", path.display(), e))
        })
    }

    /// Describes the current state: world translations and current skin weights.
    pub fn to_scene_file(&self) -> SceneFile {
        let nodes = self
            .nodes
            .iter()
            .enumerate()
            .map(|(index, node)| SceneNode {
                name: node.name.clone(),
                kind: node.kind,
                parent: node.parent.map(|p| self.nodes[p].name.clone()),
                translation: self.world(index),
                mesh: node.mesh.as_ref().map(|mesh| MeshData {
                    vertices: mesh.vertices.clone(),
                    skin: mesh.skin.as_ref().map(|skin| SkinData {
                        name: skin.name.clone(),
                        influences: skin.influences.clone(),
                        normalize: skin.normalize,
                        weights: (0..skin.weights.len())
                            .filter_map(|vertex| {
                                let entries = ordered_entries(skin, vertex);
                                (!entries.is_empty()).then(|| (vertex.to_string(), entries))
                            })
                            .collect(),
                    }),
                }),
            })
            .collect();
        SceneFile { nodes }
    }

    /// Current world translation of a named node.
    pub fn world_translation(&self, name: &str) -> Option<DVec3> {
        self.names.get(name).map(|&index| self.world(index))
    }

    /// Non-zero skin weights of one vertex, in influence order.
    pub fn vertex_weights(&self, mesh: &str, vertex: usize) -> Option<Vec<WeightEntry>> {
        let skin = self.skin_of(mesh)?;
        (vertex < skin.weights.len()).then(|| ordered_entries(skin, vertex))
    }

    /// Whether the mesh's skin currently normalizes assignments.
    pub fn skin_normalize_mode(&self, mesh: &str) -> Option<bool> {
        self.skin_of(mesh).map(|skin| skin.normalize)
    }

    fn skin_of(&self, mesh: &str) -> Option<&RuntimeSkin> {
        let index = *self.names.get(mesh)?;
        self.nodes[index].mesh.as_ref()?.skin.as_ref()
    }

    fn bind_skin(&mut self, mesh_name: &str, skin: &SkinData) -> SolverResult<()> {
        for bone in &skin.influences {
            match self.names.get(bone) {
                Some(&index) if self.nodes[index].kind == NodeKind::Joint => {}
                _ => {
                    return Err(SolverError::scene(format!(
                        "influence '{}' of {} is not a joint in the scene",
                        bone, skin.name
                    )))
                }
            }
        }

        let index = self.names[mesh_name];
        let vertex_count = self.nodes[index]
            .mesh
            .as_ref()
            .map_or(0, |mesh| mesh.vertices.len());

        let mut weights = vec![BTreeMap::new(); vertex_count];
        for (vertex_id, entries) in &skin.weights {
            let vertex = parse_vertex_id(vertex_id)
                .filter(|&v| v < vertex_count)
                .ok_or_else(|| {
                    SolverError::scene(format!(
                        "{} weights reference invalid vertex '{}'",
                        skin.name, vertex_id
                    ))
                })?;
            for entry in entries {
                if !skin.influences.contains(&entry.bone) {
                    return Err(SolverError::scene(format!(
                        "{} weights reference '{}', which is not an influence",
                        skin.name, entry.bone
                    )));
                }
                if entry.weight != 0.0 {
                    weights[vertex].insert(entry.bone.clone(), entry.weight);
                }
            }
        }

        if let Some(mesh) = self.nodes[index].mesh.as_mut() {
            mesh.skin = Some(RuntimeSkin {
                name: skin.name.clone(),
                influences: skin.influences.clone(),
                normalize: skin.normalize,
                weights,
            });
        }
        Ok(())
    }

    fn world(&self, index: usize) -> DVec3 {
        let mut world = DVec3::ZERO;
        let mut current = Some(index);
        while let Some(i) = current {
            world += self.nodes[i].local;
            current = self.nodes[i].parent;
        }
        world
    }

    fn node(&self, handle: NodeHandle) -> HostResult<&RuntimeNode> {
        self.nodes
            .get(handle.index())
            .ok_or_else(|| HostError::new(format!("no node with handle {}", handle.index())))
    }

    fn skin_mut(&mut self, deformer: DeformerHandle) -> HostResult<&mut RuntimeSkin> {
        self.nodes
            .get_mut(deformer.index())
            .and_then(|node| node.mesh.as_mut())
            .and_then(|mesh| mesh.skin.as_mut())
            .ok_or_else(|| HostError::new(format!("no deformer with handle {}", deformer.index())))
    }
}

fn ordered_entries(skin: &RuntimeSkin, vertex: usize) -> Vec<WeightEntry> {
    skin.influences
        .iter()
        .filter_map(|bone| {
            skin.weights[vertex]
                .get(bone)
                .map(|&weight| WeightEntry::new(bone.clone(), weight))
        })
        .collect()
}

impl SceneResolver for MemoryScene {
    fn resolve(&self, identifier: &str) -> Option<NodeHandle> {
        self.names.get(identifier).map(|&i| NodeHandle::from_index(i))
    }

    fn node_name(&self, node: NodeHandle) -> HostResult<String> {
        Ok(self.node(node)?.name.clone())
    }
}

impl GeometryPort for MemoryScene {
    fn snapshot_vertex_positions(&self, mesh: NodeHandle) -> HostResult<Vec<DVec3>> {
        let node = self.node(mesh)?;
        let data = node
            .mesh
            .as_ref()
            .ok_or_else(|| HostError::new(format!("node '{}' is not a mesh", node.name)))?;

        let Some(skin) = &data.skin else {
            return Ok(data.vertices.clone());
        };

        let offsets: HashMap<&str, DVec3> = skin
            .influences
            .iter()
            .map(|bone| {
                let index = self.names[bone];
                (bone.as_str(), self.world(index) - self.nodes[index].bind_world)
            })
            .collect();

        Ok(data
            .vertices
            .iter()
            .zip(&skin.weights)
            .map(|(rest, weights)| {
                weights
                    .iter()
                    .fold(*rest, |pos, (bone, weight)| pos + offsets[bone.as_str()] * *weight)
            })
            .collect())
    }
}

impl PosePort for MemoryScene {
    fn get_world_translation(&self, node: NodeHandle) -> HostResult<DVec3> {
        self.node(node)?;
        Ok(self.world(node.index()))
    }

    fn set_world_translation(&mut self, node: NodeHandle, translation: DVec3) -> HostResult<()> {
        let parent = self.node(node)?.parent;
        let parent_world = parent.map_or(DVec3::ZERO, |p| self.world(p));
        self.nodes[node.index()].local = translation - parent_world;
        Ok(())
    }

    fn get_children(&self, node: NodeHandle) -> HostResult<Vec<NodeHandle>> {
        Ok(self
            .node(node)?
            .children
            .iter()
            .map(|&i| NodeHandle::from_index(i))
            .collect())
    }

    fn is_joint(&self, node: NodeHandle) -> bool {
        self.node(node)
            .map(|n| n.kind == NodeKind::Joint)
            .unwrap_or(false)
    }
}

impl DeformerPort for MemoryScene {
    fn find_deformer(&self, mesh: NodeHandle) -> Option<DeformerHandle> {
        let node = self.nodes.get(mesh.index())?;
        node.mesh.as_ref()?.skin.as_ref()?;
        Some(DeformerHandle::from_index(mesh.index()))
    }

    fn set_normalize_mode(&mut self, deformer: DeformerHandle, enabled: bool) -> HostResult<()> {
        self.skin_mut(deformer)?.normalize = enabled;
        Ok(())
    }

    fn reset_vertex_weights(
        &mut self,
        deformer: DeformerHandle,
        vertex_ids: &[usize],
        bone_names: &[String],
    ) -> HostResult<()> {
        let skin = self.skin_mut(deformer)?;
        for &vertex in vertex_ids {
            // Out-of-range ids are reported by the assignment that follows.
            let Some(weights) = skin.weights.get_mut(vertex) else {
                continue;
            };
            for bone in bone_names {
                weights.remove(bone);
            }
        }
        Ok(())
    }

    fn assign_vertex_weights(
        &mut self,
        deformer: DeformerHandle,
        vertex_id: usize,
        weights: &[WeightEntry],
    ) -> Result<(), AssignmentError> {
        let skin = self
            .skin_mut(deformer)
            .map_err(|e| AssignmentError::new(vertex_id, e.message))?;

        if vertex_id >= skin.weights.len() {
            return Err(AssignmentError::new(
                vertex_id,
                format!(
                    "vertex index out of range for {} ({} vertices)",
                    skin.name,
                    skin.weights.len()
                ),
            ));
        }
        if let Some(entry) = weights.iter().find(|e| !skin.influences.contains(&e.bone)) {
            return Err(AssignmentError::new(
                vertex_id,
                format!(
                    "Invalid influence: '{}' is not bound to {}",
                    entry.bone, skin.name
                ),
            ));
        }

        let map = &mut skin.weights[vertex_id];
        for entry in weights {
            if entry.weight == 0.0 {
                map.remove(&entry.bone);
            } else {
                map.insert(entry.bone.clone(), entry.weight);
            }
        }
        if skin.normalize {
            skin.renormalize(vertex_id);
        }
        Ok(())
    }
}
