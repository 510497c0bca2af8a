//! Collaborator ports.
//!
//! The solver never touches a scene graph directly. A host (a DCC binding, or
//! [`crate::memory::MemoryScene`]) implements these traits and hands out
//! opaque handles. All calls are synchronous.

use glam::DVec3;
use skinweight_data::WeightEntry;

use crate::error::{AssignmentError, HostResult, SolverError, SolverResult};

/// Opaque handle to a scene node (bone, transform, or mesh).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Opaque handle to a skin deformer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeformerHandle(usize);

impl DeformerHandle {
    pub fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// Resolves user-facing identifiers to handles.
pub trait SceneResolver {
    /// Resolves a node name, or `None` if no live node has that name.
    fn resolve(&self, identifier: &str) -> Option<NodeHandle>;

    /// Name of a node.
    fn node_name(&self, node: NodeHandle) -> HostResult<String>;

    /// Resolves an identifier that must exist. `role` names it in the error.
    fn resolve_required(&self, role: &'static str, identifier: &str) -> SolverResult<NodeHandle> {
        self.resolve(identifier)
            .ok_or_else(|| SolverError::InputResolution {
                role,
                identifier: identifier.to_string(),
            })
    }
}

/// Read access to mesh geometry.
pub trait GeometryPort {
    /// World-space vertex positions of a mesh under the current pose.
    ///
    /// Must be indexed consistently across calls for the same mesh.
    fn snapshot_vertex_positions(&self, mesh: NodeHandle) -> HostResult<Vec<DVec3>>;
}

/// Read/write access to the skeleton pose.
pub trait PosePort {
    fn get_world_translation(&self, node: NodeHandle) -> HostResult<DVec3>;

    fn set_world_translation(&mut self, node: NodeHandle, translation: DVec3) -> HostResult<()>;

    /// Immediate children in the host's native order.
    fn get_children(&self, node: NodeHandle) -> HostResult<Vec<NodeHandle>>;

    /// Whether the node is a skeletal joint.
    fn is_joint(&self, node: NodeHandle) -> bool;
}

/// Access to a mesh's skin deformer.
pub trait DeformerPort {
    /// First skin deformer in the mesh's deformation history.
    fn find_deformer(&self, mesh: NodeHandle) -> Option<DeformerHandle>;

    /// Enables or disables the deformer's own weight normalization.
    fn set_normalize_mode(&mut self, deformer: DeformerHandle, enabled: bool) -> HostResult<()>;

    /// Zeroes the influence of every named bone on every listed vertex.
    fn reset_vertex_weights(
        &mut self,
        deformer: DeformerHandle,
        vertex_ids: &[usize],
        bone_names: &[String],
    ) -> HostResult<()>;

    /// Assigns a vertex's weights in one call.
    fn assign_vertex_weights(
        &mut self,
        deformer: DeformerHandle,
        vertex_id: usize,
        weights: &[WeightEntry],
    ) -> Result<(), AssignmentError>;
}
