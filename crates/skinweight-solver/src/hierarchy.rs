//! Bone hierarchy traversal.

use crate::error::SolverResult;
use crate::ports::{NodeHandle, PosePort, SceneResolver};

/// A joint reached by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bone {
    pub handle: NodeHandle,
    pub name: String,
}

/// Orders the joint descendants of `root` depth-first, pre-order.
///
/// Children are visited in the host's native order. Non-joint children are
/// skipped along with everything below them. The root itself is not part of
/// the result. The hierarchy must be acyclic.
pub fn order_bones<H>(host: &H, root: NodeHandle) -> SolverResult<Vec<Bone>>
where
    H: SceneResolver + PosePort + ?Sized,
{
    let mut ordered = Vec::new();
    let mut stack = joint_children(host, root)?;
    stack.reverse();

    while let Some(handle) = stack.pop() {
        ordered.push(Bone {
            handle,
            name: host.node_name(handle)?,
        });
        let mut children = joint_children(host, handle)?;
        children.reverse();
        stack.extend(children);
    }

    Ok(ordered)
}

fn joint_children<H>(host: &H, node: NodeHandle) -> SolverResult<Vec<NodeHandle>>
where
    H: PosePort + ?Sized,
{
    Ok(host
        .get_children(node)?
        .into_iter()
        .filter(|child| host.is_joint(*child))
        .collect())
}
