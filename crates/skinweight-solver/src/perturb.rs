//! Scoped bone perturbation.
//!
//! A [`PoseGuard`] owns the only mutable borrow of the pose while one bone is
//! displaced. Its immediate children are counter-shifted so they keep their
//! world position. Dropping the guard, or calling [`PoseGuard::restore`], puts
//! every touched node back where it was.

use glam::DVec3;

use crate::error::{HostResult, SolverResult};
use crate::ports::{NodeHandle, PosePort};

/// Holds one bone in its perturbed position until restored or dropped.
pub struct PoseGuard<'a, P: PosePort + ?Sized> {
    pose: &'a mut P,
    bone: NodeHandle,
    bone_rest: DVec3,
    children: Vec<(NodeHandle, DVec3)>,
    active: bool,
}

impl<'a, P: PosePort + ?Sized> PoseGuard<'a, P> {
    /// Moves `bone` by `displacement` and each immediate child by its negation.
    ///
    /// Rest translations are recorded before any write. If a write fails the
    /// nodes already moved are restored before the error is returned.
    pub fn perturb(pose: &'a mut P, bone: NodeHandle, displacement: DVec3) -> SolverResult<Self> {
        let bone_rest = pose.get_world_translation(bone)?;
        let mut children = Vec::new();
        for child in pose.get_children(bone)? {
            children.push((child, pose.get_world_translation(child)?));
        }

        let mut guard = Self {
            pose,
            bone,
            bone_rest,
            children,
            active: true,
        };
        for &(child, rest) in &guard.children {
            guard.pose.set_world_translation(child, rest - displacement)?;
        }
        guard
            .pose
            .set_world_translation(bone, bone_rest + displacement)?;
        Ok(guard)
    }

    /// Read access to the perturbed pose, for sampling.
    pub fn pose(&self) -> &P {
        &*self.pose
    }

    /// Restores the bone, then its children.
    ///
    /// Every write is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub fn restore(mut self) -> SolverResult<()> {
        self.active = false;
        Ok(self.restore_all()?)
    }

    fn restore_all(&mut self) -> HostResult<()> {
        let mut first_error = self
            .pose
            .set_world_translation(self.bone, self.bone_rest)
            .err();
        for &(child, rest) in &self.children {
            if let Err(err) = self.pose.set_world_translation(child, rest) {
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl<P: PosePort + ?Sized> Drop for PoseGuard<'_, P> {
    fn drop(&mut self) {
        if self.active {
            if let Err(err) = self.restore_all() {
                log::warn!("Failed to restore pose after perturbation: {}", err);
            }
        }
    }
}

/// Perturbs `bone`, runs `measure` against the perturbed pose, and restores.
///
/// Restoration runs on every path. A measurement error takes precedence over
/// a restoration error.
pub fn perturb_and_measure<P, T, F>(
    pose: &mut P,
    bone: NodeHandle,
    displacement: DVec3,
    measure: F,
) -> SolverResult<T>
where
    P: PosePort + ?Sized,
    F: FnOnce(&P) -> SolverResult<T>,
{
    let guard = PoseGuard::perturb(pose, bone, displacement)?;
    let measured = measure(guard.pose());
    let restored = guard.restore();
    let value = measured?;
    restored?;
    Ok(value)
}
