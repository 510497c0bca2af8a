//! Vertex snapshots and per-bone weight derivation.

use std::collections::BTreeMap;

use glam::DVec3;

use crate::error::{SolverError, SolverResult};
use crate::ports::{GeometryPort, NodeHandle};

/// Vertex positions of one mesh at one point in time, indexed by vertex id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VertexSnapshot {
    positions: Vec<DVec3>,
}

impl VertexSnapshot {
    /// Captures the mesh under the host's current pose.
    pub fn capture<G>(geometry: &G, mesh: NodeHandle) -> SolverResult<Self>
    where
        G: GeometryPort + ?Sized,
    {
        Ok(Self {
            positions: geometry.snapshot_vertex_positions(mesh)?,
        })
    }

    pub fn from_positions(positions: Vec<DVec3>) -> Self {
        Self { positions }
    }

    pub fn positions(&self) -> &[DVec3] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Rounds to `precision` decimal digits.
///
/// Goes through decimal formatting so ties resolve on the exact binary
/// value, the way a persisted `%.3f` weight would.
pub fn round_to(value: f64, precision: u32) -> f64 {
    format!("{:.*}", precision as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Weight of one bone on every vertex it moved.
///
/// A vertex counts as moved when its rest and perturbed positions differ at
/// all. Its weight is the displacement length divided by `bone_delta`,
/// rounded to `precision` digits. Vertices that did not move, or whose
/// weight rounds to zero, are left out.
pub fn weights_for_bone(
    rest: &VertexSnapshot,
    perturbed: &VertexSnapshot,
    bone_delta: f64,
    precision: u32,
) -> SolverResult<BTreeMap<usize, f64>> {
    if rest.len() != perturbed.len() {
        return Err(SolverError::TopologyChanged {
            expected: rest.len(),
            actual: perturbed.len(),
        });
    }

    let mut weights = BTreeMap::new();
    for (vertex_id, (before, after)) in rest.positions.iter().zip(&perturbed.positions).enumerate()
    {
        if before == after {
            continue;
        }
        let weight = round_to(before.distance(*after) / bone_delta, precision);
        if weight == 0.0 {
            log::debug!("vertex {} moved below rounding precision; skipped", vertex_id);
            continue;
        }
        weights.insert(vertex_id, weight);
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn snapshot(points: &[[f64; 3]]) -> VertexSnapshot {
        VertexSnapshot::from_positions(points.iter().map(|p| DVec3::from_array(*p)).collect())
    }

    #[test]
    fn test_full_displacement_is_unit_weight() {
        let rest = snapshot(&[[0.0, 1.0, 0.0], [5.0, 5.0, 5.0]]);
        let moved = snapshot(&[[0.0, 3.0, 0.0], [5.0, 5.0, 5.0]]);

        let weights = weights_for_bone(&rest, &moved, 2.0, 3).unwrap();
        assert_eq!(weights, BTreeMap::from([(0, 1.0)]));
    }

    #[test]
    fn test_partial_displacement_is_rounded() {
        let rest = snapshot(&[[0.0, 0.0, 0.0]]);
        let moved = snapshot(&[[0.0, 2.0 / 3.0, 0.0]]);

        let weights = weights_for_bone(&rest, &moved, 2.0, 3).unwrap();
        assert_eq!(weights[&0], 0.333);
    }

    #[test]
    fn test_jitter_below_precision_is_dropped() {
        let rest = snapshot(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
        let moved = snapshot(&[[0.0, 1e-9, 0.0], [1.0, 0.5, 0.0]]);

        let weights = weights_for_bone(&rest, &moved, 2.0, 3).unwrap();
        assert_eq!(weights, BTreeMap::from([(1, 0.25)]));
    }

    #[test]
    fn test_vertex_count_mismatch() {
        let rest = snapshot(&[[0.0; 3], [1.0; 3]]);
        let moved = snapshot(&[[0.0; 3]]);

        let err = weights_for_bone(&rest, &moved, 2.0, 3).unwrap_err();
        assert!(matches!(
            err,
            SolverError::TopologyChanged {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.12345, 3), 0.123);
        assert_eq!(round_to(0.9996, 3), 1.0);
        assert_eq!(round_to(1.23456, 0), 1.0);
    }
}
