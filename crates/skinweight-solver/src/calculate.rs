//! Weight calculation entry points.
//!
//! Bones are processed strictly one after another: each is perturbed,
//! measured, and restored before the next one moves, because every
//! measurement reads the shared pose.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use skinweight_data::{save_with, JsonLayout, SkinWeightData};

use crate::aggregate::WeightAggregator;
use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::hierarchy::{order_bones, Bone};
use crate::perturb::perturb_and_measure;
use crate::ports::{GeometryPort, PosePort, SceneResolver};
use crate::sampler::{weights_for_bone, VertexSnapshot};

/// Cooperative cancellation, checked between bones.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Takes effect before the next bone is perturbed.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome of a calculation run.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationReport {
    /// Calculated weights, ready to persist.
    pub data: SkinWeightData,
    /// Bones processed, in hierarchy order.
    pub bones: Vec<String>,
    /// Vertices in the mesh.
    pub vertex_count: usize,
    /// Vertices no bone influenced above tolerance.
    pub unweighted_vertices: Vec<usize>,
    /// Vertices whose normalized total drifted from 1.0.
    pub normalization_failures: Vec<usize>,
    pub message: String,
}

/// Calculates skin weights for `mesh` from the joints under `root`.
pub fn calculate<H>(
    host: &mut H,
    mesh: &str,
    root: &str,
    config: &SolverConfig,
) -> SolverResult<CalculationReport>
where
    H: SceneResolver + GeometryPort + PosePort + ?Sized,
{
    calculate_with_cancel(host, mesh, root, config, &CancelFlag::new())
}

/// Like [`calculate`], then writes the weights to `output` in `layout` when given.
pub fn calculate_to_file<H>(
    host: &mut H,
    mesh: &str,
    root: &str,
    config: &SolverConfig,
    output: Option<&Path>,
    layout: JsonLayout,
) -> SolverResult<CalculationReport>
where
    H: SceneResolver + GeometryPort + PosePort + ?Sized,
{
    let report = calculate(host, mesh, root, config)?;
    if let Some(path) = output {
        save_with(path, &report.data, layout)?;
        log::info!("Saved weights to {}", path.display());
    }
    Ok(report)
}

/// Like [`calculate`], stopping between bones once `cancel` is set.
///
/// The bone being measured when cancellation is requested is restored
/// before [`SolverError::Cancelled`] is returned.
pub fn calculate_with_cancel<H>(
    host: &mut H,
    mesh: &str,
    root: &str,
    config: &SolverConfig,
    cancel: &CancelFlag,
) -> SolverResult<CalculationReport>
where
    H: SceneResolver + GeometryPort + PosePort + ?Sized,
{
    config.validate()?;
    let mesh_handle = host.resolve_required("mesh", mesh)?;
    let root_handle = host.resolve_required("root bone", root)?;

    let mut bones = Vec::new();
    if config.include_root {
        bones.push(Bone {
            handle: root_handle,
            name: host.node_name(root_handle)?,
        });
    }
    bones.extend(order_bones(&*host, root_handle)?);

    let rest = VertexSnapshot::capture(&*host, mesh_handle)?;
    let displacement = config.displacement();
    let mut aggregator = WeightAggregator::new(config.tolerance);
    let total = bones.len();

    for (index, bone) in bones.iter().enumerate() {
        if cancel.is_cancelled() {
            log::warn!("Calculation cancelled after {}/{} bone(s)", index, total);
            return Err(SolverError::Cancelled {
                completed: index,
                total,
            });
        }
        log::info!("Processing {}/{} | {}", index + 1, total, bone.name);

        let weights = perturb_and_measure(host, bone.handle, displacement, |pose| {
            let perturbed = VertexSnapshot::capture(pose, mesh_handle)?;
            weights_for_bone(&rest, &perturbed, config.bone_delta, config.precision)
        })?;
        let kept = aggregator.add_bone(&bone.name, &weights);
        log::debug!("{} influences {} vertex(es)", bone.name, kept);
    }

    let unweighted_vertices: Vec<usize> = (0..rest.len())
        .filter(|&vertex| !aggregator.is_weighted(vertex))
        .collect();
    if !unweighted_vertices.is_empty() {
        log::warn!(
            "{} of {} vertex(es) received no weight",
            unweighted_vertices.len(),
            rest.len()
        );
    }

    let order: Vec<String> = bones.into_iter().map(|bone| bone.name).collect();
    let aggregated = aggregator.into_data(order.clone(), config.normalize)?;
    let message = format!(
        "Calculated weights for {} vertex(es) from {} bone(s)",
        aggregated.data.vertex_count(),
        order.len()
    );

    Ok(CalculationReport {
        data: aggregated.data,
        bones: order,
        vertex_count: rest.len(),
        unweighted_vertices,
        normalization_failures: aggregated.normalization_failures,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use glam::DVec3;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use skinweight_data::{load, WeightEntry};

    use crate::error::{HostError, HostResult};
    use crate::memory::{MemoryScene, SceneFile};
    use crate::ports::NodeHandle;

    fn two_bone_file() -> SceneFile {
        SceneFile::new()
            .joint("root", None, [0.0, 0.0, 0.0])
            .joint("child", Some("root"), [0.0, 1.0, 0.0])
            .mesh("body", &[[0.0, 1.0, 0.0], [5.0, 5.0, 5.0]])
            .skin("body", "skinCluster1", &["root", "child"])
            .bind_weights("body", 0, &[("child", 1.0)])
    }

    fn two_bone_scene() -> MemoryScene {
        MemoryScene::from_scene_file(&two_bone_file()).unwrap()
    }

    /// Delegating host that fails or cancels on a given snapshot call.
    struct Scripted {
        inner: MemoryScene,
        snapshots: Cell<usize>,
        fail_at: Option<usize>,
        cancel_at: Option<(usize, CancelFlag)>,
    }

    impl Scripted {
        fn new(inner: MemoryScene) -> Self {
            Self {
                inner,
                snapshots: Cell::new(0),
                fail_at: None,
                cancel_at: None,
            }
        }
    }

    impl SceneResolver for Scripted {
        fn resolve(&self, identifier: &str) -> Option<NodeHandle> {
            self.inner.resolve(identifier)
        }

        fn node_name(&self, node: NodeHandle) -> HostResult<String> {
            self.inner.node_name(node)
        }
    }

    impl GeometryPort for Scripted {
        fn snapshot_vertex_positions(&self, mesh: NodeHandle) -> HostResult<Vec<DVec3>> {
            let call = self.snapshots.get();
            self.snapshots.set(call + 1);
            if self.fail_at == Some(call) {
                return Err(HostError::new("mesh evaluation failed"));
            }
            if let Some((at, flag)) = &self.cancel_at {
                if *at == call {
                    flag.cancel();
                }
            }
            self.inner.snapshot_vertex_positions(mesh)
        }
    }

    impl PosePort for Scripted {
        fn get_world_translation(&self, node: NodeHandle) -> HostResult<DVec3> {
            self.inner.get_world_translation(node)
        }

        fn set_world_translation(&mut self, node: NodeHandle, t: DVec3) -> HostResult<()> {
            self.inner.set_world_translation(node, t)
        }

        fn get_children(&self, node: NodeHandle) -> HostResult<Vec<NodeHandle>> {
            self.inner.get_children(node)
        }

        fn is_joint(&self, node: NodeHandle) -> bool {
            self.inner.is_joint(node)
        }
    }

    #[test]
    fn test_single_child_scenario() {
        let mut scene = two_bone_scene();
        let report = calculate(&mut scene, "body", "root", &SolverConfig::default()).unwrap();

        assert_eq!(
            report.data.to_value().unwrap(),
            json!({"weight": {"0": [["child", 1.0]]}, "order": ["child"]})
        );
        assert_eq!(report.bones, vec!["child"]);
        assert_eq!(report.vertex_count, 2);
        assert_eq!(report.unweighted_vertices, vec![1]);
        assert!(report.normalization_failures.is_empty());
        assert_eq!(scene.to_scene_file(), two_bone_scene().to_scene_file());
    }

    #[test]
    fn test_include_root_prepends_root() {
        let mut scene = two_bone_scene();
        let config = SolverConfig::default().include_root(true);
        let report = calculate(&mut scene, "body", "root", &config).unwrap();

        assert_eq!(report.data.order, vec!["root", "child"]);
        assert_eq!(report.data.get(0), Some(&vec![WeightEntry::new("child", 1.0)]));
    }

    #[test]
    fn test_shared_vertex_is_split() {
        let file = two_bone_file().bind_weights("body", 1, &[("root", 0.5), ("child", 0.5)]);
        let mut scene = MemoryScene::from_scene_file(&file).unwrap();
        let config = SolverConfig::default().include_root(true);

        let report = calculate(&mut scene, "body", "root", &config).unwrap();
        assert_eq!(
            report.data.get(1),
            Some(&vec![WeightEntry::new("root", 0.5), WeightEntry::new("child", 0.5)])
        );
        assert!(report.unweighted_vertices.is_empty());
    }

    #[test]
    fn test_tolerance_drops_weak_influence() {
        let file = two_bone_file().bind_weights("body", 1, &[("root", 0.5), ("child", 0.5)]);
        let mut scene = MemoryScene::from_scene_file(&file).unwrap();
        let config = SolverConfig::default().include_root(true).tolerance(0.5);

        let report = calculate(&mut scene, "body", "root", &config).unwrap();
        assert_eq!(report.data.get(1), None);
        assert_eq!(report.unweighted_vertices, vec![1]);
    }

    #[test]
    fn test_unresolved_root() {
        let mut scene = two_bone_scene();
        let err = calculate(&mut scene, "body", "hips", &SolverConfig::default()).unwrap_err();
        assert_eq!(err.to_string(), "root bone 'hips' was not found in the scene");

        let err = calculate(&mut scene, "cape", "root", &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::InputResolution { role: "mesh", .. }));
    }

    #[test]
    fn test_invalid_config_rejected_before_any_work() {
        let mut scene = two_bone_scene();
        let config = SolverConfig::default().bone_delta(0.0);
        let err = calculate(&mut scene, "body", "root", &config).unwrap_err();
        assert!(matches!(err, SolverError::InvalidConfig { .. }));
    }

    #[test]
    fn test_sampling_failure_restores_pose() {
        let mut host = Scripted::new(two_bone_scene());
        // Call 0 is the rest snapshot, call 1 samples the perturbed child.
        host.fail_at = Some(1);

        let err = calculate(&mut host, "body", "root", &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, SolverError::Host(_)));
        assert_eq!(host.inner.to_scene_file(), two_bone_scene().to_scene_file());
    }

    #[test]
    fn test_cancel_between_bones() {
        let flag = CancelFlag::new();
        let mut host = Scripted::new(two_bone_scene());
        host.cancel_at = Some((1, flag.clone()));
        let config = SolverConfig::default().include_root(true);

        let err = calculate_with_cancel(&mut host, "body", "root", &config, &flag).unwrap_err();
        assert!(matches!(
            err,
            SolverError::Cancelled {
                completed: 1,
                total: 2
            }
        ));
        assert_eq!(host.inner.to_scene_file(), two_bone_scene().to_scene_file());
    }

    #[test]
    fn test_empty_hierarchy_yields_empty_data() {
        let file = SceneFile::new()
            .joint("root", None, [0.0; 3])
            .transform("grp", Some("root"), [0.0; 3])
            .mesh("body", &[[0.0; 3]]);
        let mut scene = MemoryScene::from_scene_file(&file).unwrap();

        let report = calculate(&mut scene, "body", "root", &SolverConfig::default()).unwrap();
        assert!(report.data.is_empty());
        assert!(report.data.order.is_empty());
        assert_eq!(report.unweighted_vertices, vec![0]);
    }

    #[test]
    fn test_calculate_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("weights.json");
        let mut scene = two_bone_scene();

        let report = calculate_to_file(
            &mut scene,
            "body",
            "root",
            &SolverConfig::default(),
            Some(&path),
            JsonLayout::Compact,
        )
        .unwrap();
        assert_eq!(load(&path).unwrap(), report.data);
    }

    #[test]
    fn test_calculate_to_file_pretty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights.json");
        let mut scene = two_bone_scene();

        let report = calculate_to_file(
            &mut scene,
            "body",
            "root",
            &SolverConfig::default(),
            Some(&path),
            JsonLayout::Pretty,
        )
        .unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, report.data.to_json_pretty().unwrap());
        assert_eq!(load(&path).unwrap(), report.data);
    }
}
