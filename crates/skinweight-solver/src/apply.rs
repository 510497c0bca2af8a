//! Applying weight data to a skin deformer.
//!
//! Application resets every listed vertex against the data's bone order,
//! then assigns each vertex's (optionally re-normalized) weights. A vertex
//! the deformer rejects is recorded and skipped; the run carries on.

use skinweight_data::{
    normalize_weights, parse_vertex_id, total_weight, validate_data, SkinWeightData, WarningCode,
};

use crate::config::SolverConfig;
use crate::error::{SolverError, SolverResult};
use crate::ports::{DeformerHandle, DeformerPort, SceneResolver};
use crate::source::{resolve_data_source, DataSource, SourceOrigin};

/// Outcome of an application run.
///
/// `message` is "Success" whenever the run completed, even if individual
/// vertices failed. Check `threshold_exceeded` and `failures` for those.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyReport {
    pub message: String,
    /// Deformer the weights were written to.
    pub deformer: DeformerHandle,
    /// Where the data came from, when resolved by [`apply`].
    pub source: Option<SourceOrigin>,
    /// Vertices whose assignment succeeded.
    pub vertices_applied: usize,
    /// Distinct failure messages, in first-seen order.
    pub failures: Vec<String>,
    /// Every vertex that failed, in processing order.
    pub failed_vertices: Vec<usize>,
    /// Whether the distinct failures exceed the configured threshold.
    pub threshold_exceeded: bool,
    /// Vertices whose re-normalized total drifted from 1.0.
    pub normalization_failures: Vec<usize>,
    /// Bones weighted by the data but missing from its order. Their prior
    /// influence was not reset.
    pub unordered_bones: Vec<String>,
}

impl ApplyReport {
    /// Whether any vertex failed.
    pub fn is_degraded(&self) -> bool {
        !self.failed_vertices.is_empty()
    }
}

/// Resolves the data source, then applies it to the first skin deformer on `mesh`.
pub fn apply<H>(
    host: &mut H,
    mesh: &str,
    source: &DataSource,
    config: &SolverConfig,
) -> SolverResult<ApplyReport>
where
    H: SceneResolver + DeformerPort + ?Sized,
{
    let resolved = resolve_data_source(source, config.source_preference)?;
    let mut report = apply_weighting(host, mesh, None, &resolved.data, config)?;
    report.source = Some(resolved.origin);
    Ok(report)
}

/// Zeroes every named bone on every listed vertex.
///
/// The deformer's normalization should already be disabled, otherwise the
/// host may redistribute the removed weight.
pub fn remove_all_weighting<H>(
    host: &mut H,
    deformer: DeformerHandle,
    vertex_ids: &[usize],
    bone_names: &[String],
) -> SolverResult<()>
where
    H: DeformerPort + ?Sized,
{
    log::debug!(
        "Resetting {} bone(s) on {} vertex(es)",
        bone_names.len(),
        vertex_ids.len()
    );
    host.reset_vertex_weights(deformer, vertex_ids, bone_names)?;
    Ok(())
}

/// Applies validated weight data to `mesh`.
///
/// With no `deformer`, the first skin deformer in the mesh's history is
/// used. The deformer's own normalization is disabled and left disabled.
pub fn apply_weighting<H>(
    host: &mut H,
    mesh: &str,
    deformer: Option<DeformerHandle>,
    data: &SkinWeightData,
    config: &SolverConfig,
) -> SolverResult<ApplyReport>
where
    H: SceneResolver + DeformerPort + ?Sized,
{
    config.validate()?;
    let validation = validate_data(data);
    if !validation.is_ok() {
        return Err(SolverError::InvalidData {
            reason: validation.summary().1,
        });
    }
    for warning in &validation.warnings {
        match warning.code {
            WarningCode::BoneMissingFromOrder | WarningCode::DuplicateBoneInOrder => {
                log::warn!("{}", warning)
            }
            _ => log::debug!("{}", warning),
        }
    }

    let mesh_handle = host.resolve_required("mesh", mesh)?;
    let deformer = match deformer {
        Some(deformer) => deformer,
        None => host
            .find_deformer(mesh_handle)
            .ok_or_else(|| SolverError::DeformerResolution {
                mesh: mesh.to_string(),
            })?,
    };

    let mut vertices: Vec<(usize, &[_])> = data
        .weight
        .iter()
        .filter_map(|(key, list)| Some((parse_vertex_id(key)?, list.as_slice())))
        .collect();
    vertices.sort_unstable_by_key(|(vertex_id, _)| *vertex_id);
    let vertex_ids: Vec<usize> = vertices.iter().map(|(vertex_id, _)| *vertex_id).collect();

    log::info!("Applying weights to {} vertex(es) on {}", vertex_ids.len(), mesh);
    host.set_normalize_mode(deformer, false)?;
    remove_all_weighting(host, deformer, &vertex_ids, &data.order)?;

    let mut report = ApplyReport {
        message: "Success".to_string(),
        deformer,
        source: None,
        vertices_applied: 0,
        failures: Vec::new(),
        failed_vertices: Vec::new(),
        threshold_exceeded: false,
        normalization_failures: Vec::new(),
        unordered_bones: data.unordered_bones().into_iter().map(str::to_string).collect(),
    };
    let mut totals: Option<(f64, f64)> = None;

    for (vertex_id, list) in vertices {
        if list.is_empty() {
            log::debug!("vertex {} has no weights; left reset", vertex_id);
            continue;
        }

        let weights = if config.normalize {
            match normalize_weights(list) {
                Ok(normalized) => {
                    if !normalized.exact {
                        report.normalization_failures.push(vertex_id);
                    }
                    normalized.entries
                }
                Err(err) => {
                    record_failure(&mut report, vertex_id, err.to_string());
                    continue;
                }
            }
        } else {
            list.to_vec()
        };

        let total = total_weight(&weights);
        totals = Some(match totals {
            Some((min, max)) => (min.min(total), max.max(total)),
            None => (total, total),
        });

        match host.assign_vertex_weights(deformer, vertex_id, &weights) {
            Ok(()) => report.vertices_applied += 1,
            Err(err) => record_failure(&mut report, vertex_id, err.message),
        }
    }

    if let Some((min, max)) = totals {
        log::debug!("Assigned vertex totals range from {} to {}", min, max);
    }
    if !report.normalization_failures.is_empty() {
        log::debug!(
            "{} vertex(es) not exactly normalized to 1.0",
            report.normalization_failures.len()
        );
    }

    if report.failures.len() > config.failure_threshold {
        report.threshold_exceeded = true;
        log::warn!(
            "{} distinct failure(s) while applying weights to {}",
            report.failures.len(),
            mesh
        );
        for failure in &report.failures {
            log::warn!("{}", failure);
        }
    }

    log::info!(
        "Applied weights to {}/{} vertex(es)",
        report.vertices_applied,
        vertex_ids.len()
    );
    Ok(report)
}

fn record_failure(report: &mut ApplyReport, vertex_id: usize, reason: String) {
    let message = format!("Bone Failure: {}", reason);
    log::debug!("vertex {}: {}", vertex_id, message);
    report.failed_vertices.push(vertex_id);
    if !report.failures.contains(&message) {
        report.failures.push(message);
    }
}
