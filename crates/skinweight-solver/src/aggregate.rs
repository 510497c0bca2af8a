//! Cross-bone weight aggregation.

use std::collections::BTreeMap;

use skinweight_data::{normalize_weights, SkinWeightData, VertexWeightList, WeightEntry};

use crate::error::{SolverError, SolverResult};

/// Collects per-bone contributions into per-vertex weight lists.
#[derive(Debug, Clone)]
pub struct WeightAggregator {
    tolerance: f64,
    lists: BTreeMap<usize, VertexWeightList>,
}

/// Aggregated weights plus normalization diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregated {
    pub data: SkinWeightData,
    /// Vertices whose normalized total still differs from 1.0.
    pub normalization_failures: Vec<usize>,
}

impl WeightAggregator {
    /// Contributions at or below `tolerance` are discarded.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            lists: BTreeMap::new(),
        }
    }

    /// Appends one bone's contributions. Returns how many were kept.
    pub fn add_bone(&mut self, bone: &str, weights: &BTreeMap<usize, f64>) -> usize {
        let mut kept = 0;
        for (&vertex_id, &weight) in weights {
            if weight > self.tolerance {
                self.lists
                    .entry(vertex_id)
                    .or_default()
                    .push(WeightEntry::new(bone, weight));
                kept += 1;
            }
        }
        kept
    }

    /// Number of vertices with at least one entry.
    pub fn vertex_count(&self) -> usize {
        self.lists.len()
    }

    /// Whether the vertex received any entry.
    pub fn is_weighted(&self, vertex_id: usize) -> bool {
        self.lists.contains_key(&vertex_id)
    }

    /// Builds the persisted data, normalizing every list when `normalize` is set.
    ///
    /// A list whose total is zero cannot be normalized and fails the whole
    /// aggregation. Lists that normalize inexactly are kept and reported.
    pub fn into_data(self, order: Vec<String>, normalize: bool) -> SolverResult<Aggregated> {
        let mut data = SkinWeightData::with_order(order);
        let mut normalization_failures = Vec::new();

        for (vertex_id, list) in self.lists {
            if !normalize {
                data.insert(vertex_id, list);
                continue;
            }
            let normalized =
                normalize_weights(&list).map_err(|source| SolverError::Normalization {
                    vertex_id: vertex_id.to_string(),
                    source,
                })?;
            if !normalized.exact {
                log::warn!(
                    "vertex {} normalized to {} instead of 1.0",
                    vertex_id,
                    normalized.total
                );
                normalization_failures.push(vertex_id);
            }
            data.insert(vertex_id, normalized.entries);
        }

        Ok(Aggregated {
            data,
            normalization_failures,
        })
    }
}
