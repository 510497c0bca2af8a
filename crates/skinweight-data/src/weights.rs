//! Skin weight data model.
//!
//! [`SkinWeightData`] is the only value that crosses a persistence boundary.
//! Its JSON form is:
//!
//! ```json
//! {
//!   "weight": { "0": [["spine", 0.75], ["chest", 0.25]] },
//!   "order": ["spine", "chest"]
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{DataError, DataResult};
use crate::validation::validate_value;

/// Parses a vertex id key.
///
/// Only canonical decimal integers are ids: `"7"` parses, while `"+7"` and
/// `"007"` do not, so every id has exactly one key.
pub fn parse_vertex_id(key: &str) -> Option<usize> {
    key.parse::<usize>()
        .ok()
        .filter(|id| id.to_string() == key)
}

/// A single bone influence on a vertex.
///
/// Serialized as a two-element array `[bone_name, weight]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, f64)", into = "(String, f64)")]
pub struct WeightEntry {
    /// Name of the influencing bone.
    pub bone: String,
    /// Influence weight, nominally in [0, 1].
    pub weight: f64,
}

impl WeightEntry {
    pub fn new(bone: impl Into<String>, weight: f64) -> Self {
        Self {
            bone: bone.into(),
            weight,
        }
    }
}

impl From<(String, f64)> for WeightEntry {
    fn from((bone, weight): (String, f64)) -> Self {
        Self { bone, weight }
    }
}

impl From<WeightEntry> for (String, f64) {
    fn from(entry: WeightEntry) -> Self {
        (entry.bone, entry.weight)
    }
}

/// Ordered bone influences for one vertex.
pub type VertexWeightList = Vec<WeightEntry>;

/// Sums the non-zero weights of a list.
pub fn total_weight(list: &[WeightEntry]) -> f64 {
    list.iter()
        .filter(|entry| entry.weight != 0.0)
        .map(|entry| entry.weight)
        .sum()
}

/// Persisted skin weights: the bone order used during calculation plus the
/// vertex-keyed weight lists.
///
/// Vertex ids are string-encoded integers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SkinWeightData {
    /// Vertex id -> weight list.
    pub weight: BTreeMap<String, VertexWeightList>,
    /// Bone names in hierarchy order. Application resets every vertex against this list.
    pub order: Vec<String>,
}

impl SkinWeightData {
    /// Creates empty weight data with the given bone order.
    pub fn with_order(order: Vec<String>) -> Self {
        Self {
            weight: BTreeMap::new(),
            order,
        }
    }

    /// Parses weight data from a JSON string.
    ///
    /// The document is validated structurally before it is decoded, so a
    /// malformed document reports every problem instead of the first serde error.
    pub fn from_json(json: &str) -> DataResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Decodes weight data from a JSON value after structural validation.
    pub fn from_value(value: serde_json::Value) -> DataResult<Self> {
        let result = validate_value(&value);
        if !result.is_ok() {
            return Err(DataError::Integrity {
                errors: result.errors,
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Serializes the data to a compact JSON string.
    pub fn to_json(&self) -> DataResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the data to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> DataResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serializes the data to a JSON value.
    pub fn to_value(&self) -> DataResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Sets the weight list of a vertex, replacing any previous list.
    pub fn insert(&mut self, vertex_id: usize, list: VertexWeightList) {
        self.weight.insert(vertex_id.to_string(), list);
    }

    /// Returns the weight list of a vertex.
    pub fn get(&self, vertex_id: usize) -> Option<&VertexWeightList> {
        self.weight.get(&vertex_id.to_string())
    }

    /// Number of weighted vertices.
    pub fn vertex_count(&self) -> usize {
        self.weight.len()
    }

    /// Returns true if no vertex carries weights.
    pub fn is_empty(&self) -> bool {
        self.weight.is_empty()
    }

    /// Vertex ids in ascending numeric order. Keys that are not canonical integers are skipped.
    pub fn vertex_ids(&self) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .weight
            .keys()
            .filter_map(|key| parse_vertex_id(key))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Every bone name referenced by any weight list.
    pub fn referenced_bones(&self) -> BTreeSet<&str> {
        self.weight
            .values()
            .flatten()
            .map(|entry| entry.bone.as_str())
            .collect()
    }

    /// Bones referenced by a weight list but missing from `order`.
    ///
    /// Application never resets these bones' prior influence.
    pub fn unordered_bones(&self) -> BTreeSet<&str> {
        let ordered: BTreeSet<&str> = self.order.iter().map(String::as_str).collect();
        self.referenced_bones()
            .into_iter()
            .filter(|bone| !ordered.contains(bone))
            .collect()
    }
}
