//! Weight data validation.
//!
//! [`validate_value`] checks an untyped JSON document against the persisted
//! schema. [`validate_data`] checks an already-decoded [`SkinWeightData`] for
//! problems the type system cannot rule out. Both collect every problem
//! rather than stopping at the first.
//!
//! Neither checks that vertex ids are in range for a particular mesh;
//! topology compatibility is the caller's responsibility.

use std::collections::HashSet;

use serde_json::Value;

use crate::error::{ErrorCode, ValidationError, ValidationResult, ValidationWarning, WarningCode};
use crate::normalize::is_normalized;
use crate::weights::{parse_vertex_id, total_weight, SkinWeightData, WeightEntry};

/// Top-level keys every document must carry, and the only keys it may carry.
pub const REQUIRED_KEYS: [&str; 2] = ["weight", "order"];

/// Validates an untyped JSON document as skin weight data.
///
/// # Example
/// ```
/// use skinweight_data::validation::validate_value;
///
/// let doc = serde_json::json!({ "order": [1, 2] });
/// let result = validate_value(&doc);
/// let (ok, reason) = result.summary();
/// assert!(!ok);
/// assert!(reason.contains("bone names must be strings"));
/// ```
pub fn validate_value(value: &Value) -> ValidationResult {
    let mut result = ValidationResult::default();

    let Some(object) = value.as_object() else {
        result.add_error(ValidationError::new(
            ErrorCode::NotAnObject,
            "data must be a mapping with keys \"weight\" and \"order\"",
        ));
        return result;
    };

    for key in REQUIRED_KEYS {
        if !object.contains_key(key) {
            result.add_error(ValidationError::new(
                ErrorCode::MissingKey,
                format!("data does not contain key \"{}\"", key),
            ));
        }
    }

    for key in object.keys() {
        if !REQUIRED_KEYS.contains(&key.as_str()) {
            result.add_error(ValidationError::with_path(
                ErrorCode::UnexpectedKey,
                format!("unexpected top-level key \"{}\"", key),
                key.clone(),
            ));
        }
    }

    let order = object.get("order").map(|order| validate_order(order, &mut result));
    if let Some(weight) = object.get("weight") {
        validate_weight_map(weight, &mut result);
    }

    if result.is_ok() {
        if let Some(order) = order {
            check_order_warnings(&order, &mut result);
        }
    }

    result
}

/// Validates decoded weight data.
///
/// Errors cover values that would not survive a JSON round trip (non-finite
/// weights) and vertex ids that are not canonical integers. Warnings cover the
/// data-consistency risks of application: bones missing from `order`,
/// duplicate bone names, unnormalized and empty weight lists.
pub fn validate_data(data: &SkinWeightData) -> ValidationResult {
    let mut result = ValidationResult::default();

    for (vertex_id, list) in &data.weight {
        let path = format!("weight.{}", vertex_id);
        if parse_vertex_id(vertex_id).is_none() {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidVertexId,
                format!("vertex id \"{}\" is not a canonical non-negative integer", vertex_id),
                path.clone(),
            ));
        }
        for (index, entry) in list.iter().enumerate() {
            if !entry.weight.is_finite() {
                result.add_error(ValidationError::with_path(
                    ErrorCode::NonFiniteWeight,
                    format!("weight for bone \"{}\" is not finite", entry.bone),
                    format!("{}[{}]", path, index),
                ));
            }
        }
        check_list_warnings(vertex_id, list, &mut result);
    }

    let order: Vec<&str> = data.order.iter().map(String::as_str).collect();
    check_order_warnings(&order, &mut result);

    for bone in data.unordered_bones() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::BoneMissingFromOrder,
            format!(
                "bone \"{}\" is weighted but missing from order; its prior influence will not be reset",
                bone
            ),
            "order",
        ));
    }

    result
}

/// Validates the `order` sequence and returns the bone names that are strings.
fn validate_order<'a>(order: &'a Value, result: &mut ValidationResult) -> Vec<&'a str> {
    let Some(items) = order.as_array() else {
        result.add_error(ValidationError::with_path(
            ErrorCode::OrderNotArray,
            "order must be a sequence of bone names",
            "order",
        ));
        return Vec::new();
    };

    let mut names = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match item.as_str() {
            Some(name) => names.push(name),
            None => result.add_error(ValidationError::with_path(
                ErrorCode::BoneNameNotString,
                format!("bone names must be strings, got {}", item),
                format!("order[{}]", index),
            )),
        }
    }
    names
}

fn validate_weight_map(weight: &Value, result: &mut ValidationResult) {
    let Some(map) = weight.as_object() else {
        result.add_error(ValidationError::with_path(
            ErrorCode::WeightNotObject,
            "weight must be a mapping of vertex id to weight list",
            "weight",
        ));
        return;
    };

    let mut decoded_lists: Vec<(String, Vec<WeightEntry>)> = Vec::new();
    for (vertex_id, list) in map {
        let path = format!("weight.{}", vertex_id);
        if parse_vertex_id(vertex_id).is_none() {
            result.add_error(ValidationError::with_path(
                ErrorCode::InvalidVertexId,
                format!("vertex id \"{}\" is not a canonical non-negative integer", vertex_id),
                path.clone(),
            ));
        }

        let Some(entries) = list.as_array() else {
            result.add_error(ValidationError::with_path(
                ErrorCode::WeightListNotArray,
                "vertex weight list must be a sequence of [bone_name, weight] pairs",
                path,
            ));
            continue;
        };

        let mut decoded = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let entry_path = format!("{}[{}]", path, index);
            match decode_entry(entry) {
                Some(weight_entry) if weight_entry.weight.is_finite() => {
                    decoded.push(weight_entry)
                }
                Some(weight_entry) => result.add_error(ValidationError::with_path(
                    ErrorCode::NonFiniteWeight,
                    format!("weight for bone \"{}\" is not finite", weight_entry.bone),
                    entry_path,
                )),
                None => result.add_error(ValidationError::with_path(
                    ErrorCode::MalformedWeightEntry,
                    format!("weight entry must be [bone_name, weight], got {}", entry),
                    entry_path,
                )),
            }
        }
        decoded_lists.push((vertex_id.clone(), decoded));
    }

    for (vertex_id, list) in &decoded_lists {
        check_list_warnings(vertex_id, list, result);
    }
}

fn decode_entry(entry: &Value) -> Option<WeightEntry> {
    match entry.as_array()?.as_slice() {
        [bone, weight] => Some(WeightEntry::new(bone.as_str()?, weight.as_f64()?)),
        _ => None,
    }
}

fn check_list_warnings(vertex_id: &str, list: &[WeightEntry], result: &mut ValidationResult) {
    let path = format!("weight.{}", vertex_id);
    if list.is_empty() {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::EmptyWeightList,
            format!("vertex {} has an empty weight list", vertex_id),
            path,
        ));
    } else if !is_normalized(list) {
        result.add_warning(ValidationWarning::with_path(
            WarningCode::UnnormalizedVertex,
            format!(
                "weights of vertex {} sum to {}, not 1.0",
                vertex_id,
                total_weight(list)
            ),
            path,
        ));
    }
}

fn check_order_warnings(order: &[&str], result: &mut ValidationResult) {
    let mut seen = HashSet::new();
    for (index, bone) in order.iter().enumerate() {
        if !seen.insert(*bone) {
            result.add_warning(ValidationWarning::with_path(
                WarningCode::DuplicateBoneInOrder,
                format!("bone \"{}\" appears more than once in order", bone),
                format!("order[{}]", index),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_document() {
        let doc = json!({
            "weight": { "0": [["root", 0.5], ["child", 0.5]] },
            "order": ["root", "child"]
        });
        let result = validate_value(&doc);
        assert!(result.is_ok(), "errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_non_object_rejected() {
        let result = validate_value(&json!([1, 2, 3]));
        assert!(result.has_error(ErrorCode::NotAnObject));
        assert_eq!(result.errors.len(), 1);
    }

    #[test]
    fn test_order_of_integers_reports_string_requirement() {
        let result = validate_value(&json!({ "order": [1, 2] }));
        assert!(!result.is_ok());
        assert!(result.has_error(ErrorCode::MissingKey));
        assert!(result.has_error(ErrorCode::BoneNameNotString));

        let (ok, reason) = result.summary();
        assert!(!ok);
        assert!(reason.contains("bone names must be strings"));
    }

    #[test]
    fn test_unexpected_key_rejected() {
        let result = validate_value(&json!({ "weight": {}, "order": [], "version": 2 }));
        assert!(result.has_error(ErrorCode::UnexpectedKey));
    }

    #[test]
    fn test_order_must_be_array() {
        let result = validate_value(&json!({ "weight": {}, "order": "root" }));
        assert!(result.has_error(ErrorCode::OrderNotArray));
    }

    #[test]
    fn test_weight_shape_errors() {
        let result = validate_value(&json!({ "weight": [], "order": [] }));
        assert!(result.has_error(ErrorCode::WeightNotObject));

        let result = validate_value(&json!({
            "weight": {
                "abc": [["root", 1.0]],
                "1": "root",
                "2": [["root"]],
                "3": [[1.0, "root"]]
            },
            "order": ["root"]
        }));
        assert!(result.has_error(ErrorCode::InvalidVertexId));
        assert!(result.has_error(ErrorCode::WeightListNotArray));
        assert_eq!(
            result
                .errors
                .iter()
                .filter(|e| e.code == ErrorCode::MalformedWeightEntry)
                .count(),
            2
        );
    }

    #[test]
    fn test_non_canonical_vertex_ids_rejected() {
        for key in ["+7", "007", "-0"] {
            let result = validate_value(&json!({
                "weight": { key: [["root", 1.0]] },
                "order": ["root"]
            }));
            assert!(result.has_error(ErrorCode::InvalidVertexId), "{key} was accepted");
        }

        let result = validate_value(&json!({
            "weight": { "0": [["root", 1.0]], "7": [["root", 1.0]] },
            "order": ["root"]
        }));
        assert!(result.is_ok(), "errors: {:?}", result.errors);

        let mut data = SkinWeightData::with_order(vec!["root".into()]);
        data.weight.insert("007".into(), vec![WeightEntry::new("root", 1.0)]);
        assert!(validate_data(&data).has_error(ErrorCode::InvalidVertexId));
    }

    #[test]
    fn test_warnings_on_structurally_valid_document() {
        let doc = json!({
            "weight": {
                "0": [["root", 0.3], ["root", 0.3]],
                "1": []
            },
            "order": ["root", "root"]
        });
        let result = validate_value(&doc);
        assert!(result.is_ok(), "errors: {:?}", result.errors);
        assert!(result.has_warning(WarningCode::UnnormalizedVertex));
        assert!(result.has_warning(WarningCode::EmptyWeightList));
        assert!(result.has_warning(WarningCode::DuplicateBoneInOrder));
    }

    #[test]
    fn test_validate_data_flags_bone_missing_from_order() {
        let mut data = SkinWeightData::with_order(vec!["root".into()]);
        data.insert(0, vec![WeightEntry::new("root", 0.5), WeightEntry::new("arm", 0.5)]);

        let result = validate_data(&data);
        assert!(result.is_ok());
        assert!(result.has_warning(WarningCode::BoneMissingFromOrder));
        assert!(result.warnings.iter().any(|w| w.message.contains("\"arm\"")));
    }

    #[test]
    fn test_validate_data_rejects_non_finite() {
        let mut data = SkinWeightData::with_order(vec!["root".into()]);
        data.insert(0, vec![WeightEntry::new("root", f64::NAN)]);
        data.weight
            .insert("x".to_string(), vec![WeightEntry::new("root", 1.0)]);

        let result = validate_data(&data);
        assert!(result.has_error(ErrorCode::NonFiniteWeight));
        assert!(result.has_error(ErrorCode::InvalidVertexId));
    }
}
