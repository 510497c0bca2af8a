//! Skin Weight Data Library
//!
//! This crate provides the persisted data model, codec, validation, and
//! normalization for displacement-inferred skin weights.
//!
//! # Overview
//!
//! A weight file is a JSON document with exactly two keys:
//!
//! - **`order`**: bone names in the hierarchy order used during calculation.
//!   Application zeroes every vertex against this list before assigning.
//! - **`weight`**: vertex id (string-encoded integer) to a list of
//!   `[bone_name, weight]` pairs.
//!
//! # Example
//!
//! ```
//! use skinweight_data::{normalize_weights, SkinWeightData, WeightEntry};
//! use skinweight_data::validation::validate_data;
//!
//! let mut data = SkinWeightData::with_order(vec!["root".into(), "arm".into()]);
//! let normalized = normalize_weights(&[
//!     WeightEntry::new("root", 0.3),
//!     WeightEntry::new("arm", 0.3),
//! ])
//! .unwrap();
//! data.insert(4, normalized.entries);
//!
//! assert!(validate_data(&data).is_ok());
//! let json = data.to_json().unwrap();
//! assert_eq!(SkinWeightData::from_json(&json).unwrap(), data);
//! ```
//!
//! # Modules
//!
//! - [`error`]: Error codes, validation results, and error types
//! - [`weights`]: `SkinWeightData` and `WeightEntry`
//! - [`normalize`]: Per-vertex weight normalization
//! - [`validation`]: Structural and consistency validation
//! - [`codec`]: Saving and loading weight files

pub mod codec;
pub mod error;
pub mod normalize;
pub mod validation;
pub mod weights;

// Re-export commonly used types at the crate root
pub use codec::{load, load_value, save, save_with, JsonLayout};
pub use error::{
    DataError, DataResult, ErrorCode, NormalizationError, ReportableError, ValidationError,
    ValidationResult, ValidationWarning, WarningCode,
};
pub use normalize::{is_normalized, normalize_weights, Normalized};
pub use validation::{validate_data, validate_value};
pub use weights::{parse_vertex_id, total_weight, SkinWeightData, VertexWeightList, WeightEntry};

#[cfg(test)]
mod integration_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// The two-bone scenario: one vertex fully owned by the child bone.
    #[test]
    fn test_parse_single_child_document() {
        let json = r#"{
            "weight": { "0": [["child", 1.0]] },
            "order": ["child"]
        }"#;

        let data = SkinWeightData::from_json(json).expect("should parse");
        assert_eq!(data.order, vec!["child".to_string()]);
        assert_eq!(data.get(0), Some(&vec![WeightEntry::new("child", 1.0)]));
        assert_eq!(data.get(1), None);

        let result = validate_data(&data);
        assert!(result.is_ok(), "errors: {:?}", result.errors);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_value_and_typed_validation_agree_on_valid_data() {
        let json = r#"{
            "weight": {
                "0": [["hips", 0.5], ["spine", 0.5]],
                "1": [["spine", 1.0]]
            },
            "order": ["hips", "spine"]
        }"#;

        let value: serde_json::Value = serde_json::from_str(json).unwrap();
        assert!(validate_value(&value).is_ok());

        let data = SkinWeightData::from_value(value).unwrap();
        assert!(validate_data(&data).is_ok());
    }

    #[test]
    fn test_empty_data_is_valid() {
        let data = SkinWeightData::default();
        assert!(validate_data(&data).is_ok());

        let json = data.to_json().unwrap();
        assert_eq!(json, r#"{"weight":{},"order":[]}"#);
        assert_eq!(SkinWeightData::from_json(&json).unwrap(), data);
    }
}
