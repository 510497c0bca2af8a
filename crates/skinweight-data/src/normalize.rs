//! Weight normalization.
//!
//! Rescales a vertex's weight list so its non-zero weights sum to 1.0.

use crate::error::NormalizationError;
use crate::weights::{total_weight, WeightEntry};

/// Result of normalizing one vertex weight list.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Rescaled entries, in input order.
    pub entries: Vec<WeightEntry>,
    /// Total recomputed after rescaling.
    pub total: f64,
    /// Whether `total` equals 1.0 within [`normalization_epsilon`].
    pub exact: bool,
}

/// Largest accepted deviation from 1.0 for a list of `len` entries.
///
/// Each addition may round by half an ulp, so the bound grows with the
/// number of summed entries.
pub fn normalization_epsilon(len: usize) -> f64 {
    f64::EPSILON * len.max(1) as f64
}

/// Returns true if the list's non-zero weights sum to 1.0.
pub fn is_normalized(list: &[WeightEntry]) -> bool {
    (total_weight(list) - 1.0).abs() <= normalization_epsilon(list.len())
}

/// Divides every weight by the list's total.
///
/// Entries with weight exactly zero are ignored when computing the total but
/// are kept (still zero) in the output. A zero or non-finite total is an
/// error; the division is never attempted.
pub fn normalize_weights(list: &[WeightEntry]) -> Result<Normalized, NormalizationError> {
    let total = total_weight(list);
    if !total.is_finite() {
        return Err(NormalizationError::NonFiniteTotal { total });
    }
    if total == 0.0 {
        return Err(NormalizationError::ZeroTotal);
    }

    let entries: Vec<WeightEntry> = list
        .iter()
        .map(|entry| WeightEntry::new(entry.bone.clone(), entry.weight / total))
        .collect();

    let total = total_weight(&entries);
    let exact = (total - 1.0).abs() <= normalization_epsilon(entries.len());
    if !exact {
        log::debug!("normalized total {} deviates from 1.0", total);
    }

    Ok(Normalized {
        entries,
        total,
        exact,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_equal_weights_split_evenly() {
        let list = vec![WeightEntry::new("boneA", 0.3), WeightEntry::new("boneB", 0.3)];
        let normalized = normalize_weights(&list).unwrap();
        assert_eq!(
            normalized.entries,
            vec![WeightEntry::new("boneA", 0.5), WeightEntry::new("boneB", 0.5)]
        );
        assert!(normalized.exact);
    }

    #[test]
    fn test_already_normalized_is_idempotent() {
        let list = vec![WeightEntry::new("a", 0.25), WeightEntry::new("b", 0.75)];
        let normalized = normalize_weights(&list).unwrap();
        assert_eq!(normalized.entries, list);
        assert_eq!(normalized.total, 1.0);
    }

    #[test]
    fn test_weights_above_one_are_scaled_down() {
        let list = vec![WeightEntry::new("root", 1.0), WeightEntry::new("child", 1.0)];
        let normalized = normalize_weights(&list).unwrap();
        assert_eq!(normalized.entries[0].weight, 0.5);
        assert_eq!(normalized.entries[1].weight, 0.5);
    }

    #[test]
    fn test_zero_entries_kept_but_ignored() {
        let list = vec![WeightEntry::new("a", 0.0), WeightEntry::new("b", 0.4)];
        let normalized = normalize_weights(&list).unwrap();
        assert_eq!(normalized.entries[0].weight, 0.0);
        assert_eq!(normalized.entries[1].weight, 1.0);
    }

    #[test]
    fn test_zero_total_is_an_error() {
        let list = vec![WeightEntry::new("a", 0.0), WeightEntry::new("b", 0.0)];
        assert_eq!(normalize_weights(&list), Err(NormalizationError::ZeroTotal));
        assert_eq!(normalize_weights(&[]), Err(NormalizationError::ZeroTotal));
    }

    #[test]
    fn test_non_finite_total_is_an_error() {
        let list = vec![WeightEntry::new("a", f64::INFINITY)];
        assert!(matches!(
            normalize_weights(&list),
            Err(NormalizationError::NonFiniteTotal { .. })
        ));
    }

    #[test]
    fn test_is_normalized() {
        assert!(is_normalized(&[WeightEntry::new("a", 1.0)]));
        assert!(!is_normalized(&[WeightEntry::new("a", 0.9)]));
        assert!(!is_normalized(&[]));
    }
}
