//! Elementwise differences and their aggregates

use std::cmp::Ordering;

use crate::error::ComparisonError;

/// `|actual - expected|`
pub fn absolute_difference(expected: f64, actual: f64) -> f64 {
    (actual - expected).abs()
}

/// Absolute difference scaled by `|expected| + epsilon`
///
/// `epsilon` keeps the ratio finite where the reference is zero.
pub fn relative_difference(expected: f64, actual: f64, epsilon: f64) -> f64 {
    absolute_difference(expected, actual) / (expected.abs() + epsilon)
}

/// Aggregate difference statistics over two equal-length arrays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffStats {
    /// Number of compared elements
    pub count: usize,
    /// Maximum absolute difference
    pub max_abs: f64,
    /// Index of the first element reaching `max_abs`
    pub max_abs_index: usize,
    /// Mean absolute difference
    pub mean_abs: f64,
    /// Root mean square of the absolute differences
    pub rms: f64,
    /// Maximum relative difference
    pub max_rel: f64,
    /// Index of the first element reaching `max_rel`
    pub max_rel_index: usize,
}

/// One element that differs between reference and candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementDiff {
    /// Position in the flattened arrays
    pub index: usize,
    /// Reference value
    pub expected: f64,
    /// Candidate value
    pub actual: f64,
    /// Absolute difference
    pub abs_diff: f64,
    /// Relative difference
    pub rel_diff: f64,
}

impl DiffStats {
    /// Compute statistics for `reference` against `candidate`
    pub fn compute(
        reference: &[f64],
        candidate: &[f64],
        epsilon: f64,
    ) -> Result<Self, ComparisonError> {
        analyze(reference, candidate, epsilon, 0).map(|(stats, _)| stats)
    }
}

/// Compute statistics and collect up to `worst_limit` of the largest differences
///
/// Runs in a single pass without materializing the difference arrays. A NaN
/// difference poisons the matching aggregates, so any threshold check on them
/// fails.
pub fn analyze(
    reference: &[f64],
    candidate: &[f64],
    epsilon: f64,
    worst_limit: usize,
) -> Result<(DiffStats, Vec<ElementDiff>), ComparisonError> {
    if reference.len() != candidate.len() {
        return Err(ComparisonError::ShapeMismatch {
            reference: reference.len(),
            candidate: candidate.len(),
        });
    }
    if reference.is_empty() {
        return Err(ComparisonError::EmptyInput);
    }

    let mut max_abs = 0.0f64;
    let mut max_abs_index = 0;
    let mut max_rel = 0.0f64;
    let mut max_rel_index = 0;
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let mut worst = Vec::with_capacity(worst_limit);

    for (i, (&expected, &actual)) in reference.iter().zip(candidate.iter()).enumerate() {
        let abs_diff = absolute_difference(expected, actual);
        let rel_diff = relative_difference(expected, actual, epsilon);

        update_max(&mut max_abs, &mut max_abs_index, abs_diff, i);
        update_max(&mut max_rel, &mut max_rel_index, rel_diff, i);
        sum += abs_diff;
        sum_sq += abs_diff * abs_diff;

        push_worst(
            &mut worst,
            worst_limit,
            ElementDiff {
                index: i,
                expected,
                actual,
                abs_diff,
                rel_diff,
            },
        );
    }

    let n = reference.len() as f64;
    let stats = DiffStats {
        count: reference.len(),
        max_abs,
        max_abs_index,
        mean_abs: sum / n,
        rms: (sum_sq / n).sqrt(),
        max_rel,
        max_rel_index,
    };

    Ok((stats, worst))
}

fn update_max(current: &mut f64, index: &mut usize, value: f64, i: usize) {
    if current.is_nan() {
        return;
    }
    if value.is_nan() || value > *current {
        *current = value;
        *index = i;
    }
}

/// Insert into a list kept sorted by descending `abs_diff`
fn push_worst(worst: &mut Vec<ElementDiff>, limit: usize, diff: ElementDiff) {
    if limit == 0 || !(diff.abs_diff > 0.0 || diff.abs_diff.is_nan()) {
        return;
    }
    if worst.len() == limit {
        if let Some(last) = worst.last() {
            if diff.abs_diff.total_cmp(&last.abs_diff) != Ordering::Greater {
                return;
            }
        }
    }

    // Ties keep the earlier index first
    let pos = worst.partition_point(|w| w.abs_diff.total_cmp(&diff.abs_diff) != Ordering::Less);
    worst.insert(pos, diff);
    worst.truncate(limit);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_arrays() {
        let values = vec![1.0, 2.0, 3.0];
        let stats = DiffStats::compute(&values, &values, 1e-8).unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.max_abs, 0.0);
        assert_eq!(stats.mean_abs, 0.0);
        assert_eq!(stats.rms, 0.0);
        assert_eq!(stats.max_rel, 0.0);
    }

    #[test]
    fn test_aggregates() {
        let reference = vec![1.0, 2.0, 4.0, 8.0];
        let candidate = vec![1.0, 2.6, 3.0, 8.0];
        let stats = DiffStats::compute(&reference, &candidate, 1e-8).unwrap();

        assert_eq!(stats.max_abs, 1.0);
        assert_eq!(stats.max_abs_index, 2);
        assert!((stats.mean_abs - 0.4).abs() < 1e-12);
        assert!((stats.rms - (1.36f64 / 4.0).sqrt()).abs() < 1e-12);
        // 0.6 / 2 beats 1.0 / 4
        assert!((stats.max_rel - 0.3).abs() < 1e-6);
        assert_eq!(stats.max_rel_index, 1);
    }

    #[test]
    fn test_zero_reference_is_finite() {
        let rel = relative_difference(0.0, 0.001, 1e-6);
        assert!(rel.is_finite());
        assert!((rel - 1000.0).abs() < 1e-6);

        let stats = DiffStats::compute(&[0.0, 10.0], &[0.001, 10.0], 1e-6).unwrap();
        assert!((stats.max_rel - 1000.0).abs() < 1e-6);
        assert_eq!(stats.max_rel_index, 0);
    }

    #[test]
    fn test_length_mismatch() {
        let err = DiffStats::compute(&[1.0; 5], &[1.0; 3], 1e-8).unwrap_err();
        assert!(matches!(
            err,
            ComparisonError::ShapeMismatch { reference: 5, candidate: 3 }
        ));
    }

    #[test]
    fn test_empty_input() {
        let err = DiffStats::compute(&[], &[], 1e-8).unwrap_err();
        assert!(matches!(err, ComparisonError::EmptyInput));
    }

    #[test]
    fn test_nan_poisons_aggregates() {
        let stats =
            DiffStats::compute(&[1.0, 2.0, 3.0], &[1.0, f64::NAN, 100.0], 1e-8).unwrap();
        assert!(stats.max_abs.is_nan());
        assert_eq!(stats.max_abs_index, 1);
        assert!(stats.mean_abs.is_nan());
        assert!(stats.max_rel.is_nan());
    }

    #[test]
    fn test_worst_elements_sorted_and_bounded() {
        let reference = vec![0.0; 6];
        let candidate = vec![0.1, 0.0, 0.5, 0.3, 0.5, 0.2];
        let (_, worst) = analyze(&reference, &candidate, 1e-8, 3).unwrap();

        let indices: Vec<usize> = worst.iter().map(|d| d.index).collect();
        assert_eq!(indices, vec![2, 4, 3]);
    }

    #[test]
    fn test_worst_elements_skip_exact_matches() {
        let values = vec![1.0, 2.0];
        let (_, worst) = analyze(&values, &values, 1e-8, 10).unwrap();
        assert!(worst.is_empty());
    }
}
