//! Difference statistics and verdicts
//!
//! Tools for checking a computed output against a reference:
//! - Elementwise absolute/relative differences
//! - Streaming aggregates (max, mean, RMS)
//! - Absolute- or relative-dominant pass/fail policy

mod comparator;
mod stats;
mod verdict;

pub use comparator::{compare, Comparator, ComparisonReport};
pub use stats::{absolute_difference, analyze, relative_difference, DiffStats, ElementDiff};
pub use verdict::{
    Breach, Metric, Verdict, VerdictPolicy, ABSOLUTE_DOMINANT_EPSILON, DEFAULT_MAX_ABS_THRESHOLD,
    DEFAULT_MAX_REL_THRESHOLD, DEFAULT_MEAN_ABS_THRESHOLD, RELATIVE_DOMINANT_EPSILON,
};
