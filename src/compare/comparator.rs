//! Reference-vs-candidate comparison
//!
//! Loads both inputs, computes difference statistics and evaluates the
//! configured verdict policy. Never touches the process exit status; callers
//! decide what a failing [`Verdict`] means.

use std::path::Path;

use tracing::{debug, info};

use super::stats::{analyze, DiffStats, ElementDiff};
use super::verdict::{Verdict, VerdictPolicy};
use crate::config::ComparisonConfig;
use crate::error::ComparisonError;
use crate::io::{load_npy, load_text};

/// Result of a comparison that produced a verdict
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    /// Shape of the reference array before flattening
    pub reference_shape: Vec<usize>,
    /// Aggregate statistics
    pub stats: DiffStats,
    /// Largest differences, worst first
    pub worst: Vec<ElementDiff>,
    /// Policy the verdict was evaluated with
    pub policy: VerdictPolicy,
    /// Epsilon used for relative differences
    pub epsilon: f64,
    /// Pass/fail outcome
    pub verdict: Verdict,
}

impl ComparisonReport {
    /// Whether the comparison passed
    pub fn passed(&self) -> bool {
        self.verdict.is_pass()
    }

    /// Statistic lines in report order, 6 decimal places
    pub fn stat_lines(&self) -> Vec<String> {
        vec![
            format!("Max absolute difference: {:.6}", self.stats.max_abs),
            format!("Mean absolute difference: {:.6}", self.stats.mean_abs),
            format!("RMS difference: {:.6}", self.stats.rms),
            format!("Max relative difference: {:.6}", self.stats.max_rel),
        ]
    }

    /// One line per recorded worst element
    pub fn diff_lines(&self) -> Vec<String> {
        self.worst
            .iter()
            .map(|d| {
                format!(
                    "  [{}] expected={:.6}, actual={:.6}, diff={:.2e}, rel={:.2e}",
                    d.index, d.expected, d.actual, d.abs_diff, d.rel_diff
                )
            })
            .collect()
    }

    /// Final pass/fail marker line
    pub fn marker(&self) -> String {
        if self.passed() {
            format!("✓ {}", self.verdict)
        } else {
            format!("✗ {}", self.verdict)
        }
    }
}

/// Compares a reference array against a candidate array
pub struct Comparator {
    config: ComparisonConfig,
}

impl Default for Comparator {
    fn default() -> Self {
        Self::new()
    }
}

impl Comparator {
    /// Create a comparator with the default absolute-dominant config
    pub fn new() -> Self {
        Self::with_config(ComparisonConfig::default())
    }

    /// Create with custom config
    pub fn with_config(config: ComparisonConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    /// Compare an NPY reference file against a text candidate file
    pub fn compare_files<P, Q>(
        &self,
        reference_path: P,
        candidate_path: Q,
    ) -> Result<ComparisonReport, ComparisonError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let reference_path = reference_path.as_ref();
        let candidate_path = candidate_path.as_ref();
        info!(
            "Comparing {:?} against reference {:?} ({} policy)",
            candidate_path,
            reference_path,
            self.config.policy.name()
        );

        let reference = load_npy(reference_path)?;
        let candidate = load_text(candidate_path)?;

        self.build_report(reference.shape().to_vec(), &reference.flatten(), &candidate)
    }

    /// Compare two in-memory sequences; the reference shape is taken as 1-D
    pub fn compare_slices(
        &self,
        reference: &[f64],
        candidate: &[f64],
    ) -> Result<ComparisonReport, ComparisonError> {
        self.build_report(vec![reference.len()], reference, candidate)
    }

    fn build_report(
        &self,
        reference_shape: Vec<usize>,
        reference: &[f64],
        candidate: &[f64],
    ) -> Result<ComparisonReport, ComparisonError> {
        let (stats, worst) = analyze(
            reference,
            candidate,
            self.config.epsilon,
            self.config.max_reported_diffs,
        )?;
        debug!("Computed statistics over {} elements: {:?}", stats.count, stats);

        let verdict = self.config.policy.evaluate(&stats);
        info!("Verdict: {}", if verdict.is_pass() { "pass" } else { "fail" });

        Ok(ComparisonReport {
            reference_shape,
            stats,
            worst,
            policy: self.config.policy,
            epsilon: self.config.epsilon,
            verdict,
        })
    }
}

/// Compare `candidate_path` against `reference_path` under `config`
pub fn compare<P, Q>(
    reference_path: P,
    candidate_path: Q,
    config: &ComparisonConfig,
) -> Result<ComparisonReport, ComparisonError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    Comparator::with_config(config.clone()).compare_files(reference_path, candidate_path)
}
