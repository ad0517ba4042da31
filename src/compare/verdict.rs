//! Pass/fail policies over difference statistics

use std::fmt;

use serde::Deserialize;

use super::stats::DiffStats;

/// Default bound on the maximum absolute difference
pub const DEFAULT_MAX_ABS_THRESHOLD: f64 = 1e-4;
/// Default bound on the mean absolute difference
pub const DEFAULT_MEAN_ABS_THRESHOLD: f64 = 1e-5;
/// Default bound on the maximum relative difference
pub const DEFAULT_MAX_REL_THRESHOLD: f64 = 1e-2;
/// Relative-difference stabilizer paired with the absolute-dominant policy
pub const ABSOLUTE_DOMINANT_EPSILON: f64 = 1e-8;
/// Relative-difference stabilizer paired with the relative-dominant policy
pub const RELATIVE_DOMINANT_EPSILON: f64 = 1e-6;

fn default_max_abs() -> f64 {
    DEFAULT_MAX_ABS_THRESHOLD
}

fn default_mean_abs() -> f64 {
    DEFAULT_MEAN_ABS_THRESHOLD
}

fn default_max_rel() -> f64 {
    DEFAULT_MAX_REL_THRESHOLD
}

/// Which statistics gate the verdict
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum VerdictPolicy {
    /// Pass iff `max_abs < max_abs` threshold and `mean_abs < mean_abs` threshold
    AbsoluteDominant {
        /// Strict upper bound on the maximum absolute difference
        #[serde(default = "default_max_abs")]
        max_abs: f64,
        /// Strict upper bound on the mean absolute difference
        #[serde(default = "default_mean_abs")]
        mean_abs: f64,
    },
    /// Pass iff `max_rel <= max_rel` threshold
    RelativeDominant {
        /// Inclusive upper bound on the maximum relative difference
        #[serde(default = "default_max_rel")]
        max_rel: f64,
    },
}

impl Default for VerdictPolicy {
    fn default() -> Self {
        Self::absolute_dominant()
    }
}

impl VerdictPolicy {
    /// Absolute-dominant policy with default thresholds
    pub fn absolute_dominant() -> Self {
        Self::AbsoluteDominant {
            max_abs: DEFAULT_MAX_ABS_THRESHOLD,
            mean_abs: DEFAULT_MEAN_ABS_THRESHOLD,
        }
    }

    /// Relative-dominant policy with default threshold
    pub fn relative_dominant() -> Self {
        Self::RelativeDominant {
            max_rel: DEFAULT_MAX_REL_THRESHOLD,
        }
    }

    /// Epsilon that goes with this policy when none is configured
    pub fn default_epsilon(&self) -> f64 {
        match self {
            Self::AbsoluteDominant { .. } => ABSOLUTE_DOMINANT_EPSILON,
            Self::RelativeDominant { .. } => RELATIVE_DOMINANT_EPSILON,
        }
    }

    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::AbsoluteDominant { .. } => "absolute-dominant",
            Self::RelativeDominant { .. } => "relative-dominant",
        }
    }

    /// Evaluate `stats` against this policy
    pub fn evaluate(&self, stats: &DiffStats) -> Verdict {
        let mut breaches = Vec::new();

        // Negated comparisons so NaN statistics count as breaches
        match *self {
            Self::AbsoluteDominant { max_abs, mean_abs } => {
                if !(stats.max_abs < max_abs) {
                    breaches.push(Breach::new(Metric::MaxAbs, stats.max_abs, max_abs));
                }
                if !(stats.mean_abs < mean_abs) {
                    breaches.push(Breach::new(Metric::MeanAbs, stats.mean_abs, mean_abs));
                }
            }
            Self::RelativeDominant { max_rel } => {
                if !(stats.max_rel <= max_rel) {
                    breaches.push(Breach::new(Metric::MaxRel, stats.max_rel, max_rel));
                }
            }
        }

        if breaches.is_empty() {
            Verdict::Pass
        } else {
            Verdict::Fail(breaches)
        }
    }
}

/// A gated statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Maximum absolute difference
    MaxAbs,
    /// Mean absolute difference
    MeanAbs,
    /// Maximum relative difference
    MaxRel,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Metric::MaxAbs => "max absolute difference",
            Metric::MeanAbs => "mean absolute difference",
            Metric::MaxRel => "max relative difference",
        };
        f.write_str(name)
    }
}

/// A statistic that violated its threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    /// Which statistic
    pub metric: Metric,
    /// Observed value
    pub value: f64,
    /// Configured threshold
    pub threshold: f64,
}

impl Breach {
    fn new(metric: Metric, value: f64, threshold: f64) -> Self {
        Self {
            metric,
            value,
            threshold,
        }
    }
}

impl fmt::Display for Breach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6e} (threshold {:e})",
            self.metric, self.value, self.threshold
        )
    }
}

/// Outcome of a completed comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// All gated statistics are within bounds
    Pass,
    /// One or more thresholds were exceeded
    Fail(Vec<Breach>),
}

impl Verdict {
    /// Whether the comparison passed
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }

    /// Violated thresholds, empty on pass
    pub fn breaches(&self) -> &[Breach] {
        match self {
            Verdict::Pass => &[],
            Verdict::Fail(breaches) => breaches,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("Output matches expected results."),
            Verdict::Fail(breaches) => {
                f.write_str("Output mismatch exceeds threshold")?;
                for (i, breach) in breaches.iter().enumerate() {
                    let sep = if i == 0 { ": " } else { "; " };
                    write!(f, "{}{}", sep, breach)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(max_abs: f64, mean_abs: f64, max_rel: f64) -> DiffStats {
        DiffStats {
            count: 1,
            max_abs,
            max_abs_index: 0,
            mean_abs,
            rms: mean_abs,
            max_rel,
            max_rel_index: 0,
        }
    }

    #[test]
    fn test_defaults() {
        let abs = VerdictPolicy::default();
        assert_eq!(abs, VerdictPolicy::AbsoluteDominant { max_abs: 1e-4, mean_abs: 1e-5 });
        assert_eq!(abs.default_epsilon(), 1e-8);

        let rel = VerdictPolicy::relative_dominant();
        assert_eq!(rel, VerdictPolicy::RelativeDominant { max_rel: 1e-2 });
        assert_eq!(rel.default_epsilon(), 1e-6);
    }

    #[test]
    fn test_zero_stats_pass_both() {
        let zero = stats(0.0, 0.0, 0.0);
        assert!(VerdictPolicy::absolute_dominant().evaluate(&zero).is_pass());
        assert!(VerdictPolicy::relative_dominant().evaluate(&zero).is_pass());
    }

    #[test]
    fn test_absolute_boundary_is_strict() {
        let policy = VerdictPolicy::absolute_dominant();
        let verdict = policy.evaluate(&stats(1e-4, 0.0, 0.0));
        assert!(!verdict.is_pass());
        assert_eq!(verdict.breaches().len(), 1);
        assert_eq!(verdict.breaches()[0].metric, Metric::MaxAbs);
    }

    #[test]
    fn test_absolute_ignores_relative() {
        let policy = VerdictPolicy::absolute_dominant();
        assert!(policy.evaluate(&stats(1e-6, 1e-7, 1e3)).is_pass());
    }

    #[test]
    fn test_absolute_reports_both_breaches() {
        let verdict = VerdictPolicy::absolute_dominant().evaluate(&stats(1.0, 1.0, 0.0));
        let metrics: Vec<Metric> = verdict.breaches().iter().map(|b| b.metric).collect();
        assert_eq!(metrics, vec![Metric::MaxAbs, Metric::MeanAbs]);
    }

    #[test]
    fn test_relative_boundary_is_inclusive() {
        let policy = VerdictPolicy::relative_dominant();
        assert!(policy.evaluate(&stats(5.0, 5.0, 1e-2)).is_pass());
        assert!(!policy.evaluate(&stats(0.0, 0.0, 0.011)).is_pass());
    }

    #[test]
    fn test_nan_fails() {
        let nan = stats(f64::NAN, f64::NAN, f64::NAN);
        assert!(!VerdictPolicy::absolute_dominant().evaluate(&nan).is_pass());
        assert!(!VerdictPolicy::relative_dominant().evaluate(&nan).is_pass());
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Pass.to_string(), "Output matches expected results.");

        let verdict = VerdictPolicy::relative_dominant().evaluate(&stats(0.0, 0.0, 1000.0));
        let msg = verdict.to_string();
        assert!(msg.starts_with("Output mismatch exceeds threshold: max relative difference"));
    }

    #[test]
    fn test_policy_yaml_defaults() {
        let policy: VerdictPolicy = serde_yaml::from_str("kind: relative_dominant\n").unwrap();
        assert_eq!(policy, VerdictPolicy::relative_dominant());

        let policy: VerdictPolicy =
            serde_yaml::from_str("kind: absolute_dominant\nmax_abs: 0.5\n").unwrap();
        assert_eq!(policy, VerdictPolicy::AbsoluteDominant { max_abs: 0.5, mean_abs: 1e-5 });
    }

    #[test]
    fn test_policy_yaml_rejects_other_policy_threshold() {
        let result: Result<VerdictPolicy, _> =
            serde_yaml::from_str("kind: absolute_dominant
max_rel: 0.5
");
        assert!(result.is_err());

        let result: Result<VerdictPolicy, _> =
            serde_yaml::from_str("kind: relative_dominant
mean_abs: 0.5
");
        assert!(result.is_err());
    }
}
