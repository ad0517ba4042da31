//! Comparison configuration
//!
//! Thresholds and the relative-difference epsilon, loadable from YAML:
//!
//! ```yaml
//! policy:
//!   kind: relative_dominant
//!   max_rel: 1.0e-2
//! epsilon: 1.0e-6
//! max_reported_diffs: 5
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::mem;
use std::path::Path;

use crate::compare::VerdictPolicy;

/// Default number of worst elements kept in a report
pub const DEFAULT_MAX_REPORTED_DIFFS: usize = 10;

fn default_max_reported_diffs() -> usize {
    DEFAULT_MAX_REPORTED_DIFFS
}

/// On-disk shape of the config; `epsilon` falls back to the policy default
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    policy: VerdictPolicy,
    #[serde(default)]
    epsilon: Option<f64>,
    #[serde(default = "default_max_reported_diffs")]
    max_reported_diffs: usize,
}

impl From<ConfigFile> for ComparisonConfig {
    fn from(file: ConfigFile) -> Self {
        Self {
            epsilon: file.epsilon.unwrap_or_else(|| file.policy.default_epsilon()),
            policy: file.policy,
            max_reported_diffs: file.max_reported_diffs,
        }
    }
}

/// Configuration for one comparison run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct ComparisonConfig {
    /// Verdict policy and its thresholds
    pub policy: VerdictPolicy,
    /// Stabilizer added to `|reference|` before dividing
    pub epsilon: f64,
    /// Number of worst elements to keep in the report
    pub max_reported_diffs: usize,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self::with_policy(VerdictPolicy::default())
    }
}

/// Command-line overrides applied on top of a loaded config
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Maximum absolute difference threshold
    pub max_abs: Option<f64>,
    /// Mean absolute difference threshold
    pub mean_abs: Option<f64>,
    /// Maximum relative difference threshold
    pub max_rel: Option<f64>,
    /// Relative-difference epsilon
    pub epsilon: Option<f64>,
    /// Number of worst elements to report
    pub max_reported_diffs: Option<usize>,
}

impl ComparisonConfig {
    /// Config for `policy` with its paired default epsilon
    pub fn with_policy(policy: VerdictPolicy) -> Self {
        Self {
            epsilon: policy.default_epsilon(),
            policy,
            max_reported_diffs: DEFAULT_MAX_REPORTED_DIFFS,
        }
    }

    /// Absolute-dominant defaults: thresholds 1e-4 / 1e-5, epsilon 1e-8
    pub fn absolute_dominant() -> Self {
        Self::with_policy(VerdictPolicy::absolute_dominant())
    }

    /// Relative-dominant defaults: threshold 1e-2, epsilon 1e-6
    pub fn relative_dominant() -> Self {
        Self::with_policy(VerdictPolicy::relative_dominant())
    }

    /// Load and validate a YAML config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Switch to another policy kind, resetting thresholds and epsilon to its
    /// defaults. Selecting the current kind keeps the configured values.
    pub fn switch_policy(&mut self, policy: VerdictPolicy) {
        if mem::discriminant(&self.policy) != mem::discriminant(&policy) {
            self.epsilon = policy.default_epsilon();
            self.policy = policy;
        }
    }

    /// Apply command-line overrides; thresholds must belong to the active policy
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        match &mut self.policy {
            VerdictPolicy::AbsoluteDominant { max_abs, mean_abs } => {
                if overrides.max_rel.is_some() {
                    anyhow::bail!("--max-rel only applies to the relative-dominant policy");
                }
                if let Some(v) = overrides.max_abs {
                    *max_abs = v;
                }
                if let Some(v) = overrides.mean_abs {
                    *mean_abs = v;
                }
            }
            VerdictPolicy::RelativeDominant { max_rel } => {
                if overrides.max_abs.is_some() || overrides.mean_abs.is_some() {
                    anyhow::bail!(
                        "--max-abs and --mean-abs only apply to the absolute-dominant policy"
                    );
                }
                if let Some(v) = overrides.max_rel {
                    *max_rel = v;
                }
            }
        }

        if let Some(eps) = overrides.epsilon {
            self.epsilon = eps;
        }
        if let Some(n) = overrides.max_reported_diffs {
            self.max_reported_diffs = n;
        }

        self.validate()
    }

    /// Reject non-positive epsilon and negative or NaN thresholds
    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            anyhow::bail!("epsilon must be finite and positive, got {}", self.epsilon);
        }

        let thresholds = match self.policy {
            VerdictPolicy::AbsoluteDominant { max_abs, mean_abs } => {
                vec![("max_abs", max_abs), ("mean_abs", mean_abs)]
            }
            VerdictPolicy::RelativeDominant { max_rel } => vec![("max_rel", max_rel)],
        };
        for (name, value) in thresholds {
            if !(value >= 0.0) {
                anyhow::bail!("{} threshold must be non-negative, got {}", name, value);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_absolute_dominant() {
        let config = ComparisonConfig::default();
        assert_eq!(config.policy, VerdictPolicy::absolute_dominant());
        assert_eq!(config.epsilon, 1e-8);
        assert_eq!(config.max_reported_diffs, 10);
    }

    #[test]
    fn test_relative_defaults_not_merged() {
        let config = ComparisonConfig::relative_dominant();
        assert_eq!(config.epsilon, 1e-6);
        assert_eq!(config.policy, VerdictPolicy::RelativeDominant { max_rel: 1e-2 });
    }

    #[test]
    fn test_yaml_epsilon_follows_policy() {
        let config: ComparisonConfig =
            serde_yaml::from_str("policy:\n  kind: relative_dominant\n").unwrap();
        assert_eq!(config.epsilon, 1e-6);

        let yaml = "policy:\n  kind: relative_dominant\n  max_rel: 0.05\n\
                    epsilon: 1.0e-3\nmax_reported_diffs: 2\n";
        let config: ComparisonConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.policy, VerdictPolicy::RelativeDominant { max_rel: 0.05 });
        assert_eq!(config.epsilon, 1e-3);
        assert_eq!(config.max_reported_diffs, 2);
    }

    #[test]
    fn test_yaml_empty_policy_defaults() {
        let config: ComparisonConfig = serde_yaml::from_str("max_reported_diffs: 3\n").unwrap();
        assert_eq!(config.policy, VerdictPolicy::absolute_dominant());
        assert_eq!(config.epsilon, 1e-8);
    }

    #[test]
    fn test_yaml_rejects_unknown_fields() {
        let result: std::result::Result<ComparisonConfig, _> =
            serde_yaml::from_str("max_abs_threshold: 1.0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_rejects_other_policy_threshold() {
        let result: std::result::Result<ComparisonConfig, _> =
            serde_yaml::from_str("policy:\n  kind: absolute_dominant\n  max_rel: 0.5\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_switch_policy_resets_epsilon() {
        let mut config = ComparisonConfig::default();
        config.switch_policy(VerdictPolicy::relative_dominant());
        assert_eq!(config.epsilon, 1e-6);

        // Same kind keeps configured values
        config.policy = VerdictPolicy::RelativeDominant { max_rel: 0.5 };
        config.switch_policy(VerdictPolicy::relative_dominant());
        assert_eq!(config.policy, VerdictPolicy::RelativeDominant { max_rel: 0.5 });
    }

    #[test]
    fn test_overrides() {
        let mut config = ComparisonConfig::default();
        let overrides = ConfigOverrides {
            max_abs: Some(1e-3),
            epsilon: Some(1e-7),
            ..Default::default()
        };
        config.apply_overrides(&overrides).unwrap();
        assert_eq!(
            config.policy,
            VerdictPolicy::AbsoluteDominant { max_abs: 1e-3, mean_abs: 1e-5 }
        );
        assert_eq!(config.epsilon, 1e-7);
    }

    #[test]
    fn test_overrides_reject_foreign_threshold() {
        let mut config = ComparisonConfig::default();
        let overrides = ConfigOverrides {
            max_rel: Some(0.1),
            ..Default::default()
        };
        assert!(config.apply_overrides(&overrides).is_err());

        let mut config = ComparisonConfig::relative_dominant();
        let overrides = ConfigOverrides {
            mean_abs: Some(0.1),
            ..Default::default()
        };
        assert!(config.apply_overrides(&overrides).is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = ComparisonConfig::default();
        assert!(config.validate().is_ok());

        config.epsilon = 0.0;
        assert!(config.validate().is_err());

        let mut config = ComparisonConfig::relative_dominant();
        config.policy = VerdictPolicy::RelativeDominant { max_rel: f64::NAN };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thresholds.yaml");
        std::fs::write(
            &path,
            "policy:\n  kind: absolute_dominant\n  max_abs: 2.0e-4\n  mean_abs: 2.0e-5\n",
        )
        .unwrap();

        let config = ComparisonConfig::load(&path).unwrap();
        assert_eq!(
            config.policy,
            VerdictPolicy::AbsoluteDominant { max_abs: 2e-4, mean_abs: 2e-5 }
        );
        assert_eq!(config.epsilon, 1e-8);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "epsilon: -1.0\n").unwrap();
        assert!(ComparisonConfig::load(&path).is_err());
    }
}
