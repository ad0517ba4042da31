//! # tinyonnx-validate
//!
//! Checks a computed output against a NumPy reference.
//!
//! Loads a reference `.npy` array and a candidate text file of floats,
//! reports absolute and relative difference statistics, and evaluates a
//! pass/fail policy.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tinyonnx_validate::{compare, ComparisonConfig};
//!
//! let report = compare(
//!     "test_data/reference_output.npy",
//!     "tinyonnx_output.txt",
//!     &ComparisonConfig::default(),
//! )?;
//! for line in report.stat_lines() {
//!     println!("{}", line);
//! }
//! println!("{}", report.marker());
//! # Ok::<(), tinyonnx_validate::ComparisonError>(())
//! ```

// Require docs for public items, but not struct fields (too verbose)
#![warn(missing_docs)]
#![allow(rustdoc::missing_crate_level_docs)]

pub mod compare;
pub mod config;
pub mod error;
pub mod io;

// Re-exports for convenience
pub use compare::{compare, Comparator, ComparisonReport, DiffStats, Verdict, VerdictPolicy};
pub use config::{ComparisonConfig, ConfigOverrides};
pub use error::{ComparisonError, NpyError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reference array read when no path is given
pub const DEFAULT_REFERENCE_PATH: &str = "test_data/reference_output.npy";

/// Candidate output read when no path is given
pub const DEFAULT_CANDIDATE_PATH: &str = "tinyonnx_output.txt";
