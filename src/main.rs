//! tinyonnx-validate CLI - compare a computed output against a reference array

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use tinyonnx_validate::io::load_npy_header;
use tinyonnx_validate::{
    Comparator, ComparisonConfig, ConfigOverrides, VerdictPolicy, DEFAULT_CANDIDATE_PATH,
    DEFAULT_REFERENCE_PATH, VERSION,
};

/// tinyonnx-validate - check computed outputs against a NumPy reference
#[derive(Parser, Debug)]
#[command(name = "tinyonnx-validate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging and per-element diffs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compare a candidate output against a reference array
    Compare {
        /// Reference array (.npy)
        #[arg(short, long, default_value = DEFAULT_REFERENCE_PATH)]
        reference: PathBuf,

        /// Candidate output (whitespace-separated floats)
        #[arg(short = 'i', long, default_value = DEFAULT_CANDIDATE_PATH)]
        candidate: PathBuf,

        /// YAML file with policy, thresholds and epsilon
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Verdict policy; resets thresholds to that policy's defaults
        #[arg(short, long, value_enum)]
        policy: Option<PolicyArg>,

        /// Maximum absolute difference threshold (absolute policy)
        #[arg(long)]
        max_abs: Option<f64>,

        /// Mean absolute difference threshold (absolute policy)
        #[arg(long)]
        mean_abs: Option<f64>,

        /// Maximum relative difference threshold (relative policy)
        #[arg(long)]
        max_rel: Option<f64>,

        /// Stabilizer added to |reference| in relative differences
        #[arg(long)]
        epsilon: Option<f64>,

        /// Number of worst elements to print with --verbose
        #[arg(long)]
        max_diffs: Option<usize>,
    },

    /// Show the header of an NPY file
    Inspect {
        /// Path to the .npy file
        path: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    /// max_abs < threshold and mean_abs < threshold
    Absolute,
    /// max_rel <= threshold
    Relative,
}

impl From<PolicyArg> for VerdictPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Absolute => VerdictPolicy::absolute_dominant(),
            PolicyArg::Relative => VerdictPolicy::relative_dominant(),
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

fn build_config(
    config: Option<PathBuf>,
    policy: Option<PolicyArg>,
    overrides: &ConfigOverrides,
) -> Result<ComparisonConfig> {
    let mut cfg = match config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            ComparisonConfig::load(&path).context("Failed to load config")?
        }
        None => ComparisonConfig::default(),
    };

    if let Some(policy) = policy {
        cfg.switch_policy(policy.into());
    }
    cfg.apply_overrides(overrides).context("Invalid threshold options")?;

    debug!("Effective config: {:?}", cfg);
    Ok(cfg)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    info!("tinyonnx-validate v{}", VERSION);

    match cli.command {
        Commands::Compare {
            reference,
            candidate,
            config,
            policy,
            max_abs,
            mean_abs,
            max_rel,
            epsilon,
            max_diffs,
        } => {
            let overrides = ConfigOverrides {
                max_abs,
                mean_abs,
                max_rel,
                epsilon,
                max_reported_diffs: max_diffs,
            };
            let config = build_config(config, policy, &overrides)?;

            let report = Comparator::with_config(config)
                .compare_files(&reference, &candidate)
                .context("Comparison aborted")?;

            for line in report.stat_lines() {
                println!("{}", line);
            }

            if cli.verbose && !report.worst.is_empty() {
                println!("Largest differences:");
                for line in report.diff_lines() {
                    println!("{}", line);
                }
            }

            println!("{}", report.marker());
            if report.passed() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Inspect { path } => {
            let header = load_npy_header(&path)?;
            println!("File: {:?}", path);
            println!("  dtype: {}", header.descr);
            println!("  shape: {:?}", header.shape);
            println!("  fortran_order: {}", header.fortran_order);
            println!("  elements: {}", header.len());
            Ok(ExitCode::SUCCESS)
        }
    }
}
