//! Union search evaluation tool.
//!
//! Scores the rankings of a table union search method on one benchmark,
//! for the original datalake and each perturbed variant, and optionally
//! measures per-column embedding drift between variants.
//!
//! # Usage
//!
//! ```bash
//! # Ranking evaluation, reports under output/santos/<variant>/
//! unionsearch-eval santos
//!
//! # Column drift only
//! unionsearch-eval tus --distances-only
//!
//! # Custom roots, JSON summary
//! unionsearch-eval tusLarge --data-dir /mnt/data --vectors-dir /mnt/vectors --json
//! ```

mod output;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use unionsearch_core::search::ExhaustiveSearcher;
use unionsearch_core::storage::BenchmarkLayout;
use unionsearch_core::{
    Benchmark, BenchmarkConfig, EvaluationObserver, EvaluationOrchestrator, SearchError,
    TableEmbedding, VariantOutcome,
};

// =============================================================================
// CLI
// =============================================================================

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BenchmarkArg {
    Santos,
    Pylon,
    Tus,
    #[value(name = "tusLarge")]
    TusLarge,
}

impl From<BenchmarkArg> for Benchmark {
    fn from(arg: BenchmarkArg) -> Self {
        match arg {
            BenchmarkArg::Santos => Benchmark::Santos,
            BenchmarkArg::Pylon => Benchmark::Pylon,
            BenchmarkArg::Tus => Benchmark::Tus,
            BenchmarkArg::TusLarge => Benchmark::TusLarge,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "unionsearch-eval", version)]
#[command(about = "Evaluate table union search rankings across datalake variants")]
struct Args {
    /// Benchmark to evaluate
    #[arg(value_enum)]
    benchmark: BenchmarkArg,

    /// Only compute column drift between variants
    #[arg(long, alias = "distances_only")]
    distances_only: bool,

    /// Root of the CSV table directories
    #[arg(long, alias = "data_dir", default_value = "data")]
    data_dir: PathBuf,

    /// Root of ground truth and embedding files
    #[arg(long, default_value = "vectors")]
    vectors_dir: PathBuf,

    /// Root of written reports
    #[arg(long, default_value = "output")]
    output_dir: PathBuf,

    /// Output the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

// =============================================================================
// Progress
// =============================================================================

/// Shows one progress bar per variant.
#[derive(Default)]
struct ProgressObserver {
    bar: RefCell<Option<ProgressBar>>,
}

impl EvaluationObserver for ProgressObserver {
    fn variant_started(&self, variant: &str, num_queries: usize) {
        let pb = ProgressBar::new(num_queries as u64);
        pb.set_style(
            ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb.set_message(format!("Processing {}", variant));
        *self.bar.borrow_mut() = Some(pb);
    }

    fn query_finished(&self, _variant: &str, _query_id: &str) {
        if let Some(pb) = self.bar.borrow().as_ref() {
            pb.inc(1);
        }
    }

    fn variant_finished(&self, _variant: &str, _outcome: &VariantOutcome) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}

fn exhaustive_searcher(
    config: &BenchmarkConfig,
    datalake: Vec<TableEmbedding>,
) -> Result<ExhaustiveSearcher, SearchError> {
    ExhaustiveSearcher::new(datalake, config.scale)
}

// =============================================================================
// Main
// =============================================================================

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let benchmark = Benchmark::from(args.benchmark);
    let config = benchmark.config();
    let layout = BenchmarkLayout::new(
        benchmark.name(),
        &args.data_dir,
        &args.vectors_dir,
        &args.output_dir,
    );

    for variant in &config.variants {
        let dir = layout.variant_output_dir(variant);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
    }

    info!(
        "Evaluating {} (max_k={}, stride_k={}, sample_size={:?})",
        benchmark, config.max_k, config.stride_k, config.sample_size
    );

    let orchestrator = EvaluationOrchestrator::new(config, layout);
    let summary = if args.distances_only {
        orchestrator.run_drift()
    } else {
        orchestrator
            .with_observer(ProgressObserver::default())
            .run(exhaustive_searcher)
    };

    if args.json {
        let json = output::format_json(&summary).context("Failed to serialize run summary")?;
        println!("{}", json);
    } else {
        print!("{}", output::format_human(&summary));
    }

    Ok(if summary.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
