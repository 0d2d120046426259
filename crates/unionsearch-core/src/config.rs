//! Benchmark configuration.
//!
//! Each named benchmark carries a fixed evaluation configuration: the
//! deepest cutoff, the stride of reported cutoffs, an optional query sample
//! size, and the similarity threshold handed to the searcher. The values are
//! configuration, not derived; [`Benchmark::config`] returns an explicit
//! [`BenchmarkConfig`] record that is passed to the orchestrator.
//!
//! # Usage
//!
//! ```
//! use unionsearch_core::config::Benchmark;
//!
//! let config = Benchmark::Tus.config();
//! assert_eq!(config.max_k, 60);
//! assert_eq!(config.sample_size, Some(150));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Constants
// =============================================================================

/// Column vector width used for zero placeholders when an embedding batch fails.
pub const EMBEDDING_DIM: usize = 768;

/// Tables are truncated to this many data rows when loaded.
pub const MAX_TABLE_ROWS: usize = 1000;

/// Number of tables embedded per batch.
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Seed for query sampling.
pub const DEFAULT_SAMPLE_SEED: u64 = 42;

/// Name of the unperturbed datalake variant.
pub const ORIGINAL_VARIANT: &str = "original";

/// Column-permuted datalake variant.
pub const PERMUTED_COLUMNS_VARIANT: &str = "p-col";

// =============================================================================
// Benchmarks
// =============================================================================

/// Benchmarks with a known evaluation configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Benchmark {
    Santos,
    Pylon,
    Tus,
    TusLarge,
}

impl Benchmark {
    /// Returns all benchmarks for iteration.
    pub fn all() -> &'static [Benchmark] {
        &[
            Benchmark::Santos,
            Benchmark::Pylon,
            Benchmark::Tus,
            Benchmark::TusLarge,
        ]
    }

    /// Directory name of the benchmark.
    pub fn name(&self) -> &'static str {
        match self {
            Benchmark::Santos => "santos",
            Benchmark::Pylon => "pylon",
            Benchmark::Tus => "tus",
            Benchmark::TusLarge => "tusLarge",
        }
    }

    /// Evaluation configuration for this benchmark.
    pub fn config(&self) -> BenchmarkConfig {
        match self {
            Benchmark::Santos | Benchmark::Pylon => BenchmarkConfig {
                name: self.name().to_string(),
                max_k: 10,
                stride_k: 1,
                sample_size: None,
                ..BenchmarkConfig::default()
            },
            Benchmark::Tus => BenchmarkConfig {
                name: self.name().to_string(),
                max_k: 60,
                stride_k: 10,
                sample_size: Some(150),
                ..BenchmarkConfig::default()
            },
            Benchmark::TusLarge => BenchmarkConfig {
                name: self.name().to_string(),
                max_k: 60,
                stride_k: 10,
                sample_size: Some(100),
                ..BenchmarkConfig::default()
            },
        }
    }
}

impl fmt::Display for Benchmark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Benchmark {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Benchmark::all()
            .iter()
            .copied()
            .find(|b| b.name() == s)
            .ok_or_else(|| format!("Unknown benchmark: {}", s))
    }
}

/// Evaluation parameters for one benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    /// Benchmark directory name
    pub name: String,
    /// Deepest cutoff evaluated (every k in 1..=max_k is computed)
    pub max_k: usize,
    /// Stride of the cutoffs surfaced in `metrics_at_k`
    pub stride_k: usize,
    /// Number of queries to sample, or all queries when `None`
    pub sample_size: Option<usize>,
    /// Seed for query sampling
    pub sample_seed: u64,
    /// Minimum column similarity passed to the searcher
    pub threshold: f32,
    /// Fraction of the datalake the searcher indexes
    pub scale: f32,
    /// Datalake variants evaluated, in order
    pub variants: Vec<String>,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            max_k: 10,
            stride_k: 1,
            sample_size: None,
            sample_seed: DEFAULT_SAMPLE_SEED,
            threshold: 0.1,
            scale: 1.0,
            variants: vec![
                ORIGINAL_VARIANT.to_string(),
                PERMUTED_COLUMNS_VARIANT.to_string(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_benchmarks_evaluate_every_cutoff() {
        for benchmark in [Benchmark::Santos, Benchmark::Pylon] {
            let config = benchmark.config();
            assert_eq!(config.max_k, 10);
            assert_eq!(config.stride_k, 1);
            assert_eq!(config.sample_size, None);
        }
    }

    #[test]
    fn test_tus_benchmarks_sample_queries() {
        assert_eq!(Benchmark::Tus.config().sample_size, Some(150));
        assert_eq!(Benchmark::TusLarge.config().sample_size, Some(100));
        assert_eq!(Benchmark::TusLarge.config().stride_k, 10);
    }

    #[test]
    fn test_shared_defaults() {
        for benchmark in Benchmark::all() {
            let config = benchmark.config();
            assert_eq!(config.name, benchmark.name());
            assert!((config.threshold - 0.1).abs() < f32::EPSILON);
            assert_eq!(config.sample_seed, 42);
            assert_eq!(config.variants, vec!["original", "p-col"]);
        }
    }

    #[test]
    fn test_parse_benchmark_name() {
        assert_eq!("tusLarge".parse::<Benchmark>(), Ok(Benchmark::TusLarge));
        assert!("wdc".parse::<Benchmark>().is_err());
    }
}
