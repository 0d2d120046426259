//! # Unionsearch Core
//!
//! Ranking evaluation for table union search.
//!
//! Given ranked candidate tables for each query table, this crate scores the
//! rankings against a ground-truth relevance mapping (Precision@k, Recall@k,
//! MAP@k, F1@k) over a sweep of cutoffs, and compares datalake variants such
//! as an original datalake and its column-permuted counterpart.
//!
//! ## Modules
//!
//! - [`evaluation`] - Metric engine, query sampling, column drift
//! - [`runner`] - Per-variant evaluation orchestration and report persistence
//! - [`search`] - Search capability trait and an exhaustive reference searcher
//! - [`embedding`] - Table embedding trait and batched vector extraction
//! - [`storage`] - Benchmark artifact layout, JSON and CSV loading
//! - [`config`] - Benchmark configuration table
//! - [`types`] - Identifiers, ground truth, tables and embeddings
//! - [`error`] - Error types

pub mod config;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod runner;
pub mod search;
pub mod storage;
pub mod types;

pub use config::{Benchmark, BenchmarkConfig};
pub use error::{EmbeddingError, EvaluationError, RunError, SearchError, StorageError};
pub use runner::{EvaluationObserver, EvaluationOrchestrator, RunSummary, VariantOutcome};
pub use types::{CandidateId, GroundTruth, QueryId, RankedResults, Table, TableEmbedding};
