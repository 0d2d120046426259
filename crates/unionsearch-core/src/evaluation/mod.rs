//! Evaluation of table union search.
//!
//! This module scores ranked candidate tables against ground truth and
//! compares column embeddings across datalake variants.
//!
//! # Overview
//!
//! - [`metrics`] - Precision@k, Recall@k, MAP@k and F1@k over a cutoff sweep
//! - [`sampling`] - Reproducible query sampling for large benchmarks
//! - [`drift`] - Column-level embedding drift between two datalake variants
//! - [`sink`] - Publishing final-cutoff metrics to a reporting sink
//!
//! # Example
//!
//! ```ignore
//! use unionsearch_core::evaluation::{MetricEngine, report_final_cutoff, TracingSink};
//!
//! let engine = MetricEngine::new(60, 10)?;
//! let report = engine.evaluate(&ranked, &ground_truth)?;
//! report_final_cutoff(&report.system, &TracingSink);
//! ```
//!
//! # Metrics Reference
//!
//! | Metric | Definition |
//! |--------|------------|
//! | P@k | pooled TP / (TP + FP) over queries with at least k relevant tables |
//! | R@k | mean over the batch of tp / \|relevant\| |
//! | F1@k | 2 · P@k · R@k / (P@k + R@k) |
//! | MAP@k | (P@1 + ... + P@k) / k |

pub mod drift;
pub mod metrics;
pub mod sampling;
pub mod sink;

pub use drift::{compute_drift, ColumnDrift, DriftReport, TableDrift, TableDriftSummary};
pub use metrics::{
    evaluate, used_cutoffs, CutoffCounts, MetricEngine, MetricsAtK, MetricsReport, QueryMetrics,
    SystemMetrics,
};
pub use sampling::sample_queries;
pub use sink::{report_final_cutoff, MetricsSink, TracingSink};
