//! Per-variant evaluation orchestration.
//!
//! [`EvaluationOrchestrator`] drives a benchmark run: for each datalake
//! variant it loads query and datalake embeddings, asks a [`TableSearcher`]
//! for the top `max_k` candidates of every sampled query, scores the rankings
//! with the [`MetricEngine`] and writes `detailed_metrics.json`. A second pass
//! ([`EvaluationOrchestrator::run_drift`]) compares column embeddings of each
//! variant against the original datalake and writes `raw_distances.json`.
//!
//! Variants are independent. A variant with missing artifacts is skipped and
//! any other failure is recorded; neither stops the remaining variants.

use crate::config::{BenchmarkConfig, ORIGINAL_VARIANT};
use crate::error::{RunError, SearchError, StorageError};
use crate::evaluation::{
    compute_drift, report_final_cutoff, sample_queries, MetricEngine, MetricsSink, QueryMetrics,
    SystemMetrics, TracingSink,
};
use crate::search::TableSearcher;
use crate::storage::{self, BenchmarkLayout};
use crate::types::{GroundTruth, QueryId, RankedResults, TableEmbedding};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

// ============================================================================
// Outcomes
// ============================================================================

/// Ranking report written to `detailed_metrics.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub benchmark: String,
    pub variant: String,
    pub max_k: usize,
    pub stride_k: usize,
    pub threshold: f32,
    pub num_queries: usize,
    pub per_query_metrics: BTreeMap<QueryId, QueryMetrics>,
    pub system_metrics: SystemMetrics,
}

/// What a completed variant produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "pass", rename_all = "snake_case")]
pub enum CompletedSummary {
    Ranking {
        num_queries: usize,
        system: SystemMetrics,
    },
    Drift {
        num_tables: usize,
        mean_cosine: Option<f64>,
        mean_euclidean: Option<f64>,
    },
}

/// Result of evaluating one variant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VariantOutcome {
    /// Report written to `report_path`
    Completed {
        report_path: PathBuf,
        summary: CompletedSummary,
    },
    /// Required artifacts were missing; nothing was written
    Skipped { reason: String },
    /// Evaluation started but hit an error
    Failed { error: String },
}

impl VariantOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, VariantOutcome::Completed { .. })
    }

    /// Ranking metrics of a completed ranking pass.
    pub fn system_metrics(&self) -> Option<&SystemMetrics> {
        match self {
            VariantOutcome::Completed {
                summary: CompletedSummary::Ranking { system, .. },
                ..
            } => Some(system),
            _ => None,
        }
    }

    fn from_error(err: RunError) -> Self {
        match err {
            RunError::Storage(StorageError::MissingArtifact(path)) => VariantOutcome::Skipped {
                reason: format!("missing {}", path.display()),
            },
            other => VariantOutcome::Failed {
                error: other.to_string(),
            },
        }
    }
}

/// Outcome of one variant, keyed by its name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariantRun {
    pub variant: String,
    #[serde(flatten)]
    pub outcome: VariantOutcome,
}

/// Outcomes of every configured variant, in configuration order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RunSummary {
    pub benchmark: String,
    pub variants: Vec<VariantRun>,
}

impl RunSummary {
    pub fn outcome(&self, variant: &str) -> Option<&VariantOutcome> {
        self.variants
            .iter()
            .find(|run| run.variant == variant)
            .map(|run| &run.outcome)
    }

    pub fn completed(&self) -> usize {
        self.count(|o| o.is_completed())
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, VariantOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, VariantOutcome::Failed { .. }))
    }

    /// True when nothing completed and at least one variant failed.
    pub fn is_failure(&self) -> bool {
        self.completed() == 0 && self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&VariantOutcome) -> bool) -> usize {
        self.variants.iter().filter(|run| pred(&run.outcome)).count()
    }
}

// ============================================================================
// Observer
// ============================================================================

/// Progress callbacks. Every method defaults to a no-op.
pub trait EvaluationObserver {
    fn variant_started(&self, _variant: &str, _num_queries: usize) {}
    fn query_finished(&self, _variant: &str, _query_id: &str) {}
    fn variant_finished(&self, _variant: &str, _outcome: &VariantOutcome) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl EvaluationObserver for NoopObserver {}

// ============================================================================
// Orchestrator
// ============================================================================

/// Runs the ranking and drift passes of one benchmark.
pub struct EvaluationOrchestrator {
    config: BenchmarkConfig,
    layout: BenchmarkLayout,
    sink: Box<dyn MetricsSink>,
    observer: Box<dyn EvaluationObserver>,
}

impl EvaluationOrchestrator {
    pub fn new(config: BenchmarkConfig, layout: BenchmarkLayout) -> Self {
        Self {
            config,
            layout,
            sink: Box::new(TracingSink),
            observer: Box::new(NoopObserver),
        }
    }

    /// Replaces the sink that receives final-cutoff metrics.
    pub fn with_sink(mut self, sink: impl MetricsSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    pub fn with_observer(mut self, observer: impl EvaluationObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    pub fn layout(&self) -> &BenchmarkLayout {
        &self.layout
    }

    /// Ranking pass over every configured variant.
    ///
    /// `factory` builds the searcher for a variant from the benchmark config
    /// and that variant's datalake embeddings.
    #[instrument(skip_all, fields(benchmark = %self.config.name))]
    pub fn run<S, F>(&self, factory: F) -> RunSummary
    where
        S: TableSearcher,
        F: Fn(&BenchmarkConfig, Vec<TableEmbedding>) -> Result<S, SearchError>,
    {
        let ground_truth = match storage::load_ground_truth(&self.layout.ground_truth_path()) {
            Ok(gt) => gt,
            Err(e) => {
                warn!("Ground truth unavailable: {}", e);
                let outcome = VariantOutcome::from_error(e.into());
                return self.summarize(|_| outcome.clone());
            }
        };

        self.summarize(|variant| {
            let outcome = self
                .evaluate_variant(variant, &ground_truth, &factory)
                .unwrap_or_else(VariantOutcome::from_error);
            self.log_outcome(variant, &outcome);
            self.observer.variant_finished(variant, &outcome);
            outcome
        })
    }

    /// Drift pass: compares each variant's column embeddings against the
    /// original datalake.
    #[instrument(skip_all, fields(benchmark = %self.config.name))]
    pub fn run_drift(&self) -> RunSummary {
        self.summarize(|variant| {
            let outcome = self
                .drift_variant(variant)
                .unwrap_or_else(VariantOutcome::from_error);
            self.log_outcome(variant, &outcome);
            outcome
        })
    }

    fn summarize(&self, mut per_variant: impl FnMut(&str) -> VariantOutcome) -> RunSummary {
        let variants = self
            .config
            .variants
            .iter()
            .map(|variant| VariantRun {
                variant: variant.clone(),
                outcome: per_variant(variant),
            })
            .collect();

        RunSummary {
            benchmark: self.config.name.clone(),
            variants,
        }
    }

    fn log_outcome(&self, variant: &str, outcome: &VariantOutcome) {
        match outcome {
            VariantOutcome::Completed { report_path, .. } => {
                info!("Variant {} done: {}", variant, report_path.display())
            }
            VariantOutcome::Skipped { reason } => warn!("Skipping {}: {}", variant, reason),
            VariantOutcome::Failed { error } => error!("Error processing {}: {}", variant, error),
        }
    }

    #[instrument(skip(self, ground_truth, factory))]
    fn evaluate_variant<S, F>(
        &self,
        variant: &str,
        ground_truth: &GroundTruth,
        factory: &F,
    ) -> Result<VariantOutcome, RunError>
    where
        S: TableSearcher,
        F: Fn(&BenchmarkConfig, Vec<TableEmbedding>) -> Result<S, SearchError>,
    {
        let datalake_path = self.layout.datalake_embeddings_path(variant);
        let query_path = self.layout.query_embeddings_path();
        for path in [&datalake_path, &query_path] {
            if !path.exists() {
                return Ok(VariantOutcome::Skipped {
                    reason: format!("embeddings not found: {}", path.display()),
                });
            }
        }

        let engine = MetricEngine::new(self.config.max_k, self.config.stride_k)?;
        let datalake = storage::load_embeddings(&datalake_path)?;
        let searcher = factory(&self.config, datalake)?;

        let queries = sample_queries(
            storage::load_embeddings(&query_path)?,
            self.config.sample_size,
            self.config.sample_seed,
        );
        info!("Processing {} queries for {}", queries.len(), variant);
        self.observer.variant_started(variant, queries.len());

        let mut ranked = RankedResults::new();
        let mut scores: HashMap<QueryId, Vec<f32>> = HashMap::with_capacity(queries.len());
        for query in &queries {
            let hits = searcher.topk(query, self.config.max_k, self.config.threshold)?;
            debug!("{} -> {} candidates", query.table_id, hits.len());

            let (query_scores, ids): (Vec<f32>, Vec<String>) =
                hits.into_iter().map(|h| (h.score, h.table_id)).unzip();
            ranked.insert(query.table_id.clone(), ids);
            scores.insert(query.table_id.clone(), query_scores);
            self.observer.query_finished(variant, &query.table_id);
        }

        let mut metrics = engine.evaluate(&ranked, ground_truth)?;
        for (query_id, per_query) in metrics.per_query.iter_mut() {
            if let Some(query_scores) = scores.remove(query_id) {
                per_query.similarity_scores = query_scores;
            }
        }

        let report = EvaluationReport {
            benchmark: self.config.name.clone(),
            variant: variant.to_string(),
            max_k: self.config.max_k,
            stride_k: self.config.stride_k,
            threshold: self.config.threshold,
            num_queries: queries.len(),
            per_query_metrics: metrics.per_query,
            system_metrics: metrics.system,
        };
        let report_path = self.layout.ranking_report_path(variant);
        storage::write_json(&report_path, &report)?;
        report_final_cutoff(&report.system_metrics, self.sink.as_ref());

        Ok(VariantOutcome::Completed {
            report_path,
            summary: CompletedSummary::Ranking {
                num_queries: report.num_queries,
                system: report.system_metrics,
            },
        })
    }

    #[instrument(skip(self))]
    fn drift_variant(&self, variant: &str) -> Result<VariantOutcome, RunError> {
        let original =
            storage::load_embeddings(&self.layout.datalake_embeddings_path(ORIGINAL_VARIANT))?;
        let permuted = storage::load_embeddings(&self.layout.datalake_embeddings_path(variant))?;

        let original_columns = load_headers(
            &self.layout.datalake_tables_dir(ORIGINAL_VARIANT),
            &original,
        )?;
        let variant_columns = load_headers(&self.layout.datalake_tables_dir(variant), &permuted)?;

        let report = compute_drift(&original, &permuted, &original_columns, &variant_columns);
        info!(
            "Compared {} of {} tables for {}",
            report.tables.len(),
            original.len(),
            variant
        );

        let report_path = self.layout.drift_report_path(variant);
        storage::write_json(&report_path, &report)?;

        Ok(VariantOutcome::Completed {
            report_path,
            summary: CompletedSummary::Drift {
                num_tables: report.tables.len(),
                mean_cosine: report.mean_cosine(),
                mean_euclidean: report.mean_euclidean(),
            },
        })
    }
}

/// Header names of every embedded table found in `dir`.
///
/// Tables whose CSV is absent or unreadable are left out.
fn load_headers(
    dir: &Path,
    tables: &[TableEmbedding],
) -> Result<HashMap<String, Vec<String>>, StorageError> {
    if !dir.is_dir() {
        return Err(StorageError::MissingArtifact(dir.to_path_buf()));
    }
    Ok(tables
        .iter()
        .filter_map(|table| match storage::load_table_columns(&dir.join(&table.table_id)) {
            Ok(columns) => Some((table.table_id.clone(), columns)),
            Err(e) => {
                debug!("No headers for {}: {}", table.table_id, e);
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchHit;
    use std::cell::RefCell;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Returns a fixed ranking per query id, scores descending from 1.0.
    struct FixedSearcher {
        rankings: HashMap<String, Vec<String>>,
    }

    impl TableSearcher for FixedSearcher {
        fn topk(
            &self,
            query: &TableEmbedding,
            k: usize,
            _threshold: f32,
        ) -> Result<Vec<SearchHit>, SearchError> {
            Ok(self
                .rankings
                .get(&query.table_id)
                .map(|ids| {
                    ids.iter()
                        .take(k)
                        .enumerate()
                        .map(|(i, id)| SearchHit::new(1.0 - i as f32 * 0.1, id.clone()))
                        .collect()
                })
                .unwrap_or_default())
        }
    }

    fn fixed_factory(
        _config: &BenchmarkConfig,
        _datalake: Vec<TableEmbedding>,
    ) -> Result<FixedSearcher, SearchError> {
        let rankings = HashMap::from([(
            "q1.csv".to_string(),
            vec!["a.csv".to_string(), "x.csv".to_string(), "b.csv".to_string()],
        )]);
        Ok(FixedSearcher { rankings })
    }

    fn config() -> BenchmarkConfig {
        BenchmarkConfig {
            name: "santos".to_string(),
            max_k: 3,
            stride_k: 1,
            ..Default::default()
        }
    }

    fn write_artifacts(layout: &BenchmarkLayout, variants: &[&str]) {
        fs::create_dir_all(layout.query_embeddings_path().parent().unwrap()).unwrap();
        fs::write(
            layout.ground_truth_path(),
            r#"{"q1.csv": ["a.csv", "b.csv", "c.csv"]}"#,
        )
        .unwrap();
        fs::write(layout.query_embeddings_path(), r#"[["q1.csv", [[1.0, 0.0]]]]"#).unwrap();
        for variant in variants {
            fs::write(
                layout.datalake_embeddings_path(variant),
                r#"[["a.csv", [[1.0, 0.0]]]]"#,
            )
            .unwrap();
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl EvaluationObserver for RecordingObserver {
        fn variant_started(&self, variant: &str, num_queries: usize) {
            self.events
                .borrow_mut()
                .push(format!("start {} {}", variant, num_queries));
        }

        fn query_finished(&self, _variant: &str, query_id: &str) {
            self.events.borrow_mut().push(format!("query {}", query_id));
        }

        fn variant_finished(&self, variant: &str, outcome: &VariantOutcome) {
            self.events
                .borrow_mut()
                .push(format!("finish {} {}", variant, outcome.is_completed()));
        }
    }

    #[test]
    fn test_completed_variant_writes_report_with_scores() {
        let dir = TempDir::new().unwrap();
        let layout = BenchmarkLayout::under(dir.path(), "santos");
        write_artifacts(&layout, &["original"]);

        let orchestrator = EvaluationOrchestrator::new(config(), layout.clone());
        let summary = orchestrator.run(fixed_factory);

        let system = summary.outcome("original").unwrap().system_metrics().unwrap();
        assert!((system.precision[2] - 2.0 / 3.0).abs() < 1e-9);

        let report: EvaluationReport =
            storage::read_json(&layout.ranking_report_path("original")).unwrap();
        assert_eq!(report.num_queries, 1);
        assert_eq!(report.variant, "original");
        let scores = &report.per_query_metrics["q1.csv"].similarity_scores;
        assert_eq!(scores.len(), 3);
        assert!((scores[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_variant_is_skipped_without_report() {
        let dir = TempDir::new().unwrap();
        let layout = BenchmarkLayout::under(dir.path(), "santos");
        write_artifacts(&layout, &["original"]);

        let summary = EvaluationOrchestrator::new(config(), layout.clone()).run(fixed_factory);

        assert!(summary.outcome("original").unwrap().is_completed());
        assert!(matches!(
            summary.outcome("p-col"),
            Some(VariantOutcome::Skipped { .. })
        ));
        assert!(!layout.ranking_report_path("p-col").exists());
        assert!(!summary.is_failure());
    }

    #[test]
    fn test_missing_ground_truth_skips_everything() {
        let dir = TempDir::new().unwrap();
        let layout = BenchmarkLayout::under(dir.path(), "santos");

        let summary = EvaluationOrchestrator::new(config(), layout).run(fixed_factory);
        assert_eq!(summary.skipped(), 2);
        assert_eq!(summary.completed(), 0);
    }

    #[test]
    fn test_invalid_cutoff_fails_variant() {
        let dir = TempDir::new().unwrap();
        let layout = BenchmarkLayout::under(dir.path(), "santos");
        write_artifacts(&layout, &["original", "p-col"]);

        let bad = BenchmarkConfig {
            stride_k: 5,
            ..config()
        };
        let summary = EvaluationOrchestrator::new(bad, layout).run(fixed_factory);
        assert_eq!(summary.failed(), 2);
        assert!(summary.is_failure());
    }

    #[test]
    fn test_observer_sees_every_query() {
        let dir = TempDir::new().unwrap();
        let layout = BenchmarkLayout::under(dir.path(), "santos");
        write_artifacts(&layout, &["original"]);

        let observer = RecordingObserver::default();
        let events = Rc::clone(&observer.events);
        EvaluationOrchestrator::new(config(), layout)
            .with_observer(observer)
            .run(fixed_factory);

        assert_eq!(
            *events.borrow(),
            vec![
                "start original 1",
                "query q1.csv",
                "finish original true",
                "finish p-col false",
            ]
        );
    }

    #[test]
    fn test_summary_serializes_status_tags() {
        let summary = RunSummary {
            benchmark: "tus".to_string(),
            variants: vec![VariantRun {
                variant: "p-col".to_string(),
                outcome: VariantOutcome::Skipped {
                    reason: "missing".to_string(),
                },
            }],
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["variants"][0]["status"], "skipped");
        assert_eq!(json["variants"][0]["variant"], "p-col");
    }
}
