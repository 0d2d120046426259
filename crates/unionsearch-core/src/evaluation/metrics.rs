//! Ranking metrics for table union search.
//!
//! This module scores ranked candidate lists against ground truth at every
//! cutoff `k` in `1..=max_k`:
//! - Precision@k (corpus level, pooled TP/FP)
//! - Recall@k (mean of per-query recall over the batch)
//! - F1@k (harmonic mean of the two)
//! - MAP@k (cumulative mean of Precision@1..Precision@k)
//!
//! Only a strided subset of cutoffs (`used_k`) is surfaced in the
//! `metrics_at_k` snapshot; the full arrays are always kept.
//!
//! # Corpus gating
//!
//! Corpus TP/FP/FN totals at cutoff `k` only include queries with at least
//! `k` relevant candidates. A query with a smaller relevant set cannot fill
//! `k` relevant slots and is left out of the precision denominator at that
//! cutoff. The per-query recall term is added for every query regardless of
//! this gate, and recall is averaged over the whole batch. The two policies
//! differ on purpose and must not be unified.

use crate::error::EvaluationError;
use crate::types::{CandidateId, GroundTruth, QueryId, RankedResults};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// Report Types
// ============================================================================

/// The four metrics at one cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsAtK {
    pub precision: f64,
    pub recall: f64,
    pub map: f64,
    pub f1: f64,
}

/// Corpus-level metrics over the whole query batch.
///
/// Arrays are indexed by `k - 1` and have length `max_k`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemMetrics {
    /// Precision@k for k = 1..=max_k
    pub precision: Vec<f64>,
    /// Recall@k for k = 1..=max_k
    pub recall: Vec<f64>,
    /// MAP@k for k = 1..=max_k
    pub map: Vec<f64>,
    /// F1@k for k = 1..=max_k
    pub f1: Vec<f64>,
    /// Cutoffs surfaced in `metrics_at_k`
    pub used_k: Vec<usize>,
    /// Snapshot of the four metrics at each cutoff in `used_k`
    pub metrics_at_k: BTreeMap<usize, MetricsAtK>,
}

impl SystemMetrics {
    /// Deepest cutoff evaluated.
    pub fn max_k(&self) -> usize {
        self.precision.len()
    }

    /// Metrics at cutoff `k` (1-indexed), if it was evaluated.
    pub fn at(&self, k: usize) -> Option<MetricsAtK> {
        let idx = k.checked_sub(1)?;
        Some(MetricsAtK {
            precision: *self.precision.get(idx)?,
            recall: *self.recall.get(idx)?,
            map: *self.map.get(idx)?,
            f1: *self.f1.get(idx)?,
        })
    }

    /// Metrics at the deepest cutoff.
    pub fn final_cutoff(&self) -> Option<MetricsAtK> {
        self.at(self.max_k())
    }
}

/// Metric history of a single query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryMetrics {
    /// tp / k for k = 1..=max_k
    pub precision: Vec<f64>,
    /// tp / |relevant| for k = 1..=max_k
    pub recall: Vec<f64>,
    pub f1: Vec<f64>,
    /// Cumulative mean of this query's precision
    pub map: Vec<f64>,
    /// Similarity scores returned by the searcher, one per rank
    #[serde(default)]
    pub similarity_scores: Vec<f32>,
}

/// Output of [`MetricEngine::evaluate`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsReport {
    pub system: SystemMetrics,
    pub per_query: BTreeMap<QueryId, QueryMetrics>,
}

// ============================================================================
// Per-Query Counts
// ============================================================================

/// Confusion counts for one query at one cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffCounts {
    /// Cutoff these counts were taken at
    pub k: usize,
    /// Relevant candidates in the top-k set
    pub tp: usize,
    /// `k - tp`; positives are counted as `k` even for shorter rankings
    pub fp_candidate: usize,
    /// Relevant candidates missing from the top-k set
    pub fn_candidate: usize,
    /// Size of the query's relevant set
    pub relevant: usize,
}

impl CutoffCounts {
    /// Counts the top-`k` prefix of `ranking` against `truth`.
    ///
    /// Duplicate candidates in the prefix collapse into one.
    pub fn compute(ranking: &[CandidateId], truth: &HashSet<CandidateId>, k: usize) -> Self {
        let result_set: HashSet<&CandidateId> = ranking.iter().take(k).collect();
        let tp = result_set.iter().filter(|c| truth.contains(**c)).count();

        Self {
            k,
            tp,
            fp_candidate: k - tp,
            fn_candidate: truth.len() - tp,
            relevant: truth.len(),
        }
    }

    /// Whether these counts enter the corpus TP/FP/FN totals.
    ///
    /// Only queries with at least `k` relevant candidates do.
    pub fn counts_toward_corpus(&self) -> bool {
        self.relevant >= self.k
    }

    /// This query's recall at the cutoff: `tp / |relevant|`.
    ///
    /// Callers must reject empty relevant sets before computing counts.
    fn recall(&self) -> f64 {
        self.tp as f64 / self.relevant as f64
    }

    fn precision(&self) -> f64 {
        self.tp as f64 / self.k as f64
    }
}

/// Running corpus totals at one cutoff.
#[derive(Debug, Clone, Copy, Default)]
struct CorpusTotals {
    true_positive: usize,
    false_positive: usize,
    false_negative: usize,
    recall_sum: f64,
}

impl CorpusTotals {
    fn absorb(mut self, counts: &CutoffCounts) -> Self {
        if counts.counts_toward_corpus() {
            self.true_positive += counts.tp;
            self.false_positive += counts.fp_candidate;
            self.false_negative += counts.fn_candidate;
        }
        self.recall_sum += counts.recall();
        self
    }

    fn precision(&self) -> f64 {
        let positives = self.true_positive + self.false_positive;
        if positives == 0 {
            0.0
        } else {
            self.true_positive as f64 / positives as f64
        }
    }

    fn recall(&self, batch_size: usize) -> f64 {
        if batch_size == 0 {
            0.0
        } else {
            self.recall_sum / batch_size as f64
        }
    }
}

// ============================================================================
// Metric Engine
// ============================================================================

/// Computes ranking metrics at every cutoff in `1..=max_k`.
///
/// The engine is a pure function of its inputs: evaluating the same ranked
/// results and ground truth twice gives bit-identical reports.
///
/// # Example
///
/// ```
/// use std::collections::{BTreeMap, HashMap, HashSet};
/// use unionsearch_core::evaluation::MetricEngine;
///
/// let mut ranked = BTreeMap::new();
/// ranked.insert("q".to_string(), vec!["a".to_string(), "x".to_string()]);
/// let mut truth = HashMap::new();
/// truth.insert("q".to_string(), HashSet::from(["a".to_string(), "b".to_string()]));
///
/// let report = MetricEngine::new(2, 1).unwrap().evaluate(&ranked, &truth).unwrap();
/// assert_eq!(report.system.precision, vec![1.0, 0.5]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricEngine {
    max_k: usize,
    stride_k: usize,
}

impl MetricEngine {
    /// Creates an engine for cutoffs `1..=max_k`, surfacing every
    /// `stride_k`-th cutoff.
    ///
    /// Fails unless `1 <= stride_k <= max_k`.
    pub fn new(max_k: usize, stride_k: usize) -> Result<Self, EvaluationError> {
        if max_k < 1 || stride_k < 1 || stride_k > max_k {
            return Err(EvaluationError::InvalidCutoff { max_k, stride_k });
        }
        Ok(Self { max_k, stride_k })
    }

    pub fn max_k(&self) -> usize {
        self.max_k
    }

    pub fn stride_k(&self) -> usize {
        self.stride_k
    }

    /// Cutoffs surfaced in the `metrics_at_k` snapshot.
    pub fn used_k(&self) -> Vec<usize> {
        used_cutoffs(self.max_k, self.stride_k)
    }

    /// Scores `ranked` against `ground_truth`.
    ///
    /// Queries missing from `ground_truth` contribute nothing except to the
    /// batch size that recall is averaged over.
    ///
    /// # Errors
    ///
    /// [`EvaluationError::EmptyGroundTruth`] if a ranked query has an empty
    /// relevant set.
    pub fn evaluate(
        &self,
        ranked: &RankedResults,
        ground_truth: &GroundTruth,
    ) -> Result<MetricsReport, EvaluationError> {
        let judged: Vec<(&QueryId, &Vec<CandidateId>, &HashSet<CandidateId>)> = ranked
            .iter()
            .filter_map(|(query_id, ranking)| {
                ground_truth
                    .get(query_id)
                    .map(|truth| (query_id, ranking, truth))
            })
            .collect();

        if let Some((query_id, _, _)) = judged.iter().find(|(_, _, truth)| truth.is_empty()) {
            return Err(EvaluationError::EmptyGroundTruth {
                query_id: (*query_id).clone(),
            });
        }

        // counts[q][k - 1]
        let counts: Vec<(&QueryId, Vec<CutoffCounts>)> = judged
            .iter()
            .map(|(query_id, ranking, truth)| {
                let per_k = (1..=self.max_k)
                    .map(|k| CutoffCounts::compute(ranking, truth, k))
                    .collect();
                (*query_id, per_k)
            })
            .collect();

        let batch_size = ranked.len();
        let mut precision = Vec::with_capacity(self.max_k);
        let mut recall = Vec::with_capacity(self.max_k);
        let mut f1 = Vec::with_capacity(self.max_k);

        for k in 1..=self.max_k {
            let totals = counts
                .iter()
                .map(|(_, per_k)| &per_k[k - 1])
                .fold(CorpusTotals::default(), CorpusTotals::absorb);

            let p = totals.precision();
            let r = totals.recall(batch_size);

            tracing::trace!(
                k,
                tp = totals.true_positive,
                fp = totals.false_positive,
                fn_ = totals.false_negative,
                precision = p,
                recall = r,
                "cutoff totals"
            );

            precision.push(p);
            recall.push(r);
            f1.push(f1_score(p, r));
        }

        let map = cumulative_mean(&precision);
        let used_k = self.used_k();
        let metrics_at_k = used_k
            .iter()
            .map(|&k| {
                let i = k - 1;
                (
                    k,
                    MetricsAtK {
                        precision: precision[i],
                        recall: recall[i],
                        map: map[i],
                        f1: f1[i],
                    },
                )
            })
            .collect();

        let per_query = counts
            .iter()
            .map(|(query_id, per_k)| ((*query_id).clone(), query_metrics(per_k)))
            .collect();

        Ok(MetricsReport {
            system: SystemMetrics {
                precision,
                recall,
                map,
                f1,
                used_k,
                metrics_at_k,
            },
            per_query,
        })
    }
}

/// Evaluates with a one-off [`MetricEngine`].
pub fn evaluate(
    max_k: usize,
    stride_k: usize,
    ranked: &RankedResults,
    ground_truth: &GroundTruth,
) -> Result<MetricsReport, EvaluationError> {
    MetricEngine::new(max_k, stride_k)?.evaluate(ranked, ground_truth)
}

/// Cutoffs surfaced for a sweep: `stride_k`, then every further multiple of
/// `stride_k` up to and including `max_k`.
///
/// ```text
/// used_cutoffs(10, 1)  = [1, 2, ..., 10]
/// used_cutoffs(60, 10) = [10, 20, 30, 40, 50, 60]
/// ```
pub fn used_cutoffs(max_k: usize, stride_k: usize) -> Vec<usize> {
    let mut used = vec![stride_k];
    if stride_k > 0 && max_k > stride_k {
        used.extend((stride_k * 2..=max_k).step_by(stride_k));
    }
    used
}

fn query_metrics(per_k: &[CutoffCounts]) -> QueryMetrics {
    let precision: Vec<f64> = per_k.iter().map(CutoffCounts::precision).collect();
    let recall: Vec<f64> = per_k.iter().map(CutoffCounts::recall).collect();
    let f1 = precision
        .iter()
        .zip(&recall)
        .map(|(&p, &r)| f1_score(p, r))
        .collect();
    let map = cumulative_mean(&precision);

    QueryMetrics {
        precision,
        recall,
        f1,
        map,
        similarity_scores: Vec::new(),
    }
}

/// `2PR / (P + R)`, or 0 when both are 0.
fn f1_score(precision: f64, recall: f64) -> f64 {
    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}

/// `out[i] = (values[0] + ... + values[i]) / (i + 1)`
fn cumulative_mean(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |sum, &v| {
            *sum += v;
            Some(*sum)
        })
        .enumerate()
        .map(|(i, sum)| sum / (i + 1) as f64)
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
