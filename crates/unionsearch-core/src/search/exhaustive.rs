// Exhaustive column-matching search over a loaded datalake

use super::{SearchHit, TableSearcher};
use crate::error::SearchError;
use crate::evaluation::drift::cosine_similarity;
use crate::types::TableEmbedding;
use std::cmp::Ordering;
use tracing::instrument;

/// Validates that an embedding has the expected dimension.
pub fn validate_dimension(expected: usize, actual: usize) -> Result<(), SearchError> {
    if actual == expected {
        Ok(())
    } else {
        Err(SearchError::DimensionMismatch { expected, actual })
    }
}

/// Scores every indexed datalake table against the query.
///
/// A candidate's score is the weight of a greedy one-to-one matching between
/// query columns and candidate columns, where edge weights are cosine
/// similarities and edges below the threshold are dropped. Candidates with
/// no matched column are not returned.
#[derive(Debug, Clone)]
pub struct ExhaustiveSearcher {
    tables: Vec<TableEmbedding>,
    dimension: Option<usize>,
}

impl ExhaustiveSearcher {
    /// Indexes the first `ceil(scale * n)` tables of `datalake`.
    ///
    /// `scale` is clamped to `[0, 1]`.
    pub fn new(datalake: Vec<TableEmbedding>, scale: f32) -> Result<Self, SearchError> {
        let scale = scale.clamp(0.0, 1.0) as f64;
        let keep = (datalake.len() as f64 * scale).ceil() as usize;
        let tables: Vec<TableEmbedding> = datalake.into_iter().take(keep).collect();

        let dimension = tables.iter().find_map(TableEmbedding::dim);
        if let Some(dim) = dimension {
            for column in tables.iter().flat_map(|t| &t.columns) {
                validate_dimension(dim, column.len())?;
            }
        }

        Ok(Self { tables, dimension })
    }

    /// Number of indexed tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl TableSearcher for ExhaustiveSearcher {
    #[instrument(skip(self, query), fields(query_table = %query.table_id))]
    fn topk(
        &self,
        query: &TableEmbedding,
        k: usize,
        threshold: f32,
    ) -> Result<Vec<SearchHit>, SearchError> {
        if query.columns.is_empty() {
            return Err(SearchError::EmptyQuery(query.table_id.clone()));
        }
        if let Some(dim) = self.dimension {
            for column in &query.columns {
                validate_dimension(dim, column.len())?;
            }
        }

        let mut hits: Vec<SearchHit> = self
            .tables
            .iter()
            .map(|table| {
                SearchHit::new(
                    matching_score(&query.columns, &table.columns, threshold),
                    table.table_id.clone(),
                )
            })
            .filter(|hit| hit.score > 0.0)
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.table_id.cmp(&b.table_id))
        });
        hits.truncate(k);
        Ok(hits)
    }
}

/// Greedy maximum-weight matching between two column sets.
fn matching_score(query: &[Vec<f32>], candidate: &[Vec<f32>], threshold: f32) -> f32 {
    let mut edges: Vec<(f64, usize, usize)> = query
        .iter()
        .enumerate()
        .flat_map(|(qi, q)| {
            candidate
                .iter()
                .enumerate()
                .map(move |(ci, c)| (cosine_similarity(q, c), qi, ci))
        })
        .filter(|&(sim, _, _)| sim >= threshold as f64)
        .collect();

    edges.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

    let mut query_used = vec![false; query.len()];
    let mut candidate_used = vec![false; candidate.len()];
    let mut score = 0.0;

    for (sim, qi, ci) in edges {
        if query_used[qi] || candidate_used[ci] {
            continue;
        }
        query_used[qi] = true;
        candidate_used[ci] = true;
        score += sim;
    }

    score as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datalake() -> Vec<TableEmbedding> {
        vec![
            TableEmbedding::new("same.csv", vec![vec![1.0, 0.0], vec![0.0, 1.0]]),
            TableEmbedding::new("half.csv", vec![vec![1.0, 0.0], vec![-1.0, 0.0]]),
            TableEmbedding::new("none.csv", vec![vec![-1.0, 0.0]]),
        ]
    }

    #[test]
    fn test_ranks_by_matching_weight() {
        let searcher = ExhaustiveSearcher::new(datalake(), 1.0).unwrap();
        let query = TableEmbedding::new("q.csv", vec![vec![1.0, 0.0], vec![0.0, 1.0]]);

        let hits = searcher.topk(&query, 10, 0.1).unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.table_id.as_str()).collect();

        assert_eq!(ids, vec!["same.csv", "half.csv"]);
        assert!((hits[0].score - 2.0).abs() < 1e-6);
        assert!((hits[1].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_truncates_to_k() {
        let searcher = ExhaustiveSearcher::new(datalake(), 1.0).unwrap();
        let query = TableEmbedding::new("q.csv", vec![vec![1.0, 0.0]]);
        assert_eq!(searcher.topk(&query, 1, 0.1).unwrap().len(), 1);
    }

    #[test]
    fn test_one_to_one_matching() {
        // Two query columns cannot both match the single candidate column.
        let searcher =
            ExhaustiveSearcher::new(vec![TableEmbedding::new("t.csv", vec![vec![1.0, 0.0]])], 1.0)
                .unwrap();
        let query = TableEmbedding::new("q.csv", vec![vec![1.0, 0.0], vec![1.0, 0.0]]);

        let hits = searcher.topk(&query, 5, 0.1).unwrap();
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_drops_weak_edges() {
        let searcher = ExhaustiveSearcher::new(datalake(), 1.0).unwrap();
        let query = TableEmbedding::new("q.csv", vec![vec![1.0, 1.0]]);
        // cos((1,1),(1,0)) ~ 0.707
        assert!(searcher.topk(&query, 5, 0.9).unwrap().is_empty());
        assert_eq!(searcher.topk(&query, 5, 0.5).unwrap().len(), 2);
    }

    #[test]
    fn test_scale_limits_indexed_tables() {
        let searcher = ExhaustiveSearcher::new(datalake(), 0.5).unwrap();
        assert_eq!(searcher.len(), 2);
    }

    #[test]
    fn test_dimension_mismatch() {
        let searcher = ExhaustiveSearcher::new(datalake(), 1.0).unwrap();
        let query = TableEmbedding::new("q.csv", vec![vec![1.0, 0.0, 0.0]]);
        assert_eq!(
            searcher.topk(&query, 5, 0.1),
            Err(SearchError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_empty_query_rejected() {
        let searcher = ExhaustiveSearcher::new(datalake(), 1.0).unwrap();
        let query = TableEmbedding::new("q.csv", vec![]);
        assert!(matches!(
            searcher.topk(&query, 5, 0.1),
            Err(SearchError::EmptyQuery(_))
        ));
    }

    #[test]
    fn test_ties_break_on_table_id() {
        let lake = vec![
            TableEmbedding::new("b.csv", vec![vec![1.0, 0.0]]),
            TableEmbedding::new("a.csv", vec![vec![1.0, 0.0]]),
        ];
        let searcher = ExhaustiveSearcher::new(lake, 1.0).unwrap();
        let query = TableEmbedding::new("q.csv", vec![vec![1.0, 0.0]]);
        let hits = searcher.topk(&query, 5, 0.1).unwrap();
        assert_eq!(hits[0].table_id, "a.csv");
    }
}
