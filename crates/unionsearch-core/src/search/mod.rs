//! Candidate table search.
//!
//! The evaluated retrieval method is an external capability: given a query
//! table's column embeddings, a cutoff `K` and a similarity threshold, it
//! returns ranked `(score, table_id)` pairs. [`TableSearcher`] is that seam;
//! the orchestrator and tests only depend on the trait.
//!
//! [`ExhaustiveSearcher`] is a reference implementation that scores every
//! datalake table against the query.

pub mod exhaustive;

pub use exhaustive::ExhaustiveSearcher;

use crate::error::SearchError;
use crate::types::TableEmbedding;
use serde::{Deserialize, Serialize};

/// One ranked candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Similarity of the candidate to the query (higher is better)
    pub score: f32,
    /// Datalake table id
    pub table_id: String,
}

impl SearchHit {
    pub fn new(score: f32, table_id: impl Into<String>) -> Self {
        Self {
            score,
            table_id: table_id.into(),
        }
    }
}

/// Ranks datalake tables for a query table.
pub trait TableSearcher {
    /// Returns at most `k` candidates, best first. Column pairs below
    /// `threshold` similarity do not contribute to a candidate's score.
    fn topk(
        &self,
        query: &TableEmbedding,
        k: usize,
        threshold: f32,
    ) -> Result<Vec<SearchHit>, SearchError>;
}

impl<S: TableSearcher + ?Sized> TableSearcher for Box<S> {
    fn topk(
        &self,
        query: &TableEmbedding,
        k: usize,
        threshold: f32,
    ) -> Result<Vec<SearchHit>, SearchError> {
        (**self).topk(query, k, threshold)
    }
}
