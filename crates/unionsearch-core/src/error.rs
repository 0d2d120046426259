//! Error types for unionsearch-core.
//!
//! Each concern (metric computation, artifact storage, search, embedding)
//! has its own error enum. [`RunError`] is what a single variant evaluation
//! can fail with; the orchestrator catches it at the variant boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the metric engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// Cutoff parameters outside the accepted range
    #[error("Invalid cutoff: max_k={max_k}, stride_k={stride_k} (need 1 <= stride_k <= max_k)")]
    InvalidCutoff { max_k: usize, stride_k: usize },
    /// A query with no relevant candidates reached the recall sum
    #[error("Ground truth for query '{query_id}' is empty; recall is undefined")]
    EmptyGroundTruth { query_id: String },
}

/// Errors that can occur while reading or writing benchmark artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Required artifact does not exist
    #[error("Missing artifact: {}", .0.display())]
    MissingArtifact(PathBuf),
    /// I/O failure on a specific path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// JSON (de)serialization failure on a specific path
    #[error("JSON error in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Table file could not be interpreted
    #[error("Invalid table {}: {reason}", path.display())]
    InvalidTable { path: PathBuf, reason: String },
}

/// Errors that can occur during candidate search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// Query and datalake vectors have different widths
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    /// Query table has no column vectors
    #[error("Query table '{0}' has no columns")]
    EmptyQuery(String),
}

/// Errors that can occur during table embedding.
#[derive(Debug, Clone, Error)]
pub enum EmbeddingError {
    /// Model inference failed for a batch
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
    /// Model returned an unexpected number of tables or columns
    #[error("Unexpected embedding output: {0}")]
    UnexpectedOutput(String),
}

/// Failure of one variant evaluation.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

impl From<RunError> for String {
    fn from(err: RunError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_cutoff_message() {
        let err = EvaluationError::InvalidCutoff {
            max_k: 0,
            stride_k: 1,
        };
        assert!(err.to_string().contains("max_k=0"));
    }

    #[test]
    fn test_run_error_wraps_storage() {
        let err: RunError = StorageError::MissingArtifact(PathBuf::from("vectors/x.json")).into();
        assert!(matches!(err, RunError::Storage(StorageError::MissingArtifact(_))));
        assert_eq!(String::from(err), "Missing artifact: vectors/x.json");
    }
}
