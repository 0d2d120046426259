use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Identifier of a query table (its file name).
pub type QueryId = String;

/// Identifier of a datalake table (its file name).
pub type CandidateId = String;

/// Relevant candidates for each query. Read-only for the duration of a run.
pub type GroundTruth = HashMap<QueryId, HashSet<CandidateId>>;

/// Ranked candidates returned for each query, best first.
///
/// Ordered by query id so that aggregation order, and therefore every
/// floating point sum, is deterministic.
pub type RankedResults = BTreeMap<QueryId, Vec<CandidateId>>;

/// Column-level embedding of one table.
///
/// Serialized as a `[table_id, [[f32, ...], ...]]` pair, one vector per
/// column in table column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "(String, Vec<Vec<f32>>)", into = "(String, Vec<Vec<f32>>)")]
pub struct TableEmbedding {
    pub table_id: String,
    pub columns: Vec<Vec<f32>>,
}

impl TableEmbedding {
    pub fn new(table_id: impl Into<String>, columns: Vec<Vec<f32>>) -> Self {
        Self {
            table_id: table_id.into(),
            columns,
        }
    }

    /// Zero-valued embedding with `num_columns` vectors of width `dim`.
    pub fn zeros(table_id: impl Into<String>, num_columns: usize, dim: usize) -> Self {
        Self::new(table_id, vec![vec![0.0; dim]; num_columns])
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Width of the column vectors, if the table has any columns.
    pub fn dim(&self) -> Option<usize> {
        self.columns.first().map(Vec::len)
    }
}

impl From<(String, Vec<Vec<f32>>)> for TableEmbedding {
    fn from((table_id, columns): (String, Vec<Vec<f32>>)) -> Self {
        Self { table_id, columns }
    }
}

impl From<TableEmbedding> for (String, Vec<Vec<f32>>) {
    fn from(emb: TableEmbedding) -> Self {
        (emb.table_id, emb.columns)
    }
}

/// A loaded CSV table: header names and (possibly truncated) data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }
}
