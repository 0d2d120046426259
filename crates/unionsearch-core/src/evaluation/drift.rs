//! Column-level embedding drift between two datalake variants.
//!
//! A perturbed variant (e.g. with permuted columns) holds the same tables as
//! the original datalake. For every table present in both, columns are
//! aligned by header name and the distance between their embeddings is
//! reported. A retrieval model that is robust to the perturbation produces
//! near-identical column vectors.
//!
//! Tables are skipped without error when:
//! - they are missing from either variant,
//! - their column headers are unknown on either side,
//! - their column embedding counts differ,
//! - no column name is shared.

use crate::types::TableEmbedding;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Distance between one column's embeddings in the two variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDrift {
    pub column_name: String,
    /// Column index in the original table
    pub original_position: usize,
    /// Column index in the variant table
    pub permuted_position: usize,
    pub euclidean_distance: f64,
    pub cosine_similarity: f64,
    /// `1 - cosine_similarity`
    pub cosine_distance: f64,
}

/// Per-table means over the aligned columns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TableDriftSummary {
    pub mean_euclidean: f64,
    pub mean_cosine: f64,
    /// Mean cosine similarity when columns are paired by index instead of name
    pub positional_mean_cosine: f64,
}

/// Drift of one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDrift {
    pub table_name: String,
    /// Number of columns in the original table header
    pub num_columns: usize,
    pub column_similarities: Vec<ColumnDrift>,
    pub aggregate_metrics: TableDriftSummary,
}

/// Drift of every comparable table, in original datalake order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DriftReport {
    pub tables: Vec<TableDrift>,
}

impl DriftReport {
    /// Mean of the per-table mean cosine similarities.
    pub fn mean_cosine(&self) -> Option<f64> {
        mean(self.tables.iter().map(|t| t.aggregate_metrics.mean_cosine))
    }

    /// Mean of the per-table mean Euclidean distances.
    pub fn mean_euclidean(&self) -> Option<f64> {
        mean(self.tables.iter().map(|t| t.aggregate_metrics.mean_euclidean))
    }
}

/// Compares `original` and `variant` embeddings table by table.
///
/// `original_columns` and `variant_columns` map table ids to header names in
/// column order.
pub fn compute_drift(
    original: &[TableEmbedding],
    variant: &[TableEmbedding],
    original_columns: &HashMap<String, Vec<String>>,
    variant_columns: &HashMap<String, Vec<String>>,
) -> DriftReport {
    let variant_by_id: HashMap<&str, &TableEmbedding> = variant
        .iter()
        .map(|t| (t.table_id.as_str(), t))
        .collect();

    let tables = original
        .iter()
        .filter_map(|orig| {
            let var = variant_by_id.get(orig.table_id.as_str())?;
            let orig_names = original_columns.get(&orig.table_id)?;
            let var_names = variant_columns.get(&orig.table_id)?;
            table_drift(orig, var, orig_names, var_names)
        })
        .collect();

    DriftReport { tables }
}

fn table_drift(
    original: &TableEmbedding,
    variant: &TableEmbedding,
    original_names: &[String],
    variant_names: &[String],
) -> Option<TableDrift> {
    if original_names.is_empty() || variant_names.is_empty() {
        return None;
    }
    if original.num_columns() != variant.num_columns() {
        return None;
    }

    // Later duplicates of a header name win, as in a name-keyed lookup.
    let variant_map: HashMap<&str, (usize, &Vec<f32>)> = variant_names
        .iter()
        .zip(&variant.columns)
        .enumerate()
        .map(|(idx, (name, emb))| (name.as_str(), (idx, emb)))
        .collect();
    let original_map: HashMap<&str, (usize, &Vec<f32>)> = original_names
        .iter()
        .zip(&original.columns)
        .enumerate()
        .map(|(idx, (name, emb))| (name.as_str(), (idx, emb)))
        .collect();

    let mut seen = HashSet::new();
    let column_similarities: Vec<ColumnDrift> = original_names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .filter_map(|name| {
            let &(orig_idx, orig_emb) = original_map.get(name.as_str())?;
            let &(var_idx, var_emb) = variant_map.get(name.as_str())?;
            let cosine = cosine_similarity(orig_emb, var_emb);
            Some(ColumnDrift {
                column_name: name.clone(),
                original_position: orig_idx,
                permuted_position: var_idx,
                euclidean_distance: euclidean_distance(orig_emb, var_emb),
                cosine_similarity: cosine,
                cosine_distance: 1.0 - cosine,
            })
        })
        .collect();

    let mean_euclidean = mean(column_similarities.iter().map(|c| c.euclidean_distance))?;
    let mean_cosine = mean(column_similarities.iter().map(|c| c.cosine_similarity))?;
    let positional_mean_cosine = mean(
        original
            .columns
            .iter()
            .zip(&variant.columns)
            .map(|(a, b)| cosine_similarity(a, b)),
    )
    .unwrap_or(0.0);

    Some(TableDrift {
        table_name: original.table_id.clone(),
        num_columns: original_names.len(),
        column_similarities,
        aggregate_metrics: TableDriftSummary {
            mean_euclidean,
            mean_cosine,
            positional_mean_cosine,
        },
    })
}

/// Euclidean (L2) distance.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Cosine similarity. Zero vectors have similarity 0 with everything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(&x, &y)| x as f64 * y as f64).sum();
    let mag_a = a.iter().map(|&x| (x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b = b.iter().map(|&y| (y as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }
    dot / (mag_a * mag_b)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn columns_for(entries: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        entries
            .iter()
            .map(|(table, cols)| (table.to_string(), names(cols)))
            .collect()
    }

    #[test]
    fn test_distances() {
        assert!((euclidean_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-9);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_identical_tables_have_no_drift() {
        let table = TableEmbedding::new("t.csv", vec![vec![1.0, 2.0], vec![0.5, -1.0]]);
        let cols = columns_for(&[("t.csv", &["a", "b"])]);

        let report = compute_drift(&[table.clone()], &[table], &cols, &cols);
        assert_eq!(report.tables.len(), 1);

        let drift = &report.tables[0];
        assert_eq!(drift.num_columns, 2);
        assert!(drift.aggregate_metrics.mean_euclidean.abs() < 1e-9);
        assert!((drift.aggregate_metrics.mean_cosine - 1.0).abs() < 1e-9);
        assert!((drift.column_similarities[0].cosine_distance).abs() < 1e-9);
    }

    #[test]
    fn test_name_alignment_beats_positional_alignment() {
        // Variant stores the same columns in reversed order.
        let original = TableEmbedding::new(
            "t.csv",
            vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]],
        );
        let permuted = TableEmbedding::new(
            "t.csv",
            vec![vec![0.0, 0.0, 1.0], vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0]],
        );
        let orig_cols = columns_for(&[("t.csv", &["id", "name", "city"])]);
        let var_cols = columns_for(&[("t.csv", &["city", "name", "id"])]);

        let report = compute_drift(&[original], &[permuted], &orig_cols, &var_cols);
        let summary = report.tables[0].aggregate_metrics;

        assert!((summary.mean_cosine - 1.0).abs() < 1e-9);
        assert!((summary.positional_mean_cosine - 1.0 / 3.0).abs() < 1e-9);
        assert!(summary.mean_cosine > summary.positional_mean_cosine);

        let id_col = &report.tables[0].column_similarities[0];
        assert_eq!(id_col.column_name, "id");
        assert_eq!(id_col.original_position, 0);
        assert_eq!(id_col.permuted_position, 2);
    }

    #[test]
    fn test_mismatched_column_counts_skipped() {
        let original = TableEmbedding::new("t.csv", vec![vec![1.0], vec![2.0]]);
        let variant = TableEmbedding::new("t.csv", vec![vec![1.0]]);
        let cols = columns_for(&[("t.csv", &["a", "b"])]);

        let report = compute_drift(&[original], &[variant], &cols, &cols);
        assert!(report.tables.is_empty());
    }

    #[test]
    fn test_missing_tables_and_headers_skipped() {
        let a = TableEmbedding::new("a.csv", vec![vec![1.0]]);
        let b = TableEmbedding::new("b.csv", vec![vec![1.0]]);
        let cols = columns_for(&[("a.csv", &["x"])]);

        // b.csv has no headers, c.csv only exists in the variant
        let c = TableEmbedding::new("c.csv", vec![vec![1.0]]);
        let report = compute_drift(&[a.clone(), b.clone()], &[a, b, c], &cols, &cols);
        assert_eq!(report.tables.len(), 1);
        assert_eq!(report.tables[0].table_name, "a.csv");
    }

    #[test]
    fn test_no_shared_names_skipped() {
        let t = TableEmbedding::new("t.csv", vec![vec![1.0]]);
        let orig_cols = columns_for(&[("t.csv", &["a"])]);
        let var_cols = columns_for(&[("t.csv", &["b"])]);

        let report = compute_drift(&[t.clone()], &[t], &orig_cols, &var_cols);
        assert!(report.tables.is_empty());
        assert_eq!(report.mean_cosine(), None);
    }
}
