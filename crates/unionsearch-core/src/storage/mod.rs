//! Benchmark artifact storage.
//!
//! All artifacts of a benchmark live under three roots:
//!
//! ```text
//! <vectors_root>/<benchmark>/
//! ├── benchmark.json                       # {"query.csv": ["table.csv", ...]}
//! ├── query_embeddings.json                # [["query.csv", [[f32, ...], ...]], ...]
//! └── <variant>_datalake_embeddings.json   # same shape, one entry per datalake table
//!
//! <data_root>/<benchmark>/datalake/*.csv             # original tables
//! <data_root>/<benchmark>-<variant>/datalake/*.csv   # perturbed tables
//!
//! <output_root>/<benchmark>/<variant>/
//! ├── detailed_metrics.json                # ranking evaluation report
//! └── raw_distances.json                   # column drift report
//! ```

pub mod csv;

pub use self::csv::{load_table, load_table_columns, load_tables_in_dir};

use crate::config::ORIGINAL_VARIANT;
use crate::error::StorageError;
use crate::types::{GroundTruth, TableEmbedding};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const GROUND_TRUTH_FILENAME: &str = "benchmark.json";
const QUERY_EMBEDDINGS_FILENAME: &str = "query_embeddings.json";
const RANKING_REPORT_FILENAME: &str = "detailed_metrics.json";
const DRIFT_REPORT_FILENAME: &str = "raw_distances.json";

/// Paths of every artifact of one benchmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkLayout {
    pub benchmark: String,
    /// Root of the CSV table directories
    pub data_root: PathBuf,
    /// Root of ground truth and embedding files
    pub vectors_root: PathBuf,
    /// Root of written reports
    pub output_root: PathBuf,
}

impl BenchmarkLayout {
    pub fn new(
        benchmark: impl Into<String>,
        data_root: impl Into<PathBuf>,
        vectors_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            benchmark: benchmark.into(),
            data_root: data_root.into(),
            vectors_root: vectors_root.into(),
            output_root: output_root.into(),
        }
    }

    /// Layout with all three roots under `base` (`data/`, `vectors/`, `output/`).
    pub fn under(base: &Path, benchmark: impl Into<String>) -> Self {
        Self::new(
            benchmark,
            base.join("data"),
            base.join("vectors"),
            base.join("output"),
        )
    }

    fn vectors_dir(&self) -> PathBuf {
        self.vectors_root.join(&self.benchmark)
    }

    pub fn ground_truth_path(&self) -> PathBuf {
        self.vectors_dir().join(GROUND_TRUTH_FILENAME)
    }

    pub fn query_embeddings_path(&self) -> PathBuf {
        self.vectors_dir().join(QUERY_EMBEDDINGS_FILENAME)
    }

    pub fn datalake_embeddings_path(&self, variant: &str) -> PathBuf {
        self.vectors_dir()
            .join(format!("{}_datalake_embeddings.json", variant))
    }

    /// Directory of the CSV tables of a datalake variant.
    pub fn datalake_tables_dir(&self, variant: &str) -> PathBuf {
        let dir = if variant == ORIGINAL_VARIANT {
            self.benchmark.clone()
        } else {
            format!("{}-{}", self.benchmark, variant)
        };
        self.data_root.join(dir).join("datalake")
    }

    pub fn variant_output_dir(&self, variant: &str) -> PathBuf {
        self.output_root.join(&self.benchmark).join(variant)
    }

    pub fn ranking_report_path(&self, variant: &str) -> PathBuf {
        self.variant_output_dir(variant).join(RANKING_REPORT_FILENAME)
    }

    pub fn drift_report_path(&self, variant: &str) -> PathBuf {
        self.variant_output_dir(variant).join(DRIFT_REPORT_FILENAME)
    }
}

// ============================================================================
// JSON
// ============================================================================

/// Reads and deserializes a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Err(StorageError::MissingArtifact(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes `value` as pretty-printed JSON, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.flush().map_err(io_err)?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Loads the ground truth mapping. Duplicate candidates collapse.
pub fn load_ground_truth(path: &Path) -> Result<GroundTruth, StorageError> {
    let raw: HashMap<String, Vec<String>> = read_json(path)?;
    Ok(raw
        .into_iter()
        .map(|(query, candidates)| (query, candidates.into_iter().collect::<HashSet<_>>()))
        .collect())
}

/// Loads column embeddings of a set of tables.
pub fn load_embeddings(path: &Path) -> Result<Vec<TableEmbedding>, StorageError> {
    read_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = BenchmarkLayout::new("santos", "data", "vectors", "output");

        assert_eq!(
            layout.ground_truth_path(),
            PathBuf::from("vectors/santos/benchmark.json")
        );
        assert_eq!(
            layout.datalake_embeddings_path("p-col"),
            PathBuf::from("vectors/santos/p-col_datalake_embeddings.json")
        );
        assert_eq!(
            layout.datalake_tables_dir("original"),
            PathBuf::from("data/santos/datalake")
        );
        assert_eq!(
            layout.datalake_tables_dir("p-col"),
            PathBuf::from("data/santos-p-col/datalake")
        );
        assert_eq!(
            layout.ranking_report_path("p-col"),
            PathBuf::from("output/santos/p-col/detailed_metrics.json")
        );
        assert_eq!(
            layout.drift_report_path("original"),
            PathBuf::from("output/santos/original/raw_distances.json")
        );
    }

    #[test]
    fn test_ground_truth_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("benchmark.json");
        fs::write(&path, r#"{"q1.csv": ["a.csv", "b.csv", "a.csv"], "q2.csv": []}"#).unwrap();

        let gt = load_ground_truth(&path).unwrap();
        assert_eq!(gt["q1.csv"].len(), 2);
        assert!(gt["q1.csv"].contains("b.csv"));
        assert!(gt["q2.csv"].is_empty());
    }

    #[test]
    fn test_missing_artifact() {
        let dir = TempDir::new().unwrap();
        let result = load_embeddings(&dir.path().join("nope.json"));
        assert!(matches!(result, Err(StorageError::MissingArtifact(_))));
    }

    #[test]
    fn test_malformed_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            load_embeddings(&path),
            Err(StorageError::Json { .. })
        ));
    }

    #[test]
    fn test_write_json_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output/santos/original/detailed_metrics.json");
        let embeddings = vec![TableEmbedding::new("t.csv", vec![vec![0.5]])];

        write_json(&path, &embeddings).unwrap();
        assert_eq!(load_embeddings(&path).unwrap(), embeddings);
    }
}
