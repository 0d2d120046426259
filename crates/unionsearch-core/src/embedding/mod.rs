//! Table embedding extraction.
//!
//! Produces the `(table_id, column_vectors)` artifacts that evaluation runs
//! consume. The model is abstracted by [`TableEmbedder`]; [`extract_vectors`]
//! batches tables through it and tolerates failed batches.

mod traits;

pub use traits::TableEmbedder;

use crate::types::{Table, TableEmbedding};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Timing and failure counts of one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionStats {
    pub num_tables: usize,
    pub num_batches: usize,
    /// Batches replaced by zero placeholders
    pub failed_batches: usize,
    /// Time spent inside the embedder
    pub inference_time: Duration,
    pub total_time: Duration,
}

impl ExtractionStats {
    /// Mean inference time per table, or zero when nothing was embedded.
    pub fn per_table_inference(&self) -> Duration {
        match u32::try_from(self.num_tables) {
            Ok(n) if n > 0 => self.inference_time / n,
            _ => Duration::ZERO,
        }
    }
}

/// Embeds `tables` in batches of `batch_size`.
///
/// A batch whose inference fails, or that returns the wrong number of tables,
/// is replaced by zero vectors of shape `(num_columns, embedding_dim)` per
/// table. Output order matches input order. A `batch_size` of 0 is treated
/// as 1.
pub fn extract_vectors<E: TableEmbedder + ?Sized>(
    tables: &[(String, Table)],
    embedder: &E,
    batch_size: usize,
) -> (Vec<TableEmbedding>, ExtractionStats) {
    let start = Instant::now();
    let batch_size = batch_size.max(1);
    let dim = embedder.embedding_dim();

    let mut stats = ExtractionStats {
        num_tables: tables.len(),
        ..Default::default()
    };
    let mut embeddings = Vec::with_capacity(tables.len());

    for (batch_idx, batch) in tables.chunks(batch_size).enumerate() {
        stats.num_batches += 1;
        let refs: Vec<&Table> = batch.iter().map(|(_, table)| table).collect();

        let inference_start = Instant::now();
        let result = embedder.embed_tables(&refs);
        stats.inference_time += inference_start.elapsed();

        let vectors = match result {
            Ok(vectors) if vectors.len() == batch.len() => vectors,
            Ok(vectors) => {
                warn!(
                    "Batch {} returned {} tables, expected {}; using placeholders",
                    batch_idx,
                    vectors.len(),
                    batch.len()
                );
                stats.failed_batches += 1;
                placeholders(batch, dim)
            }
            Err(e) => {
                warn!("Batch {} failed: {}; using placeholders", batch_idx, e);
                stats.failed_batches += 1;
                placeholders(batch, dim)
            }
        };

        embeddings.extend(
            batch
                .iter()
                .zip(vectors)
                .map(|((id, _), columns)| TableEmbedding::new(id.clone(), columns)),
        );
        debug!("Embedded batch {} ({} tables)", batch_idx, batch.len());
    }

    stats.total_time = start.elapsed();
    info!(
        "Extracted {} tables in {} batches ({} failed), inference {:.2}s, total {:.2}s",
        stats.num_tables,
        stats.num_batches,
        stats.failed_batches,
        stats.inference_time.as_secs_f64(),
        stats.total_time.as_secs_f64()
    );

    (embeddings, stats)
}

fn placeholders(batch: &[(String, Table)], dim: usize) -> Vec<Vec<Vec<f32>>> {
    batch
        .iter()
        .map(|(_, table)| vec![vec![0.0; dim]; table.num_columns()])
        .collect()
}
