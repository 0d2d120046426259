//! Trait for table embedding models.

use crate::error::EmbeddingError;
use crate::types::Table;

/// Turns tables into one embedding vector per column.
///
/// The model itself (tokenization, serialization of cell values, inference)
/// lives behind this trait so extraction can be driven and tested without it.
///
/// # Examples
///
/// ```ignore
/// let embedder: Box<dyn TableEmbedder> = Box::new(MyModel::load(path)?);
/// let vectors = embedder.embed_tables(&[&table])?;
/// assert_eq!(vectors[0].len(), table.num_columns());
/// assert_eq!(vectors[0][0].len(), embedder.embedding_dim());
/// ```
pub trait TableEmbedder {
    /// Width of every column vector.
    fn embedding_dim(&self) -> usize;

    /// Embeds a batch of tables.
    ///
    /// # Returns
    ///
    /// One entry per input table, in input order. Each entry holds one vector
    /// of length `embedding_dim()` per column.
    fn embed_tables(&self, tables: &[&Table]) -> Result<Vec<Vec<Vec<f32>>>, EmbeddingError>;
}

impl<E: TableEmbedder + ?Sized> TableEmbedder for Box<E> {
    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }

    fn embed_tables(&self, tables: &[&Table]) -> Result<Vec<Vec<Vec<f32>>>, EmbeddingError> {
        (**self).embed_tables(tables)
    }
}
