//! Reproducible query sampling.
//!
//! Large benchmarks evaluate a fixed-size sample of their query tables.
//! Queries are sorted by identifier first so the sample depends only on the
//! query set and the seed, never on load order.

use crate::types::TableEmbedding;
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Sorts `queries` by table id and, when `sample_size` is set, draws a
/// uniform sample without replacement using a `ChaCha8Rng` seeded with
/// `seed`.
///
/// A `sample_size` at or above the number of queries keeps every query.
pub fn sample_queries(
    mut queries: Vec<TableEmbedding>,
    sample_size: Option<usize>,
    seed: u64,
) -> Vec<TableEmbedding> {
    queries.sort_by(|a, b| a.table_id.cmp(&b.table_id));

    let Some(size) = sample_size else {
        return queries;
    };
    if size >= queries.len() {
        return queries;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let picked = index::sample(&mut rng, queries.len(), size);

    let mut slots: Vec<Option<TableEmbedding>> = queries.into_iter().map(Some).collect();
    picked
        .into_iter()
        .filter_map(|i| slots[i].take())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn queries(n: usize) -> Vec<TableEmbedding> {
        (0..n)
            .rev()
            .map(|i| TableEmbedding::new(format!("q{:03}.csv", i), vec![vec![i as f32]]))
            .collect()
    }

    fn table_ids(sample: &[TableEmbedding]) -> Vec<String> {
        sample.iter().map(|q| q.table_id.clone()).collect()
    }

    #[test]
    fn test_no_sampling_sorts_by_id() {
        let sample = sample_queries(queries(5), None, 42);
        assert_eq!(
            table_ids(&sample),
            vec!["q000.csv", "q001.csv", "q002.csv", "q003.csv", "q004.csv"]
        );
    }

    #[test]
    fn test_sample_is_reproducible() {
        let a = sample_queries(queries(200), Some(50), 42);
        let b = sample_queries(queries(200), Some(50), 42);
        assert_eq!(table_ids(&a), table_ids(&b));
    }

    #[test]
    fn test_sample_independent_of_input_order() {
        let mut shuffled = queries(100);
        shuffled.reverse();
        let a = sample_queries(queries(100), Some(10), 7);
        let b = sample_queries(shuffled, Some(10), 7);
        assert_eq!(table_ids(&a), table_ids(&b));
    }

    #[test]
    fn test_sample_without_replacement() {
        let sample = sample_queries(queries(150), Some(100), 42);
        assert_eq!(sample.len(), 100);
        let unique: HashSet<_> = table_ids(&sample).into_iter().collect();
        assert_eq!(unique.len(), 100);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = sample_queries(queries(200), Some(20), 1);
        let b = sample_queries(queries(200), Some(20), 2);
        assert_ne!(table_ids(&a), table_ids(&b));
    }

    #[test]
    fn test_oversized_sample_keeps_all() {
        let sample = sample_queries(queries(3), Some(10), 42);
        assert_eq!(sample.len(), 3);
    }
}
