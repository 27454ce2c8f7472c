use crate::io::MovieId;

/// Capability interface over a trained item-item similarity structure.
///
/// Implementations are immutable after construction and keep no lazy caches,
/// so a single instance can be shared across all actix workers without locking.
pub trait ItemSimilarity {
    /// Resolves an external movie id to the model's dense inner index.
    /// Returns `None` when the movie was not part of the training vocabulary.
    fn to_inner(&self, movie_id: &MovieId) -> Option<usize>;

    fn to_raw(&self, inner: usize) -> MovieId;

    /// The up to `k` nearest inner indices of `inner`, ordered by descending
    /// similarity. The order is deterministic for a fixed `k`.
    fn neighbors(&self, inner: usize, k: usize) -> &[usize];

    /// Pairwise similarity between two inner indices. The range depends on the
    /// trained metric, negative values are possible.
    fn similarity(&self, inner_a: usize, inner_b: usize) -> f64;
}
