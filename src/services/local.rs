use std::collections::HashSet;

use crate::models::ScoredCandidate;

use super::index::FeatureIndex;

/// Neighbor pool floor and multiplier: the query is oversized relative to k
/// so seed exclusion and cross-source dedup still leave k results.
const MIN_POOL: usize = 16;
const POOL_FACTOR: usize = 4;

/// Queries the feature index for neighbors of the seed set.
///
/// Seeds absent from the index are skipped; when none resolve the pool is
/// empty and the caller falls through to the fallback generator. Cosine
/// distance d becomes the similarity score 1 - d.
pub fn local_candidates(index: &FeatureIndex, seed_ids: &[u64], k: usize) -> Vec<ScoredCandidate> {
    let Some(vector) = index.seed_vector(seed_ids) else {
        return Vec::new();
    };

    let excluded: HashSet<u64> = seed_ids.iter().copied().collect();
    let pool = MIN_POOL.max(POOL_FACTOR * k).min(index.len());

    index
        .query(&vector, &excluded, pool)
        .into_iter()
        .filter_map(|(id, distance)| {
            let entry = index.entry_by_id(id)?;
            Some(ScoredCandidate::from_entry(entry, 1.0 - distance))
        })
        .collect()
}
