use std::collections::HashSet;

use crate::models::ScoredCandidate;

/// Merges the similarity-ranked local pool with the heuristically ranked
/// fallback pool: local ahead of fallback, seeds removed, duplicates dropped
/// keeping the first occurrence, truncated to k. Never reorders across
/// sources, so a fallback id already produced locally is simply dropped.
pub fn aggregate(
    local: Vec<ScoredCandidate>,
    fallback: Vec<ScoredCandidate>,
    seed_ids: &[u64],
    k: usize,
) -> Vec<ScoredCandidate> {
    let seeds: HashSet<u64> = seed_ids.iter().copied().collect();
    let mut seen: HashSet<u64> = HashSet::new();
    let mut merged = Vec::with_capacity(k);

    for candidate in local.into_iter().chain(fallback) {
        if seeds.contains(&candidate.id) || !seen.insert(candidate.id) {
            continue;
        }
        merged.push(candidate);
        if merged.len() == k {
            break;
        }
    }

    merged
}
