/// Fallback candidate generation via the external provider
///
/// Runs when the local pool cannot satisfy k: pulls each seed's "similar"
/// pages, widens with attribute-driven discovery when still short, and ranks
/// everything with a shared-credit heuristic. Any single provider failure is
/// logged and skipped; it never aborts the pass.
use std::collections::{HashMap, HashSet};

use crate::models::{Facets, MovieDetails, MovieSummary, ScoredCandidate};

use super::providers::{DiscoverFilter, SimilarityProvider};

/// Weights of the shared-attribute heuristic.
const DIRECTOR_OVERLAP_WEIGHT: f64 = 3.0;
const CAST_OVERLAP_WEIGHT: f64 = 2.0;
const GENRE_OVERLAP_WEIGHT: f64 = 1.0;
const POPULARITY_DIVISOR: f64 = 100.0;

/// Billing cutoff when collecting cast ids.
const TOP_CAST: usize = 6;

/// Caps on discovery filter list sizes, bounding provider query cost.
const MAX_CAST_FILTER: usize = 6;
const MAX_CREW_FILTER: usize = 4;
const MAX_GENRE_FILTER: usize = 6;

/// Hard cap on the pooled candidate count per request.
const MAX_POOL: usize = 40;

#[derive(Debug, Clone, Copy)]
pub struct FallbackLimits {
    /// Pages of "similar" results fetched per seed.
    pub similar_pages: u32,
}

impl Default for FallbackLimits {
    fn default() -> Self {
        Self { similar_pages: 1 }
    }
}

/// Attribute profile of the seed set: provider ids for filtering and
/// scoring, names for explanations.
#[derive(Debug, Default)]
pub struct SeedProfile {
    pub cast_ids: HashSet<u64>,
    pub director_ids: HashSet<u64>,
    pub genre_ids: HashSet<u64>,
    genre_names: HashMap<u64, String>,
    pub facets: Facets,
}

impl SeedProfile {
    fn absorb(&mut self, details: &MovieDetails) {
        for genre in &details.genres {
            self.genre_ids.insert(genre.id);
            self.genre_names.insert(genre.id, genre.name.clone());
            self.facets.genres.insert(genre.name.clone());
        }
        for director in details.directors() {
            self.director_ids.insert(director.id);
            self.facets.directors.insert(director.name.clone());
        }
        for member in details.top_cast(TOP_CAST) {
            self.cast_ids.insert(member.id);
            self.facets.actors.insert(member.name.clone());
        }
    }
}

/// Collects the seed set's provider-side attribute profile. A failed detail
/// fetch drops that one seed from the profile, nothing else.
pub async fn seed_profile(provider: &dyn SimilarityProvider, seed_ids: &[u64]) -> SeedProfile {
    let mut profile = SeedProfile::default();
    for &seed in seed_ids {
        match provider.details(seed).await {
            Ok(details) => profile.absorb(&details),
            Err(error) => {
                tracing::warn!(seed, error = %error, "Seed detail fetch failed; skipping seed");
            }
        }
    }
    profile
}

/// Generates scored fallback candidates, most relevant first.
pub async fn fallback_candidates(
    provider: &dyn SimilarityProvider,
    seed_ids: &[u64],
    profile: &SeedProfile,
    already_seen: &HashSet<u64>,
    needed: usize,
    limits: FallbackLimits,
) -> Vec<ScoredCandidate> {
    let pool = collect_pool(provider, seed_ids, profile, already_seen, needed, limits).await;

    let mut scored = Vec::with_capacity(pool.len());
    for summary in &pool {
        let (score, facets) = score_candidate(provider, summary, profile).await;
        scored.push(ScoredCandidate::from_summary(summary, score, facets));
    }

    // descending by heuristic score; stable sort keeps encounter order on ties
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

/// Accumulates unseen candidate summaries: per-seed "similar" pages first,
/// stopping early once enough are pooled, then attribute-driven discovery
/// if direct links left us short.
async fn collect_pool(
    provider: &dyn SimilarityProvider,
    seed_ids: &[u64],
    profile: &SeedProfile,
    already_seen: &HashSet<u64>,
    needed: usize,
    limits: FallbackLimits,
) -> Vec<MovieSummary> {
    let mut seen = already_seen.clone();
    seen.extend(seed_ids.iter().copied());

    let mut pool: Vec<MovieSummary> = Vec::new();

    'similar: for &seed in seed_ids {
        for page in 1..=limits.similar_pages.max(1) {
            match provider.similar(seed, page).await {
                Ok(result) => {
                    for summary in result.results {
                        if seen.insert(summary.id) && pool.len() < MAX_POOL {
                            pool.push(summary);
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(seed, page, error = %error, "Similar fetch failed; skipping page");
                }
            }
            if pool.len() >= needed {
                break 'similar;
            }
        }
    }

    if pool.len() < needed {
        for filter in discover_filters(profile) {
            match provider.discover(&filter).await {
                Ok(result) => {
                    for summary in result.results {
                        if seen.insert(summary.id) && pool.len() < MAX_POOL {
                            pool.push(summary);
                        }
                    }
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Discover fetch failed; skipping filter");
                }
            }
        }
    }

    pool
}

/// One OR-filtered discovery query per attribute family with any signal.
fn discover_filters(profile: &SeedProfile) -> Vec<DiscoverFilter> {
    let mut filters = Vec::new();

    let with_cast = capped(&profile.cast_ids, MAX_CAST_FILTER);
    if !with_cast.is_empty() {
        filters.push(DiscoverFilter {
            with_cast,
            ..Default::default()
        });
    }

    let with_crew = capped(&profile.director_ids, MAX_CREW_FILTER);
    if !with_crew.is_empty() {
        filters.push(DiscoverFilter {
            with_crew,
            ..Default::default()
        });
    }

    let with_genres = capped(&profile.genre_ids, MAX_GENRE_FILTER);
    if !with_genres.is_empty() {
        filters.push(DiscoverFilter {
            with_genres,
            ..Default::default()
        });
    }

    filters
}

fn capped(ids: &HashSet<u64>, cap: usize) -> Vec<u64> {
    let mut ids: Vec<u64> = ids.iter().copied().collect();
    // deterministic filter contents regardless of set iteration order
    ids.sort_unstable();
    ids.truncate(cap);
    ids
}

/// Scores one pooled candidate against the seed profile.
///
/// The candidate's own credits are fetched only when its summary genre ids
/// show no overlap with the seeds already, saving one detail call per
/// candidate in the common case. A failed fetch falls back to the cheap
/// summary fields.
async fn score_candidate(
    provider: &dyn SimilarityProvider,
    summary: &MovieSummary,
    profile: &SeedProfile,
) -> (f64, Facets) {
    let mut genre_ids: HashSet<u64> = summary.genre_ids.iter().copied().collect();
    let mut director_ids: HashSet<u64> = HashSet::new();
    let mut cast_ids: HashSet<u64> = HashSet::new();
    let mut facets = Facets::default();

    let overlap_evident = genre_ids.iter().any(|id| profile.genre_ids.contains(id));
    if !overlap_evident {
        match provider.details(summary.id).await {
            Ok(details) => {
                for genre in &details.genres {
                    genre_ids.insert(genre.id);
                    facets.genres.insert(genre.name.clone());
                }
                for director in details.directors() {
                    director_ids.insert(director.id);
                    facets.directors.insert(director.name.clone());
                }
                for member in details.top_cast(TOP_CAST) {
                    cast_ids.insert(member.id);
                    facets.actors.insert(member.name.clone());
                }
            }
            Err(error) => {
                tracing::warn!(
                    candidate = summary.id,
                    error = %error,
                    "Candidate detail fetch failed; scoring on summary fields"
                );
            }
        }
    }

    // summary rows carry genre ids without names; recover the shared ones
    // from the seed profile so explanations can still name them
    for id in &genre_ids {
        if let Some(name) = profile.genre_names.get(id) {
            facets.genres.insert(name.clone());
        }
    }

    let shared_directors = director_ids.intersection(&profile.director_ids).count();
    let shared_cast = cast_ids.intersection(&profile.cast_ids).count();
    let shared_genres = genre_ids.intersection(&profile.genre_ids).count();

    let score = DIRECTOR_OVERLAP_WEIGHT * shared_directors as f64
        + CAST_OVERLAP_WEIGHT * shared_cast as f64
        + GENRE_OVERLAP_WEIGHT * shared_genres as f64
        + summary.popularity / POPULARITY_DIVISOR;

    (score, facets)
}
