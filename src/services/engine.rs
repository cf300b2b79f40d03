use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    catalog::CatalogLoader,
    error::{AppError, AppResult},
    models::{Candidate, Facets},
};

use super::{
    aggregate, explain,
    fallback::{self, FallbackLimits},
    index::FeatureIndex,
    local,
    providers::SimilarityProvider,
};

/// Requested count when the client omits k.
pub const DEFAULT_K: usize = 10;

/// Similarity recommendation engine
///
/// Owns the swappable feature index plus the collaborators it queries. The
/// index is rebuilt wholesale by `refresh`; reads clone the Arc out of a
/// short-held lock, so queries never block on a rebuild in flight and see
/// either the old or the new index, never a partial one.
pub struct RecommendationEngine {
    loader: Arc<dyn CatalogLoader>,
    provider: Arc<dyn SimilarityProvider>,
    limits: FallbackLimits,
    index: RwLock<Option<Arc<FeatureIndex>>>,
}

impl RecommendationEngine {
    pub fn new(
        loader: Arc<dyn CatalogLoader>,
        provider: Arc<dyn SimilarityProvider>,
        limits: FallbackLimits,
    ) -> Self {
        Self {
            loader,
            provider,
            limits,
            index: RwLock::new(None),
        }
    }

    /// Rebuilds the feature index from a fresh catalog snapshot.
    ///
    /// The load and build run entirely outside the lock; only the final Arc
    /// swap takes the write lock. Any failure leaves the prior index in
    /// service. Returns the number of indexed entries.
    pub async fn refresh(&self) -> AppResult<usize> {
        let entries = self.loader.load().await?;
        let built = FeatureIndex::build(entries)?;
        let indexed = built.len();
        let built_at = built.built_at();

        *self.index.write().await = Some(Arc::new(built));

        tracing::info!(indexed, built_at = %built_at, "Feature index refreshed");
        Ok(indexed)
    }

    /// Number of entries in the currently served index.
    pub async fn indexed_count(&self) -> Option<usize> {
        self.index.read().await.as_ref().map(|index| index.len())
    }

    /// Recommends up to k catalog items similar to the seed set.
    ///
    /// Local index neighbors come first; the external provider fills any
    /// shortfall. A valid request that matches nothing yields an empty list,
    /// not an error.
    pub async fn recommend(&self, seed_ids: &[u64], k: usize) -> AppResult<Vec<Candidate>> {
        if seed_ids.is_empty() {
            return Err(AppError::InvalidInput(
                "seed_ids must not be empty".to_string(),
            ));
        }
        if k == 0 {
            return Err(AppError::InvalidInput("k must be positive".to_string()));
        }

        let snapshot = self.index.read().await.clone();

        let mut seed_facets = Facets::default();
        let local_pool = match snapshot.as_deref() {
            Some(index) => {
                for &seed in seed_ids {
                    if let Some(entry) = index.entry_by_id(seed) {
                        seed_facets.merge(&entry.facets);
                    }
                }
                local::local_candidates(index, seed_ids, k)
            }
            // no index yet: missing local signal, not an error
            None => Vec::new(),
        };

        tracing::debug!(
            seed_count = seed_ids.len(),
            local = local_pool.len(),
            k,
            "Local pool assembled"
        );

        // The local query already excludes seeds and cannot duplicate ids,
        // so its length is the post-exclusion pool size.
        let fallback_pool = if local_pool.len() < k {
            let seen: HashSet<u64> = local_pool.iter().map(|c| c.id).collect();
            let profile = fallback::seed_profile(self.provider.as_ref(), seed_ids).await;
            seed_facets.merge(&profile.facets);
            let needed = k - local_pool.len();
            fallback::fallback_candidates(
                self.provider.as_ref(),
                seed_ids,
                &profile,
                &seen,
                needed,
                self.limits,
            )
            .await
        } else {
            Vec::new()
        };

        let merged = aggregate::aggregate(local_pool, fallback_pool, seed_ids, k);

        tracing::info!(
            seed_count = seed_ids.len(),
            k,
            results = merged.len(),
            "Recommendation assembled"
        );

        Ok(merged
            .into_iter()
            .map(|candidate| explain::attach(candidate, &seed_facets))
            .collect())
    }
}
