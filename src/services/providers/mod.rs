/// Similar-items provider abstraction
///
/// The fallback generator only talks to this trait, so alternative content
/// providers can be swapped in without touching the engine. Every call may
/// fail or time out; callers treat failures as skippable, never fatal.
use crate::{
    error::AppResult,
    models::{MovieDetails, MoviePage},
};

pub mod tmdb;

/// Filter for the provider's discovery endpoint.
///
/// Each id list is matched with OR semantics; empty lists are left out of
/// the query entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverFilter {
    pub with_cast: Vec<u64>,
    pub with_crew: Vec<u64>,
    pub with_genres: Vec<u64>,
}

/// Trait for external similar-items sources
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SimilarityProvider: Send + Sync {
    /// Fetches one page of titles similar to the given one.
    async fn similar(&self, id: u64, page: u32) -> AppResult<MoviePage>;

    /// Fetches full details with credits for a single title.
    async fn details(&self, id: u64) -> AppResult<MovieDetails>;

    /// Fetches popularity-sorted titles matching the filter.
    async fn discover(&self, filter: &DiscoverFilter) -> AppResult<MoviePage>;
}
