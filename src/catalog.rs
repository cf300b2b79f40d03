use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{CatalogEntry, Facets},
};

/// Produces catalog snapshots for index builds
///
/// Abstracts the storage shape away from the engine: the engine only sees
/// entries with their facet sets, never tables or columns. A load error is
/// fatal to the rebuild that requested it and nothing else.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogLoader: Send + Sync {
    /// Loads the full catalog snapshot.
    async fn load(&self) -> AppResult<Vec<CatalogEntry>>;
}

/// Loads the catalog from the Postgres schema populated by the ingest jobs.
pub struct PostgresCatalogLoader {
    pool: PgPool,
}

impl PostgresCatalogLoader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl CatalogLoader for PostgresCatalogLoader {
    async fn load(&self) -> AppResult<Vec<CatalogEntry>> {
        // Stable ordering keeps index row order reproducible across rebuilds
        let films: Vec<(i64, String, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT tmdb_id, title, poster_path, overview FROM film ORDER BY tmdb_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let directors: Vec<(i64, String)> =
            sqlx::query_as("SELECT film_tmdb_id, name FROM directors")
                .fetch_all(&self.pool)
                .await?;

        let actors: Vec<(i64, String)> = sqlx::query_as(
            "SELECT fa.film_id, a.name \
             FROM film_actor fa JOIN actor a ON a.id = fa.actor_id \
             ORDER BY fa.film_id, fa.cast_order",
        )
        .fetch_all(&self.pool)
        .await?;

        let genres: Vec<(i64, String)> = sqlx::query_as(
            "SELECT fg.film_id, g.name \
             FROM film_genre fg JOIN genre g ON g.id = fg.genre_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut facets: HashMap<u64, Facets> = HashMap::new();
        for (film_id, name) in directors {
            facets.entry(film_id as u64).or_default().directors.insert(name);
        }
        for (film_id, name) in actors {
            facets.entry(film_id as u64).or_default().actors.insert(name);
        }
        for (film_id, name) in genres {
            facets.entry(film_id as u64).or_default().genres.insert(name);
        }

        let entries = films
            .into_iter()
            .map(|(id, title, poster_path, overview)| {
                let id = id as u64;
                CatalogEntry {
                    id,
                    title,
                    poster_path,
                    synopsis: overview,
                    facets: facets.remove(&id).unwrap_or_default(),
                }
            })
            .collect();

        Ok(entries)
    }
}
