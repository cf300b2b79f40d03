/// TMDB provider
///
/// Serves the fallback generator: similar-title pages, detail lookups with
/// credits appended, and attribute-filtered discovery queries.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{MovieDetails, MoviePage},
};

use super::{DiscoverFilter, SimilarityProvider};

/// Bounded retry on rate limiting; anything else surfaces immediately.
const MAX_ATTEMPTS: u32 = 3;
const RETRY_BASE_DELAY_MS: u64 = 300;

#[derive(Clone)]
pub struct TmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    region: String,
}

impl TmdbProvider {
    pub fn new(
        api_key: String,
        api_url: String,
        language: String,
        region: String,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            api_url,
            language,
            region,
        })
    }

    /// v4 tokens are JWTs sent as a bearer header; v3 keys ride in the
    /// query string.
    fn uses_bearer_auth(&self) -> bool {
        self.api_key.starts_with("ey")
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self
                .http_client
                .get(&url)
                .query(&[("language", self.language.as_str())])
                .query(params);
            if self.uses_bearer_auth() {
                request = request.bearer_auth(&self.api_key);
            } else {
                request = request.query(&[("api_key", self.api_key.as_str())]);
            }

            let response = request.send().await?;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS
                && attempt < MAX_ATTEMPTS
            {
                let delay = Duration::from_millis(RETRY_BASE_DELAY_MS * u64::from(attempt));
                tracing::warn!(path, attempt, "TMDB rate limited; retrying");
                tokio::time::sleep(delay).await;
                continue;
            }

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(AppError::ExternalApi(format!(
                    "TMDB returned status {}: {}",
                    status, body
                )));
            }

            return Ok(response.json().await?);
        }
    }
}

#[async_trait::async_trait]
impl SimilarityProvider for TmdbProvider {
    async fn similar(&self, id: u64, page: u32) -> AppResult<MoviePage> {
        let page: MoviePage = self
            .get_json(
                &format!("/movie/{}/similar", id),
                &[
                    ("page", page.to_string()),
                    ("region", self.region.clone()),
                ],
            )
            .await?;

        tracing::debug!(id, results = page.results.len(), "Similar titles fetched");
        Ok(page)
    }

    async fn details(&self, id: u64) -> AppResult<MovieDetails> {
        self.get_json(
            &format!("/movie/{}", id),
            &[("append_to_response", "credits".to_string())],
        )
        .await
    }

    async fn discover(&self, filter: &DiscoverFilter) -> AppResult<MoviePage> {
        let mut params = vec![
            ("sort_by", "popularity.desc".to_string()),
            ("include_adult", "false".to_string()),
            ("page", "1".to_string()),
            ("region", self.region.clone()),
        ];
        if !filter.with_cast.is_empty() {
            params.push(("with_cast", join_ids(&filter.with_cast)));
        }
        if !filter.with_crew.is_empty() {
            params.push(("with_crew", join_ids(&filter.with_crew)));
        }
        if !filter.with_genres.is_empty() {
            params.push(("with_genres", join_ids(&filter.with_genres)));
        }

        let page: MoviePage = self.get_json("/discover/movie", &params).await?;

        tracing::debug!(results = page.results.len(), "Discover titles fetched");
        Ok(page)
    }
}

/// TMDB treats comma-separated id lists as OR filters.
fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
