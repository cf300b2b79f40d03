use std::sync::Arc;

use axum_test::TestServer;
use serde_json::json;

use cinematch_api::catalog::CatalogLoader;
use cinematch_api::error::{AppError, AppResult};
use cinematch_api::models::{CatalogEntry, Facets, MovieDetails, MoviePage};
use cinematch_api::routes::{create_router, AppState};
use cinematch_api::services::fallback::FallbackLimits;
use cinematch_api::services::providers::{DiscoverFilter, SimilarityProvider};
use cinematch_api::services::RecommendationEngine;

/// In-memory loader serving a fixed snapshot.
struct FixtureLoader {
    entries: Vec<CatalogEntry>,
}

#[async_trait::async_trait]
impl CatalogLoader for FixtureLoader {
    async fn load(&self) -> AppResult<Vec<CatalogEntry>> {
        Ok(self.entries.clone())
    }
}

/// Provider with no data: every call fails or comes back empty.
struct EmptyProvider;

#[async_trait::async_trait]
impl SimilarityProvider for EmptyProvider {
    async fn similar(&self, _id: u64, _page: u32) -> AppResult<MoviePage> {
        Ok(MoviePage::default())
    }

    async fn details(&self, id: u64) -> AppResult<MovieDetails> {
        Err(AppError::ExternalApi(format!("no details for {}", id)))
    }

    async fn discover(&self, _filter: &DiscoverFilter) -> AppResult<MoviePage> {
        Ok(MoviePage::default())
    }
}

fn entry(id: u64, director: &str, genre: &str) -> CatalogEntry {
    CatalogEntry {
        id,
        title: format!("Film {}", id),
        poster_path: Some(format!("/{}.jpg", id)),
        synopsis: Some("A film.".to_string()),
        facets: Facets {
            directors: [director.to_string()].into_iter().collect(),
            actors: Default::default(),
            genres: [genre.to_string()].into_iter().collect(),
        },
    }
}

fn fixture_catalog() -> Vec<CatalogEntry> {
    vec![
        entry(1, "X", "Action"),
        entry(2, "X", "Action"),
        entry(3, "Y", "Comedy"),
    ]
}

fn create_test_server(entries: Vec<CatalogEntry>) -> TestServer {
    let engine = Arc::new(RecommendationEngine::new(
        Arc::new(FixtureLoader { entries }),
        Arc::new(EmptyProvider),
        FallbackLimits::default(),
    ));
    let app = create_router(AppState { engine }, "*");
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server(fixture_catalog());
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_refresh_reports_indexed_count() {
    let server = create_test_server(fixture_catalog());

    let response = server.post("/api/v1/admin/refresh").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["indexed"], 3);
}

#[tokio::test]
async fn test_refresh_empty_catalog_is_unprocessable() {
    let server = create_test_server(vec![]);

    let response = server.post("/api/v1/admin/refresh").await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_refresh_without_feature_signal_is_unprocessable() {
    let bare = vec![CatalogEntry {
        id: 1,
        title: "Film 1".to_string(),
        poster_path: None,
        synopsis: None,
        facets: Facets::default(),
    }];
    let server = create_test_server(bare);

    let response = server.post("/api/v1/admin/refresh").await;
    response.assert_status(axum::http::StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_recommend_flow() {
    let server = create_test_server(fixture_catalog());
    server.post("/api/v1/admin/refresh").await.assert_status_ok();

    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "seed_ids": [1], "k": 2 }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    // shared director and genre put film 2 first
    assert_eq!(results[0]["id"], 2);
    assert_eq!(results[0]["reason"], "Same director: X");
    assert_eq!(results[1]["id"], 3);

    // seeds never appear in results
    assert!(results.iter().all(|r| r["id"] != 1));
}

#[tokio::test]
async fn test_recommend_empty_seed_list_is_bad_request() {
    let server = create_test_server(fixture_catalog());

    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "seed_ids": [], "k": 5 }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommend_zero_k_is_bad_request() {
    let server = create_test_server(fixture_catalog());

    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "seed_ids": [1], "k": 0 }))
        .await;
    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recommend_unknown_seed_yields_empty_success() {
    let server = create_test_server(fixture_catalog());
    server.post("/api/v1/admin/refresh").await.assert_status_ok();

    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "seed_ids": [999], "k": 5 }))
        .await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_recommend_defaults_k() {
    let server = create_test_server(fixture_catalog());
    server.post("/api/v1/admin/refresh").await.assert_status_ok();

    let response = server
        .post("/api/v1/recommend")
        .json(&json!({ "seed_ids": [1] }))
        .await;
    response.assert_status_ok();

    // the whole non-seed catalog fits under the default k
    let body: serde_json::Value = response.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_recommend_is_deterministic_across_requests() {
    let server = create_test_server(fixture_catalog());
    server.post("/api/v1/admin/refresh").await.assert_status_ok();

    let first: serde_json::Value = server
        .post("/api/v1/recommend")
        .json(&json!({ "seed_ids": [1, 3], "k": 2 }))
        .await
        .json();
    let second: serde_json::Value = server
        .post("/api/v1/recommend")
        .json(&json!({ "seed_ids": [1, 3], "k": 2 }))
        .await
        .json();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_response_carries_request_id_header() {
    let server = create_test_server(fixture_catalog());
    let response = server.get("/health").await;
    assert!(response.headers().contains_key("x-request-id"));
}
