use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppResult,
    middleware::request_id::RequestId,
    models::Candidate,
    routes::AppState,
    services::engine::DEFAULT_K,
};

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub seed_ids: Vec<u64>,
    #[serde(default = "default_k")]
    pub k: usize,
}

fn default_k() -> usize {
    DEFAULT_K
}

#[derive(Debug, Serialize)]
pub struct RecommendResponse {
    pub results: Vec<Candidate>,
}

/// Handler for the recommendation endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendResponse>> {
    tracing::info!(
        request_id = %request_id,
        seed_count = request.seed_ids.len(),
        k = request.k,
        "Processing recommendation request"
    );

    let results = state.engine.recommend(&request.seed_ids, request.k).await?;

    tracing::info!(
        request_id = %request_id,
        results = results.len(),
        "Recommendation request completed"
    );

    Ok(Json(RecommendResponse { results }))
}
