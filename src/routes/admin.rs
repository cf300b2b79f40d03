use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::{error::AppResult, middleware::request_id::RequestId, routes::AppState};

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub indexed: usize,
}

/// Handler for the index refresh endpoint
///
/// Rebuilds the feature index from the current catalog snapshot. On failure
/// the previous index, if any, stays in service.
pub async fn refresh(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<RefreshResponse>> {
    let indexed = state.engine.refresh().await?;

    tracing::info!(
        request_id = %request_id,
        indexed,
        "Index refresh completed"
    );

    Ok(Json(RefreshResponse { indexed }))
}
