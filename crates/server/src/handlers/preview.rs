//! Link preview endpoints.
//!
//! Both routes answer `200` with a preview record whenever a URL was given,
//! including when the preview itself failed. Only a missing or blank URL is
//! rejected with `400`.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use readlog_core::{PreviewRequest, PreviewResult};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub url: Option<String>,
}

/// `POST /api/articles/preview-url` with a `{"url": "..."}` body.
pub async fn preview_url(
    State(state): State<AppState>,
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let url = payload.map(|Json(req)| req.url).unwrap_or_default();
    run_preview(&state, &url).await
}

/// `GET /api/preview?url=...`
pub async fn preview_query(State(state): State<AppState>, Query(params): Query<PreviewQuery>) -> ApiResult<Json<Value>> {
    run_preview(&state, params.url.as_deref().unwrap_or_default()).await
}

async fn run_preview(state: &AppState, url: &str) -> ApiResult<Json<Value>> {
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("URL is required".into()));
    }

    let preview: PreviewResult = state.previewer.get_preview(url).await;
    info!(
        url,
        success = preview.is_success(),
        kind = ?preview.error_kind(),
        "preview served"
    );

    Ok(Json(preview.to_json()))
}
