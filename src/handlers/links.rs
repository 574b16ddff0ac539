use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde::Serialize;

use crate::error::HubError;
use crate::links::{LinkRecord, NewLink};
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct AddLinkResponse {
    pub ok: bool,
    pub slug: String,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// GET /links
pub async fn list_links(State(state): State<AppState>) -> Result<Json<Vec<LinkRecord>>, HubError> {
    let links = state.hub().await.list_links().await?;
    Ok(Json(links))
}

/// POST /links (admin)
///
/// The body is parsed here rather than by an extractor so malformed input
/// reports as a validation error.
pub async fn add_link(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AddLinkResponse>, HubError> {
    let new_link: NewLink = serde_json::from_slice(&body)
        .map_err(|e| HubError::Validation(format!("invalid link body: {e}")))?;
    let record = new_link
        .into_record()
        .map_err(|e| HubError::Validation(e.to_string()))?;

    let slug = state.hub().await.upsert_link(record).await?;
    Ok(Json(AddLinkResponse { ok: true, slug }))
}

/// DELETE /links/{*path} (admin)
///
/// The slug is the last path segment, so `/links/a/b` removes `b`.
pub async fn delete_link(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<OkResponse>, HubError> {
    let slug = path.rsplit('/').next().unwrap_or_default();
    state.hub().await.remove_link(slug).await?;
    Ok(Json(OkResponse { ok: true }))
}
