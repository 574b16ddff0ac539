use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::HeaderMap;

use super::links::OkResponse;
use crate::chat::{ChatReply, resolve_session_id};
use crate::error::HubError;
use crate::server::AppState;

/// Query pairs in order; repeated keys are kept.
type QueryPairs = Vec<(String, String)>;

/// First `sid` in the query string, if any.
fn first_sid(query: Result<Query<QueryPairs>, QueryRejection>) -> Option<String> {
    let Query(pairs) = query.ok()?;
    pairs.into_iter().find_map(|(key, value)| (key == "sid").then_some(value))
}

/// GET /chat
pub async fn chat_status() -> Json<OkResponse> {
    Json(OkResponse { ok: true })
}

/// POST /chat
///
/// The body is the raw message text. Invalid UTF-8 is replaced rather than
/// rejected, and a malformed query string is ignored.
pub async fn chat_message(
    State(state): State<AppState>,
    query: Result<Query<QueryPairs>, QueryRejection>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ChatReply>, HubError> {
    let sid = first_sid(query);
    let session_id = resolve_session_id(&headers, sid.as_deref());
    let message = String::from_utf8_lossy(&body);

    let hub = state.hub().await;
    let reply = state.chat.handle_message(&hub, session_id, &message).await?;
    Ok(Json(reply))
}
