use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Serialize;

use crate::admin::IssuedSession;
use crate::error::HubError;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub session: IssuedSession,
}

/// POST /verify
///
/// Forwards the raw presentation to the verification service and, for an
/// admin credential, returns a fresh session token. Invalid UTF-8 is
/// replaced rather than rejected.
pub async fn verify(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<VerifyResponse>, HubError> {
    let raw = String::from_utf8_lossy(&body).into_owned();
    let hub = state.hub().await;
    let session = state.admin.verify_presentation(&hub, raw).await?;
    Ok(Json(VerifyResponse { ok: true, session }))
}
