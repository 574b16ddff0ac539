//! Admin session gate for privileged routes.
//!
//! Accepts `Authorization: Bearer <token>` or `X-Admin-Token: <token>`. The
//! token must name a stored, unexpired admin session.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::admin;
use crate::server::AppState;

/// Middleware that runs the wrapped route only for a valid admin session.
///
/// The resolved `AdminSession` is inserted into request extensions.
pub async fn require_admin_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let hub = state.hub().await;
    let headers = request.headers().clone();

    let result = admin::require_admin(&hub, &headers, |session| async move {
        request.extensions_mut().insert(session);
        Ok(next.run(request).await)
    })
    .await;

    result.unwrap_or_else(IntoResponse::into_response)
}
