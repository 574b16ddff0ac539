//! Problem documents for responses produced outside the handlers.
//!
//! Extractor rejections, the body limit and the request timeout answer with
//! plain text or an empty body. This layer rewrites any such error response
//! into the same problem document a handler error would produce.

use axum::body::to_bytes;
use axum::response::{IntoResponse, Response};

use super::problem_details::is_problem;
use crate::error::HubError;

/// Longer rejection bodies fall back to the status reason.
const REJECTION_BODY_LIMIT: usize = 4096;

pub async fn problem_for_bare_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error()) || is_problem(&response) {
        return response;
    }

    let detail = match to_bytes(response.into_body(), REJECTION_BODY_LIMIT).await {
        Ok(bytes) if !bytes.is_empty() => String::from_utf8_lossy(&bytes).trim().to_string(),
        _ => status.canonical_reason().unwrap_or("request rejected").to_string(),
    };

    HubError::from_rejection(status, detail).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{StatusCode, header};
    use http_body_util::BodyExt;

    async fn json(response: Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_plain_text_rejection_becomes_problem() {
        let bare = (StatusCode::BAD_REQUEST, "Failed to deserialize query string").into_response();

        let response = problem_for_bare_errors(bare).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/problem+json"
        );
        let json = json(response).await;
        assert_eq!(json["error"], "validation_error");
        assert_eq!(json["detail"], "Failed to deserialize query string");
    }

    #[tokio::test]
    async fn test_empty_timeout_body_gets_reason() {
        let bare = Response::builder()
            .status(StatusCode::REQUEST_TIMEOUT)
            .body(Body::empty())
            .unwrap();

        let json = json(problem_for_bare_errors(bare).await).await;
        assert_eq!(json["status"], 408);
        assert_eq!(json["error"], "request_timeout");
    }

    #[tokio::test]
    async fn test_success_and_problem_responses_pass_through() {
        let ok = (StatusCode::OK, "fine").into_response();
        let response = problem_for_bare_errors(ok).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.into_body().collect().await.unwrap().to_bytes(),
            "fine"
        );

        let limited = HubError::RateLimited {
            retry_after_secs: 7,
        }
        .into_response();
        let response = problem_for_bare_errors(limited).await;
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "7");
    }
}
