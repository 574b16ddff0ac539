//! Request-level error taxonomy.
//!
//! Every handler returns `Result<_, HubError>`; the error renders itself as a
//! problem document so no failure crosses a request boundary unconverted.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

use crate::handlers::problem_details::ProblemDetails;
use crate::hub::ActorError;

#[derive(Debug, Error)]
pub enum HubError {
    /// Bad or missing request input.
    #[error("{0}")]
    Validation(String),

    #[error("missing, unknown or expired admin token")]
    Unauthorized,

    /// The presentation verified but carries no admin claim.
    #[error("credential does not carry the admin claim")]
    NotAdmin { result: Value },

    #[error("no credential available for the verification service")]
    NoVerifierAuth,

    #[error("verification endpoint is not configured")]
    NotConfigured,

    /// The OAuth token endpoint rejected the client credentials.
    #[error("token endpoint returned {status}")]
    UpstreamAuth { status: u16, body: String },

    /// The verification service rejected the request.
    #[error("verification service returned {status}")]
    UpstreamVerification { status: u16, body: String },

    /// The verification service answered but did not report success.
    #[error("presentation did not verify")]
    VerificationFailed { result: Value },

    /// Transport failure talking to an upstream service.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("rate limit exceeded, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("no route for this method and path")]
    NotFound,

    #[error("request body too large")]
    PayloadTooLarge,

    #[error("request timed out")]
    RequestTimeout,

    /// Any other rejection raised before a handler produced a result.
    #[error("{detail}")]
    Rejected { status: StatusCode, detail: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl HubError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::UpstreamVerification { .. } => StatusCode::BAD_REQUEST,
            Self::VerificationFailed { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotAdmin { .. } | Self::NoVerifierAuth => StatusCode::FORBIDDEN,
            Self::NotConfigured => StatusCode::NOT_IMPLEMENTED,
            Self::UpstreamAuth { .. } | Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::Rejected { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code, rendered as the `error` member.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Unauthorized => "unauthorized",
            Self::NotAdmin { .. } => "not_admin",
            Self::NoVerifierAuth => "no_verifier_auth",
            Self::NotConfigured => "verification_not_configured",
            Self::UpstreamAuth { .. } => "oauth_failed",
            Self::UpstreamVerification { .. } => "verification_rejected",
            Self::VerificationFailed { .. } => "verification_failed",
            Self::Upstream(_) => "upstream_unavailable",
            Self::RateLimited { .. } => "rate_limited",
            Self::NotFound => "not_found",
            Self::PayloadTooLarge => "payload_too_large",
            Self::RequestTimeout => "request_timeout",
            Self::Rejected { .. } => "request_rejected",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Classify an error response produced outside the handlers, such as an
    /// extractor rejection or a middleware short-circuit.
    pub fn from_rejection(status: StatusCode, detail: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::Validation(detail),
            StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => Self::NotFound,
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge,
            StatusCode::REQUEST_TIMEOUT => Self::RequestTimeout,
            StatusCode::INTERNAL_SERVER_ERROR => Self::Internal(detail),
            status => Self::Rejected { status, detail },
        }
    }

    fn to_problem(&self) -> ProblemDetails {
        let detail = match self {
            // Internal details stay in the log.
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };
        let problem = ProblemDetails::new(self.status(), detail).with("error", self.code());

        match self {
            Self::UpstreamAuth { status, body } | Self::UpstreamVerification { status, body } => {
                problem
                    .with("upstream_status", *status)
                    .with("upstream_body", body.as_str())
            }
            Self::NotAdmin { result } | Self::VerificationFailed { result } => {
                problem.with("result", result.clone())
            }
            Self::RateLimited { retry_after_secs } => {
                problem.with("retry_after", *retry_after_secs)
            }
            _ => problem,
        }
    }
}

impl From<ActorError> for HubError {
    fn from(err: ActorError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl IntoResponse for HubError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref message) = self {
            error!(error = %message, "Request failed");
        }

        let mut response = self.to_problem().into_response();
        if let Self::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}
