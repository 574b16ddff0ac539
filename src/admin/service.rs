//! Admin session issuance and the admin capability gate.

use std::future::Future;

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{AdminConfig, DEFAULT_ADMIN_SESSION_TTL_MS};
use crate::error::HubError;
use crate::hub::HubHandle;

use super::presentation::{AdminClaimPolicy, is_success};
use super::session::{AdminSession, extract_token};
use super::verifier::VerifierClient;

/// Token returned from a successful verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssuedSession {
    pub token: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires: DateTime<Utc>,
}

/// Turns verified presentations into admin sessions.
#[derive(Clone)]
pub struct AdminService {
    verifier: VerifierClient,
    policy: AdminClaimPolicy,
    ttl: Duration,
}

impl AdminService {
    pub fn new(verifier: VerifierClient, policy: AdminClaimPolicy, ttl: Duration) -> Self {
        Self {
            verifier,
            policy,
            ttl,
        }
    }

    /// Build from config. A zero TTL falls back to the default.
    pub fn from_config(verifier: VerifierClient, config: &AdminConfig) -> Self {
        let ttl_ms = match config.session_ttl_ms {
            0 => DEFAULT_ADMIN_SESSION_TTL_MS,
            ms => ms,
        };
        let ttl = i64::try_from(ttl_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .unwrap_or(Duration::MAX);

        Self::new(
            verifier,
            AdminClaimPolicy::new(&config.claim_path, &config.claim_value),
            ttl,
        )
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Verify `raw` with the external service and mint an admin session.
    pub async fn verify_presentation(
        &self,
        hub: &HubHandle,
        raw: String,
    ) -> Result<IssuedSession, HubError> {
        let endpoint = self.verifier.endpoint().ok_or(HubError::NotConfigured)?;
        let credential = self.verifier.credential().await?;
        let result = self.verifier.verify(endpoint, &credential, raw).await?;

        if !is_success(&result) {
            debug!("Verification service did not report success");
            return Err(HubError::VerificationFailed { result });
        }

        let Some(verified) = self.policy.evaluate(&result) else {
            debug!(claim_path = %self.policy.claim_path, "Credential lacks admin claim");
            return Err(HubError::NotAdmin { result });
        };

        let created = Utc::now();
        let expires = created.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        let session = AdminSession {
            token: Uuid::new_v4().to_string(),
            created,
            expires,
            verified,
        };
        let issued = IssuedSession {
            token: session.token.clone(),
            expires,
        };

        hub.put_admin_session(session).await?;
        info!(expires = %expires, "Issued admin session");
        Ok(issued)
    }
}

/// Resolve the admin session presented in `headers`.
///
/// Missing, unknown and expired tokens are all `Unauthorized`.
pub async fn authorize(hub: &HubHandle, headers: &HeaderMap) -> Result<AdminSession, HubError> {
    let token = extract_token(headers).ok_or(HubError::Unauthorized)?;
    let session = hub
        .admin_session(&token)
        .await?
        .ok_or(HubError::Unauthorized)?;

    if !session.is_valid_at(Utc::now()) {
        return Err(HubError::Unauthorized);
    }
    Ok(session)
}

/// Run `continuation` only for a valid admin session.
pub async fn require_admin<T, F, Fut>(
    hub: &HubHandle,
    headers: &HeaderMap,
    continuation: F,
) -> Result<T, HubError>
where
    F: FnOnce(AdminSession) -> Fut,
    Fut: Future<Output = Result<T, HubError>>,
{
    let session = authorize(hub, headers).await?;
    continuation(session).await
}
