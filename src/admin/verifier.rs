//! Client for the external presentation-verification service.

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::{VerifierConfig, non_empty};
use crate::error::HubError;

/// Bearer credential presented to the verification service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifierCredential {
    /// Static key from configuration.
    ApiKey(String),
    /// Access token obtained through an OAuth2 client-credentials exchange.
    OAuth(String),
}

impl VerifierCredential {
    fn secret(&self) -> &str {
        match self {
            Self::ApiKey(key) | Self::OAuth(key) => key,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Talks to the verification service and its token endpoint.
///
/// OAuth tokens are fetched per call and never cached.
#[derive(Clone)]
pub struct VerifierClient {
    http: Client,
    config: VerifierConfig,
}

impl VerifierClient {
    #[must_use]
    pub fn new(http: Client, config: VerifierConfig) -> Self {
        Self { http, config }
    }

    /// Verification endpoint, if configured.
    pub fn endpoint(&self) -> Option<&str> {
        non_empty(&self.config.url)
    }

    /// Token endpoint for the client-credentials exchange.
    fn token_url(&self, tenant: &str) -> String {
        match non_empty(&self.config.token_url) {
            Some(url) => url.to_string(),
            None => format!("https://login.microsoftonline.com/{tenant}/oauth2/v2.0/token"),
        }
    }

    /// Resolve a bearer credential: the static API key, else an OAuth token.
    ///
    /// Fails with `NoVerifierAuth` when neither is available.
    pub async fn credential(&self) -> Result<VerifierCredential, HubError> {
        if let Some(key) = non_empty(&self.config.api_key) {
            return Ok(VerifierCredential::ApiKey(key.to_string()));
        }

        let (Some(client_id), Some(client_secret), Some(tenant)) = (
            non_empty(&self.config.client_id),
            non_empty(&self.config.client_secret),
            non_empty(&self.config.tenant_id),
        ) else {
            return Err(HubError::NoVerifierAuth);
        };

        let url = self.token_url(tenant);
        debug!(url = %url, "Requesting verifier access token");

        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("scope", self.config.scope.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HubError::UpstreamAuth {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        token
            .access_token
            .filter(|t| !t.is_empty())
            .map(VerifierCredential::OAuth)
            .ok_or(HubError::NoVerifierAuth)
    }

    /// Forward `raw` unmodified to `endpoint` and return the parsed response.
    ///
    /// A response body that is not JSON parses as `Value::Null`, which never
    /// reads as a successful verification.
    pub async fn verify(
        &self,
        endpoint: &str,
        credential: &VerifierCredential,
        raw: String,
    ) -> Result<Value, HubError> {
        let response = self
            .http
            .post(endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", credential.secret()))
            .body(raw)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(HubError::UpstreamVerification {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body).unwrap_or(Value::Null))
    }
}
