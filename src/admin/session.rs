//! Admin session records and bearer token extraction.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Store key prefix for admin sessions.
pub const ADMIN_KEY_PREFIX: &str = "admin:";

/// Fallback header carrying a raw admin token.
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Store key for an admin session.
pub fn admin_key(token: &str) -> String {
    format!("{ADMIN_KEY_PREFIX}{token}")
}

/// A short-lived admin capability minted after a successful verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminSession {
    pub token: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires: DateTime<Utc>,
    pub verified: VerifiedClaim,
}

impl AdminSession {
    /// Valid up to and including `expires`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires
    }
}

/// What the verification established about the presenter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedClaim {
    #[serde(default)]
    pub issuer: Option<String>,
    pub claim_path: String,
    #[serde(default)]
    pub claim_value: Option<Value>,
}

/// Pull the admin token from `Authorization` or `X-Admin-Token`.
///
/// `Authorization` wins when both are present. A `Bearer` scheme prefix is
/// stripped case-insensitively; any other value is used verbatim.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers
        .get(AUTHORIZATION)
        .or_else(|| headers.get(ADMIN_TOKEN_HEADER))?
        .to_str()
        .ok()?
        .trim();

    let token = strip_bearer(raw);
    (!token.is_empty()).then(|| token.to_string())
}

fn strip_bearer(value: &str) -> &str {
    let Some(scheme) = value.get(..6) else {
        return value;
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return value;
    }

    let rest = &value[6..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        rest.trim_start()
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn test_extract_bearer_token() {
        let map = headers(&[("authorization", "Bearer abc-123")]);
        assert_eq!(extract_token(&map).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_extract_bearer_case_insensitive() {
        let map = headers(&[("authorization", "bearer   abc")]);
        assert_eq!(extract_token(&map).as_deref(), Some("abc"));
    }

    #[test]
    fn test_extract_admin_token_header() {
        let map = headers(&[("x-admin-token", "raw-token")]);
        assert_eq!(extract_token(&map).as_deref(), Some("raw-token"));
    }

    #[test]
    fn test_authorization_wins_over_admin_header() {
        let map = headers(&[("authorization", "Bearer a"), ("x-admin-token", "b")]);
        assert_eq!(extract_token(&map).as_deref(), Some("a"));
    }

    #[test]
    fn test_extract_missing_or_empty() {
        assert_eq!(extract_token(&HeaderMap::new()), None);
        assert_eq!(extract_token(&headers(&[("authorization", "Bearer ")])), None);
    }

    #[test]
    fn test_bearer_without_separator_is_verbatim() {
        let map = headers(&[("authorization", "Bearerabc")]);
        assert_eq!(extract_token(&map).as_deref(), Some("Bearerabc"));
    }

    #[test]
    fn test_session_validity_is_inclusive() {
        let now = Utc::now();
        let session = AdminSession {
            token: "t".to_string(),
            created: now - Duration::minutes(15),
            expires: now,
            verified: VerifiedClaim {
                issuer: None,
                claim_path: "credentialSubject.role".to_string(),
                claim_value: None,
            },
        };

        assert!(session.is_valid_at(now));
        assert!(!session.is_valid_at(now + Duration::milliseconds(1)));
    }

    #[test]
    fn test_session_serialized_shape() {
        let session = AdminSession {
            token: "t".to_string(),
            created: DateTime::from_timestamp_millis(1_000).unwrap(),
            expires: DateTime::from_timestamp_millis(901_000).unwrap(),
            verified: VerifiedClaim {
                issuer: Some("did:example:issuer".to_string()),
                claim_path: "credentialSubject.role".to_string(),
                claim_value: Some(Value::from("admin")),
            },
        };

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["expires"], 901_000);
        assert_eq!(json["verified"]["claimPath"], "credentialSubject.role");
        assert_eq!(json["verified"]["claimValue"], "admin");
    }
}
