//! Tolerant reading of verification-service responses.
//!
//! Verification services disagree on response shape, so every accessor here
//! returns an `Option` and treats an unexpected shape as "absent".

use serde_json::Value;

use super::session::VerifiedClaim;

/// Top-level fields that may carry the verification verdict.
const SUCCESS_FLAG_PATHS: [&str; 4] = ["verificationResult", "status", "isValid", "result.isValid"];

/// Fields that may carry the verified credentials, in lookup order.
const CREDENTIAL_PATHS: [&str; 4] = [
    "verifiableCredential",
    "result.verifiableCredential",
    "verifiableCredentials",
    "result.verifiableCredentials",
];

/// Walk a dot-separated path through nested objects.
///
/// Numeric segments index into arrays.
pub fn lookup_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// `true` when no non-empty `errors` array is present and any known verdict
/// field reads `"Success"`, `"success"` or `true`.
pub fn is_success(response: &Value) -> bool {
    let has_errors = response
        .get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| !errors.is_empty());
    if has_errors {
        return false;
    }

    SUCCESS_FLAG_PATHS
        .iter()
        .filter_map(|path| lookup_path(response, path))
        .any(|flag| match flag {
            Value::String(s) => s == "Success" || s == "success",
            Value::Bool(b) => *b,
            _ => false,
        })
}

/// First credential of the first credential list found.
///
/// Lookup stops at the first field present, even when it is not an array,
/// so a malformed primary field never falls through to a secondary one.
pub fn first_credential(response: &Value) -> Option<&Value> {
    CREDENTIAL_PATHS
        .iter()
        .find_map(|path| lookup_path(response, path).filter(|v| !v.is_null()))
        .and_then(Value::as_array)
        .and_then(|credentials| credentials.first())
}

/// Issuer of a credential: `issuer` as a string or as an object with `id`,
/// else the JWT-style `iss`.
fn credential_issuer(credential: &Value) -> Option<String> {
    let issuer = credential.get("issuer").or_else(|| credential.get("iss"))?;
    match issuer {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map.get("id").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

// ============================================================================
// AdminClaimPolicy
// ============================================================================

/// Decides whether a verified credential grants admin rights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminClaimPolicy {
    /// Dot path into the credential, e.g. `credentialSubject.role`.
    pub claim_path: String,
    /// Expected string value at `claim_path`.
    pub claim_value: String,
}

impl AdminClaimPolicy {
    pub fn new(claim_path: impl Into<String>, claim_value: impl Into<String>) -> Self {
        Self {
            claim_path: claim_path.into(),
            claim_value: claim_value.into(),
        }
    }

    /// Evaluate a verification response.
    ///
    /// Admin when the configured claim equals the expected value, or the
    /// subject carries `admin: true`, or the subject's `role` equals the
    /// expected value. Returns `None` for a non-admin.
    pub fn evaluate(&self, response: &Value) -> Option<VerifiedClaim> {
        let credential = first_credential(response)?;
        let claim = lookup_path(credential, &self.claim_path).filter(|v| !v.is_null());

        let claim_matches = claim.and_then(Value::as_str) == Some(self.claim_value.as_str());
        let subject = credential.get("credentialSubject");
        let subject_admin = subject
            .and_then(|s| s.get("admin"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let subject_role = subject
            .and_then(|s| s.get("role"))
            .and_then(Value::as_str)
            == Some(self.claim_value.as_str());

        (claim_matches || subject_admin || subject_role).then(|| VerifiedClaim {
            issuer: credential_issuer(credential),
            claim_path: self.claim_path.clone(),
            claim_value: claim.cloned(),
        })
    }
}

impl Default for AdminClaimPolicy {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_ADMIN_CLAIM_PATH,
            crate::config::DEFAULT_ADMIN_CLAIM_VALUE,
        )
    }
}
