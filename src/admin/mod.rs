//! Admin sessions gated by external presentation verification.
//!
//! ```text
//!  POST /verify ──▶ VerifierClient ──▶ verification service
//!                        │                 (API key or OAuth2 client credentials)
//!                        ▼
//!                  presentation::evaluate ──▶ AdminClaimPolicy
//!                        │
//!                        ▼
//!                  AdminSession stored as admin:<token> in the hub actor
//! ```
//!
//! Sessions end only by expiry; there is no revocation.

mod presentation;
mod service;
mod session;
mod verifier;

pub use presentation::{AdminClaimPolicy, first_credential, is_success, lookup_path};
pub use service::{AdminService, IssuedSession, authorize, require_admin};
pub use session::{
    ADMIN_KEY_PREFIX, ADMIN_TOKEN_HEADER, AdminSession, VerifiedClaim, admin_key, extract_token,
};
pub use verifier::{VerifierClient, VerifierCredential};
