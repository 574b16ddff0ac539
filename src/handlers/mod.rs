//! HTTP request handlers.

pub mod admin_auth;
mod chat;
mod health;
mod links;
pub(crate) mod problem_details;
mod rejection;
mod verify;
mod version;

pub use chat::{chat_message, chat_status};
pub use health::livez;
pub use links::{add_link, delete_link, list_links};
pub use rejection::problem_for_bare_errors;
pub use verify::verify;
pub use version::version;

use crate::error::HubError;

/// Fallback for unknown paths and unsupported methods.
pub async fn not_found() -> HubError {
    HubError::NotFound
}
