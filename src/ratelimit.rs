//! Fixed-window per-session rate limiting.
//!
//! A window opens on the first accepted request and admits `limit` requests
//! until `window` has elapsed. Bursts straddling a window boundary are
//! allowed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::RateLimitConfig;

/// Store key prefix for rate windows.
pub const RATE_KEY_PREFIX: &str = "rate:";

/// Store key for a session's rate window.
pub fn rate_key(session_id: &str) -> String {
    format!("{RATE_KEY_PREFIX}{session_id}")
}

// ============================================================================
// Types
// ============================================================================

/// Limit and window length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub limit: u32,
    pub window: Duration,
}

impl Default for RatePolicy {
    fn default() -> Self {
        Self {
            limit: 5,
            window: Duration::milliseconds(60_000),
        }
    }
}

impl From<&RateLimitConfig> for RatePolicy {
    fn from(config: &RateLimitConfig) -> Self {
        Self {
            limit: config.limit,
            window: i64::try_from(config.window_ms)
                .ok()
                .and_then(Duration::try_milliseconds)
                .unwrap_or(Duration::MAX),
        }
    }
}

/// Persisted counter: requests accepted since `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateWindow {
    pub count: u32,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start: DateTime<Utc>,
}

/// Outcome of a rate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    /// Rejected; the window resets in `retry_after_secs`.
    Limited { retry_after_secs: u64 },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

// ============================================================================
// Check
// ============================================================================

/// Apply one request to `current`.
///
/// Returns the decision and, when allowed, the window to persist. A rejected
/// request leaves the stored window untouched.
pub fn check(
    current: Option<RateWindow>,
    policy: RatePolicy,
    now: DateTime<Utc>,
) -> (RateDecision, Option<RateWindow>) {
    let window = match current {
        Some(w) if now - w.start <= policy.window => w,
        _ => {
            let fresh = RateWindow {
                count: 1,
                start: now,
            };
            return (RateDecision::Allowed, Some(fresh));
        }
    };

    if window.count >= policy.limit {
        let remaining_ms = window
            .start
            .checked_add_signed(policy.window)
            .map_or(i64::MAX, |reset| (reset - now).num_milliseconds());
        let retry_after_secs = (remaining_ms.max(0) as u64).div_ceil(1000).max(1);
        return (RateDecision::Limited { retry_after_secs }, None);
    }

    let next = RateWindow {
        count: window.count + 1,
        ..window
    };
    (RateDecision::Allowed, Some(next))
}
