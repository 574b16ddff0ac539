//! Hub actor command protocol and error types.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::admin::AdminSession;
use crate::chat::ConversationTurn;
use crate::links::LinkRecord;
use crate::ratelimit::{RateDecision, RatePolicy};
use crate::store::StorageError;

// ============================================================================
// Hub Command
// ============================================================================

/// Commands that can be sent to a hub actor.
///
/// Every read-modify-write is a single command, so the actor applies it
/// without interleaving.
pub enum HubCommand {
    // Links
    ListLinks {
        reply: oneshot::Sender<Result<Vec<LinkRecord>, ActorError>>,
    },
    UpsertLink {
        record: LinkRecord,
        reply: oneshot::Sender<Result<String, ActorError>>,
    },
    RemoveLink {
        slug: String,
        reply: oneshot::Sender<Result<(), ActorError>>,
    },

    // Admin sessions
    PutAdminSession {
        session: AdminSession,
        reply: oneshot::Sender<Result<(), ActorError>>,
    },
    GetAdminSession {
        token: String,
        reply: oneshot::Sender<Result<Option<AdminSession>, ActorError>>,
    },

    // Rate limiting
    CheckRateLimit {
        session_id: String,
        policy: RatePolicy,
        now: DateTime<Utc>,
        reply: oneshot::Sender<Result<RateDecision, ActorError>>,
    },

    // Conversations
    AppendTurn {
        session_id: String,
        turn: ConversationTurn,
        /// Number of trailing turns to return after the append.
        window: usize,
        reply: oneshot::Sender<Result<Vec<ConversationTurn>, ActorError>>,
    },
    GetConversation {
        session_id: String,
        reply: oneshot::Sender<Result<Vec<ConversationTurn>, ActorError>>,
    },
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors from actor operations.
#[derive(Debug, Error)]
pub enum ActorError {
    /// The actor has shut down.
    #[error("actor has shut down")]
    ActorShutdown,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

// ============================================================================
// Constants
// ============================================================================

/// Name of the single actor backing the HTTP surface.
pub const HUB_ACTOR_NAME: &str = "global-chat";

/// Channel capacity for commands.
///
/// If this fills up, callers block on send().
pub const CHANNEL_CAPACITY: usize = 256;
