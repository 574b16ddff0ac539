//! Handle for communicating with a hub actor.
//!
//! `HubHandle` is a thin wrapper around an `mpsc::Sender<HubCommand>` and is
//! cheap to clone.

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

use crate::admin::AdminSession;
use crate::chat::ConversationTurn;
use crate::links::LinkRecord;
use crate::ratelimit::{RateDecision, RatePolicy};

use super::actor_types::{ActorError, HubCommand};

#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    pub(crate) fn new(tx: mpsc::Sender<HubCommand>) -> Self {
        Self { tx }
    }

    /// Send a command built around a fresh reply channel and await the reply.
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T, ActorError>>) -> HubCommand,
    ) -> Result<T, ActorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| ActorError::ActorShutdown)?;

        reply_rx.await.map_err(|_| ActorError::ActorShutdown)?
    }

    // ------------------------------------------------------------------------
    // Links
    // ------------------------------------------------------------------------

    pub async fn list_links(&self) -> Result<Vec<LinkRecord>, ActorError> {
        self.request(|reply| HubCommand::ListLinks { reply }).await
    }

    /// Replace-by-slug insert. Returns the slug.
    pub async fn upsert_link(&self, record: LinkRecord) -> Result<String, ActorError> {
        self.request(|reply| HubCommand::UpsertLink { record, reply })
            .await
    }

    pub async fn remove_link(&self, slug: &str) -> Result<(), ActorError> {
        let slug = slug.to_string();
        self.request(|reply| HubCommand::RemoveLink { slug, reply })
            .await
    }

    // ------------------------------------------------------------------------
    // Admin sessions
    // ------------------------------------------------------------------------

    pub async fn put_admin_session(&self, session: AdminSession) -> Result<(), ActorError> {
        self.request(|reply| HubCommand::PutAdminSession { session, reply })
            .await
    }

    pub async fn admin_session(&self, token: &str) -> Result<Option<AdminSession>, ActorError> {
        let token = token.to_string();
        self.request(|reply| HubCommand::GetAdminSession { token, reply })
            .await
    }

    // ------------------------------------------------------------------------
    // Rate limiting
    // ------------------------------------------------------------------------

    /// Count one request against `session_id`'s window.
    pub async fn check_rate_limit(
        &self,
        session_id: &str,
        policy: RatePolicy,
        now: DateTime<Utc>,
    ) -> Result<RateDecision, ActorError> {
        let session_id = session_id.to_string();
        self.request(|reply| HubCommand::CheckRateLimit {
            session_id,
            policy,
            now,
            reply,
        })
        .await
    }

    // ------------------------------------------------------------------------
    // Conversations
    // ------------------------------------------------------------------------

    /// Append `turn` and return the last `window` turns including it.
    pub async fn append_turn(
        &self,
        session_id: &str,
        turn: ConversationTurn,
        window: usize,
    ) -> Result<Vec<ConversationTurn>, ActorError> {
        let session_id = session_id.to_string();
        self.request(|reply| HubCommand::AppendTurn {
            session_id,
            turn,
            window,
            reply,
        })
        .await
    }

    pub async fn conversation(&self, session_id: &str) -> Result<Vec<ConversationTurn>, ActorError> {
        let session_id = session_id.to_string();
        self.request(|reply| HubCommand::GetConversation { session_id, reply })
            .await
    }
}
