//! Per-session conversation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::llm::{Message, Role};

/// Store key prefix for conversation logs.
pub const CONVO_KEY_PREFIX: &str = "convo:";

/// Number of trailing turns sent to the completion service.
pub const CONTEXT_WINDOW: usize = 6;

pub fn convo_key(session_id: &str) -> String {
    format!("{CONVO_KEY_PREFIX}{session_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Bot,
}

/// One entry of a conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(TurnRole::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(TurnRole::Bot, text)
    }

    fn new(role: TurnRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            ts: Utc::now(),
        }
    }
}

impl From<&ConversationTurn> for Message {
    fn from(turn: &ConversationTurn) -> Self {
        let role = match turn.role {
            TurnRole::User => Role::User,
            TurnRole::Bot => Role::Assistant,
        };
        Message::text(role, &turn.text)
    }
}

/// The last `n` turns of `log`, oldest first.
pub fn trailing(log: &[ConversationTurn], n: usize) -> &[ConversationTurn] {
    &log[log.len().saturating_sub(n)..]
}
