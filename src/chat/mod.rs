//! Conversation manager.
//!
//! A chat message is rate limited per session, appended to the session log,
//! answered by the completion service when one is configured and by the rule
//! table otherwise, and the reply appended in turn.

mod conversation;
mod rules;

use std::sync::Arc;

use axum::http::HeaderMap;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{ChatConfig, RateLimitConfig, non_empty};
use crate::error::HubError;
use crate::hub::HubHandle;
use crate::llm::{ChatRequest, LLMError, LLMProvider, Message, OpenAICompatibleProvider};
use crate::ratelimit::{RateDecision, RatePolicy};

pub use conversation::{
    CONTEXT_WINDOW, CONVO_KEY_PREFIX, ConversationTurn, TurnRole, convo_key, trailing,
};
pub use rules::{EMPTY_REPLY, FALLBACK_REPLY, rule_reply};

/// Header carrying the caller's session id.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Body of a `POST /chat` reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub reply: String,
    pub session_id: String,
}

/// Session id from the `X-Session-Id` header, else the `sid` query value,
/// else a fresh UUID.
pub fn resolve_session_id(headers: &HeaderMap, sid: Option<&str>) -> String {
    headers
        .get(SESSION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| sid.map(str::trim).filter(|v| !v.is_empty()))
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_string)
}

#[derive(Clone)]
pub struct ChatService {
    provider: Option<Arc<dyn LLMProvider>>,
    model: String,
    rate: RatePolicy,
}

impl ChatService {
    pub fn new(provider: Option<Arc<dyn LLMProvider>>, model: String, rate: RatePolicy) -> Self {
        Self {
            provider,
            model,
            rate,
        }
    }

    /// Completion is enabled only when an API key is configured.
    pub fn from_config(http: Client, chat: &ChatConfig, rate: &RateLimitConfig) -> Self {
        let provider = non_empty(&chat.api_key).map(|key| {
            Arc::new(OpenAICompatibleProvider::new(
                http,
                chat.base_url.clone(),
                Some(key.to_string()),
            )) as Arc<dyn LLMProvider>
        });

        Self::new(provider, chat.model.clone(), RatePolicy::from(rate))
    }

    pub fn has_completion(&self) -> bool {
        self.provider.is_some()
    }

    /// Handle one inbound message for `session_id`.
    pub async fn handle_message(
        &self,
        hub: &HubHandle,
        session_id: String,
        message: &str,
    ) -> Result<ChatReply, HubError> {
        let text = message.trim();

        if let RateDecision::Limited { retry_after_secs } =
            hub.check_rate_limit(&session_id, self.rate, Utc::now()).await?
        {
            debug!(session_id = %session_id, retry_after_secs, "Chat rate limited");
            return Err(HubError::RateLimited { retry_after_secs });
        }

        let history = hub
            .append_turn(&session_id, ConversationTurn::user(text), CONTEXT_WINDOW)
            .await?;

        let reply = match self.complete(&history).await {
            Some(reply) if !reply.is_empty() => reply,
            _ => rule_reply(text).to_string(),
        };

        if let Err(e) = hub
            .append_turn(&session_id, ConversationTurn::bot(&reply), 0)
            .await
        {
            warn!(session_id = %session_id, error = %e, "Failed to persist bot reply");
        }

        Ok(ChatReply { reply, session_id })
    }

    /// Ask the completion service, if any.
    ///
    /// Failures become literal replies rather than errors.
    async fn complete(&self, history: &[ConversationTurn]) -> Option<String> {
        let provider = self.provider.as_ref()?;
        let messages = history.iter().map(Message::from).collect();

        match provider.chat(ChatRequest::new(&self.model, messages)).await {
            Ok(response) => Some(response.first_content().to_string()),
            Err(LLMError::Api { status, message }) => {
                warn!(status, message = %message, "Completion API returned an error");
                Some(format!("LLM error: {status}"))
            }
            Err(LLMError::Request(e)) => {
                warn!(error = %e, "Completion request failed");
                Some("LLM request failed".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{ActorRegistry, StoreFactory};
    use crate::llm::{ChatResponse, Role};
    use async_trait::async_trait;
    use axum::http::HeaderValue;
    use std::sync::Mutex;

    /// Provider returning a fixed reply and recording requests.
    struct FixedProvider {
        reply: String,
        seen: Mutex<Vec<Vec<(Role, String)>>>,
    }

    #[async_trait]
    impl LLMProvider for FixedProvider {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LLMError> {
            self.seen.lock().unwrap().push(
                request
                    .messages
                    .into_iter()
                    .map(|m| (m.role, m.content))
                    .collect(),
            );
            let body = serde_json::json!({"choices": [{"message": {"content": self.reply}}]});
            Ok(serde_json::from_value(body).unwrap())
        }
    }

    struct FailingProvider(u16);

    #[async_trait]
    impl LLMProvider for FailingProvider {
        async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, LLMError> {
            Err(LLMError::Api {
                status: self.0,
                message: "nope".to_string(),
            })
        }
    }

    async fn hub() -> (ActorRegistry, HubHandle) {
        let registry = ActorRegistry::new(StoreFactory::Memory);
        let hub = registry.get_or_spawn("chat-test").await;
        (registry, hub)
    }

    #[test]
    fn test_resolve_session_id_precedence() {
        let mut headers = HeaderMap::new();
        assert_eq!(resolve_session_id(&headers, Some("q")), "q");

        headers.insert(SESSION_ID_HEADER, HeaderValue::from_static("h"));
        assert_eq!(resolve_session_id(&headers, Some("q")), "h");
    }

    #[test]
    fn test_resolve_session_id_generates_uuid() {
        let id = resolve_session_id(&HeaderMap::new(), Some(""));
        assert!(Uuid::parse_str(&id).is_ok());
    }

    #[tokio::test]
    async fn test_rule_reply_without_provider() {
        let (_registry, hub) = hub().await;
        let service = ChatService::new(None, "m".to_string(), RatePolicy::default());

        let reply = service
            .handle_message(&hub, "s".to_string(), "What domains do you have?")
            .await
            .unwrap();

        assert!(reply.reply.starts_with("Primary domains:"));
        assert_eq!(reply.session_id, "s");

        let log = hub.conversation("s").await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].role, TurnRole::User);
        assert_eq!(log[1].role, TurnRole::Bot);
        assert_eq!(log[1].text, reply.reply);
    }

    #[tokio::test]
    async fn test_provider_reply_and_context_window() {
        let (_registry, hub) = hub().await;
        let provider = Arc::new(FixedProvider {
            reply: "  from the model  ".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let service = ChatService::new(
            Some(provider.clone() as Arc<dyn LLMProvider>),
            "m".to_string(),
            RatePolicy {
                limit: 100,
                ..RatePolicy::default()
            },
        );

        for i in 0..4 {
            let reply = service
                .handle_message(&hub, "s".to_string(), &format!("q{i}"))
                .await
                .unwrap();
            assert_eq!(reply.reply, "from the model");
        }

        let seen = provider.seen.lock().unwrap();
        let last = seen.last().unwrap();
        assert_eq!(last.len(), CONTEXT_WINDOW);
        assert_eq!(last.first().unwrap().0, Role::Assistant);
        assert_eq!(last.last().unwrap(), &(Role::User, "q3".to_string()));
    }

    #[tokio::test]
    async fn test_empty_completion_falls_back_to_rules() {
        let (_registry, hub) = hub().await;
        let provider = Arc::new(FixedProvider {
            reply: "   ".to_string(),
            seen: Mutex::new(Vec::new()),
        });
        let service = ChatService::new(
            Some(provider as Arc<dyn LLMProvider>),
            "m".to_string(),
            RatePolicy::default(),
        );

        let reply = service
            .handle_message(&hub, "s".to_string(), "help")
            .await
            .unwrap();
        assert!(reply.reply.starts_with("You can ask:"));
    }

    #[tokio::test]
    async fn test_api_error_becomes_literal_reply() {
        let (_registry, hub) = hub().await;
        let service = ChatService::new(
            Some(Arc::new(FailingProvider(503)) as Arc<dyn LLMProvider>),
            "m".to_string(),
            RatePolicy::default(),
        );

        let reply = service
            .handle_message(&hub, "s".to_string(), "hello")
            .await
            .unwrap();
        assert_eq!(reply.reply, "LLM error: 503");
    }

    #[tokio::test]
    async fn test_sixth_message_is_rate_limited() {
        let (_registry, hub) = hub().await;
        let service = ChatService::new(None, "m".to_string(), RatePolicy::default());

        for _ in 0..5 {
            service
                .handle_message(&hub, "s".to_string(), "hi")
                .await
                .unwrap();
        }
        let err = service
            .handle_message(&hub, "s".to_string(), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, HubError::RateLimited { retry_after_secs } if retry_after_secs > 0));

        // Rejected messages are not logged.
        assert_eq!(hub.conversation("s").await.unwrap().len(), 10);
    }
}
