use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware;
use axum::routing::{delete, get, post};
use reqwest::Client;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::admin::{AdminService, VerifierClient};
use crate::chat::ChatService;
use crate::config::Config;
use crate::handlers;
use crate::hub::{ActorRegistry, HUB_ACTOR_NAME, HubHandle};

/// Maximum concurrent in-flight requests.
pub const DEFAULT_MAX_CONNECTIONS: usize = 256;

/// Request bodies above this size are rejected.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

// ============================================================================
// Application State
// ============================================================================

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub registry: ActorRegistry,
    pub admin: AdminService,
    pub chat: ChatService,
    pub max_connections: usize,
}

impl AppState {
    /// Wire services from config over an existing registry.
    ///
    /// One HTTP client, bounded by the request timeout, is shared by every
    /// upstream call.
    pub fn from_config(config: &Config, registry: ActorRegistry) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.server.request_timeout_seconds))
            .build()?;

        let verifier = VerifierClient::new(http.clone(), config.verifier.clone());
        Ok(Self {
            registry,
            admin: AdminService::from_config(verifier, &config.admin),
            chat: ChatService::from_config(http, &config.chat, &config.rate_limit),
            max_connections: DEFAULT_MAX_CONNECTIONS,
        })
    }

    /// Handle to the actor backing every route.
    pub async fn hub(&self) -> HubHandle {
        self.registry.get_or_spawn(HUB_ACTOR_NAME).await
    }
}

// ============================================================================
// Server Setup
// ============================================================================

pub fn build_app(state: AppState, request_timeout_seconds: u64) -> Router {
    let max_connections = state.max_connections;
    let admin_gate = || {
        middleware::from_fn_with_state(
            state.clone(),
            handlers::admin_auth::require_admin_session,
        )
    };

    let core = Router::new()
        .route(
            "/links",
            get(handlers::list_links)
                .merge(post(handlers::add_link).route_layer(admin_gate())),
        )
        .route(
            "/links/{*path}",
            delete(handlers::delete_link).route_layer(admin_gate()),
        )
        .route("/verify", post(handlers::verify))
        .route(
            "/chat",
            get(handlers::chat_status).post(handlers::chat_message),
        )
        .method_not_allowed_fallback(handlers::not_found);

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/version", get(handlers::version))
        .merge(core.clone())
        .nest("/api", core)
        // Unsupported methods on known paths answer 404 like unknown paths.
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .with_state(state)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_seconds),
        ))
        .layer(middleware::map_response(handlers::problem_for_bare_errors))
        .layer(ConcurrencyLimitLayer::new(max_connections))
        .layer(TraceLayer::new_for_http())
}
