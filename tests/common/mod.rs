//! Common test utilities.
#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use linkhub::config::Config;
use linkhub::hub::{ActorRegistry, StoreFactory};
use linkhub::server::{self, AppState};

/// Create a test `AppState` over an in-memory store.
pub fn test_app_state(config: &Config) -> AppState {
    let registry = ActorRegistry::new(StoreFactory::Memory);
    AppState::from_config(config, registry).unwrap()
}

/// Create a test app with default config: no verifier, no completion key.
pub fn test_app() -> Router {
    test_app_with(&Config::default())
}

pub fn test_app_with(config: &Config) -> Router {
    server::build_app(test_app_state(config), 30)
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Assert `response` is a problem document with `status` and `error` code.
pub async fn assert_problem(
    response: Response<Body>,
    status: StatusCode,
    code: &str,
) -> serde_json::Value {
    assert_eq!(response.status(), status);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
    let json = body_json(response).await;
    assert_eq!(json["status"], status.as_u16());
    assert_eq!(json["error"], code);
    json
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
