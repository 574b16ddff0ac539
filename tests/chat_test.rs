//! Chat against a stubbed completion service.

mod common;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{body_json, send, test_app_with};
use linkhub::config::Config;

fn completion_app(server: &MockServer) -> Router {
    let mut config = Config::default();
    config.chat.api_key = Some("sk-test".to_string());
    config.chat.base_url = format!("{}/v1", server.uri());
    test_app_with(&config)
}

fn chat(session: &str, text: &str) -> Request<Body> {
    Request::post("/chat")
        .header("x-session-id", session)
        .body(Body::from(text.to_string()))
        .unwrap()
}

fn completion(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    }))
}

#[tokio::test]
async fn test_completion_reply_is_trimmed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "messages": [{"role": "user", "content": "tell me a joke"}]
        })))
        .respond_with(completion("  Why did the crab cross the road?\n"))
        .expect(1)
        .mount(&server)
        .await;

    let response = send(&completion_app(&server), chat("s1", "  tell me a joke  ")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"reply": "Why did the crab cross the road?", "sessionId": "s1"})
    );
}

#[tokio::test]
async fn test_history_maps_bot_turns_to_assistant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("pong"))
        .mount(&server)
        .await;

    let app = completion_app(&server);
    send(&app, chat("s2", "ping")).await;
    send(&app, chat("s2", "again")).await;

    let requests = server.received_requests().await.unwrap();
    let last: serde_json::Value = requests.last().unwrap().body_json().unwrap();
    assert_eq!(
        last["messages"],
        json!([
            {"role": "user", "content": "ping"},
            {"role": "assistant", "content": "pong"},
            {"role": "user", "content": "again"}
        ])
    );
}

#[tokio::test]
async fn test_completion_error_status_is_reported_in_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let response = send(&completion_app(&server), chat("s3", "hello")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["reply"], "LLM error: 500");
}

#[tokio::test]
async fn test_undecodable_completion_is_request_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let response = send(&completion_app(&server), chat("s4", "hello")).await;
    assert_eq!(body_json(response).await["reply"], "LLM request failed");
}

#[tokio::test]
async fn test_empty_completion_falls_back_to_rules() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion(""))
        .mount(&server)
        .await;

    let response = send(&completion_app(&server), chat("s5", "what links?")).await;
    assert_eq!(
        body_json(response).await["reply"],
        "Try: /, https://mrrainbowsmoke.com, https://github.com/rainbowkillah"
    );
}

#[tokio::test]
async fn test_rate_limit_applies_before_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(completion("ok"))
        .expect(5)
        .mount(&server)
        .await;

    let app = completion_app(&server);
    for _ in 0..5 {
        assert_eq!(send(&app, chat("s6", "x")).await.status(), StatusCode::OK);
    }
    assert_eq!(
        send(&app, chat("s6", "x")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
}
