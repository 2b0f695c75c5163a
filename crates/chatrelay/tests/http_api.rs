//! End-to-end tests for the persistent server and the serverless function.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::header::{
    ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
    CONTENT_TYPE,
};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::response::Response;
use chatrelay::function;
use chatrelay::llm::{CompletionProvider, ProviderError};
use chatrelay::relay::{Backend, ChatHandler, echo_reply};
use chatrelay::server::{AppState, build_app};
use http_body_util::BodyExt;
use tower::ServiceExt;

// ============================================================================
// Helpers
// ============================================================================

struct FlakyProvider;

#[async_trait]
impl CompletionProvider for FlakyProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if prompt == "fail" {
            return Err(ProviderError::Api {
                status: 503,
                message: "model overloaded".to_string(),
            });
        }
        Ok(format!("reply to {prompt}"))
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

/// Outlives any server timeout used in these tests.
struct StalledProvider;

#[async_trait]
impl CompletionProvider for StalledProvider {
    async fn generate(&self, _prompt: &str) -> Result<String, ProviderError> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok("too late".to_string())
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

fn echo_handler() -> ChatHandler {
    ChatHandler::echo()
}

fn unconfigured_handler() -> ChatHandler {
    ChatHandler::new(Backend::Unconfigured, Duration::from_secs(5))
}

fn flaky_handler() -> ChatHandler {
    ChatHandler::new(
        Backend::Provider(Arc::new(FlakyProvider)),
        Duration::from_secs(5),
    )
}

fn app(handler: ChatHandler) -> Router {
    build_app(AppState::new(handler), 30)
}

fn request(method: Method, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn call(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, String) {
    let response = app.clone().oneshot(req).await.unwrap();
    split(response).await
}

async fn split(response: Response) -> (StatusCode, HeaderMap, String) {
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

fn assert_cors(headers: &HeaderMap) {
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, OPTIONS");
    assert_eq!(headers[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
}

// ============================================================================
// Server
// ============================================================================

#[tokio::test]
async fn unconfigured_provider_returns_config_error() {
    let app = app(unconfigured_handler());
    let (status, headers, body) = call(
        &app,
        request(Method::POST, "/api/chat", r#"{"message":"hello"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"API key not configured"}"#);
    assert_cors(&headers);
}

#[tokio::test]
async fn missing_message_is_bad_request() {
    for handler in [echo_handler(), unconfigured_handler(), flaky_handler()] {
        let app = app(handler);
        for payload in ["{}", r#"{"message":""}"#, r#"{"message":"   "}"#, "{not json", ""] {
            let (status, headers, body) =
                call(&app, request(Method::POST, "/api/chat", payload)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "payload {payload:?}");
            assert_eq!(body, r#"{"error":"Message is required"}"#);
            assert_cors(&headers);
        }
    }
}

#[tokio::test]
async fn echo_backend_replies() {
    let app = app(echo_handler());
    let (status, _, body) =
        call(&app, request(Method::POST, "/api/chat", r#"{"message":"hi"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["reply"], echo_reply("hi"));
    assert!(json["reply"].as_str().unwrap().starts_with("Echo: hi"));
}

#[tokio::test]
async fn body_is_parsed_without_content_type() {
    let app = app(echo_handler());
    let req = Request::builder()
        .method(Method::POST)
        .uri("/api/chat")
        .body(Body::from(r#"{"message":"plain"}"#))
        .unwrap();
    let (status, _, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let app = app(echo_handler());
    for method in [Method::PUT, Method::GET, Method::DELETE, Method::PATCH] {
        let (status, headers, body) = call(&app, request(method.clone(), "/api/chat", "")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "method {method}");
        assert_eq!(body, r#"{"error":"Method not allowed"}"#);
        assert_cors(&headers);
    }
}

#[tokio::test]
async fn preflight_returns_empty_ok() {
    for handler in [echo_handler(), unconfigured_handler()] {
        let app = app(handler);
        let (status, headers, body) = call(&app, request(Method::OPTIONS, "/api/chat", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert_cors(&headers);
    }
}

#[tokio::test]
async fn provider_failure_is_reported_and_server_keeps_serving() {
    let app = app(flaky_handler());

    let (status, headers, body) =
        call(&app, request(Method::POST, "/api/chat", r#"{"message":"fail"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        r#"{"error":"Failed to process chat request","details":"api error (status 503): model overloaded"}"#
    );
    assert_cors(&headers);

    let (status, _, body) =
        call(&app, request(Method::POST, "/api/chat", r#"{"message":"again"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"reply":"reply to again"}"#);
}

#[tokio::test]
async fn server_timeout_is_json_with_cors() {
    let handler = ChatHandler::new(
        Backend::Provider(Arc::new(StalledProvider)),
        Duration::from_secs(30),
    );
    let app = build_app(AppState::new(handler), 1);

    let (status, headers, body) =
        call(&app, request(Method::POST, "/api/chat", r#"{"message":"hi"}"#)).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(headers[CONTENT_TYPE], "application/json");
    assert_eq!(body, r#"{"error":"Request timed out"}"#);
    assert_cors(&headers);
}

#[tokio::test]
async fn health_is_idempotent() {
    let app = app(unconfigured_handler());
    for _ in 0..3 {
        let (status, headers, body) = call(&app, request(Method::GET, "/health", "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_cors(&headers);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "healthy");
        let timestamp = json["timestamp"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
        assert!(timestamp.ends_with('Z'));
    }
}

#[tokio::test]
async fn unknown_route_is_json_not_found() {
    let app = app(echo_handler());
    let (status, headers, body) = call(&app, request(Method::GET, "/nope", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Not found"}"#);
    assert_cors(&headers);
}

#[tokio::test]
async fn concurrent_requests_are_independent() {
    let app = app(flaky_handler());
    let mut tasks = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            let payload = format!(r#"{{"message":"m{i}"}}"#);
            call(&app, request(Method::POST, "/api/chat", &payload)).await
        }));
    }
    for (i, task) in tasks.into_iter().enumerate() {
        let (status, _, body) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!(r#"{{"reply":"reply to m{i}"}}"#));
    }
}

// ============================================================================
// Serverless function vs server
// ============================================================================

#[tokio::test]
async fn function_and_server_produce_identical_responses() {
    let cases = [
        (Method::POST, r#"{"message":"hi"}"#),
        (Method::POST, r#"{"message":"fail"}"#),
        (Method::POST, "{}"),
        (Method::POST, "garbage"),
        (Method::PUT, ""),
        (Method::OPTIONS, ""),
    ];

    let makers: [fn() -> ChatHandler; 3] = [echo_handler, unconfigured_handler, flaky_handler];
    for make in makers {
        let server = app(make());
        let handler = make();

        for (method, payload) in &cases {
            let from_server =
                call(&server, request(method.clone(), "/api/chat", payload)).await;
            let from_function = split(
                function::invoke(&handler, request(method.clone(), "/api/chat", payload)).await,
            )
            .await;

            assert_eq!(from_server.0, from_function.0, "{method} {payload}");
            assert_eq!(from_server.2, from_function.2, "{method} {payload}");
            assert_cors(&from_server.1);
            assert_cors(&from_function.1);
        }
    }
}
