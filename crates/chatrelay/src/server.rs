use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chatrelay_types::{CHAT_PATH, ErrorResponse, HEALTH_PATH};
use tower_http::timeout::TimeoutLayer;

use crate::cors;
use crate::handlers;
use crate::relay::ChatHandler;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<ChatHandler>,
}

impl AppState {
    pub fn new(handler: ChatHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

pub fn build_app(state: AppState, request_timeout_secs: u64) -> Router {
    Router::new()
        .route(
            HEALTH_PATH,
            get(handlers::health).fallback(handlers::method_not_allowed),
        )
        .route(
            CHAT_PATH,
            post(handlers::chat)
                .options(handlers::preflight)
                .fallback(handlers::method_not_allowed),
        )
        .fallback(handlers::not_found)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
        .layer(middleware::from_fn(render_timeout))
        .layer(middleware::from_fn(cors::apply))
        .with_state(state)
}

/// `TimeoutLayer` answers with an empty 408; give it the same JSON error shape
/// as every other failure.
async fn render_timeout(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }
    tracing::warn!("Request exceeded the server timeout");
    (
        StatusCode::REQUEST_TIMEOUT,
        Json(ErrorResponse::new("Request timed out")),
    )
        .into_response()
}
