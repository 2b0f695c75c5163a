//! Chat route handlers.

use axum::Json;
use axum::body::{Body, to_bytes};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chatrelay_types::ErrorResponse;
use tracing::debug;

use crate::relay::{self, ChatHandler, HandlerError};
use crate::server::AppState;

/// Largest chat body accepted; matches axum's default extractor limit.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// POST /api/chat
pub async fn chat(State(state): State<AppState>, request: Request) -> Response {
    respond(&state.handler, request.into_body()).await
}

/// OPTIONS /api/chat
pub async fn preflight() -> Response {
    StatusCode::OK.into_response()
}

/// Any other method on /api/chat.
pub async fn method_not_allowed() -> Response {
    HandlerError::MethodNotAllowed.into_response()
}

/// Unknown routes.
pub async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found"))).into_response()
}

/// Read a chat body, run it through the handler and render the outcome.
///
/// Shared by the server route and the serverless function. A body that
/// cannot be read (too large, broken stream) counts as a missing message.
pub async fn respond(handler: &ChatHandler, body: Body) -> Response {
    let body = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "Failed to read chat body");
            return HandlerError::Validation.into_response();
        }
    };

    match handler.handle(relay::parse_request(&body)).await {
        Ok(reply) => (StatusCode::OK, Json(reply)).into_response(),
        Err(e) => e.into_response(),
    }
}
