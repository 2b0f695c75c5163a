//! Serverless entry point.
//!
//! A hosting platform calls [`invoke`] once per request. The path is ignored:
//! the function *is* the chat route. Method gating and CORS match the
//! persistent server exactly, so both shapes return the same bytes.

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::{IntoResponse, Response};

use crate::cors;
use crate::handlers;
use crate::relay::{ChatHandler, HandlerError};

/// Handle one request.
pub async fn invoke(handler: &ChatHandler, request: Request<Body>) -> Response {
    let mut response = dispatch(handler, request).await;
    cors::insert_headers(response.headers_mut());
    response
}

async fn dispatch(handler: &ChatHandler, request: Request<Body>) -> Response {
    match *request.method() {
        Method::OPTIONS => handlers::preflight().await,
        Method::POST => handlers::respond(handler, request.into_body()).await,
        _ => HandlerError::MethodNotAllowed.into_response(),
    }
}
