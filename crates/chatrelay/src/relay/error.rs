//! Handler error taxonomy and its HTTP mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chatrelay_types::ErrorResponse;
use thiserror::Error;

use crate::llm::ProviderError;

/// Terminal per-request failures. None of them is retried.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Missing, null, non-string or blank `message`.
    #[error("Message is required")]
    Validation,

    /// Anything but `POST` (or a pre-flight `OPTIONS`) on the chat route.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Provider mode without an API key.
    #[error("API key not configured")]
    Config,

    /// The provider call failed.
    #[error("Failed to process chat request")]
    Upstream(#[source] ProviderError),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            HandlerError::Validation => StatusCode::BAD_REQUEST,
            HandlerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            HandlerError::Config | HandlerError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> ErrorResponse {
        match self {
            HandlerError::Upstream(cause) => {
                ErrorResponse::with_details(self.to_string(), cause.to_string())
            }
            _ => ErrorResponse::new(self.to_string()),
        }
    }
}

impl From<ProviderError> for HandlerError {
    fn from(err: ProviderError) -> Self {
        HandlerError::Upstream(err)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
