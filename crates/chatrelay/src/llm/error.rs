//! Provider error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when calling the completion provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// API returned an error response
    #[error("api error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The provider refused to answer the prompt
    #[error("prompt blocked by provider: {0}")]
    Blocked(String),

    /// The response could not be turned into a reply
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// No reply within the configured bound
    #[error("provider did not respond within {}s", .0.as_secs_f64())]
    Timeout(Duration),
}

impl ProviderError {
    /// Build an `Api` error from a non-2xx response body.
    ///
    /// Providers wrap failures as `{"error": {"message": "..."}}`; the inner
    /// message is preferred and the raw body is the fallback.
    pub fn from_api_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| body.trim().to_string());
        ProviderError::Api { status, message }
    }
}
