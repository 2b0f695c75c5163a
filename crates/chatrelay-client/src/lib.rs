//! HTTP client for the chatrelay API.
//!
//! Mirrors what the browser UI does: post the text to `/api/chat` and show
//! the reply, or a generic apology when anything goes wrong.

use chatrelay_types::{
    CHAT_PATH, ChatRequest, ChatResponse, ErrorResponse, HEALTH_PATH, HealthResponse,
};
use reqwest::Client;
use thiserror::Error;
use tracing::warn;

/// Base URL used when [`API_URL_ENV`] is unset.
pub const DEFAULT_API_URL: &str = "http://localhost:3001";

/// Environment variable holding the server base URL.
pub const API_URL_ENV: &str = "CHATRELAY_API_URL";

/// Reply shown in place of any transport or server failure.
pub const FALLBACK_REPLY: &str = "Sorry, I encountered an error.";

/// Errors from talking to a chatrelay server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("http request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-2xx status
    #[error("server error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Client for one chatrelay server.
#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Post `message` and return the reply.
    pub async fn send(&self, message: &str) -> Result<String, ClientError> {
        let url = format!("{}{}", self.base_url, CHAT_PATH);
        let response = self
            .client
            .post(&url)
            .json(&ChatRequest::new(message))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status,
                message: error_message(&body),
            });
        }

        let reply: ChatResponse = response.json().await?;
        Ok(reply.reply)
    }

    /// Send user input the way the chat UI does.
    ///
    /// Blank input is not sent and yields `None`. Any failure is logged and
    /// replaced by [`FALLBACK_REPLY`].
    pub async fn reply_or_fallback(&self, input: &str) -> Option<String> {
        if input.trim().is_empty() {
            return None;
        }
        match self.send(input).await {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(error = %e, "Chat request failed");
                Some(FALLBACK_REPLY.to_string())
            }
        }
    }

    /// Query the liveness endpoint.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}{}", self.base_url, HEALTH_PATH);
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api {
                status,
                message: error_message(&body),
            });
        }

        Ok(response.json().await?)
    }
}

/// Render an error body as `error` or `error: details`, else the raw text.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorResponse>(body).ok() {
        Some(ErrorResponse {
            error,
            details: Some(details),
        }) => format!("{error}: {details}"),
        Some(ErrorResponse { error, .. }) => error,
        None => body.trim().to_string(),
    }
}
