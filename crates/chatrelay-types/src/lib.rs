//! Wire types shared by the chatrelay server and its clients.
//!
//! Every body exchanged over `/api/chat` and `/health` is defined here so the
//! server adapters and the client crate serialize exactly the same JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Route of the chat operation.
pub const CHAT_PATH: &str = "/api/chat";

/// Route of the liveness check.
pub const HEALTH_PATH: &str = "/health";

/// Body of `POST /api/chat`.
///
/// `message` is optional on the wire: a missing, null or non-string value is
/// a client error the server reports, not a deserialization failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }
}

/// Successful chat reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Error body returned for every non-2xx outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub const HEALTHY: &'static str = "healthy";

    /// A healthy status stamped at `at`, as RFC 3339 UTC with milliseconds.
    pub fn healthy_at(at: DateTime<Utc>) -> Self {
        Self {
            status: Self::HEALTHY.to_string(),
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
