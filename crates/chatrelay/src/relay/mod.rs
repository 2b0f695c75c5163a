//! Transport-independent chat handler.
//!
//! Both the serverless function and the persistent server parse the body
//! with [`parse_request`] and answer through [`ChatHandler::handle`], so the
//! same input always produces the same outcome whatever the hosting model.

mod echo;
mod error;

use std::sync::Arc;
use std::time::Duration;

use chatrelay_types::{ChatRequest, ChatResponse};
use tracing::{debug, error, info, warn};

use crate::config::{ProviderConfig, ProviderMode, ProviderSettings};
use crate::llm::{CompletionProvider, GeminiProvider, ProviderError};

pub use echo::reply as echo_reply;
pub use error::HandlerError;

/// Where replies come from.
#[derive(Clone)]
pub enum Backend {
    /// Deterministic local echo.
    Echo,
    /// A remote provider with credentials.
    Provider(Arc<dyn CompletionProvider>),
    /// Provider mode selected but no API key available.
    Unconfigured,
}

impl Backend {
    /// Select the backend for `settings`, wiring Gemini when a key is present.
    pub fn from_config(
        settings: &ProviderSettings,
        credentials: Option<ProviderConfig>,
        client: reqwest::Client,
    ) -> Self {
        match (settings.mode, credentials) {
            (ProviderMode::Echo, _) => {
                info!("Using echo backend");
                Backend::Echo
            }
            (ProviderMode::Gemini, Some(credentials)) => {
                let provider = GeminiProvider::new(
                    client,
                    credentials.api_key,
                    settings.base_url.clone(),
                    settings.model.clone(),
                );
                info!(model = %settings.model, "Registered Gemini provider");
                Backend::Provider(Arc::new(provider))
            }
            (ProviderMode::Gemini, None) => {
                warn!(
                    "No API key configured. Set GEMINI_API_KEY or run with --echo; \
                    chat requests will fail until then."
                );
                Backend::Unconfigured
            }
        }
    }

    fn label(&self) -> &str {
        match self {
            Backend::Echo => "echo",
            Backend::Provider(p) => p.name(),
            Backend::Unconfigured => "unconfigured",
        }
    }
}

/// Validates chat requests and produces replies.
///
/// Holds no mutable state; share it behind an `Arc`.
pub struct ChatHandler {
    backend: Backend,
    timeout: Duration,
}

impl ChatHandler {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new(backend: Backend, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn echo() -> Self {
        Self::new(Backend::Echo, Self::DEFAULT_TIMEOUT)
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Answer one chat request.
    ///
    /// Validation runs before the configuration check, which runs before any
    /// network call.
    pub async fn handle(&self, request: ChatRequest) -> Result<ChatResponse, HandlerError> {
        let message = validate(request)?;

        let reply = match &self.backend {
            Backend::Echo => echo::reply(&message),
            Backend::Unconfigured => return Err(HandlerError::Config),
            Backend::Provider(provider) => self
                .generate(provider.as_ref(), &message)
                .await
                .inspect_err(|e| {
                    error!(provider = provider.name(), error = %e, "Error processing chat request");
                })?,
        };

        debug!(backend = self.backend.label(), reply_len = reply.len(), "Chat reply ready");
        Ok(ChatResponse { reply })
    }

    async fn generate(
        &self,
        provider: &dyn CompletionProvider,
        message: &str,
    ) -> Result<String, ProviderError> {
        match tokio::time::timeout(self.timeout, provider.generate(message)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(ProviderError::Timeout(self.timeout)),
        }
    }
}

/// Return the message if it is non-blank. The untrimmed text is kept.
fn validate(request: ChatRequest) -> Result<String, HandlerError> {
    match request.message {
        Some(message) if !message.trim().is_empty() => Ok(message),
        _ => Err(HandlerError::Validation),
    }
}

/// Parse a raw chat body.
///
/// Malformed JSON, a non-object body, or a non-string `message` all come out
/// as a request without a message, which the handler rejects with 400.
pub fn parse_request(body: &[u8]) -> ChatRequest {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => ChatRequest {
            message: value
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_owned),
        },
        Err(e) => {
            debug!(error = %e, "Chat body is not valid JSON");
            ChatRequest::default()
        }
    }
}
