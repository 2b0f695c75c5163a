//! Completion provider trait.

use async_trait::async_trait;

use super::error::ProviderError;

/// A remote text-generation backend.
///
/// One call sends one prompt and waits for one non-streaming completion.
/// Implementations must not retry.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate a reply for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
