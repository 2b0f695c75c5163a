//! Remote completion client for single-turn text generation.

mod error;
mod gemini;
mod provider;

pub use error::ProviderError;
pub use gemini::GeminiProvider;
pub use provider::CompletionProvider;
