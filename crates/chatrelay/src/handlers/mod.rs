//! HTTP request handlers.

mod chat;
mod health;

pub use chat::{MAX_BODY_BYTES, chat, method_not_allowed, not_found, preflight, respond};
pub use health::health;
