//! chatrelay - a minimal chat relay that echoes messages or forwards them to a
//! generative-language API.
//!
//! One transport-independent handler ([`relay::ChatHandler`]) is exposed
//! through two adapters: a serverless entry point ([`function::invoke`]) and
//! a persistent axum server ([`server::build_app`]).

pub mod config;
pub mod cors;
pub mod function;
pub mod handlers;
pub mod llm;
pub mod relay;
pub mod server;
