//! Request relay for Quill — reshapes a chat history into the external
//! completion service's call shape and relays the reply.
//!
//! # Architecture
//!
//! - [`relay::Relay`] — trait the session controller and HTTP layer share
//! - [`relay::GeminiRelay`] — history reshaping + error translation
//! - [`http`] — the `POST /api/chat` endpoint (axum)

pub mod http;
pub mod relay;

pub use relay::{GeminiRelay, Relay, RelayError};
