//! Completion-service trait — the seam between the relay and the external
//! text-generation backend.

use async_trait::async_trait;
use thiserror::Error;

use crate::client::Content;

/// Errors from the completion service.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered but refused or returned an unusable payload.
    ///
    /// Safety rejections carry a `block_reason: <REASON>` marker in the
    /// message text, which the relay recognizes.
    #[error("{0}")]
    Api(String),
}

/// Trait for the external text-completion backend.
///
/// `history` seeds the stateful chat session with prior turns; `prompt` is
/// the new turn. The call waits for the full generated text — no streaming.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Submit a new turn against the given prior history.
    async fn complete(&self, history: &[Content], prompt: &str)
        -> Result<String, CompletionError>;
}
