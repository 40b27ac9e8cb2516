//! Relay — the boundary between the internal chat history and the external
//! completion service.
//!
//! All entries but the last are prior turns, converted to the external role
//! labels (`assistant` → `"model"`, `user` → `"user"`); the last entry is
//! the new turn. The relay waits for the full reply — no partial delivery.
//! Every upstream failure is translated into a structured error.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error};

use quill_core::types::{Message, Role};
use quill_gemini::{CompletionError, CompletionService, Content};

/// Marker substring identifying a safety/content-filter rejection in
/// upstream error text. The filter reason follows the marker.
const BLOCK_REASON_MARKER: &str = "block_reason: ";

/// Errors from the relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The submitted history was empty.
    #[error("messages must not be empty")]
    EmptyHistory,

    /// The external service rejected the input on safety grounds.
    #[error("Content blocked: {reason}")]
    ContentBlocked { reason: String },

    /// Any other upstream failure. Detail stays in the logs; the display
    /// form is deliberately generic.
    #[error("API Error")]
    Upstream(String),
}

/// The relay contract: full history in, one new assistant message out.
#[async_trait]
pub trait Relay: Send + Sync {
    async fn relay(&self, messages: &[Message]) -> Result<Message, RelayError>;
}

// ─────────────────────────────────────────────
// GeminiRelay
// ─────────────────────────────────────────────

/// Relay backed by a completion service.
pub struct GeminiRelay<S> {
    service: S,
}

impl<S: CompletionService> GeminiRelay<S> {
    pub fn new(service: S) -> Self {
        GeminiRelay { service }
    }
}

/// Map an internal role to the external service's label.
fn external_role(role: Role) -> &'static str {
    match role {
        Role::Assistant => "model",
        Role::User => "user",
    }
}

#[async_trait]
impl<S: CompletionService> Relay for GeminiRelay<S> {
    async fn relay(&self, messages: &[Message]) -> Result<Message, RelayError> {
        let (last, prior) = messages.split_last().ok_or(RelayError::EmptyHistory)?;

        let history: Vec<Content> = prior
            .iter()
            .map(|m| Content::text(external_role(m.role), m.content.clone()))
            .collect();

        debug!(turns = prior.len(), "relaying chat history");

        match self.service.complete(&history, &last.content).await {
            Ok(text) => Ok(Message::assistant(text)),
            Err(e) => Err(translate(e)),
        }
    }
}

/// Translate an upstream failure into the relay error taxonomy.
///
/// Failure text carrying the block-reason marker becomes `ContentBlocked`
/// with the extracted reason; everything else is a generic upstream error.
fn translate(err: CompletionError) -> RelayError {
    let text = err.to_string();
    if let Some(idx) = text.find(BLOCK_REASON_MARKER) {
        let reason = text[idx + BLOCK_REASON_MARKER.len()..].trim().to_string();
        error!(reason = %reason, "completion blocked by safety filter");
        RelayError::ContentBlocked { reason }
    } else {
        error!(error = %text, "completion service failed");
        RelayError::Upstream(text)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Stub completion service that records what it was called with.
    struct StubService {
        reply: Result<String, String>,
        seen: Mutex<Option<(Vec<Content>, String)>>,
    }

    impl StubService {
        fn ok(reply: &str) -> Self {
            StubService {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(None),
            }
        }

        fn err(message: &str) -> Self {
            StubService {
                reply: Err(message.to_string()),
                seen: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl CompletionService for StubService {
        async fn complete(
            &self,
            history: &[Content],
            prompt: &str,
        ) -> Result<String, CompletionError> {
            *self.seen.lock().unwrap() = Some((history.to_vec(), prompt.to_string()));
            self.reply
                .clone()
                .map_err(CompletionError::Api)
        }
    }

    #[tokio::test]
    async fn relay_returns_assistant_message() {
        let relay = GeminiRelay::new(StubService::ok("Hello!"));
        let reply = relay.relay(&[Message::user("Hi")]).await.unwrap();

        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Hello!");
    }

    #[tokio::test]
    async fn relay_maps_roles_and_splits_last_turn() {
        let service = StubService::ok("Great.");
        let relay = GeminiRelay::new(service);
        let messages = vec![
            Message::user("Hi"),
            Message::assistant("Hello!"),
            Message::user("How are you?"),
        ];

        relay.relay(&messages).await.unwrap();

        let seen = relay.service.seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.0.len(), 2);
        assert_eq!(seen.0[0].role, "user");
        assert_eq!(seen.0[1].role, "model");
        assert_eq!(seen.1, "How are you?");
    }

    #[tokio::test]
    async fn relay_rejects_empty_history() {
        let relay = GeminiRelay::new(StubService::ok("never"));
        let err = relay.relay(&[]).await.unwrap_err();
        assert!(matches!(err, RelayError::EmptyHistory));
    }

    #[tokio::test]
    async fn blocked_error_extracts_reason() {
        let relay = GeminiRelay::new(StubService::err(
            "Prompt rejected by safety filter, block_reason: toxicity",
        ));
        let err = relay.relay(&[Message::user("ugh")]).await.unwrap_err();

        match err {
            RelayError::ContentBlocked { reason } => assert_eq!(reason, "toxicity"),
            other => panic!("expected ContentBlocked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_errors_are_upstream() {
        let relay = GeminiRelay::new(StubService::err("connection refused"));
        let err = relay.relay(&[Message::user("Hi")]).await.unwrap_err();

        assert!(matches!(err, RelayError::Upstream(_)));
        assert_eq!(err.to_string(), "API Error");
    }

    #[test]
    fn blocked_display_quotes_reason() {
        let err = RelayError::ContentBlocked {
            reason: "SAFETY".to_string(),
        };
        assert_eq!(err.to_string(), "Content blocked: SAFETY");
    }
}
