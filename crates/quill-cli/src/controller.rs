//! Session controller — orchestrates user input, the relay call, and store
//! updates.
//!
//! A two-phase state machine: `Idle` accepts a submit, which appends the
//! user message and captures the target conversation; `AwaitingResponse`
//! rejects further submits until the exchange resolves. The resolution
//! always appends to the conversation captured at submit time, even if the
//! user has switched away meanwhile.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use quill_core::store::ConversationStore;
use quill_core::title::derive_title;
use quill_core::types::{Conversation, Message};
use quill_server::{Relay, RelayError};

/// Controller phase. At most one relay request is in flight.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingResponse,
}

/// An exchange captured at submit time.
///
/// Holds the target conversation id and the history snapshot so the
/// eventual response lands in the right place regardless of later
/// active-conversation changes.
pub struct PendingExchange {
    conversation_id: Uuid,
    history: Vec<Message>,
    first_exchange: bool,
}

impl PendingExchange {
    /// The history to relay (ends with the new user message).
    pub fn history(&self) -> &[Message] {
        &self.history
    }
}

// ─────────────────────────────────────────────
// SessionController
// ─────────────────────────────────────────────

/// Owns the active-conversation pointer and the submit/response lifecycle.
///
/// The store owns all conversations; the controller only holds an id into
/// it, never a parallel copy.
pub struct SessionController {
    store: ConversationStore,
    relay: Arc<dyn Relay>,
    active: Option<Uuid>,
    phase: Phase,
}

impl SessionController {
    pub fn new(store: ConversationStore, relay: Arc<dyn Relay>) -> Self {
        SessionController {
            store,
            relay,
            active: None,
            phase: Phase::Idle,
        }
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The active conversation, if any.
    pub fn active(&self) -> Option<&Conversation> {
        self.active.and_then(|id| self.store.get(id))
    }

    /// Submit a user message and wait for the assistant's reply.
    ///
    /// Returns `false` if the submit was rejected (blank text, or a request
    /// already in flight).
    pub async fn submit(&mut self, text: &str) -> bool {
        let Some(pending) = self.begin_submit(text) else {
            return false;
        };
        let relay = Arc::clone(&self.relay);
        let result = relay.relay(pending.history()).await;
        self.resolve(pending, result);
        true
    }

    /// First half of a submit: record the user message and capture the
    /// exchange. `None` means no transition happened.
    pub fn begin_submit(&mut self, text: &str) -> Option<PendingExchange> {
        if self.phase == Phase::AwaitingResponse {
            debug!("submit rejected: request already in flight");
            return None;
        }
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let id = match self.active.filter(|id| self.store.get(*id).is_some()) {
            Some(id) => id,
            None => {
                let conv = self.store.create();
                self.active = Some(conv.id);
                conv.id
            }
        };

        let conv = match self.store.append(id, Message::user(text)) {
            Ok(conv) => conv,
            Err(e) => {
                warn!(error = %e, "failed to record user message");
                return None;
            }
        };

        self.phase = Phase::AwaitingResponse;
        Some(PendingExchange {
            conversation_id: id,
            first_exchange: conv.messages.len() == 1,
            history: conv.messages,
        })
    }

    /// Second half of a submit: append the outcome and return to `Idle`.
    ///
    /// A failure becomes a synthetic assistant message so the transcript
    /// stays legible; it is a normal transition, not a crash.
    pub fn resolve(&mut self, pending: PendingExchange, result: Result<Message, RelayError>) {
        self.phase = Phase::Idle;

        match result {
            Ok(message) => {
                if let Err(e) = self.store.append(pending.conversation_id, message) {
                    warn!(error = %e, "dropping response for deleted conversation");
                    return;
                }
                if pending.first_exchange {
                    let title = derive_title(&pending.history[0].content);
                    if !title.is_empty() {
                        if let Err(e) = self.store.rename(pending.conversation_id, title) {
                            warn!(error = %e, "failed to set derived title");
                        }
                    }
                }
            }
            Err(e) => {
                let note = Message::assistant(format!("Error: {e}"));
                if let Err(e) = self.store.append(pending.conversation_id, note) {
                    warn!(error = %e, "dropping error note for deleted conversation");
                }
            }
        }
    }

    /// Start a fresh conversation, unless the active one is still unused.
    pub fn new_chat(&mut self) {
        if let Some(conv) = self.active() {
            if conv.is_empty() {
                return;
            }
        }
        let conv = self.store.create();
        self.active = Some(conv.id);
        self.store.prune_empty(self.active);
    }

    /// Switch the active conversation. Unknown ids are ignored.
    pub fn select_conversation(&mut self, id: Uuid) {
        if self.store.get(id).is_none() {
            warn!(id = %id, "cannot select unknown conversation");
            return;
        }
        self.active = Some(id);
        self.store.prune_empty(self.active);
    }

    /// Delete a conversation, clearing the active pointer if it was the
    /// target.
    pub fn delete_conversation(&mut self, id: Uuid) {
        self.store.delete(id);
        if self.active == Some(id) {
            self.active = None;
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tempfile::tempdir;

    struct EchoRelay;

    #[async_trait]
    impl Relay for EchoRelay {
        async fn relay(&self, messages: &[Message]) -> Result<Message, RelayError> {
            Ok(Message::assistant(format!(
                "echo: {}",
                messages.last().map(|m| m.content.as_str()).unwrap_or("")
            )))
        }
    }

    struct FailingRelay(RelayError);

    #[async_trait]
    impl Relay for FailingRelay {
        async fn relay(&self, _messages: &[Message]) -> Result<Message, RelayError> {
            Err(match &self.0 {
                RelayError::ContentBlocked { reason } => RelayError::ContentBlocked {
                    reason: reason.clone(),
                },
                RelayError::Upstream(s) => RelayError::Upstream(s.clone()),
                RelayError::EmptyHistory => RelayError::EmptyHistory,
            })
        }
    }

    fn make_controller(relay: Arc<dyn Relay>) -> (SessionController, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = ConversationStore::load(dir.path().join("conversations.json"));
        (SessionController::new(store, relay), dir)
    }

    #[tokio::test]
    async fn first_submit_creates_conversation_and_titles_it() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));

        assert!(ctl.submit("Hi").await);

        let conv = ctl.active().unwrap();
        assert_eq!(conv.messages.len(), 2);
        assert_eq!(conv.messages[0], Message::user("Hi"));
        assert_eq!(conv.messages[1], Message::assistant("echo: Hi"));
        assert_eq!(conv.title, "Hi");
        assert_eq!(ctl.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn later_exchanges_do_not_retitle() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));

        ctl.submit("Hi").await;
        ctl.submit("What is a monad?").await;

        let conv = ctl.active().unwrap();
        assert_eq!(conv.messages.len(), 4);
        assert_eq!(conv.title, "Hi");
    }

    #[tokio::test]
    async fn blank_submit_is_silently_ignored() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));

        assert!(!ctl.submit("   ").await);
        assert!(ctl.store().conversations().is_empty());
    }

    #[test]
    fn second_submit_while_awaiting_is_rejected() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));

        let pending = ctl.begin_submit("first").unwrap();
        assert_eq!(ctl.phase(), Phase::AwaitingResponse);

        assert!(ctl.begin_submit("second").is_none());
        let conv = ctl.active().unwrap();
        assert_eq!(conv.messages.len(), 1);

        ctl.resolve(pending, Ok(Message::assistant("done")));
        assert_eq!(ctl.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn failure_becomes_assistant_message() {
        let (mut ctl, _dir) = make_controller(Arc::new(FailingRelay(
            RelayError::ContentBlocked {
                reason: "toxicity".to_string(),
            },
        )));

        ctl.submit("something rude").await;

        let conv = ctl.active().unwrap();
        assert_eq!(conv.messages.len(), 2);
        let note = &conv.messages[1];
        assert!(note.content.contains("toxicity"));
        assert_eq!(ctl.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn upstream_failure_keeps_transcript_legible() {
        let (mut ctl, _dir) = make_controller(Arc::new(FailingRelay(RelayError::Upstream(
            "boom".to_string(),
        ))));

        ctl.submit("Hi").await;

        let conv = ctl.active().unwrap();
        assert_eq!(conv.messages[0], Message::user("Hi"));
        assert_eq!(conv.messages[1].content, "Error: API Error");
    }

    #[test]
    fn in_flight_response_lands_in_captured_conversation() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));

        let pending = ctl.begin_submit("Hi").unwrap();
        let first_id = ctl.active().unwrap().id;

        ctl.resolve(pending, Ok(Message::assistant("late reply")));
        ctl.new_chat();
        let second_id = ctl.active().unwrap().id;
        assert_ne!(first_id, second_id);
        let pending = ctl.begin_submit("hello again").unwrap();
        ctl.resolve(pending, Ok(Message::assistant("hi")));

        // Another exchange against the first conversation resolves after
        // the user has switched away.
        ctl.select_conversation(first_id);
        let pending = ctl.begin_submit("more").unwrap();
        ctl.select_conversation(second_id);
        ctl.resolve(pending, Ok(Message::assistant("stale but kept")));

        let first = ctl.store().get(first_id).unwrap();
        assert_eq!(first.messages.last().unwrap().content, "stale but kept");
        assert_eq!(ctl.active().unwrap().id, second_id);
    }

    #[test]
    fn response_for_deleted_conversation_is_dropped() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));

        let pending = ctl.begin_submit("Hi").unwrap();
        let id = ctl.active().unwrap().id;
        ctl.delete_conversation(id);

        ctl.resolve(pending, Ok(Message::assistant("orphan")));
        assert_eq!(ctl.phase(), Phase::Idle);
        assert!(ctl.store().get(id).is_none());
    }

    #[test]
    fn new_chat_is_noop_when_active_is_empty() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));

        ctl.new_chat();
        let first = ctl.active().unwrap().id;
        ctl.new_chat();

        assert_eq!(ctl.active().unwrap().id, first);
        assert_eq!(ctl.store().conversations().len(), 1);
    }

    #[tokio::test]
    async fn prune_never_removes_the_active_conversation() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));

        ctl.submit("Hi").await;
        ctl.new_chat();
        let empty_one = ctl.active().unwrap().id;
        // Selecting back and forth must never prune the active conversation,
        // even though it has zero messages.
        ctl.select_conversation(empty_one);

        assert!(ctl.store().get(empty_one).is_some());
        assert_eq!(ctl.store().conversations().len(), 2);
    }

    #[tokio::test]
    async fn delete_active_clears_pointer() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));

        ctl.submit("Hi").await;
        let id = ctl.active().unwrap().id;
        ctl.delete_conversation(id);

        assert!(ctl.active().is_none());
        assert!(ctl.store().conversations().is_empty());
    }

    #[test]
    fn select_unknown_id_is_ignored() {
        let (mut ctl, _dir) = make_controller(Arc::new(EchoRelay));
        ctl.select_conversation(Uuid::new_v4());
        assert!(ctl.active().is_none());
    }
}
