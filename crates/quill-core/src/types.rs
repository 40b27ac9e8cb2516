//! Conversation data model — typed messages with a closed role set.
//!
//! Messages are immutable once created; ordering within a conversation is
//! append-only and significant. The persisted JSON uses camelCase keys and
//! RFC 3339 timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Placeholder title for a conversation before the first exchange.
pub const PLACEHOLDER_TITLE: &str = "New Chat";

// ─────────────────────────────────────────────
// Role + Message
// ─────────────────────────────────────────────

/// Who authored a message. Closed set — never an open string.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Message {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ─────────────────────────────────────────────
// Conversation
// ─────────────────────────────────────────────

/// A titled, timestamped, ordered sequence of messages.
///
/// `timestamp` is the last-modified instant, refreshed on every append.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub timestamp: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create a new empty conversation with a fresh id and placeholder title.
    pub fn new() -> Self {
        Conversation {
            id: Uuid::new_v4(),
            title: PLACEHOLDER_TITLE.to_string(),
            timestamp: Utc::now(),
            messages: Vec::new(),
        }
    }

    /// Whether the conversation has no messages yet.
    ///
    /// Empty conversations are transient and eligible for silent removal
    /// once they are no longer active.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message_serialization() {
        let msg = Message::user("Hello, world!");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Hello, world!");
    }

    #[test]
    fn test_assistant_message_serialization() {
        let msg = Message::assistant("Hi there!");
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["role"], "assistant");
        assert_eq!(json["content"], "Hi there!");
    }

    #[test]
    fn test_message_deserialization() {
        let json = json!({"role": "user", "content": "Hi"});
        let msg: Message = serde_json::from_value(json).unwrap();

        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hi");
    }

    #[test]
    fn test_unknown_role_rejected() {
        let json = json!({"role": "system", "content": "nope"});
        assert!(serde_json::from_value::<Message>(json).is_err());
    }

    #[test]
    fn test_new_conversation_defaults() {
        let conv = Conversation::new();

        assert_eq!(conv.title, PLACEHOLDER_TITLE);
        assert!(conv.is_empty());
    }

    #[test]
    fn test_conversation_ids_unique() {
        let a = Conversation::new();
        let b = Conversation::new();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_conversation_round_trip() {
        let mut conv = Conversation::new();
        conv.messages.push(Message::user("Hi"));
        conv.messages.push(Message::assistant("Hello!"));

        let json_str = serde_json::to_string(&conv).unwrap();
        let back: Conversation = serde_json::from_str(&json_str).unwrap();

        assert_eq!(conv, back);
    }

    #[test]
    fn test_timestamp_serialized_as_rfc3339() {
        let conv = Conversation::new();
        let json = serde_json::to_value(&conv).unwrap();

        let ts = json["timestamp"].as_str().unwrap();
        chrono::DateTime::parse_from_rfc3339(ts).unwrap();
    }
}
