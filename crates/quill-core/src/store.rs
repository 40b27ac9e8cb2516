//! Conversation store — in-memory collection synchronized to a local blob.
//!
//! The store exclusively owns all conversations. Every mutation rewrites the
//! whole blob; a failed write is logged and never surfaced to the caller.
//! A missing or corrupt blob hydrates as an empty store, never an error.
//!
//! # Disk format
//!
//! A single JSON file holding the ordered conversation list (most-recent
//! first), camelCase keys, RFC 3339 timestamps.

use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::{Conversation, Message};

/// Errors from store mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The referenced conversation does not exist.
    #[error("conversation not found: {0}")]
    NotFound(Uuid),
}

// ─────────────────────────────────────────────
// ConversationStore
// ─────────────────────────────────────────────

/// Owns all conversations and keeps them synchronized to a blob on disk.
///
/// Ordering is most-recent-first: new conversations are inserted at the
/// front and the persisted file preserves that order exactly.
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    path: PathBuf,
}

impl ConversationStore {
    /// Hydrate a store from the blob at `path`.
    ///
    /// A missing or unparsable blob yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let conversations = read_blob(&path);
        ConversationStore {
            conversations,
            path,
        }
    }

    /// All conversations, most-recent first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Look up a conversation by id.
    pub fn get(&self, id: Uuid) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    /// Allocate a new empty conversation at the front of the list.
    pub fn create(&mut self) -> Conversation {
        let conv = Conversation::new();
        self.conversations.insert(0, conv.clone());
        self.persist();
        debug!(id = %conv.id, "created conversation");
        conv
    }

    /// Append a message to a conversation and refresh its timestamp.
    pub fn append(&mut self, id: Uuid, message: Message) -> Result<Conversation, StoreError> {
        let conv = self
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound(id))?;
        conv.messages.push(message);
        conv.timestamp = Utc::now();
        let snapshot = conv.clone();
        self.persist();
        Ok(snapshot)
    }

    /// Replace a conversation's title. Messages and timestamp are untouched.
    pub fn rename(&mut self, id: Uuid, title: impl Into<String>) -> Result<(), StoreError> {
        let conv = self
            .conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(StoreError::NotFound(id))?;
        conv.title = title.into();
        self.persist();
        Ok(())
    }

    /// Remove a conversation. Removing an absent id is a no-op.
    pub fn delete(&mut self, id: Uuid) {
        let before = self.conversations.len();
        self.conversations.retain(|c| c.id != id);
        if self.conversations.len() != before {
            self.persist();
            debug!(id = %id, "deleted conversation");
        }
    }

    /// Remove every empty conversation except `except`.
    ///
    /// Called on active-conversation changes so abandoned empty sessions
    /// don't accumulate. The active conversation is never pruned.
    pub fn prune_empty(&mut self, except: Option<Uuid>) {
        let before = self.conversations.len();
        self.conversations
            .retain(|c| !c.is_empty() || Some(c.id) == except);
        if self.conversations.len() != before {
            self.persist();
            debug!(removed = before - self.conversations.len(), "pruned empty conversations");
        }
    }

    /// Serialize the whole store to disk.
    pub fn save(&self) -> std::io::Result<()> {
        write_blob(&self.path, &self.conversations)
    }

    /// Persist, logging any failure instead of propagating it.
    fn persist(&self) {
        if let Err(e) = self.save() {
            warn!(path = %self.path.display(), error = %e, "failed to persist conversations");
        }
    }
}

// ─────────────────────────────────────────────
// Blob I/O
// ─────────────────────────────────────────────

fn read_blob(path: &Path) -> Vec<Conversation> {
    if !path.exists() {
        debug!(path = %path.display(), "no conversation blob, starting empty");
        return Vec::new();
    }

    let data = match std::fs::read(path) {
        Ok(d) => d,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read conversation blob");
            return Vec::new();
        }
    };

    match serde_json::from_slice::<Vec<Conversation>>(&data) {
        Ok(conversations) => {
            debug!(count = conversations.len(), "loaded conversations");
            conversations
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt conversation blob, starting empty");
            Vec::new()
        }
    }
}

/// Overwrite the blob atomically: write a temp file, then rename over.
fn write_blob(path: &Path, conversations: &[Conversation]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let bytes = serde_json::to_vec_pretty(conversations)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
