//! Core library for Quill — conversation data model, store, title derivation,
//! configuration, and the rendering seam.
//!
//! # Modules
//!
//! - [`types`] — `Role`, `Message`, `Conversation`
//! - [`store`] — in-memory conversation store with wholesale blob persistence
//! - [`title`] — pure title derivation from a conversation's first message
//! - [`config`] — typed config loaded from `~/.quill/config.json` + env vars
//! - [`render`] — markdown rendering boundary (interface only)
//! - [`utils`] — path helpers

pub mod config;
pub mod render;
pub mod store;
pub mod title;
pub mod types;
pub mod utils;

pub use store::{ConversationStore, StoreError};
pub use types::{Conversation, Message, Role};
