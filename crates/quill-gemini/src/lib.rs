//! Gemini completion-service client for Quill.
//!
//! # Architecture
//!
//! - [`traits::CompletionService`] — the trait the relay depends on
//! - [`client::GeminiClient`] — reqwest client for the `generateContent` API
//! - [`client::ChatSession`] — a stateful chat seeded from prior history

pub mod client;
pub mod traits;

pub use client::{ChatSession, Content, GeminiClient, Part};
pub use traits::{CompletionError, CompletionService};
