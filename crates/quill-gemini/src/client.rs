//! Gemini `generateContent` HTTP client.
//!
//! Talks to `{api_base}/models/{model}:generateContent` with the prior
//! conversation as `contents` (external roles: `"user"` / `"model"`) and a
//! fixed generation config. Safety rejections are surfaced as API errors
//! carrying a `block_reason: <REASON>` marker so callers can tell them apart
//! from generic failures.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use quill_core::config::{GeminiConfig, GenerationConfig};

use crate::traits::{CompletionError, CompletionService};

// ─────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────

/// One turn in the Gemini wire format.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Content {
    /// External role label: `"user"` or `"model"`.
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    /// Build a single-text-part turn.
    pub fn text(role: impl Into<String>, text: impl Into<String>) -> Self {
        Content {
            role: role.into(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// A text part within a turn.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: &'a [Content],
    generation_config: GenerationBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationBody {
    max_output_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

// ─────────────────────────────────────────────
// GeminiClient
// ─────────────────────────────────────────────

/// HTTP client for the Gemini text-generation API.
pub struct GeminiClient {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API base URL.
    api_base: String,
    /// API key, sent via the `x-goog-api-key` header.
    api_key: String,
    /// Model identifier.
    model: String,
    /// Fixed generation bounds.
    generation: GenerationConfig,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiClient {
    /// Create a new client from config.
    pub fn new(config: &GeminiConfig, generation: GenerationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to build HTTP client");

        GeminiClient {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            generation,
        }
    }

    /// Start a chat session seeded with prior turns.
    pub fn start_chat(&self, history: Vec<Content>) -> ChatSession<'_> {
        ChatSession {
            client: self,
            history,
        }
    }

    /// Build the full generateContent URL.
    fn generate_url(&self) -> String {
        let base = self.api_base.trim_end_matches('/');
        format!("{}/models/{}:generateContent", base, self.model)
    }

    /// Submit the full contents list and extract the generated text.
    async fn generate(&self, contents: &[Content]) -> Result<String, CompletionError> {
        let request_body = GenerateContentRequest {
            contents,
            generation_config: GenerationBody {
                max_output_tokens: self.generation.max_output_tokens,
                temperature: self.generation.temperature,
            },
        };

        debug!(model = %self.model, turns = contents.len(), "Calling Gemini");

        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            error!(status = %status, body = %error_text, "Gemini API error");
            return Err(CompletionError::Api(format!(
                "Gemini API error: {} — {}",
                status, error_text
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini response");
            CompletionError::Api(format!("Failed to parse Gemini response: {}", e))
        })?;

        extract_text(parsed)
    }
}

/// Pull the generated text out of a parsed response, translating safety
/// rejections into marked errors.
fn extract_text(response: GenerateContentResponse) -> Result<String, CompletionError> {
    if let Some(feedback) = response.prompt_feedback {
        if let Some(reason) = feedback.block_reason {
            return Err(CompletionError::Api(format!(
                "Prompt rejected by safety filter, block_reason: {}",
                reason
            )));
        }
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| CompletionError::Api("No candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(CompletionError::Api(
                "Response withheld by safety filter, block_reason: SAFETY".to_string(),
            ));
        }
        return Err(CompletionError::Api(
            "Empty response from Gemini".to_string(),
        ));
    }

    Ok(text)
}

// ─────────────────────────────────────────────
// ChatSession
// ─────────────────────────────────────────────

/// A stateful chat seeded from prior history.
///
/// Each `send` appends the new user turn, submits the full contents, and on
/// success records the model's reply so the session can continue.
pub struct ChatSession<'a> {
    client: &'a GeminiClient,
    history: Vec<Content>,
}

impl ChatSession<'_> {
    /// Submit a new turn and wait for the full generated text.
    pub async fn send(&mut self, text: impl Into<String>) -> Result<String, CompletionError> {
        self.history.push(Content::text("user", text));
        let reply = self.client.generate(&self.history).await?;
        self.history.push(Content::text("model", reply.clone()));
        Ok(reply)
    }

    /// The accumulated turns, including replies received so far.
    pub fn history(&self) -> &[Content] {
        &self.history
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(
        &self,
        history: &[Content],
        prompt: &str,
    ) -> Result<String, CompletionError> {
        self.start_chat(history.to_vec()).send(prompt).await
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
