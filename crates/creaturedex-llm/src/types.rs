//! Core types for oracle backend abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::LlmError;

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions
    System,
    /// User input
    User,
    /// Assistant response
    Assistant,
}

/// One segment of a message body. Order is preserved on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    /// Base64-encoded image bytes with their media type (e.g. `image/png`)
    Image {
        media_type: String,
        data_base64: String,
    },
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    pub content: Vec<ContentPart>,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: Vec<ContentPart>) -> Self {
        Self { role, content }
    }

    #[must_use]
    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, vec![ContentPart::Text { text: text.into() }])
    }

    /// Create a text-only user message
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![ContentPart::Text { text: text.into() }])
    }

    /// Concatenated text parts, ignoring images
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Image { .. } => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn has_image(&self) -> bool {
        self.content
            .iter()
            .any(|part| matches!(part, ContentPart::Image { .. }))
    }
}

/// JSON Schema the response must conform to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSchema {
    /// Short identifier (letters, digits, `_`), used as tool/format name
    pub name: String,
    pub description: String,
    pub schema: serde_json::Value,
}

/// Input to an oracle backend invocation
#[derive(Debug, Clone)]
pub struct LlmInvocation {
    /// Pipeline step that issued the call, for logging
    pub stage_id: String,
    /// Wire model id to use for this invocation
    pub model: String,
    /// Timeout for this invocation
    pub timeout: Duration,
    /// Ordered list of messages in the conversation
    pub messages: Vec<Message>,
    /// Structured output request; backends map it to their native mechanism
    pub response_schema: Option<ResponseSchema>,
    /// Provider-specific metadata (e.g., temperature, max_tokens)
    pub metadata: HashMap<String, serde_json::Value>,
}

impl LlmInvocation {
    #[must_use]
    pub fn new(
        stage_id: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
        messages: Vec<Message>,
    ) -> Self {
        Self {
            stage_id: stage_id.into(),
            model: model.into(),
            timeout,
            messages,
            response_schema: None,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_response_schema(mut self, schema: ResponseSchema) -> Self {
        self.response_schema = Some(schema);
        self
    }

    /// Add metadata to the invocation
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Result from an oracle backend invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResult {
    /// Raw response text; JSON text when a response schema was requested
    pub raw_response: String,
    /// Provider name (e.g., "openai", "anthropic")
    pub provider: String,
    /// Model that was actually used
    pub model_used: String,
    pub tokens_input: Option<u64>,
    pub tokens_output: Option<u64>,
}

impl LlmResult {
    #[must_use]
    pub fn new(
        raw_response: impl Into<String>,
        provider: impl Into<String>,
        model_used: impl Into<String>,
    ) -> Self {
        Self {
            raw_response: raw_response.into(),
            provider: provider.into(),
            model_used: model_used.into(),
            tokens_input: None,
            tokens_output: None,
        }
    }

    /// Set token counts
    #[must_use]
    pub fn with_tokens(mut self, input: u64, output: u64) -> Self {
        self.tokens_input = Some(input);
        self.tokens_output = Some(output);
        self
    }
}

/// Trait for oracle backend implementations
///
/// All HTTP providers implement this trait, so structured extraction works with
/// any provider without knowing wire details.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Invoke the model with the given invocation parameters
    ///
    /// # Errors
    ///
    /// Returns `LlmError` for any failure during invocation, including:
    /// - Transport failures (network errors, malformed envelopes)
    /// - Provider errors (auth, quota, outages)
    /// - Timeouts
    /// - Budget exhaustion
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError>;
}
