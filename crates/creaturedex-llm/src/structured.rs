//! Structured extraction on top of an oracle backend
//!
//! `StructuredOracle` is the capability the pipeline stages depend on: a
//! prompt plus an output schema in, a JSON value conforming to that schema
//! out. [`extract`] turns that value into a typed record.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::LlmError;
use crate::types::{ContentPart, LlmBackend, LlmInvocation, Message, ResponseSchema, Role};

/// One ordered segment of a prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Text(String),
    /// Base64-encoded image bytes
    Image {
        media_type: String,
        data_base64: String,
    },
}

impl PromptPart {
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub fn image(media_type: impl Into<String>, data_base64: impl Into<String>) -> Self {
        Self::Image {
            media_type: media_type.into(),
            data_base64: data_base64.into(),
        }
    }
}

impl From<PromptPart> for ContentPart {
    fn from(part: PromptPart) -> Self {
        match part {
            PromptPart::Text(text) => ContentPart::Text { text },
            PromptPart::Image {
                media_type,
                data_base64,
            } => ContentPart::Image {
                media_type,
                data_base64,
            },
        }
    }
}

/// Named JSON Schema describing the expected answer
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

impl OutputSchema {
    /// Derive the schema of `T`
    #[must_use]
    pub fn of<T: StructuredOutput>() -> Self {
        let mut schema = schemars::schema_for!(T).to_value();
        if let Some(object) = schema.as_object_mut() {
            object.remove("$schema");
        }

        Self {
            name: T::NAME.to_string(),
            description: T::DESCRIPTION.to_string(),
            schema,
        }
    }
}

impl From<&OutputSchema> for ResponseSchema {
    fn from(schema: &OutputSchema) -> Self {
        ResponseSchema {
            name: schema.name.clone(),
            description: schema.description.clone(),
            schema: schema.schema.clone(),
        }
    }
}

/// A record the oracle can be asked to produce.
///
/// Deserialisation enforces field presence and types; `validate` adds the
/// value-level rules serde cannot express.
pub trait StructuredOutput: DeserializeOwned + JsonSchema {
    /// Schema identifier sent to the backend (letters, digits and `_`)
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    /// # Errors
    ///
    /// Returns a human-readable reason when the value breaks a domain rule.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Prompt + schema in, conforming JSON value out.
///
/// Implementations never cache: every call is a fresh request.
#[async_trait]
pub trait StructuredOracle: Send + Sync {
    async fn invoke(&self, prompt: Vec<PromptPart>, schema: &OutputSchema)
    -> Result<Value, LlmError>;
}

/// Ask `oracle` for a `T`.
///
/// # Errors
///
/// Oracle failures propagate unchanged. A value that does not deserialize
/// into `T`, or that `T::validate` rejects, is `LlmError::SchemaViolation`.
pub async fn extract<T: StructuredOutput>(
    oracle: &dyn StructuredOracle,
    prompt: Vec<PromptPart>,
) -> Result<T, LlmError> {
    let schema = OutputSchema::of::<T>();
    let value = oracle.invoke(prompt, &schema).await?;

    let parsed: T = serde_json::from_value(value).map_err(|e| {
        warn!(schema = T::NAME, error = %e, "Oracle response does not match schema");
        LlmError::SchemaViolation(format!("{}: {e}", T::NAME))
    })?;

    parsed.validate().map_err(|reason| {
        warn!(schema = T::NAME, reason = %reason, "Oracle response failed validation");
        LlmError::SchemaViolation(format!("{}: {reason}", T::NAME))
    })?;

    Ok(parsed)
}

/// Adapts an [`LlmBackend`] into a [`StructuredOracle`].
pub struct LlmStructuredOracle {
    backend: Arc<dyn LlmBackend>,
    model: String,
    timeout: Duration,
}

impl LlmStructuredOracle {
    pub fn new(backend: Arc<dyn LlmBackend>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            backend,
            model: model.into(),
            timeout,
        }
    }
}

#[async_trait]
impl StructuredOracle for LlmStructuredOracle {
    async fn invoke(
        &self,
        prompt: Vec<PromptPart>,
        schema: &OutputSchema,
    ) -> Result<Value, LlmError> {
        let content = prompt.into_iter().map(ContentPart::from).collect();
        let invocation = LlmInvocation::new(
            schema.name.clone(),
            self.model.clone(),
            self.timeout,
            vec![Message::new(Role::User, content)],
        )
        .with_response_schema(ResponseSchema::from(schema));

        let result = self.backend.invoke(invocation).await?;

        debug!(
            schema = %schema.name,
            provider = %result.provider,
            model = %result.model_used,
            response_len = result.raw_response.len(),
            "Received structured oracle response"
        );

        parse_json_object(&result.raw_response).ok_or_else(|| {
            warn!(schema = %schema.name, "Oracle response contains no JSON object");
            LlmError::SchemaViolation(format!("{}: response is not a JSON object", schema.name))
        })
    }
}

/// Pull a JSON object out of raw model text.
///
/// Accepts bare JSON, JSON inside a Markdown code fence, or JSON surrounded by
/// prose (first `{` to last `}`).
fn parse_json_object(raw: &str) -> Option<Value> {
    let trimmed = strip_code_fence(raw.trim());
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str::<Value>(&trimmed[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the info string (e.g. `json`)
    let body = rest.split_once('\n').map_or("", |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
