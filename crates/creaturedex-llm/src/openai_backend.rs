//! OpenAI-compatible chat-completions backend
//!
//! Serves hosted OpenAI models and local servers that speak the same wire
//! format. Images travel as `image_url` data URIs; structured output is
//! requested through `response_format = {type: "json_schema"}`.

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{ContentPart, LlmBackend, LlmInvocation, LlmResult, Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default OpenAI API endpoint
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";

const PROVIDER: &str = "openai";

/// HTTP request parameters
#[derive(Debug, Clone)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: crate::models::DEFAULT_MAX_TOKENS,
            temperature: crate::models::DEFAULT_TEMPERATURE,
        }
    }
}

impl HttpParams {
    /// Resolve parameters for one invocation
    ///
    /// `inv.metadata["max_tokens"]` and `inv.metadata["temperature"]` override
    /// the backend defaults.
    pub(crate) fn resolve(&self, inv: &LlmInvocation) -> Self {
        let max_tokens = inv
            .metadata
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(self.max_tokens);

        let temperature = inv
            .metadata
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(self.temperature);

        Self {
            max_tokens,
            temperature,
        }
    }
}

#[derive(Clone)]
pub(crate) struct OpenAiCompatibleBackend {
    client: Arc<HttpClient>,
    base_url: String,
    /// Local servers usually run without a key
    api_key: Option<String>,
    default_model: String,
    default_params: HttpParams,
}

impl OpenAiCompatibleBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: Option<String>,
        base_url: Option<String>,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        let client = HttpClient::new()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            default_model,
            default_params,
        })
    }

    fn build_request_body(&self, inv: &LlmInvocation) -> ChatRequest {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };
        let params = self.default_params.resolve(inv);

        let response_format = inv.response_schema.as_ref().map(|schema| ResponseFormat {
            format_type: "json_schema".to_string(),
            json_schema: JsonSchemaFormat {
                name: schema.name.clone(),
                description: schema.description.clone(),
                schema: schema.schema.clone(),
                strict: false,
            },
        });

        ChatRequest {
            model,
            messages: convert_messages(&inv.messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            stream: false,
            response_format,
        }
    }
}

/// Convert messages to OpenAI chat format
///
/// Text-only messages are sent as a plain string; messages with images are
/// sent as an ordered array of parts.
fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            }
            .to_string();

            let content = if msg.has_image() {
                ChatContent::Parts(
                    msg.content
                        .iter()
                        .map(|part| match part {
                            ContentPart::Text { text } => ChatPart::Text { text: text.clone() },
                            ContentPart::Image {
                                media_type,
                                data_base64,
                            } => ChatPart::ImageUrl {
                                image_url: ImageUrl {
                                    url: format!("data:{media_type};base64,{data_base64}"),
                                },
                            },
                        })
                        .collect(),
                )
            } else {
                ChatContent::Text(msg.text())
            };

            ChatMessage { role, content }
        })
        .collect()
}

#[async_trait]
impl LlmBackend for OpenAiCompatibleBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let request_body = self.build_request_body(&inv);

        debug!(
            provider = PROVIDER,
            stage = %inv.stage_id,
            model = %request_body.model,
            max_tokens = request_body.max_tokens,
            temperature = request_body.temperature,
            structured = request_body.response_format.is_some(),
            timeout_secs = inv.timeout.as_secs(),
            "Invoking OpenAI-compatible backend"
        );

        let mut request = self
            .client
            .post(&self.base_url)
            .header("Content-Type", "application/json")
            .json(&request_body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, PROVIDER)
            .await?;

        let response_body: ChatResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse OpenAI response: {}", e))
        })?;

        let choice = response_body.choices.first().ok_or_else(|| {
            LlmError::Transport("OpenAI response missing choices[0]".to_string())
        })?;

        let content = choice.message.content.clone().ok_or_else(|| {
            LlmError::Transport("OpenAI response missing content in choices[0]".to_string())
        })?;

        let mut result = LlmResult::new(content, PROVIDER, request_body.model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = PROVIDER,
            stage = %inv.stage_id,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "OpenAI invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ChatPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ChatPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaFormat,
}

#[derive(Debug, Clone, Serialize)]
struct JsonSchemaFormat {
    name: String,
    description: String,
    schema: serde_json::Value,
    strict: bool,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseSchema;
    use serde_json::json;
    use std::time::Duration;

    fn backend() -> OpenAiCompatibleBackend {
        OpenAiCompatibleBackend::new(
            None,
            Some("http://localhost:8080/v1/chat/completions".to_string()),
            "gpt-4o-mini".to_string(),
            HttpParams::default(),
        )
        .unwrap()
    }

    fn image_invocation() -> LlmInvocation {
        LlmInvocation::new(
            "detect",
            "",
            Duration::from_secs(30),
            vec![Message::new(
                Role::User,
                vec![
                    ContentPart::Text {
                        text: "Identify the creature.".to_string(),
                    },
                    ContentPart::Image {
                        media_type: "image/jpeg".to_string(),
                        data_base64: "/9j/4AAQ".to_string(),
                    },
                ],
            )],
        )
    }

    #[test]
    fn test_image_message_uses_data_uri_parts() {
        let body = serde_json::to_value(backend().build_request_body(&image_invocation())).unwrap();

        let content = &body["messages"][0]["content"];
        assert_eq!(content[0], json!({"type": "text", "text": "Identify the creature."}));
        assert_eq!(content[1]["type"], "image_url");
        assert_eq!(content[1]["image_url"]["url"], "data:image/jpeg;base64,/9j/4AAQ");
    }

    #[test]
    fn test_text_message_is_plain_string() {
        let inv = LlmInvocation::new(
            "verify",
            "gpt-4o",
            Duration::from_secs(30),
            vec![Message::user("Is Red Panda an animal or sea creature?")],
        );
        let body = serde_json::to_value(backend().build_request_body(&inv)).unwrap();

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(
            body["messages"][0]["content"],
            "Is Red Panda an animal or sea creature?"
        );
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_empty_model_falls_back_to_default() {
        let body = serde_json::to_value(backend().build_request_body(&image_invocation())).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn test_response_schema_becomes_response_format() {
        let inv = image_invocation().with_response_schema(ResponseSchema {
            name: "creature_name".to_string(),
            description: "Name of the creature".to_string(),
            schema: json!({"type": "object", "properties": {"name": {"type": "string"}}}),
        });
        let body = serde_json::to_value(backend().build_request_body(&inv)).unwrap();

        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "creature_name");
        assert_eq!(
            body["response_format"]["json_schema"]["schema"]["properties"]["name"]["type"],
            "string"
        );
    }

    #[test]
    fn test_metadata_overrides_params() {
        let inv = image_invocation()
            .with_metadata("max_tokens", json!(64))
            .with_metadata("temperature", json!(0.5));
        let params = HttpParams::default().resolve(&inv);
        assert_eq!(params.max_tokens, 64);
        assert_eq!(params.temperature, 0.5);
    }

    #[test]
    fn test_response_parsing() {
        let response: ChatResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "{\"name\": \"Red Panda\"}"}}],
            "usage": {"prompt_tokens": 812, "completion_tokens": 9, "total_tokens": 821}
        }))
        .unwrap();

        assert_eq!(
            response.choices[0].message.content.as_deref(),
            Some("{\"name\": \"Red Panda\"}")
        );
        assert_eq!(response.usage.unwrap().prompt_tokens, 812);
    }
}
