//! Anthropic Messages API backend
//!
//! Images are sent as base64 `image` blocks. Structured output uses a single
//! forced tool whose `input_schema` is the response schema; the tool input is
//! returned as the raw JSON response.

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::openai_backend::HttpParams;
use crate::types::{ContentPart, LlmBackend, LlmInvocation, LlmResult, Message, Role};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default Anthropic API endpoint
pub(crate) const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header value
const ANTHROPIC_VERSION: &str = "2023-06-01";

const PROVIDER: &str = "anthropic";

#[derive(Clone)]
pub(crate) struct AnthropicBackend {
    client: Arc<HttpClient>,
    base_url: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

impl AnthropicBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
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

    fn build_request_body(&self, inv: &LlmInvocation) -> AnthropicRequest {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };
        let params = self.default_params.resolve(inv);
        let (system, messages) = convert_messages(&inv.messages);

        let (tools, tool_choice) = match &inv.response_schema {
            Some(schema) => (
                Some(vec![Tool {
                    name: schema.name.clone(),
                    description: schema.description.clone(),
                    input_schema: schema.schema.clone(),
                }]),
                Some(ToolChoice {
                    choice_type: "tool".to_string(),
                    name: schema.name.clone(),
                }),
            ),
            None => (None, None),
        };

        AnthropicRequest {
            model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system,
            tools,
            tool_choice,
        }
    }
}

/// Convert messages to Anthropic Messages API format
///
/// System messages go to the top-level `system` field; the rest keep their
/// order as content-block arrays.
fn convert_messages(messages: &[Message]) -> (Option<String>, Vec<AnthropicMessage>) {
    let mut system_prompt: Option<String> = None;
    let mut anthropic_messages = Vec::new();

    for msg in messages {
        let role = match msg.role {
            Role::System => {
                if let Some(existing) = system_prompt.as_mut() {
                    existing.push_str("\n\n");
                    existing.push_str(&msg.text());
                } else {
                    system_prompt = Some(msg.text());
                }
                continue;
            }
            Role::User => "user",
            Role::Assistant => "assistant",
        };

        let content = msg
            .content
            .iter()
            .map(|part| match part {
                ContentPart::Text { text } => Block::Text { text: text.clone() },
                ContentPart::Image {
                    media_type,
                    data_base64,
                } => Block::Image {
                    source: ImageSource {
                        source_type: "base64".to_string(),
                        media_type: media_type.clone(),
                        data: data_base64.clone(),
                    },
                },
            })
            .collect();

        anthropic_messages.push(AnthropicMessage {
            role: role.to_string(),
            content,
        });
    }

    (system_prompt, anthropic_messages)
}

/// Pull the answer out of the response content blocks.
///
/// A `tool_use` block wins (its `input` is the structured answer); otherwise
/// text blocks are concatenated.
fn extract_content(blocks: &[ResponseBlock]) -> Option<String> {
    if let Some(input) = blocks
        .iter()
        .find(|block| block.content_type == "tool_use")
        .and_then(|block| block.input.as_ref())
    {
        return Some(input.to_string());
    }

    let text: String = blocks
        .iter()
        .filter(|block| block.content_type == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();

    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl LlmBackend for AnthropicBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let request_body = self.build_request_body(&inv);

        debug!(
            provider = PROVIDER,
            stage = %inv.stage_id,
            model = %request_body.model,
            max_tokens = request_body.max_tokens,
            temperature = request_body.temperature,
            structured = request_body.tools.is_some(),
            timeout_secs = inv.timeout.as_secs(),
            "Invoking Anthropic backend"
        );

        let request = self
            .client
            .post(&self.base_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, PROVIDER)
            .await?;

        let response_body: AnthropicResponse = response.json().await.map_err(|e| {
            LlmError::Transport(format!("Failed to parse Anthropic response: {}", e))
        })?;

        let content = extract_content(&response_body.content).ok_or_else(|| {
            LlmError::Transport("Anthropic response missing text or tool_use content".to_string())
        })?;

        let mut result = LlmResult::new(content, PROVIDER, request_body.model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.input_tokens, usage.output_tokens);
        }

        debug!(
            provider = PROVIDER,
            stage = %inv.stage_id,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Anthropic invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<Block>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text { text: String },
    Image { source: ImageSource },
}

#[derive(Debug, Clone, Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    source_type: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Clone, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnthropicResponse {
    content: Vec<ResponseBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
    input: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    input_tokens: u64,
    output_tokens: u64,
}
