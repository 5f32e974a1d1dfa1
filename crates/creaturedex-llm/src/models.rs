//! Registry of model names accepted by the `openai` provider
//!
//! Names are what users put in configuration; the wire id is what the
//! endpoint receives. Local models are served behind an OpenAI-compatible
//! endpoint that answers to the `gpt-4o-mini` id.

use std::fmt;
use std::str::FromStr;

use crate::LlmError;

pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MAX_TOKENS: u32 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelName {
    Gpt4o,
    Gpt4oMini,
    Qwen3Local,
    Gemma3Local,
}

impl ModelName {
    pub const ALL: [ModelName; 4] = [
        ModelName::Gpt4o,
        ModelName::Gpt4oMini,
        ModelName::Qwen3Local,
        ModelName::Gemma3Local,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ModelName::Gpt4o => "gpt-4o",
            ModelName::Gpt4oMini => "gpt-4o-mini",
            ModelName::Qwen3Local => "qwen-3-local",
            ModelName::Gemma3Local => "gemma-3-local",
        }
    }

    /// Model id sent to the endpoint
    #[must_use]
    pub const fn wire_model(self) -> &'static str {
        match self {
            ModelName::Gpt4o => "gpt-4o",
            ModelName::Gpt4oMini | ModelName::Qwen3Local | ModelName::Gemma3Local => {
                "gpt-4o-mini"
            }
        }
    }

    /// Whether the model runs on a local OpenAI-compatible server
    #[must_use]
    pub const fn is_local(self) -> bool {
        matches!(self, ModelName::Qwen3Local | ModelName::Gemma3Local)
    }
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelName {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelName::ALL
            .into_iter()
            .find(|model| model.as_str() == s)
            .ok_or_else(|| LlmError::Unsupported(format!("Invalid model name: {s}")))
    }
}

/// Resolve a configured model name to the id sent on the wire.
///
/// The `openai` provider only accepts registry names; `anthropic` takes
/// `claude-*` ids verbatim.
///
/// # Errors
///
/// Returns `LlmError::Unsupported` for unknown names or providers.
pub fn resolve_wire_model(provider: &str, name: &str) -> Result<String, LlmError> {
    match provider {
        "openai" => Ok(name.parse::<ModelName>()?.wire_model().to_string()),
        "anthropic" if name.starts_with("claude-") => Ok(name.to_string()),
        "anthropic" => Err(LlmError::Unsupported(format!("Invalid model name: {name}"))),
        other => Err(LlmError::Unsupported(format!(
            "Unknown oracle provider '{other}'. Supported providers: openai, anthropic."
        ))),
    }
}
