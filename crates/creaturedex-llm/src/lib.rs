//! Oracle client for creaturedex
//!
//! Two layers:
//! - [`LlmBackend`]: transport to a chat model (OpenAI-compatible or Anthropic),
//!   with shared retry/timeout handling and a per-process call budget.
//! - [`StructuredOracle`]: prompt + schema in, conforming JSON out. Pipeline
//!   stages depend on this capability only and turn answers into typed records
//!   with [`extract`].
//!
//! Oracle handles are plain values built by [`oracles_from_config`] and passed
//! to whoever needs them.

mod anthropic_backend;
mod budgeted_backend;
pub(crate) mod http_client;
pub mod models;
mod openai_backend;
mod structured;
mod types;

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

pub use budgeted_backend::{BudgetedBackend, CallBudget};
pub use creaturedex_utils::error::LlmError;
pub use models::{ModelName, resolve_wire_model};
pub use structured::{
    LlmStructuredOracle, OutputSchema, PromptPart, StructuredOracle, StructuredOutput, extract,
};
pub use types::{
    ContentPart, LlmBackend, LlmInvocation, LlmResult, Message, ResponseSchema, Role,
};

use anthropic_backend::AnthropicBackend;
use creaturedex_config::Config;
use openai_backend::{HttpParams, OpenAiCompatibleBackend};

/// The oracles used by one pipeline.
///
/// `vision` answers the detect step (image in); `reasoning` answers verify
/// and explain (text only).
#[derive(Clone)]
pub struct OracleSet {
    pub vision: Arc<dyn StructuredOracle>,
    pub reasoning: Arc<dyn StructuredOracle>,
}

impl OracleSet {
    pub fn new(vision: Arc<dyn StructuredOracle>, reasoning: Arc<dyn StructuredOracle>) -> Self {
        Self { vision, reasoning }
    }

    /// Use one oracle for every step
    pub fn shared(oracle: Arc<dyn StructuredOracle>) -> Self {
        Self {
            vision: Arc::clone(&oracle),
            reasoning: oracle,
        }
    }
}

/// Endpoint/model/key for one role (vision or reasoning)
struct RoleSettings<'a> {
    role: &'static str,
    model: &'a str,
    endpoint: Option<&'a str>,
    api_key_env: &'a str,
}

fn read_api_key(env_name: &str) -> Option<String> {
    std::env::var(env_name)
        .ok()
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
}

fn construct_backend(
    provider: &str,
    settings: &RoleSettings<'_>,
    params: HttpParams,
) -> Result<(Box<dyn LlmBackend>, String), LlmError> {
    let wire_model = resolve_wire_model(provider, settings.model)?;
    let api_key = read_api_key(settings.api_key_env);
    let endpoint = settings.endpoint.map(str::to_string);

    let backend: Box<dyn LlmBackend> = match provider {
        "openai" => {
            // Local servers run keyless; the public endpoint does not
            if api_key.is_none() && endpoint.is_none() {
                return Err(LlmError::Misconfiguration(format!(
                    "{} oracle uses the public OpenAI endpoint but {} is not set",
                    settings.role, settings.api_key_env
                )));
            }
            Box::new(OpenAiCompatibleBackend::new(
                api_key,
                endpoint,
                wire_model.clone(),
                params,
            )?)
        }
        "anthropic" => {
            let api_key = api_key.ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "{} oracle requires an Anthropic API key in {}",
                    settings.role, settings.api_key_env
                ))
            })?;
            Box::new(AnthropicBackend::new(
                api_key,
                endpoint,
                wire_model.clone(),
                params,
            )?)
        }
        unknown => {
            return Err(LlmError::Unsupported(format!(
                "Unknown oracle provider '{unknown}'. Supported providers: openai, anthropic."
            )));
        }
    };

    debug!(
        role = settings.role,
        provider,
        model = settings.model,
        wire_model = %wire_model,
        endpoint = settings.endpoint.unwrap_or("<provider default>"),
        "Constructed oracle backend"
    );

    Ok((backend, wire_model))
}

/// Build the vision and reasoning oracles from configuration.
///
/// Both backends draw from a single [`CallBudget`].
///
/// # Errors
///
/// Returns `LlmError::Unsupported` for unknown providers or model names and
/// `LlmError::Misconfiguration` when a required API key is missing.
pub fn oracles_from_config(config: &Config) -> Result<OracleSet, LlmError> {
    let oracle = &config.oracle;
    let params = HttpParams {
        max_tokens: oracle.max_tokens,
        temperature: oracle.temperature,
    };
    let timeout = Duration::from_secs(oracle.timeout_secs);
    let budget = CallBudget::from_config(oracle.budget);

    let reasoning_settings = RoleSettings {
        role: "reasoning",
        model: &oracle.model,
        endpoint: oracle.endpoint.as_deref(),
        api_key_env: &oracle.api_key_env,
    };
    let vision_settings = RoleSettings {
        role: "vision",
        model: &oracle.vision.model,
        endpoint: oracle.vision_endpoint(),
        api_key_env: &oracle.vision.api_key_env,
    };

    let build = |settings: &RoleSettings<'_>| -> Result<Arc<dyn StructuredOracle>, LlmError> {
        let (backend, wire_model) = construct_backend(&oracle.provider, settings, params.clone())?;
        let budgeted: Arc<dyn LlmBackend> =
            Arc::new(BudgetedBackend::new(backend, Arc::clone(&budget)));
        Ok(Arc::new(LlmStructuredOracle::new(budgeted, wire_model, timeout)))
    };

    Ok(OracleSet {
        vision: build(&vision_settings)?,
        reasoning: build(&reasoning_settings)?,
    })
}
