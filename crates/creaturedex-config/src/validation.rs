use creaturedex_utils::error::{ConfigError, CreaturedexError};

use super::Config;

/// Providers with a backend implementation
pub const SUPPORTED_PROVIDERS: &[&str] = &["openai", "anthropic"];

/// Model names accepted for the `openai` provider
pub const SUPPORTED_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "qwen-3-local", "gemma-3-local"];

fn invalid(key: &str, value: String) -> CreaturedexError {
    CreaturedexError::Config(ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

fn validate_model(provider: &str, key: &str, model: &str) -> Result<(), CreaturedexError> {
    match provider {
        "openai" if !SUPPORTED_MODELS.contains(&model) => Err(invalid(
            key,
            format!(
                "'{model}' is not supported. Supported models: {}",
                SUPPORTED_MODELS.join(", ")
            ),
        )),
        // Anthropic model ids are passed through verbatim
        "anthropic" if !model.starts_with("claude-") => Err(invalid(
            key,
            format!("'{model}' is not an Anthropic model id (expected 'claude-...')"),
        )),
        _ => Ok(()),
    }
}

fn validate_endpoint(key: &str, endpoint: Option<&str>) -> Result<(), CreaturedexError> {
    if let Some(url) = endpoint
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        return Err(invalid(
            key,
            format!("'{url}' must be an http:// or https:// URL"),
        ));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values
    pub(crate) fn validate(&self) -> Result<(), CreaturedexError> {
        let oracle = &self.oracle;

        if !SUPPORTED_PROVIDERS.contains(&oracle.provider.as_str()) {
            return Err(invalid(
                "oracle.provider",
                format!(
                    "'{}' is not supported. Supported providers: {}",
                    oracle.provider,
                    SUPPORTED_PROVIDERS.join(", ")
                ),
            ));
        }

        validate_model(&oracle.provider, "oracle.model", &oracle.model)?;
        validate_model(&oracle.provider, "oracle.vision.model", &oracle.vision.model)?;

        validate_endpoint("oracle.endpoint", oracle.endpoint.as_deref())?;
        validate_endpoint("oracle.vision.endpoint", oracle.vision.endpoint.as_deref())?;

        if oracle.timeout_secs < 5 {
            return Err(invalid(
                "oracle.timeout_secs",
                "must be at least 5 seconds".to_string(),
            ));
        }
        if oracle.timeout_secs > 600 {
            return Err(invalid(
                "oracle.timeout_secs",
                "exceeds maximum limit of 600 seconds (10 minutes)".to_string(),
            ));
        }

        if oracle.max_tokens == 0 {
            return Err(invalid(
                "oracle.max_tokens",
                "must be greater than 0".to_string(),
            ));
        }

        if !oracle.temperature.is_finite() || !(0.0..=2.0).contains(&oracle.temperature) {
            return Err(invalid(
                "oracle.temperature",
                format!("{} is outside the range [0, 2]", oracle.temperature),
            ));
        }

        if oracle.budget == Some(0) {
            return Err(invalid(
                "oracle.budget",
                "must be greater than 0".to_string(),
            ));
        }

        if oracle.api_key_env.trim().is_empty() {
            return Err(invalid(
                "oracle.api_key_env",
                "must name an environment variable".to_string(),
            ));
        }
        if oracle.vision.api_key_env.trim().is_empty() {
            return Err(invalid(
                "oracle.vision.api_key_env",
                "must name an environment variable".to_string(),
            ));
        }

        if self.storage.database_path.as_os_str().is_empty() {
            return Err(CreaturedexError::Config(ConfigError::MissingRequired(
                "storage.database_path".to_string(),
            )));
        }
        if self.storage.upload_dir.as_os_str().is_empty() {
            return Err(CreaturedexError::Config(ConfigError::MissingRequired(
                "storage.upload_dir".to_string(),
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::Config;

    fn key_of(err: creaturedex_utils::error::CreaturedexError) -> String {
        match err {
            creaturedex_utils::error::CreaturedexError::Config(
                creaturedex_utils::error::ConfigError::InvalidValue { key, .. },
            ) => key,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::builder().build().is_ok());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = Config::builder().provider("ollama").build().unwrap_err();
        assert_eq!(key_of(err), "oracle.provider");
    }

    #[test]
    fn test_unknown_model_rejected() {
        let err = Config::builder().model("llama-70b").build().unwrap_err();
        assert_eq!(key_of(err), "oracle.model");

        let err = Config::builder().vision_model("gpt-5").build().unwrap_err();
        assert_eq!(key_of(err), "oracle.vision.model");
    }

    #[test]
    fn test_anthropic_requires_claude_model_ids() {
        let ok = Config::builder()
            .provider("anthropic")
            .model("claude-sonnet-4-5")
            .vision_model("claude-sonnet-4-5")
            .build();
        assert!(ok.is_ok());

        let err = Config::builder()
            .provider("anthropic")
            .model("gpt-4o")
            .vision_model("claude-sonnet-4-5")
            .build()
            .unwrap_err();
        assert_eq!(key_of(err), "oracle.model");
    }

    #[test]
    fn test_timeout_bounds() {
        assert!(Config::builder().timeout_secs(4).build().is_err());
        assert!(Config::builder().timeout_secs(5).build().is_ok());
        assert!(Config::builder().timeout_secs(600).build().is_ok());
        assert!(Config::builder().timeout_secs(601).build().is_err());
    }

    #[test]
    fn test_max_tokens_must_be_positive() {
        let err = Config::builder().max_tokens(0).build().unwrap_err();
        assert_eq!(key_of(err), "oracle.max_tokens");
    }

    #[test]
    fn test_temperature_bounds() {
        assert!(Config::builder().temperature(-0.1).build().is_err());
        assert!(Config::builder().temperature(2.5).build().is_err());
        assert!(Config::builder().temperature(f32::NAN).build().is_err());
        assert!(Config::builder().temperature(1.0).build().is_ok());
    }

    #[test]
    fn test_zero_budget_rejected() {
        let err = Config::builder().budget(0).build().unwrap_err();
        assert_eq!(key_of(err), "oracle.budget");
    }

    #[test]
    fn test_endpoint_must_be_http_url() {
        let err = Config::builder()
            .endpoint("localhost:8080")
            .build()
            .unwrap_err();
        assert_eq!(key_of(err), "oracle.endpoint");
    }
}
