use std::collections::HashMap;
use std::path::PathBuf;

use creaturedex_utils::error::CreaturedexError;

use super::discovery::TRACKED_KEYS;
use super::{Config, ConfigSource, Defaults, OracleConfig, StorageConfig};

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when you need to configure creaturedex without relying on
    /// environment variables or config files.
    ///
    /// # Example
    ///
    /// ```rust
    /// use creaturedex_config::Config;
    ///
    /// let config = Config::builder()
    ///     .model("gpt-4o-mini")
    ///     .endpoint("http://localhost:8080/v1/chat/completions")
    ///     .database_path("/tmp/creaturedex.db")
    ///     .build()
    ///     .expect("Failed to build config");
    /// assert_eq!(config.oracle.model, "gpt-4o-mini");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for programmatic configuration of creaturedex.
///
/// All values set via the builder are attributed to
/// `ConfigSource::Programmatic` in the resulting `Config`.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    provider: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    api_key_env: Option<String>,
    timeout_secs: Option<u64>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    budget: Option<u32>,
    vision_model: Option<String>,
    vision_endpoint: Option<String>,
    vision_api_key_env: Option<String>,
    database_path: Option<PathBuf>,
    upload_dir: Option<PathBuf>,
    verbose: Option<bool>,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle provider: `openai` or `anthropic`.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Reasoning model used by the verify and explain steps.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn api_key_env(mut self, name: impl Into<String>) -> Self {
        self.api_key_env = Some(name.into());
        self
    }

    /// Per-call oracle timeout in seconds (5 to 600).
    #[must_use]
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Maximum number of oracle calls for this process.
    #[must_use]
    pub fn budget(mut self, budget: u32) -> Self {
        self.budget = Some(budget);
        self
    }

    /// Image model used by the detect step.
    #[must_use]
    pub fn vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn vision_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.vision_endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn vision_api_key_env(mut self, name: impl Into<String>) -> Self {
        self.vision_api_key_env = Some(name.into());
        self
    }

    #[must_use]
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn upload_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.upload_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Build the configuration and validate it.
    ///
    /// # Errors
    ///
    /// Returns `CreaturedexError::Config` if a value fails validation.
    pub fn build(self) -> Result<Config, CreaturedexError> {
        let mut source_attribution: HashMap<String, ConfigSource> = TRACKED_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        let mut oracle = OracleConfig::default();
        let mut storage = StorageConfig::default();
        let mut defaults = Defaults::default();

        let mut set = |key: &str| {
            source_attribution.insert(key.to_string(), ConfigSource::Programmatic);
        };

        if let Some(provider) = self.provider {
            oracle.provider = provider;
            set("oracle.provider");
        }
        if let Some(model) = self.model {
            oracle.model = model;
            set("oracle.model");
        }
        if self.endpoint.is_some() {
            oracle.endpoint = self.endpoint;
            set("oracle.endpoint");
        }
        if let Some(name) = self.api_key_env {
            oracle.api_key_env = name;
            set("oracle.api_key_env");
        }
        if let Some(secs) = self.timeout_secs {
            oracle.timeout_secs = secs;
            set("oracle.timeout_secs");
        }
        if let Some(max_tokens) = self.max_tokens {
            oracle.max_tokens = max_tokens;
            set("oracle.max_tokens");
        }
        if let Some(temperature) = self.temperature {
            oracle.temperature = temperature;
            set("oracle.temperature");
        }
        if self.budget.is_some() {
            oracle.budget = self.budget;
            set("oracle.budget");
        }
        if let Some(model) = self.vision_model {
            oracle.vision.model = model;
            set("oracle.vision.model");
        }
        if self.vision_endpoint.is_some() {
            oracle.vision.endpoint = self.vision_endpoint;
            set("oracle.vision.endpoint");
        }
        if let Some(name) = self.vision_api_key_env {
            oracle.vision.api_key_env = name;
            set("oracle.vision.api_key_env");
        }
        if let Some(path) = self.database_path {
            storage.database_path = path;
            set("storage.database_path");
        }
        if let Some(dir) = self.upload_dir {
            storage.upload_dir = dir;
            set("storage.upload_dir");
        }
        if let Some(verbose) = self.verbose {
            defaults.verbose = verbose;
            set("defaults.verbose");
        }

        let config = Config {
            oracle,
            storage,
            defaults,
            source_attribution,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_values_are_programmatic() {
        let config = Config::builder()
            .model("gpt-4o")
            .upload_dir("/srv/uploads")
            .build()
            .unwrap();

        assert_eq!(config.oracle.model, "gpt-4o");
        assert_eq!(config.storage.upload_dir, PathBuf::from("/srv/uploads"));
        assert_eq!(
            config.source_attribution.get("oracle.model"),
            Some(&ConfigSource::Programmatic)
        );
        assert_eq!(
            config.source_attribution.get("oracle.provider"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_vision_endpoint_falls_back_to_reasoning_endpoint() {
        let config = Config::builder()
            .endpoint("http://localhost:8080/v1/chat/completions")
            .build()
            .unwrap();
        assert_eq!(
            config.oracle.vision_endpoint(),
            Some("http://localhost:8080/v1/chat/completions")
        );

        let config = Config::builder()
            .endpoint("http://localhost:8080/v1/chat/completions")
            .vision_endpoint("http://localhost:8081/v1/chat/completions")
            .build()
            .unwrap();
        assert_eq!(
            config.oracle.vision_endpoint(),
            Some("http://localhost:8081/v1/chat/completions")
        );
    }
}
