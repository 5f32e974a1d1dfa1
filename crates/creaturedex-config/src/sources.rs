use std::collections::BTreeMap;

use super::{Config, ConfigSource};

impl Config {
    /// Effective configuration as `key -> (value, source)` pairs, sorted by key.
    ///
    /// API keys are never included; only the names of the variables that hold
    /// them are.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, value: Option<String>| {
            if let Some(val) = value {
                let source = self
                    .source_attribution
                    .get(key)
                    .copied()
                    .unwrap_or(ConfigSource::Default);
                config.insert(key.to_string(), (val, source.to_string()));
            }
        };

        let oracle = &self.oracle;
        add_config("oracle.provider", Some(oracle.provider.clone()));
        add_config("oracle.model", Some(oracle.model.clone()));
        add_config("oracle.endpoint", oracle.endpoint.clone());
        add_config("oracle.api_key_env", Some(oracle.api_key_env.clone()));
        add_config("oracle.timeout_secs", Some(oracle.timeout_secs.to_string()));
        add_config("oracle.max_tokens", Some(oracle.max_tokens.to_string()));
        add_config("oracle.temperature", Some(oracle.temperature.to_string()));
        add_config("oracle.budget", oracle.budget.map(|b| b.to_string()));
        add_config("oracle.vision.model", Some(oracle.vision.model.clone()));
        add_config("oracle.vision.endpoint", oracle.vision.endpoint.clone());
        add_config(
            "oracle.vision.api_key_env",
            Some(oracle.vision.api_key_env.clone()),
        );
        add_config(
            "storage.database_path",
            Some(self.storage.database_path.display().to_string()),
        );
        add_config(
            "storage.upload_dir",
            Some(self.storage.upload_dir.display().to_string()),
        );
        add_config("defaults.verbose", Some(self.defaults.verbose.to_string()));

        config
    }
}
