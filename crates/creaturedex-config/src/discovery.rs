use anyhow::{Context, Result};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use creaturedex_utils::error::{ConfigError, CreaturedexError};

use super::{CliArgs, Config, ConfigSource, Defaults, OracleConfig, StorageConfig, TomlConfig};

/// Every key tracked in `source_attribution`.
pub(crate) const TRACKED_KEYS: &[&str] = &[
    "oracle.provider",
    "oracle.model",
    "oracle.endpoint",
    "oracle.api_key_env",
    "oracle.timeout_secs",
    "oracle.max_tokens",
    "oracle.temperature",
    "oracle.budget",
    "oracle.vision.model",
    "oracle.vision.endpoint",
    "oracle.vision.api_key_env",
    "storage.database_path",
    "storage.upload_dir",
    "defaults.verbose",
];

/// Environment variable naming a directory that holds `config.toml`
pub const HOME_ENV: &str = "CREATUREDEX_HOME";

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses the current working directory for config file discovery when no
    /// explicit path is provided in `cli_args`.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let home = env::var_os(HOME_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        Self::discover_with_home(start_dir, home.as_deref(), cli_args)
    }

    /// Path-driven variant of [`Config::discover_from`] that takes the
    /// `CREATUREDEX_HOME` value explicitly, so tests avoid process-global state.
    pub fn discover_with_home(
        start_dir: &Path,
        home: Option<&Path>,
        cli_args: &CliArgs,
    ) -> Result<Self> {
        let mut source_attribution: HashMap<String, ConfigSource> = TRACKED_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        let mut oracle = OracleConfig::default();
        let mut storage = StorageConfig::default();
        let mut defaults = Defaults::default();

        let config_path = Self::locate_config_file(start_dir, home, cli_args)?;

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;

            let mut mark = |key: &str| {
                source_attribution.insert(key.to_string(), ConfigSource::Config);
            };

            if let Some(file_oracle) = file_config.oracle {
                if let Some(provider) = file_oracle.provider {
                    oracle.provider = provider;
                    mark("oracle.provider");
                }
                if let Some(model) = file_oracle.model {
                    oracle.model = model;
                    mark("oracle.model");
                }
                if file_oracle.endpoint.is_some() {
                    oracle.endpoint = file_oracle.endpoint;
                    mark("oracle.endpoint");
                }
                if let Some(api_key_env) = file_oracle.api_key_env {
                    oracle.api_key_env = api_key_env;
                    mark("oracle.api_key_env");
                }
                if let Some(timeout_secs) = file_oracle.timeout_secs {
                    oracle.timeout_secs = timeout_secs;
                    mark("oracle.timeout_secs");
                }
                if let Some(max_tokens) = file_oracle.max_tokens {
                    oracle.max_tokens = max_tokens;
                    mark("oracle.max_tokens");
                }
                if let Some(temperature) = file_oracle.temperature {
                    oracle.temperature = temperature;
                    mark("oracle.temperature");
                }
                if file_oracle.budget.is_some() {
                    oracle.budget = file_oracle.budget;
                    mark("oracle.budget");
                }
                if let Some(vision) = file_oracle.vision {
                    if let Some(model) = vision.model {
                        oracle.vision.model = model;
                        mark("oracle.vision.model");
                    }
                    if vision.endpoint.is_some() {
                        oracle.vision.endpoint = vision.endpoint;
                        mark("oracle.vision.endpoint");
                    }
                    if let Some(api_key_env) = vision.api_key_env {
                        oracle.vision.api_key_env = api_key_env;
                        mark("oracle.vision.api_key_env");
                    }
                }
            }

            if let Some(file_storage) = file_config.storage {
                if let Some(database_path) = file_storage.database_path {
                    storage.database_path = database_path;
                    mark("storage.database_path");
                }
                if let Some(upload_dir) = file_storage.upload_dir {
                    storage.upload_dir = upload_dir;
                    mark("storage.upload_dir");
                }
            }

            if let Some(file_defaults) = file_config.defaults
                && let Some(verbose) = file_defaults.verbose
            {
                defaults.verbose = verbose;
                mark("defaults.verbose");
            }
        }

        // CLI overrides everything
        let mut cli = |key: &str| {
            source_attribution.insert(key.to_string(), ConfigSource::Cli);
        };
        if let Some(provider) = &cli_args.provider {
            oracle.provider = provider.clone();
            cli("oracle.provider");
        }
        if let Some(model) = &cli_args.model {
            oracle.model = model.clone();
            cli("oracle.model");
        }
        if let Some(model) = &cli_args.vision_model {
            oracle.vision.model = model.clone();
            cli("oracle.vision.model");
        }
        if let Some(path) = &cli_args.database_path {
            storage.database_path = path.clone();
            cli("storage.database_path");
        }
        if let Some(dir) = &cli_args.upload_dir {
            storage.upload_dir = dir.clone();
            cli("storage.upload_dir");
        }
        if let Some(verbose) = cli_args.verbose {
            defaults.verbose = verbose;
            cli("defaults.verbose");
        }

        let config = Self {
            oracle,
            storage,
            defaults,
            source_attribution,
        };

        config.validate()?;

        Ok(config)
    }

    /// Resolve which configuration file applies, if any.
    ///
    /// `--config` wins and must exist; then `CREATUREDEX_HOME/config.toml`;
    /// then the upward search from `start_dir`.
    fn locate_config_file(
        start_dir: &Path,
        home: Option<&Path>,
        cli_args: &CliArgs,
    ) -> Result<Option<PathBuf>> {
        if let Some(explicit_path) = &cli_args.config_path {
            if !explicit_path.exists() {
                return Err(CreaturedexError::Config(ConfigError::NotFound {
                    path: explicit_path.display().to_string(),
                })
                .into());
            }
            return Ok(Some(explicit_path.clone()));
        }

        if let Some(home) = home {
            let candidate = home.join("config.toml");
            if candidate.exists() {
                return Ok(Some(candidate));
            }
        }

        Self::discover_config_file_from(start_dir)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.creaturedex/config.toml`,
    /// stopping at repository root markers (.git, .hg, .svn) or filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir;

        loop {
            let config_path = current_dir.join(".creaturedex").join("config.toml");
            if config_path.exists() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent,
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    pub(crate) fn load_config_file(path: &Path) -> Result<TomlConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content).map_err(|e| {
            CreaturedexError::Config(ConfigError::InvalidFile(format!(
                "{}: {e}",
                path.display()
            )))
            .into()
        })
    }
}
