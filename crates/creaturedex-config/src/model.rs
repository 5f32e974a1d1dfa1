use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_PROVIDER: &str = "openai";
pub const DEFAULT_MODEL: &str = "qwen-3-local";
pub const DEFAULT_VISION_MODEL: &str = "gemma-3-local";
pub const DEFAULT_API_KEY_ENV: &str = "CREATUREDEX_MODEL_API_KEY";
pub const DEFAULT_VISION_API_KEY_ENV: &str = "CREATUREDEX_IMAGE_MODEL_API_KEY";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_TOKENS: u32 = 512;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_DATABASE_PATH: &str = "creaturedex.db";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from configuration file.
    Config,
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Config => write!(f, "config"),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Configuration for creaturedex.
///
/// `Config` provides hierarchical configuration with discovery and precedence:
/// CLI arguments > config file > built-in defaults.
///
/// # Discovery
///
/// Use [`Config::discover()`] for CLI-like behavior that:
/// - Uses the file passed with `--config` when given
/// - Respects the `CREATUREDEX_HOME` environment variable
/// - Searches for `.creaturedex/config.toml` upward from current directory
/// - Applies built-in defaults for unspecified values
///
/// For embedding, use [`Config::builder()`] which never touches the
/// environment or the filesystem.
///
/// # Configuration File Format
///
/// ```toml
/// [oracle]
/// provider = "openai"
/// model = "qwen-3-local"
/// endpoint = "http://localhost:8080/v1/chat/completions"
/// timeout_secs = 60
///
/// [oracle.vision]
/// model = "gemma-3-local"
///
/// [storage]
/// database_path = "creaturedex.db"
/// upload_dir = "uploads"
///
/// [defaults]
/// verbose = false
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Model backend used by the identification stages.
    pub oracle: OracleConfig,
    /// Catalog database and image upload locations.
    pub storage: StorageConfig,
    pub defaults: Defaults,
    /// Source attribution for each setting, keyed by dotted name.
    pub source_attribution: HashMap<String, ConfigSource>,
}

/// Reasoning model settings. The verify and explain steps use these directly;
/// the detect step uses them with the `[oracle.vision]` overrides applied.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleConfig {
    /// `openai` (any OpenAI-compatible endpoint) or `anthropic`
    pub provider: String,
    pub model: String,
    /// Chat endpoint URL; the provider's public endpoint when unset.
    pub endpoint: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Maximum oracle calls per process; `CREATUREDEX_ORACLE_BUDGET` wins over this.
    pub budget: Option<u32>,
    pub vision: VisionConfig,
}

/// Image model settings for the detect step.
#[derive(Debug, Clone, PartialEq)]
pub struct VisionConfig {
    pub model: String,
    /// Falls back to the reasoning endpoint when unset.
    pub endpoint: Option<String>,
    pub api_key_env: String,
}

impl OracleConfig {
    /// Endpoint for the detect step.
    #[must_use]
    pub fn vision_endpoint(&self) -> Option<&str> {
        self.vision.endpoint.as_deref().or(self.endpoint.as_deref())
    }
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: DEFAULT_PROVIDER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            budget: None,
            vision: VisionConfig::default(),
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_VISION_MODEL.to_string(),
            endpoint: None,
            api_key_env: DEFAULT_VISION_API_KEY_ENV.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            upload_dir: PathBuf::from(DEFAULT_UPLOAD_DIR),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Defaults {
    pub verbose: bool,
}

/// `[oracle]` as written in the TOML file
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct OracleFile {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
    pub timeout_secs: Option<u64>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub budget: Option<u32>,
    pub vision: Option<VisionFile>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct VisionFile {
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct StorageFile {
    pub database_path: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct DefaultsFile {
    pub verbose: Option<bool>,
}

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TomlConfig {
    pub oracle: Option<OracleFile>,
    pub storage: Option<StorageFile>,
    pub defaults: Option<DefaultsFile>,
}
