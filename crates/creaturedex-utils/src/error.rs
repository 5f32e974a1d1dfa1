use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Library-level error type with rich context and user-friendly reporting.
///
/// `CreaturedexError` is the umbrella error returned by creaturedex library
/// operations. It provides:
/// - Detailed error information for programmatic handling
/// - User-friendly messages with context and suggestions
/// - Mapping to CLI exit codes for consistent error reporting
///
/// # Error Categories
///
/// | Category | Description |
/// |----------|-------------|
/// | `Config` | Configuration file or CLI argument errors |
/// | `Pipeline` | Identification pipeline outcomes (rejections and faults) |
/// | `Store` | Catalog storage errors outside of the pipeline |
/// | `Llm` | Oracle backend construction or invocation errors |
///
/// # Exit Code Mapping
///
/// Use [`to_exit_code()`](Self::to_exit_code) to map errors to CLI exit codes:
///
/// | Exit Code | Error Type |
/// |-----------|------------|
/// | 2 | Configuration, CLI argument, or precondition errors |
/// | 3 | No creature recognized in the image |
/// | 4 | Creature already exists (conflict) |
/// | 5 | Creature not found |
/// | 10 | Oracle timeout |
/// | 70 | Oracle failure |
/// | 1 | Other errors |
///
/// Library code returns `CreaturedexError` and does NOT call `std::process::exit()`.
#[derive(Error, Debug)]
pub enum CreaturedexError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identification error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Oracle error: {0}")]
    Llm(#[from] LlmError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Trait for providing user-friendly error reporting with context and suggestions
pub trait UserFriendlyError {
    /// Get a user-friendly error message
    fn user_message(&self) -> String;

    /// Get contextual information about the error
    fn context(&self) -> Option<String>;

    /// Get suggested actions to resolve the error
    fn suggestions(&self) -> Vec<String>;

    /// Get the error category for grouping similar errors
    fn category(&self) -> ErrorCategory;
}

/// Categories of errors for better organization and handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    OracleIntegration,
    Identification,
    Storage,
    FileSystem,
    ResourceLimits,
    Validation,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::OracleIntegration => write!(f, "Oracle Integration"),
            Self::Identification => write!(f, "Identification"),
            Self::Storage => write!(f, "Storage"),
            Self::FileSystem => write!(f, "File System"),
            Self::ResourceLimits => write!(f, "Resource Limits"),
            Self::Validation => write!(f, "Validation"),
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file: {0}")]
    InvalidFile(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found at {path}")]
    NotFound { path: String },
}

impl UserFriendlyError for ConfigError {
    fn user_message(&self) -> String {
        match self {
            Self::InvalidFile(msg) => format!("Configuration file is invalid: {msg}"),
            Self::MissingRequired(what) => format!("Required configuration is missing: {what}"),
            Self::InvalidValue { key, value } => {
                format!("Configuration key '{key}' has an invalid value: {value}")
            }
            Self::NotFound { path } => format!("Configuration file not found: {path}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::InvalidFile(_) => {
                Some("Configuration files are parsed as TOML with [oracle], [storage] and [defaults] sections.".to_string())
            }
            Self::NotFound { .. } => Some(
                "creaturedex searches upward from the current directory for .creaturedex/config.toml."
                    .to_string(),
            ),
            _ => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidFile(_) => vec![
                "Check the TOML syntax of the configuration file".to_string(),
                "Remove unknown keys or sections".to_string(),
            ],
            Self::MissingRequired(_) => vec![
                "Add the missing key to .creaturedex/config.toml".to_string(),
                "Or pass the equivalent CLI flag".to_string(),
            ],
            Self::InvalidValue { key, .. } => {
                vec![format!("Correct the value of '{key}' in the configuration file or CLI flags")]
            }
            Self::NotFound { .. } => vec![
                "Check the path passed to --config".to_string(),
                "Set CREATUREDEX_HOME to a directory containing config.toml".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Configuration
    }
}

/// Errors that can occur during oracle backend operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Transport-level failure (HTTP connectivity, malformed envelope)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Provider authentication failure (401, 403, missing API key)
    #[error("Provider authentication error: {0}")]
    ProviderAuth(String),

    /// Provider quota/rate limit exceeded (429)
    #[error("Provider quota exceeded: {0}")]
    ProviderQuota(String),

    /// Provider service outage (5xx errors)
    #[error("Provider outage: {0}")]
    ProviderOutage(String),

    /// Invocation timed out
    #[error("Timeout after {duration:?}")]
    Timeout { duration: Duration },

    /// Budget limit exceeded
    #[error("Budget exceeded: attempted {attempted} calls, limit is {limit}")]
    BudgetExceeded { limit: u32, attempted: u32 },

    /// Response did not conform to the requested output schema
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Configuration error
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    /// Unsupported feature, provider or model
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl UserFriendlyError for LlmError {
    fn user_message(&self) -> String {
        match self {
            Self::Transport(msg) => format!("Oracle transport error: {msg}"),
            Self::ProviderAuth(msg) => format!("Oracle provider authentication failed: {msg}"),
            Self::ProviderQuota(msg) => format!("Oracle provider quota exceeded: {msg}"),
            Self::ProviderOutage(msg) => format!("Oracle provider service outage: {msg}"),
            Self::Timeout { duration } => {
                format!("Oracle invocation timed out after {:?}", duration)
            }
            Self::BudgetExceeded { limit, attempted } => format!(
                "Oracle budget exceeded: attempted {} calls, limit is {}",
                attempted, limit
            ),
            Self::SchemaViolation(msg) => {
                format!("Oracle returned a response that does not match the expected shape: {msg}")
            }
            Self::Misconfiguration(msg) => format!("Oracle configuration error: {msg}"),
            Self::Unsupported(msg) => format!("Oracle feature not supported: {msg}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Transport(_) => {
                Some("Transport errors occur when the model endpoint cannot be reached.".to_string())
            }
            Self::ProviderAuth(_) => Some(
                "Authentication errors indicate missing or invalid API keys.".to_string(),
            ),
            Self::ProviderQuota(_) => Some(
                "Quota errors occur when rate limits or usage limits are exceeded.".to_string(),
            ),
            Self::ProviderOutage(_) => {
                Some("Provider outages are temporary service disruptions.".to_string())
            }
            Self::Timeout { .. } => Some(
                "Timeouts occur when a model call takes longer than the configured limit."
                    .to_string(),
            ),
            Self::BudgetExceeded { .. } => {
                Some("Budget limits cap the number of model calls per process.".to_string())
            }
            Self::SchemaViolation(_) => Some(
                "Model answers are parsed into typed records; missing or out-of-range fields are rejected."
                    .to_string(),
            ),
            Self::Misconfiguration(_) | Self::Unsupported(_) => Some(
                "The [oracle] section selects the provider, model and endpoint.".to_string(),
            ),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) => vec![
                "Check that the model endpoint is running and reachable".to_string(),
                "Wait a few minutes and try again".to_string(),
            ],
            Self::ProviderAuth(_) => vec![
                "Check that the API key environment variable is set".to_string(),
                "Verify the API key is valid and not expired".to_string(),
            ],
            Self::ProviderQuota(_) => vec![
                "Wait a few minutes and try again".to_string(),
                "Check your provider's rate limits and usage dashboard".to_string(),
            ],
            Self::Timeout { .. } => vec![
                "Increase [oracle] timeout_secs".to_string(),
                "Use a smaller or faster model".to_string(),
            ],
            Self::BudgetExceeded { .. } => vec![
                "Raise the limit via CREATUREDEX_ORACLE_BUDGET or [oracle] budget".to_string(),
            ],
            Self::SchemaViolation(_) => vec![
                "Try again; model output is non-deterministic".to_string(),
                "Use a model with reliable structured-output support".to_string(),
            ],
            Self::Misconfiguration(_) | Self::Unsupported(_) => vec![
                "Review the [oracle] section of .creaturedex/config.toml".to_string(),
                "Run 'creaturedex models' to list supported model names".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) | Self::ProviderOutage(_) | Self::Timeout { .. } => {
                ErrorCategory::OracleIntegration
            }
            Self::ProviderQuota(_) | Self::BudgetExceeded { .. } => ErrorCategory::ResourceLimits,
            Self::SchemaViolation(_) => ErrorCategory::Validation,
            Self::ProviderAuth(_) | Self::Misconfiguration(_) | Self::Unsupported(_) => {
                ErrorCategory::Configuration
            }
        }
    }
}

/// Errors raised by the creature catalog storage
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write
    #[error("A creature with {field} '{value}' already exists")]
    Conflict { field: String, value: String },

    #[error("Creature {id} not found")]
    NotFound { id: i64 },

    #[error("Storage backend failure: {0}")]
    Backend(String),
}

impl UserFriendlyError for StoreError {
    fn user_message(&self) -> String {
        self.to_string()
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Conflict { .. } => Some(
                "Creature names and scientific names are unique in the catalog.".to_string(),
            ),
            Self::NotFound { .. } => None,
            Self::Backend(_) => Some("The catalog database could not be accessed.".to_string()),
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Conflict { .. } => vec!["Look the creature up with 'creaturedex list'".to_string()],
            Self::NotFound { .. } => vec!["List known creatures with 'creaturedex list'".to_string()],
            Self::Backend(_) => vec![
                "Check [storage] database_path and its permissions".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        ErrorCategory::Storage
    }
}

/// Outcomes of the identification pipeline other than success.
///
/// Each failure class stays distinguishable so a caller can tell
/// "try another image" from "try later" from "already exists".
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Image input was empty; rejected before any oracle call
    #[error("No image provided")]
    EmptyImage,

    /// Explain stage was asked about an empty name; rejected before any oracle call
    #[error("Creature name must not be empty")]
    EmptyCreatureName,

    /// Oracle failure (network, timeout, non-conforming response); never retried here
    #[error("Oracle retrieval failed: {0}")]
    Retrieval(#[from] LlmError),

    /// The scan completed and found no animal or sea creature
    #[error("No creature recognized in the image")]
    NoCreatureRecognized,

    /// A concurrent identification created the same creature first
    #[error("Creature '{name}' already exists")]
    DuplicateCreature { name: String },

    #[error("Catalog storage failed: {0}")]
    Storage(StoreError),

    #[error("Image storage failed: {0}")]
    ImageStorage(String),
}

impl PipelineError {
    /// True for rejections caused by the input rather than by a fault.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyImage
                | Self::EmptyCreatureName
                | Self::NoCreatureRecognized
                | Self::DuplicateCreature { .. }
        )
    }
}

impl UserFriendlyError for PipelineError {
    fn user_message(&self) -> String {
        match self {
            Self::Retrieval(llm) => llm.user_message(),
            Self::Storage(store) => store.user_message(),
            other => other.to_string(),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::EmptyImage => Some("The image file contained no bytes.".to_string()),
            Self::EmptyCreatureName => None,
            Self::Retrieval(llm) => llm.context(),
            Self::NoCreatureRecognized => Some(
                "The model did not find an animal or sea creature in the picture.".to_string(),
            ),
            Self::DuplicateCreature { .. } => Some(
                "Another identification of the same creature finished first.".to_string(),
            ),
            Self::Storage(store) => store.context(),
            Self::ImageStorage(_) => {
                Some("Uploaded images are written to [storage] upload_dir.".to_string())
            }
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::EmptyImage => vec!["Pass a non-empty image file".to_string()],
            Self::EmptyCreatureName => vec![],
            Self::Retrieval(llm) => llm.suggestions(),
            Self::NoCreatureRecognized => vec![
                "Try a different photo where the creature is clearly visible".to_string(),
            ],
            Self::DuplicateCreature { name } => {
                vec![format!("Re-read the existing entry for '{name}' with 'creaturedex list'")]
            }
            Self::Storage(store) => store.suggestions(),
            Self::ImageStorage(_) => vec![
                "Check that [storage] upload_dir exists and is writable".to_string(),
            ],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::EmptyImage | Self::EmptyCreatureName => ErrorCategory::Validation,
            Self::Retrieval(llm) => llm.category(),
            Self::NoCreatureRecognized | Self::DuplicateCreature { .. } => {
                ErrorCategory::Identification
            }
            Self::Storage(_) => ErrorCategory::Storage,
            Self::ImageStorage(_) => ErrorCategory::FileSystem,
        }
    }
}

impl UserFriendlyError for CreaturedexError {
    fn user_message(&self) -> String {
        match self {
            Self::Config(err) => err.user_message(),
            Self::Pipeline(err) => err.user_message(),
            Self::Store(err) => err.user_message(),
            Self::Llm(err) => err.user_message(),
            Self::Io(err) => format!("File system error: {err}"),
        }
    }

    fn context(&self) -> Option<String> {
        match self {
            Self::Config(err) => err.context(),
            Self::Pipeline(err) => err.context(),
            Self::Store(err) => err.context(),
            Self::Llm(err) => err.context(),
            Self::Io(_) => None,
        }
    }

    fn suggestions(&self) -> Vec<String> {
        match self {
            Self::Config(err) => err.suggestions(),
            Self::Pipeline(err) => err.suggestions(),
            Self::Store(err) => err.suggestions(),
            Self::Llm(err) => err.suggestions(),
            Self::Io(_) => vec!["Check file paths and permissions".to_string()],
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(err) => err.category(),
            Self::Pipeline(err) => err.category(),
            Self::Store(err) => err.category(),
            Self::Llm(err) => err.category(),
            Self::Io(_) => ErrorCategory::FileSystem,
        }
    }
}

impl CreaturedexError {
    /// Get a user-friendly error message with context and actionable suggestions.
    ///
    /// ```text
    /// Error: <user message>
    ///
    /// Context: <context if available>
    ///
    /// Suggestions:
    ///   • <suggestion 1>
    /// ```
    ///
    /// # Example
    ///
    /// ```rust
    /// use creaturedex_utils::error::{CreaturedexError, PipelineError};
    ///
    /// let err = CreaturedexError::Pipeline(PipelineError::NoCreatureRecognized);
    /// let message = err.display_for_user();
    /// assert!(message.contains("No creature recognized"));
    /// assert!(message.contains("Suggestions:"));
    /// ```
    #[must_use]
    pub fn display_for_user(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error: {}\n", self.user_message()));

        if let Some(ctx) = self.context() {
            output.push_str(&format!("\nContext: {}\n", ctx));
        }

        let suggestions = self.suggestions();
        if !suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for suggestion in suggestions {
                output.push_str(&format!("  • {}\n", suggestion));
            }
        }

        output
    }

    /// Map this error to the appropriate CLI exit code.
    ///
    /// This is the single source of truth for CLI exit codes.
    ///
    /// ```rust
    /// use creaturedex_utils::error::{CreaturedexError, PipelineError};
    /// use creaturedex_utils::exit_codes::ExitCode;
    ///
    /// let err = CreaturedexError::Pipeline(PipelineError::NoCreatureRecognized);
    /// assert_eq!(err.to_exit_code(), ExitCode::NO_CREATURE);
    /// ```
    #[must_use]
    pub fn to_exit_code(&self) -> crate::exit_codes::ExitCode {
        use crate::exit_codes::ExitCode;

        match self {
            CreaturedexError::Config(_) => ExitCode::CLI_ARGS,
            CreaturedexError::Pipeline(err) => match err {
                PipelineError::EmptyImage | PipelineError::EmptyCreatureName => ExitCode::CLI_ARGS,
                PipelineError::NoCreatureRecognized => ExitCode::NO_CREATURE,
                PipelineError::DuplicateCreature { .. } => ExitCode::CONFLICT,
                PipelineError::Retrieval(llm) => llm_exit_code(llm),
                PipelineError::Storage(store) => store_exit_code(store),
                PipelineError::ImageStorage(_) => ExitCode::INTERNAL,
            },
            CreaturedexError::Store(store) => store_exit_code(store),
            CreaturedexError::Llm(llm) => llm_exit_code(llm),
            CreaturedexError::Io(_) => ExitCode::INTERNAL,
        }
    }
}

fn llm_exit_code(err: &LlmError) -> crate::exit_codes::ExitCode {
    use crate::exit_codes::ExitCode;

    match err {
        LlmError::Timeout { .. } => ExitCode::ORACLE_TIMEOUT,
        LlmError::Misconfiguration(_) | LlmError::Unsupported(_) => ExitCode::CLI_ARGS,
        LlmError::Transport(_)
        | LlmError::ProviderAuth(_)
        | LlmError::ProviderQuota(_)
        | LlmError::ProviderOutage(_)
        | LlmError::BudgetExceeded { .. }
        | LlmError::SchemaViolation(_) => ExitCode::ORACLE_FAILURE,
    }
}

fn store_exit_code(err: &StoreError) -> crate::exit_codes::ExitCode {
    use crate::exit_codes::ExitCode;

    match err {
        StoreError::Conflict { .. } => ExitCode::CONFLICT,
        StoreError::NotFound { .. } => ExitCode::NOT_FOUND,
        StoreError::Backend(_) => ExitCode::INTERNAL,
    }
}
