use std::path::PathBuf;

/// CLI overrides applied on top of the configuration file.
///
/// Every field is optional; `None` leaves the file or default value in place.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit configuration file (`--config`); must exist when given
    pub config_path: Option<PathBuf>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub vision_model: Option<String>,
    pub database_path: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
    pub verbose: Option<bool>,
}
