//! Configuration management for creaturedex
//!
//! Hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. Supports TOML configuration files with `[oracle]`,
//! `[oracle.vision]`, `[storage]` and `[defaults]` sections.

mod builder;
mod cli_args;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use cli_args::CliArgs;
pub use model::*;
pub use validation::{SUPPORTED_MODELS, SUPPORTED_PROVIDERS};

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn create_test_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_dir = dir.join(".creaturedex");
        fs::create_dir_all(&config_dir).unwrap();

        let config_path = config_dir.join("config.toml");
        fs::write(&config_path, content).unwrap();

        config_path
    }

    #[test]
    fn test_default_config() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(".git")).unwrap();

        let config = Config::discover_with_home(temp_dir.path(), None, &CliArgs::default()).unwrap();

        assert_eq!(config.oracle.provider, "openai");
        assert_eq!(config.oracle.model, "qwen-3-local");
        assert_eq!(config.oracle.vision.model, "gemma-3-local");
        assert_eq!(config.oracle.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.oracle.max_tokens, 512);
        assert_eq!(config.oracle.temperature, 0.0);
        assert_eq!(config.storage.database_path, PathBuf::from("creaturedex.db"));
        assert_eq!(config.storage.upload_dir, PathBuf::from("uploads"));
        assert!(!config.defaults.verbose);
        assert_eq!(
            config.source_attribution.get("oracle.model"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_config_discovery_with_cli_override() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(
            temp_dir.path(),
            r#"
[oracle]
model = "gpt-4o-mini"
endpoint = "http://localhost:8080/v1/chat/completions"
timeout_secs = 30

[oracle.vision]
model = "gpt-4o"

[storage]
upload_dir = "images"
"#,
        );

        let cli_args = CliArgs {
            model: Some("gpt-4o".to_string()),
            verbose: Some(true),
            ..CliArgs::default()
        };

        let config = Config::discover_with_home(temp_dir.path(), None, &cli_args).unwrap();

        assert_eq!(config.oracle.model, "gpt-4o");
        assert!(config.defaults.verbose);

        assert_eq!(config.oracle.timeout_secs, 30);
        assert_eq!(config.oracle.vision.model, "gpt-4o");
        assert_eq!(
            config.oracle.endpoint.as_deref(),
            Some("http://localhost:8080/v1/chat/completions")
        );
        assert_eq!(config.storage.upload_dir, PathBuf::from("images"));

        assert_eq!(
            config.source_attribution.get("oracle.model"),
            Some(&ConfigSource::Cli)
        );
        assert_eq!(
            config.source_attribution.get("oracle.timeout_secs"),
            Some(&ConfigSource::Config)
        );
        assert_eq!(
            config.source_attribution.get("storage.database_path"),
            Some(&ConfigSource::Default)
        );
    }

    #[test]
    fn test_config_discovered_from_subdirectory() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(temp_dir.path(), "[oracle]\nmodel = \"gpt-4o\"\n");
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();

        let config = Config::discover_with_home(&nested, None, &CliArgs::default()).unwrap();
        assert_eq!(config.oracle.model, "gpt-4o");
    }

    #[test]
    fn test_home_directory_config_is_used() {
        let project = TempDir::new().unwrap();
        fs::create_dir(project.path().join(".git")).unwrap();
        let home = TempDir::new().unwrap();
        fs::write(
            home.path().join("config.toml"),
            "[storage]\ndatabase_path = \"/var/lib/creaturedex/catalog.db\"\n",
        )
        .unwrap();

        let config =
            Config::discover_with_home(project.path(), Some(home.path()), &CliArgs::default())
                .unwrap();
        assert_eq!(
            config.storage.database_path,
            PathBuf::from("/var/lib/creaturedex/catalog.db")
        );
    }

    #[test]
    fn test_explicit_config_path_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let cli_args = CliArgs {
            config_path: Some(temp_dir.path().join("missing.toml")),
            ..CliArgs::default()
        };

        let err = Config::discover_with_home(temp_dir.path(), None, &cli_args).unwrap_err();
        assert!(format!("{err:#}").contains("not found"));
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(temp_dir.path(), "[oracle\nmodel = ");

        let result = Config::discover_with_home(temp_dir.path(), None, &CliArgs::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(temp_dir.path(), "[oracle]\nmodle = \"gpt-4o\"\n");

        let result = Config::discover_with_home(temp_dir.path(), None, &CliArgs::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_config_validation() {
        let temp_dir = TempDir::new().unwrap();
        create_test_config_file(temp_dir.path(), "[oracle]\ntimeout_secs = 1\n");

        let err = Config::discover_with_home(temp_dir.path(), None, &CliArgs::default())
            .unwrap_err();
        assert!(format!("{err:#}").contains("timeout_secs"));
    }
}
