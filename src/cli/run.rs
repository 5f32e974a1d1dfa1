//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, discovers the configuration, starts tracing and
//! the tokio runtime, dispatches to a command and prints every error itself.

use clap::Parser;

use creaturedex_config::{CliArgs, Config};
use creaturedex_utils::error::CreaturedexError;
use creaturedex_utils::exit_codes::ExitCode;
use creaturedex_utils::logging::init_tracing;

use super::args::{Cli, Commands};
use super::commands;

/// Main CLI execution function.
///
/// Returns `Err(ExitCode)` after the error has been reported on stderr;
/// main.rs only maps it to the process exit status.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    let cli_args = CliArgs {
        config_path: cli.config.clone(),
        provider: cli.provider.clone(),
        model: cli.model.clone(),
        vision_model: cli.vision_model.clone(),
        database_path: cli.database_path.clone(),
        upload_dir: cli.upload_dir.clone(),
        verbose: cli.verbose.then_some(true),
    };

    let config = match Config::discover(&cli_args) {
        Ok(config) => config,
        Err(err) => return Err(report_error(&err)),
    };

    // A second subscriber (e.g. in tests) is not an error worth failing on
    let _ = init_tracing(config.defaults.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("✗ Failed to create async runtime: {e}");
            return Err(ExitCode::INTERNAL);
        }
    };

    let result = rt.block_on(async {
        match cli.command {
            Commands::Identify { image, json } => {
                commands::execute_identify_command(&image, json, &config).await
            }
            Commands::List { skip, limit, json } => {
                commands::execute_list_command(skip, limit, json, &config).await
            }
            Commands::Show { id, json } => commands::execute_show_command(id, json, &config).await,
            Commands::Update { id, fields, json } => {
                commands::execute_update_command(id, fields.into(), json, &config).await
            }
            Commands::Delete { id } => commands::execute_delete_command(id, &config).await,
            Commands::Models { json } => commands::execute_models_command(json),
            Commands::Config { json } => commands::execute_config_command(json, &config),
        }
    });

    result.map_err(|err| report_error(&err))
}

/// Print `error` for the user and pick the exit code
fn report_error(error: &anyhow::Error) -> ExitCode {
    if let Some(err) = error.downcast_ref::<CreaturedexError>() {
        eprint!("{}", err.display_for_user());
        err.to_exit_code()
    } else {
        eprintln!("✗ Unexpected error: {error:#}");
        eprintln!("\n  General troubleshooting:");
        eprintln!("    - Run with --verbose for more detailed output");
        eprintln!("    - Check that the image file and storage paths are readable and writable");
        ExitCode::INTERNAL
    }
}
