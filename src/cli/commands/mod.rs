//! CLI command implementations.
//!
//! Each command returns `anyhow::Result`; typed failures are wrapped as
//! `CreaturedexError` so `run` can pick the exit code.

mod catalog;
mod common;
mod identify;
mod info;

pub use catalog::{
    execute_delete_command, execute_list_command, execute_show_command, execute_update_command,
};
pub use identify::execute_identify_command;
pub use info::{execute_config_command, execute_models_command};
