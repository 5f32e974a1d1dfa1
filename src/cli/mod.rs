//! Command-line interface for creaturedex
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions (clap)
//! - `run`: entry point, configuration, runtime and error reporting
//! - `commands`: command implementations

pub mod args;
mod commands;
mod run;

pub use args::{Cli, Commands, UpdateArgs};
pub use run::run;
