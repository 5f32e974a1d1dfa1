//! creaturedex - identify living creatures from photographs
//!
//! An image goes through three stages:
//!
//! 1. **Scan**: a vision model names the subject and a reasoning model
//!    confirms it is an animal or sea creature.
//! 2. **Dedupe**: if the catalog already holds a creature with that exact
//!    name, that record is returned and nothing else runs.
//! 3. **Explain**: the reasoning model produces a biological profile, which is
//!    stored together with the uploaded image.
//!
//! # Embedding
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use creaturedex::{Config, Identifier, ImageInput, LocalImageStore, SqliteStore};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::builder().model("gpt-4o").vision_model("gpt-4o").build()?;
//! let oracles = creaturedex::oracles_from_config(&config)?;
//! let identifier = Identifier::new(
//!     oracles,
//!     Arc::new(SqliteStore::open(&config.storage.database_path)?),
//!     Arc::new(LocalImageStore::new(config.storage.upload_dir.clone())?),
//! );
//!
//! let image = ImageInput::new(std::fs::read("lion.jpg")?, "image/jpeg");
//! let creature = identifier.identify(&image).await?.into_creature();
//! println!("{} ({})", creature.name, creature.scientific_name);
//! # Ok(())
//! # }
//! ```
//!
//! The CLI lives in [`cli`]; `main.rs` only calls [`cli::run`].

pub mod cli;

pub use creaturedex_config::{CliArgs, Config, ConfigBuilder};
pub use creaturedex_engine::{ExplainStage, Identification, Identifier, ScanStage};
pub use creaturedex_llm::{OracleSet, StructuredOracle, oracles_from_config};
pub use creaturedex_model::{BodyShape, Creature, CreatureProfile, CreatureUpdate, NewCreature};
pub use creaturedex_store::{
    CreatureStore, ImageInput, ImageStore, LocalImageStore, MemoryStore, SqliteStore,
};
pub use creaturedex_utils::error::{CreaturedexError, PipelineError};
pub use creaturedex_utils::exit_codes::ExitCode;
