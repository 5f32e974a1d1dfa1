//! Identify command implementation
//!
//! Handles `creaturedex identify <IMAGE>` and `creaturedex identify <IMAGE> --json`.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use creaturedex_config::Config;
use creaturedex_engine::{Identification, Identifier};
use creaturedex_llm::oracles_from_config;
use creaturedex_store::LocalImageStore;
use creaturedex_utils::error::CreaturedexError;

use super::common::{emit_json, load_image, open_catalog, print_creature};

pub async fn execute_identify_command(path: &Path, json: bool, config: &Config) -> Result<()> {
    let image = load_image(path)?;
    debug!(
        path = %path.display(),
        media_type = %image.media_type,
        bytes = image.bytes.len(),
        "Loaded image"
    );

    let oracles = oracles_from_config(config).map_err(CreaturedexError::Llm)?;
    let catalog = Arc::new(open_catalog(config)?);
    let uploads = Arc::new(
        LocalImageStore::new(config.storage.upload_dir.clone()).map_err(CreaturedexError::Store)?,
    );

    let identification = Identifier::new(oracles, catalog, uploads)
        .identify(&image)
        .await
        .map_err(CreaturedexError::Pipeline)?;

    if json {
        return emit_json(identification.creature());
    }

    match &identification {
        Identification::Created(creature) => {
            println!("✓ Cataloged new creature");
            print_creature(creature);
        }
        Identification::Existing(creature) => {
            println!("✓ Already in the catalog");
            print_creature(creature);
        }
    }
    Ok(())
}
