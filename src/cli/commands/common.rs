//! Helpers shared by the CLI commands

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use creaturedex_config::Config;
use creaturedex_model::Creature;
use creaturedex_store::{ImageInput, SqliteStore, media_type_for_path};
use creaturedex_utils::error::{ConfigError, CreaturedexError};

/// Open the catalog database named in the configuration
pub fn open_catalog(config: &Config) -> Result<SqliteStore> {
    let store =
        SqliteStore::open(&config.storage.database_path).map_err(CreaturedexError::Store)?;
    Ok(store)
}

/// Read an image file, deriving its media type from the extension.
///
/// Files that are not png, jpeg, webp or gif are rejected before anything is
/// read.
pub fn load_image(path: &Path) -> Result<ImageInput> {
    let Some(media_type) = media_type_for_path(path) else {
        return Err(CreaturedexError::Config(ConfigError::InvalidValue {
            key: "image".to_string(),
            value: format!(
                "'{}' is not a supported image (png, jpg, jpeg, webp, gif)",
                path.display()
            ),
        })
        .into());
    };

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read image: {}", path.display()))?;
    Ok(ImageInput::new(bytes, media_type))
}

pub fn emit_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to emit JSON")?;
    println!("{json}");
    Ok(())
}

pub fn print_creature(creature: &Creature) {
    println!("#{} {}", creature.id, creature.name);
    println!("  Scientific name: {}", creature.scientific_name);
    println!("  Type:            {}", creature.creature_type);
    println!("  Kingdom:         {}", creature.kingdom);
    println!("  Classification:  {}", creature.classification);
    println!("  Family:          {}", creature.family);
    println!("  Height:          {} cm", creature.height_cm);
    println!("  Weight:          {} kg", creature.weight_kg);
    println!("  Gender ratio:    {}", creature.gender_ratio);
    println!("  Body shape:      {}", creature.body_shape);
    println!("  Image:           {}", creature.image_path);
    println!("  {}", creature.description);
}
