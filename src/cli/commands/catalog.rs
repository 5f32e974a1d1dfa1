//! Catalog administration commands: list, show, update, delete

use anyhow::Result;

use creaturedex_config::Config;
use creaturedex_model::{Creature, CreatureUpdate};
use creaturedex_store::{CreatureStore, StoreError};
use creaturedex_utils::error::{ConfigError, CreaturedexError};

use super::common::{emit_json, open_catalog, print_creature};

pub async fn execute_list_command(skip: u32, limit: u32, json: bool, config: &Config) -> Result<()> {
    let creatures = list_page(&open_catalog(config)?, skip, limit).await?;

    if json {
        return emit_json(&creatures);
    }

    if creatures.is_empty() {
        println!("No creatures cataloged");
        return Ok(());
    }
    for creature in &creatures {
        println!(
            "{:>5}  {}  ({})",
            creature.id, creature.name, creature.scientific_name
        );
    }
    Ok(())
}

pub async fn execute_show_command(id: i64, json: bool, config: &Config) -> Result<()> {
    let creature = fetch(&open_catalog(config)?, id).await?;
    if json {
        emit_json(&creature)
    } else {
        print_creature(&creature);
        Ok(())
    }
}

pub async fn execute_update_command(
    id: i64,
    update: CreatureUpdate,
    json: bool,
    config: &Config,
) -> Result<()> {
    let updated = apply_update(&open_catalog(config)?, id, update).await?;
    if json {
        emit_json(&updated)
    } else {
        println!("✓ Updated creature #{id}");
        print_creature(&updated);
        Ok(())
    }
}

pub async fn execute_delete_command(id: i64, config: &Config) -> Result<()> {
    open_catalog(config)?
        .delete(id)
        .await
        .map_err(CreaturedexError::Store)?;
    println!("✓ Deleted creature #{id}");
    Ok(())
}

async fn list_page(store: &dyn CreatureStore, skip: u32, limit: u32) -> Result<Vec<Creature>> {
    Ok(store
        .list(skip, limit)
        .await
        .map_err(CreaturedexError::Store)?)
}

async fn fetch(store: &dyn CreatureStore, id: i64) -> Result<Creature> {
    store
        .get(id)
        .await
        .map_err(CreaturedexError::Store)?
        .ok_or_else(|| CreaturedexError::Store(StoreError::NotFound { id }).into())
}

async fn apply_update(
    store: &dyn CreatureStore,
    id: i64,
    update: CreatureUpdate,
) -> Result<Creature> {
    if update.is_empty() {
        return Err(CreaturedexError::Config(ConfigError::InvalidValue {
            key: "update".to_string(),
            value: "no fields given; pass at least one field flag".to_string(),
        })
        .into());
    }
    Ok(store
        .update(id, update)
        .await
        .map_err(CreaturedexError::Store)?)
}
