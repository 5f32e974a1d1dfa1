//! Record assembly: profile + name + image path → catalog entry.

use creaturedex_model::{Creature, CreatureProfile, NewCreature};
use creaturedex_store::{CreatureStore, StoreError};
use creaturedex_utils::error::PipelineError;
use tracing::{info, warn};

/// Build the record to store. Every profile field is carried over unchanged.
#[must_use]
pub fn assemble(name: &str, profile: CreatureProfile, image_path: String) -> NewCreature {
    NewCreature::from_profile(name, profile, image_path)
}

/// Create the record in the catalog.
///
/// # Errors
///
/// A uniqueness conflict (another identification created the creature
/// first) is `PipelineError::DuplicateCreature`; any other store failure is
/// `PipelineError::Storage`.
pub async fn persist(
    store: &dyn CreatureStore,
    record: NewCreature,
) -> Result<Creature, PipelineError> {
    let name = record.name.clone();
    match store.create(record).await {
        Ok(created) => {
            info!(id = created.id, name = %created.name, "Cataloged new creature");
            Ok(created)
        }
        Err(StoreError::Conflict { field, value }) => {
            warn!(name = %name, field = %field, value = %value, "Creature was created concurrently");
            Err(PipelineError::DuplicateCreature { name })
        }
        Err(other) => Err(PipelineError::Storage(other)),
    }
}
