use async_trait::async_trait;
use creaturedex_model::{Creature, CreatureUpdate, NewCreature};

use crate::StoreError;

/// Page size used when the caller does not choose one
pub const DEFAULT_PAGE_LIMIT: u32 = 100;

/// The creature catalog.
///
/// Name lookups are exact and case-sensitive.
#[async_trait]
pub trait CreatureStore: Send + Sync {
    async fn find_by_name(&self, name: &str) -> Result<Option<Creature>, StoreError>;

    /// Insert a record and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// `StoreError::Conflict` when `name` or `scientific_name` is already taken.
    async fn create(&self, creature: NewCreature) -> Result<Creature, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<Creature>, StoreError>;

    /// Records ordered by id
    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Creature>, StoreError>;

    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id, `StoreError::Conflict` when
    /// the update would duplicate another record's unique field.
    async fn update(&self, id: i64, update: CreatureUpdate) -> Result<Creature, StoreError>;

    /// # Errors
    ///
    /// `StoreError::NotFound` for an unknown id.
    async fn delete(&self, id: i64) -> Result<(), StoreError>;
}
