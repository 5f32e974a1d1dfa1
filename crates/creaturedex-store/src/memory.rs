//! In-process catalog, used by tests and embedders

use std::collections::BTreeMap;

use async_trait::async_trait;
use creaturedex_model::{Creature, CreatureUpdate, NewCreature};
use tokio::sync::RwLock;
use tracing::debug;

use crate::{CreatureStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    records: BTreeMap<i64, Creature>,
}

impl Inner {
    /// First unique field already used by a record other than `skip_id`
    fn conflict(&self, name: &str, scientific_name: &str, skip_id: Option<i64>) -> Option<StoreError> {
        let others = || self.records.values().filter(|c| Some(c.id) != skip_id);

        if others().any(|c| c.name == name) {
            return Some(StoreError::Conflict {
                field: "name".to_string(),
                value: name.to_string(),
            });
        }
        if others().any(|c| c.scientific_name == scientific_name) {
            return Some(StoreError::Conflict {
                field: "scientific_name".to_string(),
                value: scientific_name.to_string(),
            });
        }
        None
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CreatureStore for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Creature>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.records.values().find(|c| c.name == name).cloned())
    }

    async fn create(&self, creature: NewCreature) -> Result<Creature, StoreError> {
        let mut inner = self.inner.write().await;
        if let Some(conflict) = inner.conflict(&creature.name, &creature.scientific_name, None) {
            return Err(conflict);
        }

        inner.next_id += 1;
        let record = creature.with_id(inner.next_id);
        inner.records.insert(record.id, record.clone());
        debug!(id = record.id, name = %record.name, "Stored creature in memory");
        Ok(record)
    }

    async fn get(&self, id: i64) -> Result<Option<Creature>, StoreError> {
        Ok(self.inner.read().await.records.get(&id).cloned())
    }

    async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Creature>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .records
            .values()
            .skip(skip as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, update: CreatureUpdate) -> Result<Creature, StoreError> {
        let mut inner = self.inner.write().await;
        let current = inner.records.get(&id).ok_or(StoreError::NotFound { id })?;
        let updated = update.apply_to(current);

        if let Some(conflict) = inner.conflict(&updated.name, &updated.scientific_name, Some(id)) {
            return Err(conflict);
        }

        inner.records.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .records
            .remove(&id)
            .map(|_| ())
            .ok_or(StoreError::NotFound { id })
    }
}
