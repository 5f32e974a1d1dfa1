//! Identification pipeline: scan → dedupe by name → explain → catalog.
//!
//! One identification is a single sequential task. The dedupe check and the
//! create are not atomic; the catalog's unique constraint on `name` decides
//! concurrent races and the loser gets `PipelineError::DuplicateCreature`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use creaturedex_llm::OracleSet;
use creaturedex_model::Creature;
use creaturedex_store::{CreatureStore, ImageInput, ImageStore};
use creaturedex_utils::error::PipelineError;
use creaturedex_utils::logging::{log_stage_complete, log_stage_error, stage_span};
use tracing::{Instrument, info};

use crate::explain::ExplainStage;
use crate::record;
use crate::scan::ScanStage;

/// Result of a successful identification
#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    /// The creature was already cataloged under this name
    Existing(Creature),
    /// The creature was explained and cataloged by this run
    Created(Creature),
}

impl Identification {
    #[must_use]
    pub fn creature(&self) -> &Creature {
        match self {
            Self::Existing(c) | Self::Created(c) => c,
        }
    }

    #[must_use]
    pub fn into_creature(self) -> Creature {
        match self {
            Self::Existing(c) | Self::Created(c) => c,
        }
    }

    #[must_use]
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created(_))
    }
}

/// Run `fut` inside the span of `stage`, logging its duration and outcome
async fn timed<T, F>(stage: &'static str, fut: F) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    let started = Instant::now();
    let result = fut.instrument(stage_span(stage)).await;
    let elapsed = started.elapsed().as_millis();
    match &result {
        Ok(_) => log_stage_complete(stage, elapsed),
        Err(e) => log_stage_error(stage, &e.to_string(), elapsed),
    }
    result
}

#[derive(Clone)]
pub struct Identifier {
    scan: ScanStage,
    explain: ExplainStage,
    creatures: Arc<dyn CreatureStore>,
    images: Arc<dyn ImageStore>,
}

impl Identifier {
    pub fn new(
        oracles: OracleSet,
        creatures: Arc<dyn CreatureStore>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        Self {
            scan: ScanStage::new(oracles.vision, Arc::clone(&oracles.reasoning)),
            explain: ExplainStage::new(oracles.reasoning),
            creatures,
            images,
        }
    }

    /// Identify the creature in `image`, cataloging it if it is new.
    ///
    /// # Errors
    ///
    /// - `EmptyImage` for an empty image (no oracle call is made)
    /// - `NoCreatureRecognized` when the scan finds no animal or sea creature;
    ///   the catalog is not consulted
    /// - `Retrieval` for any oracle failure
    /// - `DuplicateCreature` when a concurrent run created the same name first
    /// - `Storage` / `ImageStorage` for collaborator faults
    pub async fn identify(&self, image: &ImageInput) -> Result<Identification, PipelineError> {
        let started = Instant::now();

        let name = timed("scan", self.scan.run(image))
            .await?
            .ok_or(PipelineError::NoCreatureRecognized)?;

        if let Some(existing) = self
            .creatures
            .find_by_name(&name)
            .await
            .map_err(PipelineError::Storage)?
        {
            info!(id = existing.id, name = %name, "Creature already cataloged");
            return Ok(Identification::Existing(existing));
        }

        let image_path = self
            .images
            .save(image)
            .await
            .map_err(|e| PipelineError::ImageStorage(e.to_string()))?;

        let profile = timed("explain", self.explain.run(&name)).await?;
        let created = record::persist(
            self.creatures.as_ref(),
            record::assemble(&name, profile, image_path),
        )
        .await?;

        log_stage_complete("identify", started.elapsed().as_millis());
        Ok(Identification::Created(created))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedOracle;
    use async_trait::async_trait;
    use creaturedex_llm::LlmError;
    use creaturedex_model::{CreatureUpdate, NewCreature};
    use creaturedex_store::{MemoryStore, StoreError};
    use serde_json::{Value, json};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Barrier;

    /// Counts saves and hands out sequential paths
    #[derive(Default)]
    struct CountingImages {
        saved: AtomicUsize,
    }

    #[async_trait]
    impl ImageStore for CountingImages {
        async fn save(&self, image: &ImageInput) -> Result<String, StoreError> {
            let n = self.saved.fetch_add(1, Ordering::SeqCst);
            Ok(format!("uploads/{n}.{}", image.media_type.trim_start_matches("image/")))
        }
    }

    struct FailingImages;

    #[async_trait]
    impl ImageStore for FailingImages {
        async fn save(&self, _image: &ImageInput) -> Result<String, StoreError> {
            Err(StoreError::Backend("disk full".to_string()))
        }
    }

    /// Holds every save until all runs have passed the catalog lookup
    struct GatedImages {
        barrier: Barrier,
        saved: AtomicUsize,
    }

    #[async_trait]
    impl ImageStore for GatedImages {
        async fn save(&self, _image: &ImageInput) -> Result<String, StoreError> {
            self.barrier.wait().await;
            let n = self.saved.fetch_add(1, Ordering::SeqCst);
            Ok(format!("uploads/gated-{n}.png"))
        }
    }

    /// MemoryStore that counts name lookups
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        finds: AtomicUsize,
    }

    #[async_trait]
    impl CreatureStore for CountingStore {
        async fn find_by_name(&self, name: &str) -> Result<Option<Creature>, StoreError> {
            self.finds.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_name(name).await
        }

        async fn create(&self, creature: NewCreature) -> Result<Creature, StoreError> {
            self.inner.create(creature).await
        }

        async fn get(&self, id: i64) -> Result<Option<Creature>, StoreError> {
            self.inner.get(id).await
        }

        async fn list(&self, skip: u32, limit: u32) -> Result<Vec<Creature>, StoreError> {
            self.inner.list(skip, limit).await
        }

        async fn update(&self, id: i64, update: CreatureUpdate) -> Result<Creature, StoreError> {
            self.inner.update(id, update).await
        }

        async fn delete(&self, id: i64) -> Result<(), StoreError> {
            self.inner.delete(id).await
        }
    }

    fn profile_json(scientific_name: &str) -> Value {
        json!({
            "scientific_name": scientific_name,
            "description": "Small arboreal mammal with russet fur.",
            "type": "Normal",
            "gender_ratio": 0.5,
            "kingdom": "Animalia",
            "classification": "Mammal",
            "family": "Ailuridae",
            "height_cm": 60.0,
            "weight_kg": 5.0,
            "body_shape": "bsi:quadruped"
        })
    }

    fn png() -> ImageInput {
        ImageInput::new(vec![1, 2, 3, 4], "image/png")
    }

    struct Harness {
        oracle: Arc<ScriptedOracle>,
        store: Arc<MemoryStore>,
        images: Arc<CountingImages>,
        identifier: Identifier,
    }

    fn harness(script: Vec<Result<Value, LlmError>>) -> Harness {
        let oracle = ScriptedOracle::new(script);
        let store = Arc::new(MemoryStore::new());
        let images = Arc::new(CountingImages::default());
        let identifier = Identifier::new(
            OracleSet::shared(oracle.clone()),
            store.clone(),
            images.clone(),
        );
        Harness {
            oracle,
            store,
            images,
            identifier,
        }
    }

    #[tokio::test]
    async fn test_new_creature_is_explained_and_cataloged() {
        let h = harness(vec![
            Ok(json!({"name": "Red Panda"})),
            Ok(json!({"is_creature": true})),
            Ok(profile_json("Ailurus fulgens")),
        ]);

        let result = h.identifier.identify(&png()).await.unwrap();
        assert!(result.is_new());

        let creature = result.creature();
        assert_eq!(creature.name, "Red Panda");
        assert_eq!(creature.scientific_name, "Ailurus fulgens");
        assert_eq!(creature.image_path, "uploads/0.png");
        assert_eq!(
            h.oracle.schemas_seen(),
            vec!["creature_name", "creature_check", "creature_profile"]
        );
        assert_eq!(h.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_known_creature_short_circuits() {
        let h = harness(vec![
            Ok(json!({"name": "Red Panda"})),
            Ok(json!({"is_creature": true})),
            Ok(profile_json("Ailurus fulgens")),
            Ok(json!({"name": "Red Panda"})),
            Ok(json!({"is_creature": true})),
        ]);

        let first = h.identifier.identify(&png()).await.unwrap();
        let second = h.identifier.identify(&png()).await.unwrap();

        assert!(!second.is_new());
        assert_eq!(second.creature(), first.creature());
        assert_eq!(h.oracle.calls(), 5);
        assert_eq!(h.images.saved.load(Ordering::SeqCst), 1);
        assert_eq!(h.store.len().await, 1);
    }

    #[tokio::test]
    async fn test_rejected_candidate_is_no_creature() {
        let h = harness(vec![
            Ok(json!({"name": "Car"})),
            Ok(json!({"is_creature": false})),
        ]);

        let err = h.identifier.identify(&png()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoCreatureRecognized));
        assert!(err.is_client_error());
        assert_eq!(h.oracle.calls(), 2);
        assert_eq!(h.images.saved.load(Ordering::SeqCst), 0);
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_rejected_candidate_never_queries_catalog() {
        let store = Arc::new(CountingStore::default());
        let rejecting = Identifier::new(
            OracleSet::shared(ScriptedOracle::new(vec![
                Ok(json!({"name": "Car"})),
                Ok(json!({"is_creature": false})),
            ])),
            store.clone(),
            Arc::new(CountingImages::default()),
        );

        let err = rejecting.identify(&png()).await.unwrap_err();
        assert!(matches!(err, PipelineError::NoCreatureRecognized));
        assert_eq!(store.finds.load(Ordering::SeqCst), 0);

        // A verified name is looked up exactly once
        let accepting = Identifier::new(
            OracleSet::shared(ScriptedOracle::new(vec![
                Ok(json!({"name": "Red Panda"})),
                Ok(json!({"is_creature": true})),
                Ok(profile_json("Ailurus fulgens")),
            ])),
            store.clone(),
            Arc::new(CountingImages::default()),
        );
        accepting.identify(&png()).await.unwrap();
        assert_eq!(store.finds.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_identifications_create_one_record() {
        let store = Arc::new(MemoryStore::new());
        let images = Arc::new(GatedImages {
            barrier: Barrier::new(2),
            saved: AtomicUsize::new(0),
        });
        let run = || {
            Identifier::new(
                OracleSet::shared(ScriptedOracle::new(vec![
                    Ok(json!({"name": "Red Panda"})),
                    Ok(json!({"is_creature": true})),
                    Ok(profile_json("Ailurus fulgens")),
                ])),
                store.clone(),
                images.clone(),
            )
        };
        let (first, second) = (run(), run());

        let image = png();
        let (a, b) = tokio::join!(first.identify(&image), second.identify(&image));
        let results = [a, b];

        let created = results
            .iter()
            .filter(|r| matches!(r, Ok(Identification::Created(_))))
            .count();
        let duplicates = results
            .iter()
            .filter(|r| {
                matches!(r, Err(PipelineError::DuplicateCreature { name }) if name == "Red Panda")
            })
            .count();

        assert_eq!(created, 1);
        assert_eq!(duplicates, 1);
        assert_eq!(images.saved.load(Ordering::SeqCst), 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_explain_failure_leaves_catalog_untouched() {
        let h = harness(vec![
            Ok(json!({"name": "Red Panda"})),
            Ok(json!({"is_creature": true})),
            Err(LlmError::ProviderOutage("503".to_string())),
        ]);

        let err = h.identifier.identify(&png()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Retrieval(LlmError::ProviderOutage(_))));
        assert!(!err.is_client_error());
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_scientific_name_clash_is_duplicate() {
        let h = harness(vec![
            Ok(json!({"name": "Red Panda"})),
            Ok(json!({"is_creature": true})),
            Ok(profile_json("Ailurus fulgens")),
            Ok(json!({"name": "Lesser Panda"})),
            Ok(json!({"is_creature": true})),
            Ok(profile_json("Ailurus fulgens")),
        ]);

        h.identifier.identify(&png()).await.unwrap();
        let err = h.identifier.identify(&png()).await.unwrap_err();

        assert!(matches!(
            err,
            PipelineError::DuplicateCreature { ref name } if name == "Lesser Panda"
        ));
    }

    #[tokio::test]
    async fn test_image_storage_failure_skips_explain() {
        let oracle = ScriptedOracle::new(vec![
            Ok(json!({"name": "Red Panda"})),
            Ok(json!({"is_creature": true})),
        ]);
        let identifier = Identifier::new(
            OracleSet::shared(oracle.clone()),
            Arc::new(MemoryStore::new()),
            Arc::new(FailingImages),
        );

        let err = identifier.identify(&png()).await.unwrap_err();
        assert!(matches!(err, PipelineError::ImageStorage(msg) if msg.contains("disk full")));
        assert_eq!(oracle.calls(), 2);
    }
}
