//! Property-based tests for the identification invariants
//!
//! Case counts follow `PROPTEST_CASES` (default 64).

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use creaturedex::{
    BodyShape, CreatureProfile, ExplainStage, Identifier, ImageInput, ImageStore, MemoryStore,
    OracleSet, PipelineError, ScanStage,
};
use creaturedex_engine::record::assemble;
use creaturedex_engine::testing::ScriptedOracle;
use creaturedex_llm::LlmError;
use creaturedex_store::StoreError;
use proptest::prelude::*;
use serde_json::json;

const DEFAULT_PROPTEST_CASES: u32 = 64;

fn proptest_config() -> ProptestConfig {
    let cases = env::var("PROPTEST_CASES")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_PROPTEST_CASES);
    ProptestConfig::with_cases(cases)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn png() -> ImageInput {
    ImageInput::new(vec![0x89, b'P', b'N', b'G'], "image/png")
}

struct DiscardImages;

#[async_trait]
impl ImageStore for DiscardImages {
    async fn save(&self, _image: &ImageInput) -> Result<String, StoreError> {
        Ok("uploads/discarded.png".to_string())
    }
}

fn body_shape() -> impl Strategy<Value = BodyShape> {
    prop::sample::select(BodyShape::ALL.to_vec())
}

prop_compose! {
    fn profile()(
        scientific_name in "[A-Z][a-z]{2,10} [a-z]{3,10}",
        description in "[A-Za-z ,.]{0,80}",
        creature_type in "[A-Z][a-z]{2,8}",
        gender_ratio in prop::sample::select(vec![0.0f64, 0.125, 0.25, 0.5, 0.75, 0.875, 1.0]),
        kingdom in "[A-Z][a-z]{3,10}",
        classification in "[A-Z][a-z]{3,10}",
        family in "[A-Z][a-z]{3,10}",
        height_quarters in 1u32..40_000,
        weight_quarters in 1u32..800_000,
        body_shape in body_shape(),
    ) -> CreatureProfile {
        CreatureProfile {
            scientific_name,
            description,
            creature_type,
            gender_ratio,
            kingdom,
            classification,
            family,
            height_cm: f64::from(height_quarters) / 4.0,
            weight_kg: f64::from(weight_quarters) / 4.0,
            body_shape,
        }
    }
}

proptest! {
    #![proptest_config(proptest_config())]

    /// A rejected verification always wins over any detected name
    #[test]
    fn rejected_verification_never_yields_a_name(name in "[A-Za-z][A-Za-z ]{0,30}") {
        let oracle = ScriptedOracle::new(vec![
            Ok(json!({"name": name})),
            Ok(json!({"is_creature": false})),
        ]);
        let scan = ScanStage::new(oracle.clone(), oracle.clone());

        let result = runtime().block_on(scan.run(&png())).unwrap();
        prop_assert_eq!(result, None);
    }

    /// ...and the pipeline then reports no creature without touching the catalog
    #[test]
    fn rejected_verification_leaves_catalog_empty(name in "[A-Za-z][A-Za-z ]{0,30}") {
        let oracle = ScriptedOracle::new(vec![
            Ok(json!({"name": name})),
            Ok(json!({"is_creature": false})),
        ]);
        let store = Arc::new(MemoryStore::new());
        let identifier = Identifier::new(
            OracleSet::shared(oracle),
            store.clone(),
            Arc::new(DiscardImages),
        );

        let rt = runtime();
        let err = rt.block_on(identifier.identify(&png())).unwrap_err();
        prop_assert!(matches!(err, PipelineError::NoCreatureRecognized));
        prop_assert!(rt.block_on(store.is_empty()));
    }

    /// Non-positive sizes are a schema violation, whatever the other fields hold
    #[test]
    fn non_positive_sizes_are_always_rejected(
        profile in profile(),
        bad in prop_oneof![Just(0.0f64), -1.0e6f64..0.0],
        field in prop::sample::select(vec!["height_cm", "weight_kg"]),
    ) {
        let mut answer = serde_json::to_value(&profile).unwrap();
        answer[field] = json!(bad);
        let oracle = ScriptedOracle::new(vec![Ok(answer)]);

        let err = runtime()
            .block_on(ExplainStage::new(oracle).run("Test Creature"))
            .unwrap_err();
        prop_assert!(matches!(err, PipelineError::Retrieval(LlmError::SchemaViolation(_))));
    }

    /// Every profile field survives explain and record assembly unchanged
    #[test]
    fn profile_to_record_is_lossless(profile in profile(), path in "uploads/[a-f0-9]{8}\\.png") {
        let oracle = ScriptedOracle::new(vec![Ok(serde_json::to_value(&profile).unwrap())]);

        let explained = runtime()
            .block_on(ExplainStage::new(oracle).run("Test Creature"))
            .unwrap();
        prop_assert_eq!(&explained, &profile);

        let record = assemble("Test Creature", explained, path.clone());
        prop_assert_eq!(&record.image_path, &path);
        prop_assert_eq!(record.with_id(1).profile(), profile);
    }
}
