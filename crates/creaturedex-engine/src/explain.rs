//! Explain stage: expand a verified name into a [`CreatureProfile`].

use std::borrow::Cow;
use std::sync::Arc;

use creaturedex_llm::{PromptPart, StructuredOracle, StructuredOutput, extract};
use creaturedex_model::CreatureProfile;
use creaturedex_utils::error::PipelineError;
use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::Deserialize;
use tracing::{debug, warn};

fn explain_prompt(name: &str) -> String {
    format!(
        "You are an expert zoologist and Pokemon enthusiast. Provide a detailed explanation of \
the creature named '{name}' in 50 words or less.\n\
Include its scientific name, description, gender ratio, kingdom, classification, family, \
height, weight, and body shape.\n\
Provide the explanation as accurate as possible based on the constraints specified."
    )
}

/// Profile as answered by the oracle; validation rejects non-positive sizes
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct ProfileAnswer(CreatureProfile);

impl JsonSchema for ProfileAnswer {
    fn schema_name() -> Cow<'static, str> {
        CreatureProfile::schema_name()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        CreatureProfile::json_schema(generator)
    }
}

impl StructuredOutput for ProfileAnswer {
    const NAME: &'static str = "creature_profile";
    const DESCRIPTION: &'static str = "Biological profile of the named creature";

    fn validate(&self) -> Result<(), String> {
        self.0.validate().map_err(|e| e.0)
    }
}

#[derive(Clone)]
pub struct ExplainStage {
    reasoning: Arc<dyn StructuredOracle>,
}

impl ExplainStage {
    pub fn new(reasoning: Arc<dyn StructuredOracle>) -> Self {
        Self { reasoning }
    }

    /// # Errors
    ///
    /// `PipelineError::EmptyCreatureName` before any oracle call when `name`
    /// is blank; `PipelineError::Retrieval` when the oracle fails or answers
    /// with a non-conforming profile.
    pub async fn run(&self, name: &str) -> Result<CreatureProfile, PipelineError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PipelineError::EmptyCreatureName);
        }

        debug!(creature = %name, "Requesting creature profile");
        let ProfileAnswer(profile) = extract(
            self.reasoning.as_ref(),
            vec![PromptPart::text(explain_prompt(name))],
        )
        .await?;

        // Soft limits are reported, never enforced
        for advisory in profile.advisories() {
            warn!(creature = %name, advisory = %advisory, "Profile outside expected range");
        }

        debug!(
            creature = %name,
            scientific_name = %profile.scientific_name,
            "Received creature profile"
        );
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedOracle;
    use creaturedex_llm::{LlmError, OutputSchema};
    use creaturedex_model::BodyShape;
    use serde_json::{Value, json};

    fn red_panda_json() -> Value {
        json!({
            "scientific_name": "Ailurus fulgens",
            "description": "Small arboreal mammal with russet fur and a ringed tail.",
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

    fn with_field(field: &str, value: Value) -> Value {
        let mut profile = red_panda_json();
        profile[field] = value;
        profile
    }

    #[tokio::test]
    async fn test_conforming_profile_is_returned() {
        let oracle = ScriptedOracle::new(vec![Ok(red_panda_json())]);

        let profile = ExplainStage::new(oracle.clone()).run("Red Panda").await.unwrap();
        assert_eq!(profile.scientific_name, "Ailurus fulgens");
        assert_eq!(profile.creature_type, "Normal");
        assert_eq!(profile.body_shape, BodyShape::Quadruped);
        assert_eq!(oracle.schemas_seen(), vec!["creature_profile"]);

        let prompt = oracle.prompt(0);
        assert!(matches!(&prompt[0], PromptPart::Text(t) if t.contains("named 'Red Panda'")));
    }

    #[tokio::test]
    async fn test_empty_name_is_rejected_without_oracle_call() {
        let oracle = ScriptedOracle::new(vec![]);

        let err = ExplainStage::new(oracle.clone()).run("  ").await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyCreatureName));
        assert_eq!(oracle.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_field_is_schema_violation() {
        let mut profile = red_panda_json();
        profile.as_object_mut().unwrap().remove("weight_kg");
        let oracle = ScriptedOracle::new(vec![Ok(profile)]);

        let err = ExplainStage::new(oracle).run("Red Panda").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Retrieval(LlmError::SchemaViolation(msg)) if msg.contains("weight_kg")
        ));
    }

    #[tokio::test]
    async fn test_non_positive_sizes_are_rejected() {
        for (field, value) in [
            ("height_cm", json!(0.0)),
            ("height_cm", json!(-12.0)),
            ("weight_kg", json!(0)),
            ("weight_kg", json!(-3.5)),
        ] {
            let oracle = ScriptedOracle::new(vec![Ok(with_field(field, value))]);
            let err = ExplainStage::new(oracle).run("Red Panda").await.unwrap_err();
            assert!(
                matches!(err, PipelineError::Retrieval(LlmError::SchemaViolation(_))),
                "expected schema violation for {field}"
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_body_shape_is_rejected() {
        let oracle = ScriptedOracle::new(vec![Ok(with_field("body_shape", json!("blob")))]);
        let err = ExplainStage::new(oracle).run("Red Panda").await.unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Retrieval(LlmError::SchemaViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_advisory_values_are_kept() {
        let oracle = ScriptedOracle::new(vec![Ok(with_field("gender_ratio", json!(1.5)))]);
        let profile = ExplainStage::new(oracle).run("Red Panda").await.unwrap();
        assert_eq!(profile.gender_ratio, 1.5);
    }

    #[test]
    fn test_profile_schema_requires_every_field() {
        let schema = OutputSchema::of::<ProfileAnswer>();
        let required = schema.schema["required"].as_array().unwrap();
        for field in [
            "scientific_name",
            "description",
            "type",
            "gender_ratio",
            "kingdom",
            "classification",
            "family",
            "height_cm",
            "weight_kg",
            "body_shape",
        ] {
            assert!(required.iter().any(|f| f == field), "{field} not required");
        }
    }
}
