//! Scan stage: detect a candidate name in the image, then verify it.
//!
//! The stage completes in both outcomes. "Not a creature" is reported as an
//! absent name, never as an error; oracle failures abort the stage.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use creaturedex_llm::{PromptPart, StructuredOracle, StructuredOutput, extract};
use creaturedex_store::ImageInput;
use creaturedex_utils::error::PipelineError;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info};

const DETECT_PROMPT: &str = "You are an expert zoologist. Look at the image and identify the creature shown. \
If the image contains a clearly visible animal or living being, respond with its common name, \
such as \"African Lion\", \"Red Kangaroo\", or \"Chimpanzee\".";

fn verify_prompt(name: &str) -> String {
    format!("Is {name} an animal or sea creature?")
}

/// Detect answer
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreatureName {
    /// The name of the creature identified from the image.
    pub name: String,
}

impl StructuredOutput for CreatureName {
    const NAME: &'static str = "creature_name";
    const DESCRIPTION: &'static str = "Common name of the creature shown in the image";
}

/// Verify answer
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreatureCheck {
    /// Indicates if the identified object is an animal/sea creature or not.
    pub is_creature: bool,
}

impl StructuredOutput for CreatureCheck {
    const NAME: &'static str = "creature_check";
    const DESCRIPTION: &'static str = "Whether the named subject is an animal or sea creature";
}

/// Detect-then-verify over two oracles: `vision` sees the image, `reasoning`
/// answers the yes/no question.
#[derive(Clone)]
pub struct ScanStage {
    vision: Arc<dyn StructuredOracle>,
    reasoning: Arc<dyn StructuredOracle>,
}

impl ScanStage {
    pub fn new(vision: Arc<dyn StructuredOracle>, reasoning: Arc<dyn StructuredOracle>) -> Self {
        Self { vision, reasoning }
    }

    /// Run both steps. Returns the verified name, or `None` when no creature
    /// was found.
    ///
    /// # Errors
    ///
    /// `PipelineError::EmptyImage` before any oracle call for an empty image;
    /// `PipelineError::Retrieval` when either oracle call fails.
    pub async fn run(&self, image: &ImageInput) -> Result<Option<String>, PipelineError> {
        let Some(candidate) = self.detect(image).await? else {
            return Ok(None);
        };

        if self.verify(&candidate).await? {
            Ok(Some(candidate))
        } else {
            info!(candidate = %candidate, "Candidate is not an animal or sea creature");
            Ok(None)
        }
    }

    /// Ask the vision oracle for the subject's common name.
    ///
    /// A blank answer is treated as "nothing detected".
    pub async fn detect(&self, image: &ImageInput) -> Result<Option<String>, PipelineError> {
        if image.is_empty() {
            return Err(PipelineError::EmptyImage);
        }

        let prompt = vec![
            PromptPart::text(DETECT_PROMPT),
            PromptPart::image(image.media_type.clone(), BASE64.encode(&image.bytes)),
        ];

        debug!(
            bytes = image.bytes.len(),
            media_type = %image.media_type,
            "Sending image to vision oracle"
        );
        let answer: CreatureName = extract(self.vision.as_ref(), prompt).await?;

        let name = answer.name.trim();
        if name.is_empty() {
            info!("Vision oracle returned an empty name");
            return Ok(None);
        }

        debug!(candidate = %name, "Detected candidate");
        Ok(Some(name.to_string()))
    }

    /// Ask the reasoning oracle whether `name` is an animal or sea creature.
    pub async fn verify(&self, name: &str) -> Result<bool, PipelineError> {
        debug!(candidate = %name, "Verifying candidate");
        let answer: CreatureCheck = extract(
            self.reasoning.as_ref(),
            vec![PromptPart::text(verify_prompt(name))],
        )
        .await?;

        debug!(candidate = %name, is_creature = answer.is_creature, "Verification answer");
        Ok(answer.is_creature)
    }
}
