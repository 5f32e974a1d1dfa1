use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::BodyShape;

/// Structured biological profile of a creature.
///
/// Every field is required when deserializing; a missing field is a
/// deserialization error rather than a default. Field doc comments double as
/// the descriptions sent to the model in the output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CreatureProfile {
    /// The scientific name of the creature, e.g. 'Panthera leo'.
    pub scientific_name: String,
    /// A brief description of the creature, including its habitat, behavior, and notable features in 50 words or less.
    pub description: String,
    /// A Pokemon-style type tag for the creature, e.g. 'Normal', 'Water', 'Grass/Poison'.
    #[serde(rename = "type")]
    pub creature_type: String,
    /// The fraction of males in the species between 0 and 1, e.g. 0.5 for a 1:1 ratio.
    pub gender_ratio: f64,
    /// The biological kingdom to which the creature belongs, e.g. 'Animalia'.
    pub kingdom: String,
    /// The classification of the creature in one word, such as 'Mammal' or 'Bird'.
    pub classification: String,
    /// The family to which the creature belongs, e.g. 'Felidae' for cats.
    pub family: String,
    /// The average height of the creature in centimeters, e.g. 150. Positive values only.
    pub height_cm: f64,
    /// The average weight of the creature in kilograms, e.g. 85. Positive values only.
    pub weight_kg: f64,
    /// The body shape of the creature, as a body shape icon identifier.
    pub body_shape: BodyShape,
}

/// A profile that is well-typed but breaks a value constraint.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid creature profile: {0}")]
pub struct InvalidProfile(pub String);

impl CreatureProfile {
    /// Check the hard value constraints.
    ///
    /// Height and weight must be finite and strictly positive and the scientific
    /// name must not be blank. Out-of-range values are never clamped.
    pub fn validate(&self) -> Result<(), InvalidProfile> {
        if self.scientific_name.trim().is_empty() {
            return Err(InvalidProfile("scientific_name must not be empty".to_string()));
        }
        if !self.height_cm.is_finite() || self.height_cm <= 0.0 {
            return Err(InvalidProfile(format!(
                "height_cm must be positive, got {}",
                self.height_cm
            )));
        }
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            return Err(InvalidProfile(format!(
                "weight_kg must be positive, got {}",
                self.weight_kg
            )));
        }
        if !self.gender_ratio.is_finite() {
            return Err(InvalidProfile(format!(
                "gender_ratio must be a finite number, got {}",
                self.gender_ratio
            )));
        }
        Ok(())
    }

    /// Soft expectations the model was asked, not forced, to respect.
    #[must_use]
    pub fn advisories(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if !(0.0..=1.0).contains(&self.gender_ratio) {
            notes.push(format!(
                "gender_ratio {} is outside the expected range [0, 1]",
                self.gender_ratio
            ));
        }
        let words = self.description.split_whitespace().count();
        if words > 50 {
            notes.push(format!("description has {words} words, budget is 50"));
        }
        notes
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn red_panda() -> CreatureProfile {
        CreatureProfile {
            scientific_name: "Ailurus fulgens".to_string(),
            description: "A small arboreal mammal of the eastern Himalayas with reddish-brown fur and a ringed tail.".to_string(),
            creature_type: "Normal".to_string(),
            gender_ratio: 0.5,
            kingdom: "Animalia".to_string(),
            classification: "Mammal".to_string(),
            family: "Ailuridae".to_string(),
            height_cm: 60.0,
            weight_kg: 5.0,
            body_shape: BodyShape::Quadruped,
        }
    }

    #[test]
    fn test_valid_profile_passes() {
        assert!(red_panda().validate().is_ok());
        assert!(red_panda().advisories().is_empty());
    }

    #[test]
    fn test_non_positive_height_is_rejected() {
        let mut profile = red_panda();
        profile.height_cm = 0.0;
        let err = profile.validate().unwrap_err();
        assert!(err.0.contains("height_cm"));

        profile.height_cm = -3.0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_non_positive_weight_is_rejected() {
        let mut profile = red_panda();
        profile.weight_kg = -0.1;
        let err = profile.validate().unwrap_err();
        assert!(err.0.contains("weight_kg"));
    }

    #[test]
    fn test_nan_values_are_rejected() {
        let mut profile = red_panda();
        profile.weight_kg = f64::NAN;
        assert!(profile.validate().is_err());

        let mut profile = red_panda();
        profile.gender_ratio = f64::INFINITY;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_blank_scientific_name_is_rejected() {
        let mut profile = red_panda();
        profile.scientific_name = "   ".to_string();
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_gender_ratio_out_of_range_is_advisory_only() {
        let mut profile = red_panda();
        profile.gender_ratio = 1.4;
        assert!(profile.validate().is_ok());
        assert_eq!(profile.advisories().len(), 1);
    }

    #[test]
    fn test_missing_field_fails_deserialization() {
        let mut value = serde_json::to_value(red_panda()).unwrap();
        value.as_object_mut().unwrap().remove("weight_kg");
        assert!(serde_json::from_value::<CreatureProfile>(value).is_err());
    }

    #[test]
    fn test_type_field_uses_wire_name() {
        let value = serde_json::to_value(red_panda()).unwrap();
        assert_eq!(value["type"], "Normal");
        assert!(value.get("creature_type").is_none());
    }

    #[test]
    fn test_schema_lists_every_field_as_required() {
        let schema = serde_json::to_value(schemars::schema_for!(CreatureProfile)).unwrap();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
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
            assert!(required.contains(&field), "{field} should be required");
        }
    }

    proptest::proptest! {
        #[test]
        fn prop_non_positive_sizes_never_validate(
            height in proptest::num::f64::ANY,
            weight in proptest::num::f64::ANY,
        ) {
            let mut profile = red_panda();
            profile.height_cm = height;
            profile.weight_kg = weight;

            let sizes_ok = height.is_finite() && height > 0.0 && weight.is_finite() && weight > 0.0;
            proptest::prop_assert_eq!(profile.validate().is_ok(), sizes_ok);
        }
    }
}
