use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Body shape icon of a creature.
///
/// Serialized as the icon identifier (`bsi:*`) that front ends render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum BodyShape {
    #[serde(rename = "bsi:bipedal")]
    Bipedal,
    #[serde(rename = "bsi:bipedal-tail")]
    BipedalTail,
    #[serde(rename = "bsi:quadruped")]
    Quadruped,
    #[serde(rename = "bsi:winged")]
    Winged,
    #[serde(rename = "bsi:serpentine")]
    Serpentine,
    #[serde(rename = "bsi:fish")]
    Fish,
    #[serde(rename = "bsi:tentacles")]
    Tentacles,
    #[serde(rename = "bsi:insectoid")]
    Insectoid,
    #[serde(rename = "bsi:head")]
    Head,
    #[serde(rename = "bsi:head-base")]
    HeadBase,
    #[serde(rename = "bsi:head-legs")]
    HeadLegs,
}

impl BodyShape {
    pub const ALL: [BodyShape; 11] = [
        BodyShape::Bipedal,
        BodyShape::BipedalTail,
        BodyShape::Quadruped,
        BodyShape::Winged,
        BodyShape::Serpentine,
        BodyShape::Fish,
        BodyShape::Tentacles,
        BodyShape::Insectoid,
        BodyShape::Head,
        BodyShape::HeadBase,
        BodyShape::HeadLegs,
    ];

    /// Icon identifier, e.g. `bsi:quadruped`
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BodyShape::Bipedal => "bsi:bipedal",
            BodyShape::BipedalTail => "bsi:bipedal-tail",
            BodyShape::Quadruped => "bsi:quadruped",
            BodyShape::Winged => "bsi:winged",
            BodyShape::Serpentine => "bsi:serpentine",
            BodyShape::Fish => "bsi:fish",
            BodyShape::Tentacles => "bsi:tentacles",
            BodyShape::Insectoid => "bsi:insectoid",
            BodyShape::Head => "bsi:head",
            BodyShape::HeadBase => "bsi:head-base",
            BodyShape::HeadLegs => "bsi:head-legs",
        }
    }
}

impl fmt::Display for BodyShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown body shape '{0}'")]
pub struct UnknownBodyShape(pub String);

impl FromStr for BodyShape {
    type Err = UnknownBodyShape;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BodyShape::ALL
            .into_iter()
            .find(|shape| shape.as_str() == s)
            .ok_or_else(|| UnknownBodyShape(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_uses_icon_identifiers() {
        let json = serde_json::to_string(&BodyShape::BipedalTail).unwrap();
        assert_eq!(json, "\"bsi:bipedal-tail\"");

        let parsed: BodyShape = serde_json::from_str("\"bsi:head-legs\"").unwrap();
        assert_eq!(parsed, BodyShape::HeadLegs);
    }

    #[test]
    fn test_serde_and_as_str_agree_for_every_shape() {
        for shape in BodyShape::ALL {
            let json = serde_json::to_value(shape).unwrap();
            assert_eq!(json, serde_json::Value::String(shape.as_str().to_string()));
            assert_eq!(shape.as_str().parse::<BodyShape>().unwrap(), shape);
        }
    }

    #[test]
    fn test_unknown_shape_is_rejected() {
        assert!("Quadruped".parse::<BodyShape>().is_err());
        assert!(serde_json::from_str::<BodyShape>("\"bsi:wheeled\"").is_err());
    }
}
