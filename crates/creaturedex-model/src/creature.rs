use serde::{Deserialize, Serialize};

use crate::{BodyShape, CreatureProfile};

/// A catalog record that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCreature {
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub creature_type: String,
    pub gender_ratio: f64,
    pub kingdom: String,
    pub classification: String,
    pub family: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub body_shape: BodyShape,
    pub image_path: String,
}

impl NewCreature {
    /// Merge an explained profile with its name and stored image location.
    #[must_use]
    pub fn from_profile(
        name: impl Into<String>,
        profile: CreatureProfile,
        image_path: impl Into<String>,
    ) -> Self {
        let CreatureProfile {
            scientific_name,
            description,
            creature_type,
            gender_ratio,
            kingdom,
            classification,
            family,
            height_cm,
            weight_kg,
            body_shape,
        } = profile;

        Self {
            name: name.into(),
            scientific_name,
            description,
            creature_type,
            gender_ratio,
            kingdom,
            classification,
            family,
            height_cm,
            weight_kg,
            body_shape,
            image_path: image_path.into(),
        }
    }

    /// Attach the id assigned by the store.
    #[must_use]
    pub fn with_id(self, id: i64) -> Creature {
        Creature {
            id,
            name: self.name,
            scientific_name: self.scientific_name,
            description: self.description,
            creature_type: self.creature_type,
            gender_ratio: self.gender_ratio,
            kingdom: self.kingdom,
            classification: self.classification,
            family: self.family,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            body_shape: self.body_shape,
            image_path: self.image_path,
        }
    }
}

/// A stored catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Creature {
    pub id: i64,
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub creature_type: String,
    pub gender_ratio: f64,
    pub kingdom: String,
    pub classification: String,
    pub family: String,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub body_shape: BodyShape,
    pub image_path: String,
}

impl Creature {
    /// The profile portion of the record, without name, id or image.
    #[must_use]
    pub fn profile(&self) -> CreatureProfile {
        CreatureProfile {
            scientific_name: self.scientific_name.clone(),
            description: self.description.clone(),
            creature_type: self.creature_type.clone(),
            gender_ratio: self.gender_ratio,
            kingdom: self.kingdom.clone(),
            classification: self.classification.clone(),
            family: self.family.clone(),
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            body_shape: self.body_shape,
        }
    }
}

/// Partial update of a stored record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatureUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub creature_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kingdom: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_shape: Option<BodyShape>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
}

impl CreatureUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply the set fields onto `creature`, returning the updated record.
    #[must_use]
    pub fn apply_to(&self, creature: &Creature) -> Creature {
        let mut updated = creature.clone();
        if let Some(v) = &self.name {
            updated.name = v.clone();
        }
        if let Some(v) = &self.scientific_name {
            updated.scientific_name = v.clone();
        }
        if let Some(v) = &self.description {
            updated.description = v.clone();
        }
        if let Some(v) = &self.creature_type {
            updated.creature_type = v.clone();
        }
        if let Some(v) = self.gender_ratio {
            updated.gender_ratio = v;
        }
        if let Some(v) = &self.kingdom {
            updated.kingdom = v.clone();
        }
        if let Some(v) = &self.classification {
            updated.classification = v.clone();
        }
        if let Some(v) = &self.family {
            updated.family = v.clone();
        }
        if let Some(v) = self.height_cm {
            updated.height_cm = v;
        }
        if let Some(v) = self.weight_kg {
            updated.weight_kg = v;
        }
        if let Some(v) = self.body_shape {
            updated.body_shape = v;
        }
        if let Some(v) = &self.image_path {
            updated.image_path = v.clone();
        }
        updated
    }
}
