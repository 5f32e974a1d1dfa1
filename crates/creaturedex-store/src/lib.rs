//! Storage collaborators for creaturedex
//!
//! - [`CreatureStore`]: the creature catalog. `name` and `scientific_name`
//!   are unique; a violating write fails with `StoreError::Conflict`.
//! - [`ImageStore`]: persistence for uploaded images.

mod catalog;
mod image;
mod memory;
mod sqlite;

pub use catalog::{CreatureStore, DEFAULT_PAGE_LIMIT};
pub use creaturedex_utils::error::StoreError;
pub use image::{
    ImageInput, ImageStore, LocalImageStore, extension_for_media_type, media_type_for_path,
};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[cfg(test)]
pub(crate) mod fixtures {
    use creaturedex_model::{BodyShape, NewCreature};

    pub(crate) fn new_creature(name: &str, scientific_name: &str) -> NewCreature {
        NewCreature {
            name: name.to_string(),
            scientific_name: scientific_name.to_string(),
            description: "A small tree-dwelling mammal with russet fur.".to_string(),
            creature_type: "Normal".to_string(),
            gender_ratio: 0.5,
            kingdom: "Animalia".to_string(),
            classification: "Mammal".to_string(),
            family: "Ailuridae".to_string(),
            height_cm: 60.0,
            weight_kg: 5.0,
            body_shape: BodyShape::Quadruped,
            image_path: format!("uploads/{}.png", name.replace(' ', "-").to_lowercase()),
        }
    }

    pub(crate) fn red_panda() -> NewCreature {
        new_creature("Red Panda", "Ailurus fulgens")
    }
}
