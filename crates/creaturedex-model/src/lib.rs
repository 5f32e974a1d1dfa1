//! Creature profile and catalog record types
//!
//! [`CreatureProfile`] is what the explain stage produces for a verified name.
//! [`NewCreature`] is a profile plus its name and stored image, ready to be
//! written to the catalog; [`Creature`] is the persisted record with its id.

mod body_shape;
mod creature;
mod profile;

pub use body_shape::{BodyShape, UnknownBodyShape};
pub use creature::{Creature, CreatureUpdate, NewCreature};
pub use profile::{CreatureProfile, InvalidProfile};
