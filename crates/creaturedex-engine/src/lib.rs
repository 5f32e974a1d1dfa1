//! Identification engine for creaturedex
//!
//! Stages run strictly in order, each awaiting the previous one:
//!
//! 1. [`ScanStage`] detects a candidate name in the image (vision oracle) and
//!    verifies it names an animal or sea creature (reasoning oracle).
//! 2. The catalog is checked for an existing record with that exact name.
//! 3. [`ExplainStage`] asks the reasoning oracle for a [`CreatureProfile`].
//! 4. [`record`] assembles and stores the new catalog entry.
//!
//! [`Identifier`] wires the stages to their collaborators.
//!
//! [`CreatureProfile`]: creaturedex_model::CreatureProfile

mod explain;
mod pipeline;
pub mod record;
mod scan;

// Test seam; not part of public API stability guarantees.
#[doc(hidden)]
pub mod testing;

pub use explain::ExplainStage;
pub use pipeline::{Identification, Identifier};
pub use scan::{CreatureCheck, CreatureName, ScanStage};
