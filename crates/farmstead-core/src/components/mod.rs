//! Component definitions for labour pool entities.
//!
//! Components are pure data structs attached to individuals in the labour
//! pool's `hecs::World`. They have no behavior - that lives in
//! [`crate::resources::LabourPool`] and the allocator.

mod people;

pub use people::*;
