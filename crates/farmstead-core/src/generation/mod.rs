//! Generation - labour pools from configuration, and random households.

mod labour;
mod names;

pub use labour::*;
pub use names::*;
