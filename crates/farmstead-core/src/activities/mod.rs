//! The activity hierarchy.
//!
//! Activities live in an arena ([`ActivityTree`]) addressed by [`ActivityId`].
//! Parent/child edges are index lists; declared children are visited before
//! dynamic children created during `Initialise`.

mod behaviour;
mod builtin;
mod labour_requirement;
mod status;
mod timers;
mod tree;

pub use behaviour::*;
pub use builtin::*;
pub use labour_requirement::*;
pub use status::*;
pub use timers::*;
pub use tree::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::walker::Phase;

/// Stable index of a node in the [`ActivityTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub usize);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a node is, used instead of type-based child discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// The top-level holder. Its timers are not inherited.
    Container,
    Folder,
    Activity,
}

/// Whether the walker runs a node, or the node runs at its own trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AllocationStyle {
    #[default]
    Automatic,
    /// Allocated at `trigger`, or only via `FarmEngine::perform_manually`
    /// when there is none.
    Manual { trigger: Option<Phase> },
}

/// What to do when resources are short after transmutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PartialResourcePolicy {
    /// Halt the run with a fatal error
    #[default]
    ReportErrorAndStop,
    /// Take nothing and mark the activity `Ignored`
    SkipActivity,
    /// Take what is there and mark the activity `Partial`
    UseResourcesAvailable,
}
