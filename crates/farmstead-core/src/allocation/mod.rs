//! The allocation pipeline: check, transmute, take.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`request`] | Demand lines and shortfall reasons |
//! | [`checker`] | Dry-run availability with transmutation |
//! | [`labour`] | Tiered, filter-group-based labour allocation |
//! | [`taker`] | Commits a checked batch under the partial-resource policy |
//! | [`transmutation`] | Substituting one resource's shortfall with another |
//!
//! Every call receives an explicit [`AllocationContext`]; nothing reaches
//! resources through the tree.

pub mod checker;
pub mod labour;
pub mod request;
pub mod taker;
pub mod transmutation;

pub use checker::check;
pub use labour::{take_labour, DryRunLedger, LabourMode};
pub use request::{ResourceRequest, ShortfallReason, EPSILON};
pub use taker::take;
pub use transmutation::{
    NoTransmutation, TransmutationRule, TransmutationTable, TransmuteCost, Transmuter,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::activities::{ActivityId, ActivityNode, LabourRequirement, PartialResourcePolicy};
use crate::events::EventLog;
use crate::resources::{ResourceCatalog, TransactionTag};

/// Correlation id shared by every request of one allocation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PassId(Uuid);

impl PassId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PassId {
    fn default() -> Self {
        Self::new()
    }
}

/// The activity on whose behalf requests are checked and taken.
#[derive(Debug, Clone, Copy)]
pub struct Claimant<'a> {
    pub id: ActivityId,
    pub name: &'a str,
    pub policy: PartialResourcePolicy,
    pub labour: &'a [LabourRequirement],
    pub category: &'a str,
}

impl<'a> Claimant<'a> {
    pub fn from_node(node: &'a ActivityNode) -> Self {
        Self {
            id: node.id,
            name: &node.name,
            policy: node.policy,
            labour: &node.labour,
            category: &node.category,
        }
    }
}

/// Handles every checker, taker and allocator call needs.
pub struct AllocationContext<'a> {
    pub catalog: &'a mut dyn ResourceCatalog,
    pub transmuter: &'a dyn Transmuter,
    pub events: &'a mut EventLog,
    pub date: NaiveDate,
    pub pass: PassId,
}

impl AllocationContext<'_> {
    pub fn tag(&self, claimant: &Claimant<'_>) -> TransactionTag {
        TransactionTag {
            date: self.date,
            activity: claimant.name.to_string(),
            category: claimant.category.to_string(),
        }
    }
}
