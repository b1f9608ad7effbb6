//! Per-person and per-group labour caps.
//!
//! A labour requirement expresses its caps either as absolute days or as a
//! proportion of the days required this step. These functions resolve both
//! styles to concrete day limits before allocation begins.

use serde::{Deserialize, Serialize};

/// Per-person cap used when no labour requirement governs a request.
pub const PERMISSIVE_MAXIMUM_PER_PERSON: f64 = 1000.0;
/// Per-group cap used when no labour requirement governs a request.
pub const PERMISSIVE_MAXIMUM_PER_GROUP: f64 = 10000.0;

/// How `maximum_per_person` and `maximum_per_group` are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LabourLimitStyle {
    /// Caps are absolute person-days.
    #[default]
    AsTotalDaysAllowed,
    /// Caps are fractions of the days required this step.
    AsProportionOfDaysRequired,
}

/// Concrete limits for one allocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabourLimits {
    /// Most days any one person may give to this activity in one pass.
    pub per_person: f64,
    /// Most days the whole group may give to this activity in one pass.
    pub per_group: f64,
    /// Fewest days worth engaging a person for.
    pub minimum_per_person: f64,
}

impl LabourLimits {
    /// Limits that never restrict an allocation.
    pub fn permissive() -> Self {
        Self {
            per_person: PERMISSIVE_MAXIMUM_PER_PERSON,
            per_group: PERMISSIVE_MAXIMUM_PER_GROUP,
            minimum_per_person: 0.0,
        }
    }

    /// Clamp a request for `days` to the group cap.
    pub fn cap_request(&self, days: f64) -> f64 {
        days.min(self.per_group).max(0.0)
    }

    /// True when no single person may cover all of `days`.
    pub fn person_cap_binds(&self, days: f64) -> bool {
        self.per_person < days
    }
}

/// Resolve configured caps to day limits for a request of `days_required`.
pub fn compute_limits(
    style: LabourLimitStyle,
    maximum_per_person: f64,
    maximum_per_group: f64,
    minimum_per_person: f64,
    days_required: f64,
) -> LabourLimits {
    let (per_person, per_group) = match style {
        LabourLimitStyle::AsTotalDaysAllowed => (maximum_per_person, maximum_per_group),
        LabourLimitStyle::AsProportionOfDaysRequired => (
            maximum_per_person * days_required,
            maximum_per_group * days_required,
        ),
    };
    LabourLimits {
        per_person: per_person.max(0.0),
        per_group: per_group.max(0.0),
        minimum_per_person: minimum_per_person.max(0.0),
    }
}
