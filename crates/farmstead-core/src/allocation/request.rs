//! Resource requests: one demand line from one activity.

use farmstead_logic::labour_limits::LabourLimits;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::PassId;
use crate::activities::{ActivityId, LabourFilterGroup};
use crate::resources::ResourceGroupId;

/// Tolerance for shortfall comparisons.
pub const EPSILON: f64 = 1e-9;

/// Why a request ended up short, or how it was topped up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShortfallReason {
    LabourIssues,
    NoSuitableLabour,
    LabourRulesLimited,
    MinimumIndividualLabourRestricted,
    Transmuted,
    TransmuteFailed,
}

impl fmt::Display for ShortfallReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShortfallReason::LabourIssues => "Labour issues",
            ShortfallReason::NoSuitableLabour => "No suitable labour available",
            ShortfallReason::LabourRulesLimited => "Labour rules limited",
            ShortfallReason::MinimumIndividualLabourRestricted => {
                "Minimum individual labour restricted"
            }
            ShortfallReason::Transmuted => "Transmuted",
            ShortfallReason::TransmuteFailed => "Transmute failed",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    pub group: ResourceGroupId,
    /// Item name within the group (the group name for labour)
    pub type_name: String,
    pub required: f64,
    /// Filled in by the checker
    pub available: f64,
    /// Filled in by the taker
    pub provided: f64,
    pub allow_transmutation: bool,
    pub transmutation_possible: bool,
    pub claimant: ActivityId,
    pub activity_name: String,
    pub category: String,
    /// Labour only: most specific filter group first
    pub filter: Option<LabourFilterGroup>,
    /// Labour only: index into the claimant's labour requirements
    pub requirement: Option<usize>,
    pub pass: Option<PassId>,
    /// Cost of labour drawn for this request
    pub value: f64,
    pub shortfall_reasons: Vec<ShortfallReason>,
    /// Labour only: caps resolved during the check
    pub limits: Option<LabourLimits>,
}

impl ResourceRequest {
    pub fn new(group: ResourceGroupId, type_name: &str, required: f64) -> Self {
        Self {
            group,
            type_name: type_name.to_string(),
            required: required.max(0.0),
            available: 0.0,
            provided: 0.0,
            allow_transmutation: false,
            transmutation_possible: false,
            claimant: ActivityId(0),
            activity_name: String::new(),
            category: String::new(),
            filter: None,
            requirement: None,
            pass: None,
            value: 0.0,
            shortfall_reasons: Vec::new(),
            limits: None,
        }
    }

    /// A labour request for `days`, optionally restricted by a filter chain
    /// and governed by one of the claimant's requirements.
    pub fn labour(
        days: f64,
        filter: Option<LabourFilterGroup>,
        requirement: Option<usize>,
    ) -> Self {
        Self {
            filter,
            requirement,
            ..Self::new(ResourceGroupId::Labour, ResourceGroupId::Labour.name(), days)
        }
    }

    pub fn allow_transmutation(mut self, allow: bool) -> Self {
        self.allow_transmutation = allow;
        self
    }

    /// Attach the issuing activity and allocation pass.
    pub fn stamp(&mut self, claimant: ActivityId, name: &str, category: &str, pass: PassId) {
        self.claimant = claimant;
        self.activity_name = name.to_string();
        self.category = category.to_string();
        self.pass = Some(pass);
    }

    pub fn is_labour(&self) -> bool {
        self.group == ResourceGroupId::Labour
    }

    pub fn shortfall(&self) -> f64 {
        (self.required - self.available).max(0.0)
    }

    pub fn is_short(&self) -> bool {
        self.required - self.available > EPSILON
    }

    /// `available / required`, or 1.0 for a zero request.
    pub fn available_proportion(&self) -> f64 {
        if self.required <= EPSILON {
            1.0
        } else {
            (self.available / self.required).min(1.0)
        }
    }

    pub fn note(&mut self, reason: ShortfallReason) {
        if !self.shortfall_reasons.contains(&reason) {
            self.shortfall_reasons.push(reason);
        }
    }

    /// `Group.Item` label used in logs and errors.
    pub fn label(&self) -> String {
        if self.is_labour() {
            self.group.to_string()
        } else {
            format!("{}.{}", self.group, self.type_name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortfall_tolerance() {
        let mut r = ResourceRequest::new(ResourceGroupId::Finance, "Bank", 10.0);
        r.available = 10.0 - 1e-12;
        assert!(!r.is_short());
        r.available = 6.0;
        assert!(r.is_short());
        assert_eq!(r.shortfall(), 4.0);
        assert_eq!(r.available_proportion(), 0.6);
    }

    #[test]
    fn test_negative_required_clamped() {
        let r = ResourceRequest::new(ResourceGroupId::Land, "Paddock", -3.0);
        assert_eq!(r.required, 0.0);
        assert_eq!(r.available_proportion(), 1.0);
    }

    #[test]
    fn test_labels_and_reasons() {
        let mut r = ResourceRequest::labour(5.0, None, Some(0));
        assert_eq!(r.label(), "Labour");
        r.note(ShortfallReason::LabourIssues);
        r.note(ShortfallReason::LabourIssues);
        assert_eq!(r.shortfall_reasons.len(), 1);
        assert_eq!(ShortfallReason::NoSuitableLabour.to_string(), "No suitable labour available");

        let r = ResourceRequest::new(ResourceGroupId::AnimalFoodStore, "Hay", 1.0);
        assert_eq!(r.label(), "AnimalFoodStore.Hay");
    }
}
