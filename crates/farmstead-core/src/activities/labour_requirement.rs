//! Labour requirements and the filter-group chains that select individuals.

use farmstead_logic::labour_limits::{
    compute_limits, LabourLimitStyle, LabourLimits, PERMISSIVE_MAXIMUM_PER_GROUP,
    PERMISSIVE_MAXIMUM_PER_PERSON,
};
use farmstead_logic::labour_units::{days_required, LabourUnitRule, LabourUnitType};
use serde::{Deserialize, Serialize};

use crate::components::{Demographics, Gender, Name};

/// One predicate over an individual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "filter", content = "value")]
pub enum LabourFilter {
    Gender(Gender),
    MinimumAge(f64),
    MaximumAge(f64),
    Hired(bool),
    Name(String),
}

impl LabourFilter {
    pub fn matches(&self, name: &Name, demographics: &Demographics) -> bool {
        match self {
            LabourFilter::Gender(g) => demographics.gender == *g,
            LabourFilter::MinimumAge(years) => demographics.age_years() >= *years,
            LabourFilter::MaximumAge(years) => demographics.age_years() <= *years,
            LabourFilter::Hired(hired) => demographics.hired == *hired,
            LabourFilter::Name(n) => name.as_str() == n,
        }
    }
}

/// A set of filters tried together, with an optional broader fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabourFilterGroup {
    pub name: String,
    #[serde(default)]
    pub filters: Vec<LabourFilter>,
    /// Searched only if this group cannot meet the need
    #[serde(default)]
    pub broader: Option<Box<LabourFilterGroup>>,
}

impl LabourFilterGroup {
    pub fn new(name: impl Into<String>, filters: Vec<LabourFilter>) -> Self {
        Self {
            name: name.into(),
            filters,
            broader: None,
        }
    }

    pub fn or_else(mut self, broader: LabourFilterGroup) -> Self {
        self.broader = Some(Box::new(broader));
        self
    }

    /// This group followed by each broader fallback, most specific first.
    pub fn chain(&self) -> Vec<&LabourFilterGroup> {
        let mut levels = vec![self];
        let mut current = self;
        while let Some(next) = current.broader.as_deref() {
            levels.push(next);
            current = next;
        }
        levels
    }
}

fn default_per_unit() -> f64 {
    1.0
}

fn default_per_person() -> f64 {
    PERMISSIVE_MAXIMUM_PER_PERSON
}

fn default_per_group() -> f64 {
    PERMISSIVE_MAXIMUM_PER_GROUP
}

/// How many person-days an activity needs and under what caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabourRequirement {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_type: LabourUnitType,
    #[serde(default = "default_per_unit")]
    pub labour_per_unit: f64,
    #[serde(default = "default_per_unit")]
    pub unit_size: f64,
    #[serde(default)]
    pub whole_unit_blocks: bool,
    #[serde(default)]
    pub limit_style: LabourLimitStyle,
    #[serde(default = "default_per_person")]
    pub maximum_per_person: f64,
    #[serde(default = "default_per_group")]
    pub maximum_per_group: f64,
    #[serde(default)]
    pub minimum_per_person: f64,
    /// Scale the activity's other requests down when labour is short
    #[serde(default)]
    pub shortfall_affects_activity: bool,
    #[serde(default)]
    pub filter_groups: Vec<LabourFilterGroup>,
}

impl Default for LabourRequirement {
    fn default() -> Self {
        Self {
            name: String::new(),
            unit_type: LabourUnitType::Fixed,
            labour_per_unit: 1.0,
            unit_size: 1.0,
            whole_unit_blocks: false,
            limit_style: LabourLimitStyle::AsTotalDaysAllowed,
            maximum_per_person: PERMISSIVE_MAXIMUM_PER_PERSON,
            maximum_per_group: PERMISSIVE_MAXIMUM_PER_GROUP,
            minimum_per_person: 0.0,
            shortfall_affects_activity: false,
            filter_groups: Vec::new(),
        }
    }
}

impl LabourRequirement {
    /// A fixed number of days from anyone.
    pub fn fixed(days: f64) -> Self {
        Self {
            labour_per_unit: days,
            ..Default::default()
        }
    }

    pub fn with_filter_group(mut self, group: LabourFilterGroup) -> Self {
        self.filter_groups.push(group);
        self
    }

    pub fn unit_rule(&self) -> LabourUnitRule {
        LabourUnitRule {
            unit_type: self.unit_type,
            labour_per_unit: self.labour_per_unit,
            unit_size: self.unit_size,
            whole_unit_blocks: self.whole_unit_blocks,
        }
    }

    /// Person-days needed for `units` of work.
    pub fn days_required(&self, units: f64) -> f64 {
        days_required(&self.unit_rule(), units)
    }

    /// Caps for a request of `days_required`.
    pub fn limits(&self, days_required: f64) -> LabourLimits {
        compute_limits(
            self.limit_style,
            self.maximum_per_person,
            self.maximum_per_group,
            self.minimum_per_person,
            days_required,
        )
    }

    /// Reason the requirement is unusable, if any.
    pub fn validate(&self) -> Result<(), String> {
        let values = [
            ("labour_per_unit", self.labour_per_unit),
            ("unit_size", self.unit_size),
            ("maximum_per_person", self.maximum_per_person),
            ("maximum_per_group", self.maximum_per_group),
            ("minimum_per_person", self.minimum_per_person),
        ];
        for (field, value) in values {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{field} must be a non-negative number, got {value}"));
            }
        }
        if self.limit_style == LabourLimitStyle::AsTotalDaysAllowed
            && self.minimum_per_person > self.maximum_per_person
        {
            return Err(format!(
                "minimum_per_person {} exceeds maximum_per_person {}",
                self.minimum_per_person, self.maximum_per_person
            ));
        }
        Ok(())
    }
}
