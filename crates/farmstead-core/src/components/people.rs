//! People-related components: Person, Name, Demographics, Availability, etc.

use serde::{Deserialize, Serialize};

use crate::allocation::PassId;

/// Marker component identifying an entity as a labour individual
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person;

/// Display name of an individual, e.g. `"Farmhand_2"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Name(pub String);

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

/// Attributes labour filters select on
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub gender: Gender,
    pub age_months: u32,
    /// Hired labour does not age with the household
    pub hired: bool,
}

impl Demographics {
    pub fn age_years(&self) -> f64 {
        self.age_months as f64 / 12.0
    }
}

/// Days an individual can work
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Availability {
    /// Flat days available each month
    pub days_per_month: f64,
    /// Per-month override (January first)
    pub monthly_profile: Option<[f64; 12]>,
    /// Days still unallocated this step
    pub remaining: f64,
}

impl Availability {
    pub fn new(days_per_month: f64) -> Self {
        Self {
            days_per_month,
            monthly_profile: None,
            remaining: days_per_month,
        }
    }

    pub fn with_profile(mut self, profile: [f64; 12]) -> Self {
        self.monthly_profile = Some(profile);
        self
    }

    /// Days available in a month (0-based)
    pub fn days_in_month(&self, month0: usize) -> f64 {
        match self.monthly_profile {
            Some(profile) => profile[month0 % 12],
            None => self.days_per_month,
        }
    }
}

/// Cost per day of labour
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PayRate(pub f64);

/// Last-request bookkeeping: how much this individual has already given to
/// the allocation pass `pass`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimLedger {
    pub pass: Option<PassId>,
    pub drawn: f64,
}

impl ClaimLedger {
    /// Days already drawn for `pass`; zero for any other pass.
    pub fn drawn_for(&self, pass: PassId) -> f64 {
        if self.pass == Some(pass) {
            self.drawn
        } else {
            0.0
        }
    }

    pub fn record(&mut self, pass: PassId, days: f64) {
        if self.pass != Some(pass) {
            self.pass = Some(pass);
            self.drawn = 0.0;
        }
        self.drawn += days;
    }
}
