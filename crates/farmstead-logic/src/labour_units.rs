//! Labour unit conversion: turns a physical quantity into person-days.
//!
//! An activity reports how many units of work it has this step (head of
//! stock, kilograms of feed, hectares of crop). A labour rule converts that
//! quantity into the number of person-days the activity must obtain.
//!
//! ```
//! use farmstead_logic::labour_units::{days_required, LabourUnitRule, LabourUnitType};
//!
//! let rule = LabourUnitRule {
//!     unit_type: LabourUnitType::PerHead,
//!     labour_per_unit: 0.5,
//!     unit_size: 10.0,
//!     whole_unit_blocks: true,
//! };
//! // 25 head in blocks of 10 rounds up to 3 blocks
//! assert_eq!(days_required(&rule, 25.0), 1.5);
//! ```

use serde::{Deserialize, Serialize};

/// How the quantity reported by an activity is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LabourUnitType {
    /// A fixed number of days regardless of quantity.
    #[default]
    Fixed,
    /// Per head of animals.
    PerHead,
    /// Per adult equivalent.
    PerAdultEquivalent,
    /// Per kilogram, with no blocking.
    PerKg,
    /// Per generic unit (tonnes, bales, loads).
    PerUnit,
    /// Per hectare of land.
    PerHectare,
}

impl LabourUnitType {
    /// All unit types in declaration order.
    pub const ALL: [LabourUnitType; 6] = [
        LabourUnitType::Fixed,
        LabourUnitType::PerHead,
        LabourUnitType::PerAdultEquivalent,
        LabourUnitType::PerKg,
        LabourUnitType::PerUnit,
        LabourUnitType::PerHectare,
    ];

    /// Whether the unit count is divided by the unit size before scaling.
    pub fn is_blocked(self) -> bool {
        !matches!(self, LabourUnitType::Fixed | LabourUnitType::PerKg)
    }
}

/// Conversion parameters for one labour requirement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabourUnitRule {
    pub unit_type: LabourUnitType,
    /// Days of labour per unit (or in total for `Fixed`).
    pub labour_per_unit: f64,
    /// Size of one unit block (ignored by `Fixed` and `PerKg`).
    pub unit_size: f64,
    /// Round the number of blocks up to a whole number.
    pub whole_unit_blocks: bool,
}

impl Default for LabourUnitRule {
    fn default() -> Self {
        Self {
            unit_type: LabourUnitType::Fixed,
            labour_per_unit: 1.0,
            unit_size: 1.0,
            whole_unit_blocks: false,
        }
    }
}

/// Number of unit blocks in `quantity`, honouring the whole-block flag.
pub fn unit_blocks(rule: &LabourUnitRule, quantity: f64) -> f64 {
    if rule.unit_size <= 0.0 {
        return 0.0;
    }
    let blocks = quantity.max(0.0) / rule.unit_size;
    if rule.whole_unit_blocks {
        blocks.ceil()
    } else {
        blocks
    }
}

/// Person-days needed to handle `quantity` units of work.
///
/// A `Fixed` rule ignores the quantity. Negative quantities are treated as
/// zero. The result is never negative.
pub fn days_required(rule: &LabourUnitRule, quantity: f64) -> f64 {
    let days = match rule.unit_type {
        LabourUnitType::Fixed => rule.labour_per_unit,
        LabourUnitType::PerKg => quantity.max(0.0) * rule.labour_per_unit,
        LabourUnitType::PerHead
        | LabourUnitType::PerAdultEquivalent
        | LabourUnitType::PerUnit
        | LabourUnitType::PerHectare => unit_blocks(rule, quantity) * rule.labour_per_unit,
    };
    days.max(0.0)
}
