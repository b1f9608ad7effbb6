//! Resource pools: generic stores, the labour pool, and the transaction ledger.
//!
//! The allocation engine only talks to resources through [`ResourceCatalog`],
//! so a host can substitute its own pools. [`ResourceStore`] is the in-crate
//! implementation.

mod labour;
mod store;

pub use labour::*;
pub use store::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of resource groups a farm can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceGroupId {
    Finance,
    AnimalFoodStore,
    HumanFoodStore,
    GrazeFoodStore,
    Land,
    ProductStore,
    WaterStore,
    Equipment,
    Labour,
}

impl ResourceGroupId {
    pub const ALL: [ResourceGroupId; 9] = [
        ResourceGroupId::Finance,
        ResourceGroupId::AnimalFoodStore,
        ResourceGroupId::HumanFoodStore,
        ResourceGroupId::GrazeFoodStore,
        ResourceGroupId::Land,
        ResourceGroupId::ProductStore,
        ResourceGroupId::WaterStore,
        ResourceGroupId::Equipment,
        ResourceGroupId::Labour,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ResourceGroupId::Finance => "Finance",
            ResourceGroupId::AnimalFoodStore => "AnimalFoodStore",
            ResourceGroupId::HumanFoodStore => "HumanFoodStore",
            ResourceGroupId::GrazeFoodStore => "GrazeFoodStore",
            ResourceGroupId::Land => "Land",
            ResourceGroupId::ProductStore => "ProductStore",
            ResourceGroupId::WaterStore => "WaterStore",
            ResourceGroupId::Equipment => "Equipment",
            ResourceGroupId::Labour => "Labour",
        }
    }
}

impl fmt::Display for ResourceGroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle to one item inside a generic resource group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub group: ResourceGroupId,
    pub index: usize,
}

/// Who is moving a resource, attached to every ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionTag {
    pub date: NaiveDate,
    pub activity: String,
    pub category: String,
}

/// One ledger line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub group: ResourceGroupId,
    pub resource: String,
    pub activity: String,
    pub category: String,
    pub gain: f64,
    pub loss: f64,
}

/// Registry of resource pools the allocation engine draws from.
///
/// `withdraw` never takes more than is held and returns the amount actually
/// removed. The `Labour` group is present exactly when a labour pool is.
pub trait ResourceCatalog {
    fn has_group(&self, group: ResourceGroupId) -> bool;
    fn find_item(&self, group: ResourceGroupId, name: &str) -> Option<ItemRef>;
    fn item_name(&self, item: ItemRef) -> Option<&str>;
    fn amount(&self, item: ItemRef) -> f64;
    fn withdraw(&mut self, item: ItemRef, amount: f64, tag: &TransactionTag) -> f64;
    fn deposit(&mut self, item: ItemRef, amount: f64, tag: &TransactionTag);
    fn labour(&self) -> Option<&LabourPool>;
    fn labour_mut(&mut self) -> Option<&mut LabourPool>;
    /// Record a movement the catalog did not perform itself (labour draws).
    fn record(&mut self, transaction: Transaction);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_names_unique() {
        let names: std::collections::HashSet<_> =
            ResourceGroupId::ALL.iter().map(|g| g.name()).collect();
        assert_eq!(names.len(), ResourceGroupId::ALL.len());
        assert_eq!(ResourceGroupId::Labour.to_string(), "Labour");
    }
}
