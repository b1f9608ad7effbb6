//! In-memory resource store with a transaction ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    ItemRef, LabourPool, ResourceCatalog, ResourceGroupId, Transaction, TransactionTag,
};

/// A named quantity of a fungible resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    pub name: String,
    pub amount: f64,
}

/// All items held under one group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroup {
    pub items: Vec<ResourceItem>,
}

/// Farm-wide resource holdings
#[derive(Default)]
pub struct ResourceStore {
    groups: BTreeMap<ResourceGroupId, ResourceGroup>,
    labour: Option<LabourPool>,
    ledger: Vec<Transaction>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty group so items missing from it are constrained.
    pub fn add_group(&mut self, group: ResourceGroupId) {
        self.groups.entry(group).or_default();
    }

    /// Add (or top up) an item and return its handle.
    pub fn add_item(&mut self, group: ResourceGroupId, name: &str, amount: f64) -> ItemRef {
        let g = self.groups.entry(group).or_default();
        let index = match g.items.iter().position(|i| i.name == name) {
            Some(index) => {
                g.items[index].amount += amount;
                index
            }
            None => {
                g.items.push(ResourceItem {
                    name: name.to_string(),
                    amount,
                });
                g.items.len() - 1
            }
        };
        ItemRef { group, index }
    }

    pub fn set_labour(&mut self, pool: LabourPool) {
        self.labour = Some(pool);
    }

    pub fn group(&self, group: ResourceGroupId) -> Option<&ResourceGroup> {
        self.groups.get(&group)
    }

    /// Current balance of a named item.
    pub fn balance(&self, group: ResourceGroupId, name: &str) -> Option<f64> {
        self.find_item(group, name).map(|item| self.amount(item))
    }

    /// Overwrite a balance, adding the item if it is missing.
    pub fn set_balance(&mut self, group: ResourceGroupId, name: &str, amount: f64) {
        let item = self.add_item(group, name, 0.0);
        if let Some(i) = self.item_mut(item) {
            i.amount = amount;
        }
    }

    /// Every item as `(group, name, amount)`.
    pub fn balances(&self) -> Vec<(ResourceGroupId, String, f64)> {
        self.groups
            .iter()
            .flat_map(|(g, group)| {
                group
                    .items
                    .iter()
                    .map(move |i| (*g, i.name.clone(), i.amount))
            })
            .collect()
    }

    pub fn ledger(&self) -> &[Transaction] {
        &self.ledger
    }

    pub fn replace_ledger(&mut self, ledger: Vec<Transaction>) {
        self.ledger = ledger;
    }

    fn item_mut(&mut self, item: ItemRef) -> Option<&mut ResourceItem> {
        self.groups
            .get_mut(&item.group)
            .and_then(|g| g.items.get_mut(item.index))
    }
}

impl ResourceCatalog for ResourceStore {
    fn has_group(&self, group: ResourceGroupId) -> bool {
        match group {
            ResourceGroupId::Labour => self.labour.is_some(),
            _ => self.groups.contains_key(&group),
        }
    }

    fn find_item(&self, group: ResourceGroupId, name: &str) -> Option<ItemRef> {
        self.groups
            .get(&group)?
            .items
            .iter()
            .position(|i| i.name == name)
            .map(|index| ItemRef { group, index })
    }

    fn item_name(&self, item: ItemRef) -> Option<&str> {
        self.groups
            .get(&item.group)
            .and_then(|g| g.items.get(item.index))
            .map(|i| i.name.as_str())
    }

    fn amount(&self, item: ItemRef) -> f64 {
        self.groups
            .get(&item.group)
            .and_then(|g| g.items.get(item.index))
            .map(|i| i.amount)
            .unwrap_or(0.0)
    }

    fn withdraw(&mut self, item: ItemRef, amount: f64, tag: &TransactionTag) -> f64 {
        let Some(i) = self.item_mut(item) else {
            return 0.0;
        };
        let taken = amount.min(i.amount).max(0.0);
        i.amount -= taken;
        let resource = i.name.clone();
        if taken > 0.0 {
            self.ledger.push(Transaction {
                date: tag.date,
                group: item.group,
                resource,
                activity: tag.activity.clone(),
                category: tag.category.clone(),
                gain: 0.0,
                loss: taken,
            });
        }
        taken
    }

    fn deposit(&mut self, item: ItemRef, amount: f64, tag: &TransactionTag) {
        if amount <= 0.0 {
            return;
        }
        let Some(i) = self.item_mut(item) else {
            return;
        };
        i.amount += amount;
        let resource = i.name.clone();
        self.ledger.push(Transaction {
            date: tag.date,
            group: item.group,
            resource,
            activity: tag.activity.clone(),
            category: tag.category.clone(),
            gain: amount,
            loss: 0.0,
        });
    }

    fn labour(&self) -> Option<&LabourPool> {
        self.labour.as_ref()
    }

    fn labour_mut(&mut self) -> Option<&mut LabourPool> {
        self.labour.as_mut()
    }

    fn record(&mut self, transaction: Transaction) {
        self.ledger.push(transaction);
    }
}
