//! Farm description loaded from JSON.
//!
//! A [`FarmConfig`] names the opening resource balances, the labour force,
//! transmutation rules and the activity tree. Loading validates amounts,
//! labour requirements, timers and transmutation targets before anything is
//! built.

use std::path::Path;

use chrono::NaiveDate;
use farmstead_logic::timing::TimerRule;
use serde::{Deserialize, Serialize};

use crate::activities::{
    ActivityId, ActivityTree, AllocationStyle, CutAndCarry, Demand, LabourRequirement,
    ManageProducts, NodeSpec, PartialResourcePolicy, ProductOutput, ProductSpec, ResourceUse,
    Timer,
};
use crate::allocation::TransmutationRule;
use crate::components::Gender;
use crate::error::ConfigError;
use crate::generation::build_labour_pool;
use crate::resources::{ResourceGroupId, ResourceStore};
use crate::walker::Phase;

fn yes() -> bool {
    true
}

fn one() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    pub name: String,
    #[serde(default)]
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceGroupConfig {
    pub group: ResourceGroupId,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
}

/// One kind of worker; `individuals > 1` expands to `name_1 .. name_n`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabourTypeConfig {
    pub name: String,
    #[serde(default = "one")]
    pub individuals: u32,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default)]
    pub age_years: f64,
    #[serde(default)]
    pub hired: bool,
    pub days_per_month: f64,
    #[serde(default)]
    pub monthly_profile: Option<[f64; 12]>,
    #[serde(default)]
    pub pay_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub name: String,
    pub when: TimerRule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActivityKind {
    Folder,
    ResourceUse {
        #[serde(default)]
        demands: Vec<Demand>,
        #[serde(default)]
        product: Option<ProductOutput>,
        #[serde(default)]
        initial_demands: Vec<Demand>,
        #[serde(default)]
        labour_units: f64,
    },
    CutAndCarry {
        pasture: String,
        store: String,
        amount: f64,
        #[serde(default)]
        labour_units: f64,
    },
    ManageProducts {
        products: Vec<ProductSpec>,
    },
}

impl ActivityKind {
    fn default_allocation(&self) -> AllocationStyle {
        match self {
            ActivityKind::CutAndCarry { .. } => AllocationStyle::Manual {
                trigger: Some(Phase::DoCutAndCarry),
            },
            _ => AllocationStyle::Automatic,
        }
    }

    fn demands(&self) -> Vec<&Demand> {
        match self {
            ActivityKind::ResourceUse {
                demands,
                initial_demands,
                ..
            } => demands.iter().chain(initial_demands.iter()).collect(),
            ActivityKind::ManageProducts { products } => {
                products.iter().flat_map(|p| p.demands.iter()).collect()
            }
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    pub name: String,
    #[serde(default = "yes")]
    pub enabled: bool,
    pub kind: ActivityKind,
    #[serde(default)]
    pub policy: PartialResourcePolicy,
    /// Defaults to the kind's usual style
    #[serde(default)]
    pub allocation: Option<AllocationStyle>,
    #[serde(default)]
    pub timers: Vec<TimerConfig>,
    #[serde(default)]
    pub labour: Vec<LabourRequirement>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub children: Vec<ActivityConfig>,
}

impl ActivityConfig {
    fn node_spec(&self) -> NodeSpec {
        let mut spec = match &self.kind {
            ActivityKind::Folder => NodeSpec::folder(&self.name),
            ActivityKind::ResourceUse {
                demands,
                product,
                initial_demands,
                labour_units,
            } => NodeSpec::activity(
                &self.name,
                ResourceUse {
                    demands: demands.clone(),
                    product: product.clone(),
                    initial_demands: initial_demands.clone(),
                    labour_units: *labour_units,
                },
            ),
            ActivityKind::CutAndCarry {
                pasture,
                store,
                amount,
                labour_units,
            } => NodeSpec::activity(
                &self.name,
                CutAndCarry {
                    pasture: pasture.clone(),
                    store: store.clone(),
                    amount: *amount,
                    labour_units: *labour_units,
                },
            ),
            ActivityKind::ManageProducts { products } => NodeSpec::activity(
                &self.name,
                ManageProducts {
                    products: products.clone(),
                },
            ),
        };
        spec.enabled = self.enabled;
        spec.policy = self.policy;
        spec.allocation = self
            .allocation
            .unwrap_or_else(|| self.kind.default_allocation());
        spec.category = self.category.clone();
        spec.labour = self.labour.clone();
        for timer in &self.timers {
            spec = spec.with_timer(Timer::new(&timer.name, timer.when.clone()));
        }
        spec
    }

    fn add_to(&self, tree: &mut ActivityTree, parent: ActivityId) {
        let id = tree.add_child(parent, self.node_spec());
        for child in &self.children {
            child.add_to(tree, id);
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyActivityName);
        }
        for demand in self.kind.demands() {
            check_amount(&format!("{}: {}", self.name, demand.item), demand.amount)?;
        }
        match &self.kind {
            ActivityKind::CutAndCarry { amount, .. } => check_amount(&self.name, *amount)?,
            ActivityKind::ManageProducts { products } => {
                for product in products {
                    check_amount(&product.name, product.output.amount)?;
                    for requirement in &product.labour {
                        requirement.validate().map_err(|reason| {
                            ConfigError::InvalidLabourRequirement {
                                activity: product.name.clone(),
                                reason,
                            }
                        })?;
                    }
                }
            }
            _ => {}
        }
        for requirement in &self.labour {
            requirement
                .validate()
                .map_err(|reason| ConfigError::InvalidLabourRequirement {
                    activity: self.name.clone(),
                    reason,
                })?;
        }
        for timer in &self.timers {
            if !timer.when.is_valid() {
                return Err(ConfigError::InvalidTimer {
                    activity: self.name.clone(),
                    timer: timer.name.clone(),
                });
            }
        }
        self.children.iter().try_for_each(ActivityConfig::validate)
    }
}

fn check_amount(what: &str, amount: f64) -> Result<(), ConfigError> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NegativeAmount {
            what: what.to_string(),
            amount,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmConfig {
    pub name: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub resources: Vec<ResourceGroupConfig>,
    #[serde(default)]
    pub labour: Vec<LabourTypeConfig>,
    #[serde(default)]
    pub transmutations: Vec<TransmutationRule>,
    #[serde(default)]
    pub activities: Vec<ActivityConfig>,
}

impl FarmConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: FarmConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for group in &self.resources {
            for item in &group.items {
                check_amount(&format!("{}.{}", group.group, item.name), item.amount)?;
            }
        }
        for labour in &self.labour {
            check_amount(&labour.name, labour.days_per_month)?;
            check_amount(&labour.name, labour.pay_rate)?;
            if let Some(profile) = &labour.monthly_profile {
                for days in profile {
                    check_amount(&labour.name, *days)?;
                }
            }
        }
        for rule in &self.transmutations {
            let known = self.resources.iter().any(|g| {
                g.group == rule.group && g.items.iter().any(|i| i.name == rule.item)
            });
            if !known {
                return Err(ConfigError::UnknownTransmutationTarget {
                    group: rule.group.to_string(),
                    item: rule.item.clone(),
                });
            }
            if rule.packet_size.is_nan() || rule.packet_size <= 0.0 {
                return Err(ConfigError::InvalidPacketSize {
                    group: rule.group.to_string(),
                    item: rule.item.clone(),
                });
            }
            for cost in &rule.costs {
                check_amount(&format!("transmutation of {}", rule.item), cost.amount_per_packet)?;
            }
        }
        self.activities.iter().try_for_each(ActivityConfig::validate)
    }

    /// Opening balances and labour force.
    pub fn build_store(&self) -> ResourceStore {
        let mut store = ResourceStore::new();
        for group in &self.resources {
            store.add_group(group.group);
            for item in &group.items {
                store.add_item(group.group, &item.name, item.amount);
            }
        }
        if !self.labour.is_empty() {
            store.set_labour(build_labour_pool(&self.labour));
        }
        store
    }

    pub fn build_tree(&self) -> ActivityTree {
        let mut tree = ActivityTree::new(&self.name);
        let root = tree.root();
        for activity in &self.activities {
            activity.add_to(&mut tree, root);
        }
        tree
    }

    /// No resources, labour or activities; for hosts that build trees in code.
    pub fn empty(name: impl Into<String>, start_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            start_date,
            resources: Vec::new(),
            labour: Vec::new(),
            transmutations: Vec::new(),
            activities: Vec::new(),
        }
    }
}
