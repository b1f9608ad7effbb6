//! Built-in activity kinds.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ActivityBehaviour, ChildSpec, LabourRequirement, TaskContext, TaskOutcome};
use crate::allocation::{ResourceRequest, EPSILON};
use crate::resources::ResourceGroupId;

/// A fixed amount of one resource, requested every time the activity runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Demand {
    pub group: ResourceGroupId,
    pub item: String,
    pub amount: f64,
    #[serde(default)]
    pub allow_transmutation: bool,
}

impl Demand {
    pub fn new(group: ResourceGroupId, item: impl Into<String>, amount: f64) -> Self {
        Self {
            group,
            item: item.into(),
            amount,
            allow_transmutation: false,
        }
    }

    pub fn transmutable(mut self) -> Self {
        self.allow_transmutation = true;
        self
    }

    fn request(&self) -> ResourceRequest {
        ResourceRequest::new(self.group, &self.item, self.amount)
            .allow_transmutation(self.allow_transmutation)
    }
}

/// What an activity produces when it runs in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOutput {
    pub group: ResourceGroupId,
    pub item: String,
    pub amount: f64,
}

/// Grouping node with no work of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct Folder;

impl ActivityBehaviour for Folder {
    fn kind_name(&self) -> &'static str {
        "Folder"
    }

    fn has_task(&self) -> bool {
        false
    }
}

/// Consumes fixed demands and optionally produces a product, scaled by how
/// much of the demand (and labour) was actually obtained.
#[derive(Debug, Clone, Default)]
pub struct ResourceUse {
    pub demands: Vec<Demand>,
    pub product: Option<ProductOutput>,
    pub initial_demands: Vec<Demand>,
    pub labour_units: f64,
}

impl ActivityBehaviour for ResourceUse {
    fn kind_name(&self) -> &'static str {
        "ResourceUse"
    }

    fn request_resources(&mut self, _date: NaiveDate) -> Vec<ResourceRequest> {
        self.demands.iter().map(Demand::request).collect()
    }

    fn labour_units(&self, _requirement: &LabourRequirement) -> f64 {
        self.labour_units
    }

    fn initialisation_requests(&mut self, _date: NaiveDate) -> Vec<ResourceRequest> {
        self.initial_demands.iter().map(Demand::request).collect()
    }

    fn perform_task(&mut self, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        let Some(product) = &self.product else {
            return TaskOutcome::Done;
        };
        let proportion = ctx.provided_proportion() * ctx.labour_proportion;
        let amount = product.amount * proportion;
        if amount <= EPSILON {
            return TaskOutcome::NotNeeded;
        }
        if ctx.deposit(product.group, &product.item, amount) {
            TaskOutcome::Done
        } else {
            log::warn!(
                "{}: product store {}.{} not found",
                ctx.tag.activity,
                product.group,
                product.item
            );
            TaskOutcome::Warning
        }
    }
}

/// Cuts pasture and carries it into an animal food store.
///
/// Allocated manually at the `DoCutAndCarry` phase so the cut lands before
/// feeding activities draw from the store.
#[derive(Debug, Clone)]
pub struct CutAndCarry {
    pub pasture: String,
    pub store: String,
    pub amount: f64,
    pub labour_units: f64,
}

impl ActivityBehaviour for CutAndCarry {
    fn kind_name(&self) -> &'static str {
        "CutAndCarry"
    }

    fn request_resources(&mut self, _date: NaiveDate) -> Vec<ResourceRequest> {
        vec![ResourceRequest::new(
            ResourceGroupId::GrazeFoodStore,
            &self.pasture,
            self.amount,
        )]
    }

    fn labour_units(&self, _requirement: &LabourRequirement) -> f64 {
        self.labour_units
    }

    fn perform_task(&mut self, ctx: &mut TaskContext<'_>) -> TaskOutcome {
        let cut = ctx.provided(ResourceGroupId::GrazeFoodStore, &self.pasture) * ctx.labour_proportion;
        if cut <= EPSILON {
            return TaskOutcome::NotNeeded;
        }
        if ctx.deposit(ResourceGroupId::AnimalFoodStore, &self.store, cut) {
            TaskOutcome::Done
        } else {
            TaskOutcome::Warning
        }
    }
}

/// One product line managed by [`ManageProducts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSpec {
    pub name: String,
    #[serde(default)]
    pub demands: Vec<Demand>,
    pub output: ProductOutput,
    #[serde(default)]
    pub labour: Vec<LabourRequirement>,
    #[serde(default)]
    pub labour_units: f64,
}

/// Creates one dynamic [`ResourceUse`] child per product.
#[derive(Debug, Clone, Default)]
pub struct ManageProducts {
    pub products: Vec<ProductSpec>,
}

impl ActivityBehaviour for ManageProducts {
    fn kind_name(&self) -> &'static str {
        "ManageProducts"
    }

    fn spawn_children(&mut self) -> Vec<ChildSpec> {
        self.products
            .iter()
            .map(|p| ChildSpec {
                name: p.name.clone(),
                behaviour: Box::new(ResourceUse {
                    demands: p.demands.clone(),
                    product: Some(p.output.clone()),
                    initial_demands: Vec::new(),
                    labour_units: p.labour_units,
                }),
                labour: p.labour.clone(),
                policy: None,
            })
            .collect()
    }

    fn has_task(&self) -> bool {
        false
    }
}
