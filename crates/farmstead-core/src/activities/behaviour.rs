//! Hooks an activity implements to take part in the allocation pipeline.

use chrono::NaiveDate;

use super::{LabourRequirement, PartialResourcePolicy, TaskOutcome};
use crate::allocation::{ResourceRequest, EPSILON};
use crate::resources::{ResourceCatalog, ResourceGroupId, TransactionTag};

/// Everything an activity's task may touch once its resources are taken.
pub struct TaskContext<'a> {
    pub date: NaiveDate,
    /// This step's requests, with `provided` filled in
    pub requests: &'a [ResourceRequest],
    /// Share of the labour need that was met (1.0 when labour did not limit)
    pub labour_proportion: f64,
    pub catalog: &'a mut dyn ResourceCatalog,
    pub tag: TransactionTag,
}

impl TaskContext<'_> {
    /// Smallest provided/required ratio over non-labour requests.
    pub fn provided_proportion(&self) -> f64 {
        self.requests
            .iter()
            .filter(|r| r.group != ResourceGroupId::Labour && r.required > EPSILON)
            .map(|r| (r.provided / r.required).min(1.0))
            .fold(1.0, f64::min)
    }

    /// Amount provided for a named resource this step.
    pub fn provided(&self, group: ResourceGroupId, item: &str) -> f64 {
        self.requests
            .iter()
            .filter(|r| r.group == group && r.type_name == item)
            .map(|r| r.provided)
            .sum()
    }

    /// Deposit into a named item. False if the item does not exist.
    pub fn deposit(&mut self, group: ResourceGroupId, item: &str, amount: f64) -> bool {
        match self.catalog.find_item(group, item) {
            Some(item) => {
                self.catalog.deposit(item, amount, &self.tag);
                true
            }
            None => false,
        }
    }
}

/// A sub-activity created at run time by its parent.
pub struct ChildSpec {
    pub name: String,
    pub behaviour: Box<dyn ActivityBehaviour>,
    pub labour: Vec<LabourRequirement>,
    /// Inherits the parent's policy when `None`
    pub policy: Option<PartialResourcePolicy>,
}

/// Domain logic of one activity. Every hook has a no-op default.
pub trait ActivityBehaviour {
    /// Short identifier for logs, e.g. `"ResourceUse"`.
    fn kind_name(&self) -> &'static str;

    /// Called before requests are built each time the activity is managed.
    fn prepare(&mut self, _date: NaiveDate) {}

    /// Non-labour resources needed this step.
    fn request_resources(&mut self, _date: NaiveDate) -> Vec<ResourceRequest> {
        Vec::new()
    }

    /// Quantity of work (head, kg, hectares, ...) a labour requirement is
    /// scaled by. Ignored for fixed requirements.
    fn labour_units(&self, _requirement: &LabourRequirement) -> f64 {
        0.0
    }

    /// Resources needed once, when the simulation starts.
    fn initialisation_requests(&mut self, _date: NaiveDate) -> Vec<ResourceRequest> {
        Vec::new()
    }

    fn perform_task(&mut self, _ctx: &mut TaskContext<'_>) -> TaskOutcome {
        TaskOutcome::Done
    }

    /// Dynamic children, created once during `Initialise`.
    fn spawn_children(&mut self) -> Vec<ChildSpec> {
        Vec::new()
    }

    /// False for pure grouping nodes.
    fn has_task(&self) -> bool {
        true
    }
}
