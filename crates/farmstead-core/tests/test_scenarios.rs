//! End-to-end allocation scenarios driven through `FarmEngine`.
//!
//! Each test builds a small farm in code, runs one step and inspects node
//! status, the requests each node kept, and the events of the step.

use std::cell::Cell;
use std::rc::Rc;

use chrono::NaiveDate;
use farmstead_core::activities::{
    ActivityBehaviour, ActivityStatus, Demand, LabourRequirement, NodeSpec,
    PartialResourcePolicy, ResourceUse,
};
use farmstead_core::allocation::ResourceRequest;
use farmstead_core::components::{Availability, Demographics};
use farmstead_core::engine::FarmEngine;
use farmstead_core::error::{AllocationError, FarmError};
use farmstead_core::resources::{LabourPool, ResourceCatalog, ResourceGroupId};

// ── Helpers ────────────────────────────────────────────────────────────

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 3, 1).unwrap()
}

fn feed(amount: f64) -> ResourceUse {
    ResourceUse {
        demands: vec![Demand::new(ResourceGroupId::AnimalFoodStore, "Hay", amount)],
        ..Default::default()
    }
}

fn farm_with_hay(hay: f64) -> FarmEngine {
    let mut engine = FarmEngine::new("Scenario farm", start());
    engine.store.add_item(ResourceGroupId::AnimalFoodStore, "Hay", hay);
    engine
}

/// Behaviour that counts how often it was asked for requests.
struct Counting {
    calls: Rc<Cell<usize>>,
}

impl ActivityBehaviour for Counting {
    fn kind_name(&self) -> &'static str {
        "Counting"
    }

    fn request_resources(&mut self, _date: NaiveDate) -> Vec<ResourceRequest> {
        self.calls.set(self.calls.get() + 1);
        vec![ResourceRequest::new(ResourceGroupId::AnimalFoodStore, "Hay", 1.0)]
    }
}

// ── Scenario 1: unregistered resource ──────────────────────────────────

#[test]
fn unregistered_resource_is_unconstrained() {
    let mut engine = FarmEngine::new("Scenario farm", start());
    let id = engine.tree.add_child(
        engine.tree.root(),
        NodeSpec::activity(
            "Water stock",
            ResourceUse {
                demands: vec![Demand::new(ResourceGroupId::WaterStore, "Bore", 10.0)],
                ..Default::default()
            },
        ),
    );

    let summary = engine.step().unwrap();
    let node = engine.tree.get(id).unwrap();
    assert_eq!(node.status, Some(ActivityStatus::Success));
    assert_eq!(node.last_requests[0].available, 10.0);
    assert_eq!(node.last_requests[0].provided, 10.0);
    assert!(summary.shortfalls.is_empty());
}

// ── Scenario 2: partial use ────────────────────────────────────────────

#[test]
fn partial_policy_takes_what_is_there() {
    let mut engine = farm_with_hay(6.0);
    let id = engine.tree.add_child(
        engine.tree.root(),
        NodeSpec::activity("Feed", feed(10.0))
            .with_policy(PartialResourcePolicy::UseResourcesAvailable),
    );

    let summary = engine.step().unwrap();
    let node = engine.tree.get(id).unwrap();
    assert_eq!(node.status, Some(ActivityStatus::Partial));
    assert_eq!(node.last_requests[0].provided, 6.0);
    assert_eq!(summary.shortfalls.len(), 1);
    assert_eq!(summary.shortfalls[0].resource, "Hay");
    assert_eq!(summary.shortfalls[0].required, 10.0);
    assert_eq!(summary.shortfalls[0].available, 6.0);
    assert_eq!(engine.balance(ResourceGroupId::AnimalFoodStore, "Hay"), Some(0.0));
}

// ── Scenario 3: fatal shortfall ────────────────────────────────────────

#[test]
fn report_error_and_stop_terminates_run() {
    let mut engine = farm_with_hay(6.0);
    engine.tree.add_child(
        engine.tree.root(),
        NodeSpec::activity("Feed", feed(10.0))
            .with_policy(PartialResourcePolicy::ReportErrorAndStop),
    );

    let err = engine.run(3).unwrap_err();
    match &err {
        FarmError::Allocation(AllocationError::Fatal { activity, resources }) => {
            assert_eq!(activity, "Feed");
            assert_eq!(resources, &vec!["AnimalFoodStore.Hay".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
    let message = err.to_string();
    assert!(message.contains("Feed"));
    assert!(message.contains("AnimalFoodStore.Hay"));
    assert_eq!(engine.steps(), 0);
    assert_eq!(engine.status("Feed"), Some(ActivityStatus::Critical));
}

#[test]
fn skip_activity_takes_nothing() {
    let mut engine = farm_with_hay(6.0);
    engine.tree.add_child(
        engine.tree.root(),
        NodeSpec::activity("Feed", feed(10.0)).with_policy(PartialResourcePolicy::SkipActivity),
    );

    let summary = engine.step().unwrap();
    assert_eq!(summary.status_of("Feed"), Some(ActivityStatus::Ignored));
    assert_eq!(summary.shortfalls.len(), 1);
    assert_eq!(engine.balance(ResourceGroupId::AnimalFoodStore, "Hay"), Some(6.0));
}

// ── Scenario 4: tiered labour ──────────────────────────────────────────

#[test]
fn labour_partial_pass_spreads_across_people() {
    let mut engine = FarmEngine::new("Scenario farm", start());
    let mut pool = LabourPool::new();
    let small = pool.add_person("Small", Demographics::default(), Availability::new(3.0), 10.0);
    let large = pool.add_person("Large", Demographics::default(), Availability::new(6.0), 10.0);
    engine.store.set_labour(pool);

    let requirement = LabourRequirement {
        maximum_per_person: 4.0,
        ..LabourRequirement::fixed(5.0)
    };
    let id = engine.tree.add_child(
        engine.tree.root(),
        NodeSpec::activity("Milking", ResourceUse::default())
            .with_labour(requirement)
            .with_policy(PartialResourcePolicy::UseResourcesAvailable),
    );

    let summary = engine.step().unwrap();
    let node = engine.tree.get(id).unwrap();
    let labour = &node.last_requests[0];
    assert!(labour.is_labour());
    assert_eq!(labour.provided, 5.0);
    assert_eq!(labour.value, 50.0);
    assert_eq!(node.status, Some(ActivityStatus::Success));

    let pool = engine.store.labour().unwrap();
    assert_eq!(pool.remaining(large), 2.0);
    assert_eq!(pool.remaining(small), 2.0);

    let report = summary
        .performed
        .iter()
        .find(|r| r.name == "Milking")
        .unwrap();
    assert_eq!(report.labour_cost, 50.0);
}

#[test]
fn labour_without_partial_policy_is_fatal() {
    let mut engine = FarmEngine::new("Scenario farm", start());
    let mut pool = LabourPool::new();
    pool.add_person("Small", Demographics::default(), Availability::new(3.0), 0.0);
    pool.add_person("Large", Demographics::default(), Availability::new(6.0), 0.0);
    engine.store.set_labour(pool);

    engine.tree.add_child(
        engine.tree.root(),
        NodeSpec::activity("Milking", ResourceUse::default()).with_labour(LabourRequirement {
            maximum_per_person: 4.0,
            ..LabourRequirement::fixed(5.0)
        }),
    );

    let err = engine.step().unwrap_err();
    assert!(err.to_string().contains("Labour"));
}

// ── Scenario 5: disabled subtree ───────────────────────────────────────

#[test]
fn disabled_parent_ignores_whole_subtree_without_requests() {
    let mut engine = farm_with_hay(100.0);
    let calls = Rc::new(Cell::new(0));
    let root = engine.tree.root();
    let parent = engine.tree.add_child(root, NodeSpec::folder("Herd"));
    let children: Vec<_> = (0..3)
        .map(|i| {
            engine.tree.add_child(
                parent,
                NodeSpec::activity(
                    format!("Task {i}"),
                    Counting {
                        calls: Rc::clone(&calls),
                    },
                ),
            )
        })
        .collect();

    engine.set_enabled(parent, false).unwrap();
    let summary = engine.step().unwrap();

    assert_eq!(calls.get(), 0);
    assert_eq!(engine.tree.status(parent), Some(ActivityStatus::Ignored));
    for child in children {
        let node = engine.tree.get(child).unwrap();
        assert!(!node.enabled);
        assert_eq!(node.status, Some(ActivityStatus::Ignored));
        assert!(node.last_requests.is_empty());
    }
    assert!(summary.shortfalls.is_empty());
    assert_eq!(engine.balance(ResourceGroupId::AnimalFoodStore, "Hay"), Some(100.0));

    // Re-enabling brings the subtree back
    engine.set_enabled(parent, true).unwrap();
    engine.step().unwrap();
    assert_eq!(calls.get(), 3);
    assert_eq!(engine.status("Herd"), Some(ActivityStatus::NoTask));
    assert_eq!(engine.balance(ResourceGroupId::AnimalFoodStore, "Hay"), Some(97.0));
}
