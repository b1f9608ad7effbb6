//! Activity tree walker.
//!
//! The host fires [`Phase`] events in order each step. Resource phases cascade
//! down the tree, parents before children, and each automatic node runs the
//! allocation pipeline: build requests, check, take, perform its task, set
//! its status and report it. Visiting order is priority order: a node
//! earlier in the walk can exhaust a pool before a later sibling checks it.

use serde::{Deserialize, Serialize};

use crate::activities::{
    apply_outcome, ActivityId, ActivityNode, ActivityStatus, ActivityTree, AllocationStyle,
    NodeKind, PartialResourcePolicy, TaskContext,
};
use crate::allocation::{
    check, take, AllocationContext, Claimant, PassId, ResourceRequest, EPSILON,
};
use crate::error::AllocationError;
use crate::events::{PerformedReport, ReportKind};

/// Named events fired by the host, in per-step order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Initialise,
    GetResourcesForInitialisation,
    StartOfTimeStep,
    UpdateLabourAvailability,
    UpdatePasture,
    DoCutAndCarry,
    GetResourcesRequired,
    AgeResources,
    EndOfTimeStep,
}

impl Phase {
    /// Phases fired once before the first step.
    pub const SETUP: [Phase; 2] = [Phase::Initialise, Phase::GetResourcesForInitialisation];

    /// Phases fired every step, in order.
    pub const STEP: [Phase; 7] = [
        Phase::StartOfTimeStep,
        Phase::UpdateLabourAvailability,
        Phase::UpdatePasture,
        Phase::DoCutAndCarry,
        Phase::GetResourcesRequired,
        Phase::AgeResources,
        Phase::EndOfTimeStep,
    ];
}

/// React to a phase. Pool bookkeeping phases (labour availability, ageing)
/// belong to the host; this handles the activity side.
pub fn run_phase(
    tree: &mut ActivityTree,
    phase: Phase,
    ctx: &mut AllocationContext<'_>,
) -> Result<(), AllocationError> {
    match phase {
        Phase::Initialise => {
            let added = tree.spawn_dynamic_children();
            if added > 0 {
                log::debug!("created {} dynamic activities", added);
            }
        }
        Phase::GetResourcesForInitialisation => {
            for id in tree.preorder(tree.root()) {
                let runnable = tree
                    .get(id)
                    .map(|n| n.enabled && n.kind != NodeKind::Container)
                    .unwrap_or(false);
                if runnable && tree.is_due(id, ctx.date) {
                    initialise_activity(tree, id, ctx)?;
                }
            }
        }
        Phase::StartOfTimeStep => tree.reset_statuses(),
        Phase::GetResourcesRequired => {
            let root = tree.root();
            for child in tree.children_of(root) {
                visit(tree, child, ctx)?;
            }
        }
        _ => {}
    }
    run_manual_triggers(tree, phase, ctx)
}

/// Run the Manual nodes whose trigger is `phase`.
fn run_manual_triggers(
    tree: &mut ActivityTree,
    phase: Phase,
    ctx: &mut AllocationContext<'_>,
) -> Result<(), AllocationError> {
    let triggered: Vec<ActivityId> = tree
        .iter()
        .filter(|n| n.allocation == AllocationStyle::Manual { trigger: Some(phase) })
        .map(|n| n.id)
        .collect();
    for id in triggered {
        perform_manual(tree, id, ctx)?;
    }
    Ok(())
}

/// Run a single node outside the tree walk. A disabled or not-due node is
/// marked `Ignored` instead.
pub fn perform_manual(
    tree: &mut ActivityTree,
    id: ActivityId,
    ctx: &mut AllocationContext<'_>,
) -> Result<ActivityStatus, AllocationError> {
    let enabled = tree.get(id).map(|n| n.enabled).unwrap_or(false);
    if enabled && tree.is_due(id, ctx.date) {
        manage_activity(tree, id, ctx)
    } else {
        mark_ignored(tree, id, ctx);
        Ok(ActivityStatus::Ignored)
    }
}

/// Visit one node and its subtree during `GetResourcesRequired`.
fn visit(
    tree: &mut ActivityTree,
    id: ActivityId,
    ctx: &mut AllocationContext<'_>,
) -> Result<(), AllocationError> {
    let Some(node) = tree.get(id) else {
        return Ok(());
    };
    if !node.enabled || !tree.is_due(id, ctx.date) {
        report_timers(tree, id, ctx);
        for descendant in tree.preorder(id) {
            mark_ignored(tree, descendant, ctx);
        }
        return Ok(());
    }
    report_timers(tree, id, ctx);

    // Manual nodes run at their own trigger or when the host asks
    if !node.is_manual() {
        manage_activity(tree, id, ctx)?;
    }
    for child in tree.children_of(id) {
        visit(tree, child, ctx)?;
    }
    Ok(())
}

fn report_kind(node: &ActivityNode) -> ReportKind {
    match node.kind {
        NodeKind::Activity => ReportKind::Activity,
        NodeKind::Folder | NodeKind::Container => ReportKind::Folder,
    }
}

fn report_timers(tree: &ActivityTree, id: ActivityId, ctx: &mut AllocationContext<'_>) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let level = tree.depth(id) + 1;
    for timer in &node.timers {
        let status = if timer.is_due(ctx.date) {
            ActivityStatus::Timer
        } else {
            ActivityStatus::Ignored
        };
        ctx.events.performed(PerformedReport {
            date: ctx.date,
            node: id,
            name: timer.name().to_string(),
            status,
            kind: ReportKind::Timer,
            level,
            labour_cost: 0.0,
        });
    }
}

/// Set `Ignored` without building requests and report it.
fn mark_ignored(tree: &mut ActivityTree, id: ActivityId, ctx: &mut AllocationContext<'_>) {
    let level = tree.depth(id);
    let Some(node) = tree.get_mut(id) else {
        return;
    };
    node.status = Some(ActivityStatus::Ignored);
    node.last_requests.clear();
    ctx.events.performed(PerformedReport {
        date: ctx.date,
        node: id,
        name: node.name.clone(),
        status: ActivityStatus::Ignored,
        kind: report_kind(node),
        level,
        labour_cost: 0.0,
    });
}

/// Labour requests for each of a node's requirements: one per top-level
/// filter group, or one unfiltered request when it has none.
fn labour_requests(node: &ActivityNode) -> Vec<ResourceRequest> {
    let mut requests = Vec::new();
    for (index, requirement) in node.labour.iter().enumerate() {
        let units = node.behaviour.labour_units(requirement);
        let days = requirement.days_required(units);
        if days <= EPSILON {
            continue;
        }
        if requirement.filter_groups.is_empty() {
            requests.push(ResourceRequest::labour(days, None, Some(index)));
        } else {
            for group in &requirement.filter_groups {
                requests.push(ResourceRequest::labour(days, Some(group.clone()), Some(index)));
            }
        }
    }
    requests
}

/// Scale the other requests down to the labour that was found, when a short
/// labour requirement says its shortfall limits the activity. Returns the
/// proportion of labour obtained.
fn apply_labour_shortfall(node: &ActivityNode, requests: &mut [ResourceRequest]) -> f64 {
    let proportion = requests
        .iter()
        .filter(|r| r.is_labour() && r.is_short())
        .filter(|r| {
            r.requirement
                .and_then(|i| node.labour.get(i))
                .map(|req| req.shortfall_affects_activity)
                .unwrap_or(false)
        })
        .map(ResourceRequest::available_proportion)
        .fold(1.0, f64::min);
    if proportion >= 1.0 {
        return 1.0;
    }
    for request in requests.iter_mut().filter(|r| !r.is_labour()) {
        if request.available_proportion() > proportion {
            request.required *= proportion;
            request.available = request.available.min(request.required);
        }
    }
    proportion
}

/// Run the allocation pipeline for one node and set its status.
///
/// Returns the fatal error from `ReportErrorAndStop` after recording
/// `Critical` on the node.
pub fn manage_activity(
    tree: &mut ActivityTree,
    id: ActivityId,
    ctx: &mut AllocationContext<'_>,
) -> Result<ActivityStatus, AllocationError> {
    let level = tree.depth(id);
    let Some(node) = tree.get_mut(id) else {
        return Ok(ActivityStatus::Ignored);
    };
    ctx.pass = PassId::new();
    node.behaviour.prepare(ctx.date);

    if !node.behaviour.has_task() {
        node.status = Some(ActivityStatus::NoTask);
        ctx.events.performed(PerformedReport {
            date: ctx.date,
            node: id,
            name: node.name.clone(),
            status: ActivityStatus::NoTask,
            kind: report_kind(node),
            level,
            labour_cost: 0.0,
        });
        return Ok(ActivityStatus::NoTask);
    }

    let mut requests = node.behaviour.request_resources(ctx.date);
    requests.extend(labour_requests(node));
    for request in &mut requests {
        request.stamp(id, &node.name, &node.category, ctx.pass);
    }

    let claimant = Claimant {
        id,
        name: &node.name,
        policy: node.policy,
        labour: &node.labour,
        category: &node.category,
    };
    let mut status = check(&mut requests, &claimant, ctx);

    let mut labour_proportion = 1.0;
    if claimant.policy == PartialResourcePolicy::UseResourcesAvailable {
        labour_proportion = apply_labour_shortfall(node, &mut requests);
    }

    let proceed = match take(&mut requests, &claimant, &mut status, ctx) {
        Ok(proceed) => proceed,
        Err(err) => {
            node.status = Some(ActivityStatus::Critical);
            node.last_requests = requests;
            ctx.events.performed(PerformedReport {
                date: ctx.date,
                node: id,
                name: node.name.clone(),
                status: ActivityStatus::Critical,
                kind: report_kind(node),
                level,
                labour_cost: 0.0,
            });
            return Err(err);
        }
    };

    if proceed || requests.is_empty() {
        let tag = ctx.tag(&claimant);
        let mut task = TaskContext {
            date: ctx.date,
            requests: &requests,
            labour_proportion,
            catalog: &mut *ctx.catalog,
            tag,
        };
        let outcome = node.behaviour.perform_task(&mut task);
        status = apply_outcome(status, outcome);
    }

    let labour_cost = requests
        .iter()
        .filter(|r| r.is_labour())
        .map(|r| r.value)
        .sum();
    node.status = Some(status);
    node.labour_proportion = labour_proportion;
    node.last_requests = requests;
    ctx.events.performed(PerformedReport {
        date: ctx.date,
        node: id,
        name: node.name.clone(),
        status,
        kind: report_kind(node),
        level,
        labour_cost,
    });
    Ok(status)
}

/// Check and take a node's one-off initialisation requests.
fn initialise_activity(
    tree: &mut ActivityTree,
    id: ActivityId,
    ctx: &mut AllocationContext<'_>,
) -> Result<(), AllocationError> {
    let Some(node) = tree.get_mut(id) else {
        return Ok(());
    };
    let mut requests = node.behaviour.initialisation_requests(ctx.date);
    if requests.is_empty() {
        return Ok(());
    }
    ctx.pass = PassId::new();
    for request in &mut requests {
        request.stamp(id, &node.name, &node.category, ctx.pass);
    }
    let claimant = Claimant {
        id,
        name: &node.name,
        policy: node.policy,
        labour: &node.labour,
        category: &node.category,
    };
    let mut status = check(&mut requests, &claimant, ctx);
    let result = take(&mut requests, &claimant, &mut status, ctx);
    node.status = Some(status);
    node.last_requests = requests;
    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activities::{Demand, LabourRequirement, NodeSpec, ResourceUse};
    use crate::allocation::NoTransmutation;
    use crate::events::{EventLog, FarmEvent};
    use crate::resources::{ResourceGroupId, ResourceStore};
    use chrono::NaiveDate;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 5, 1).unwrap()
    }

    #[test]
    fn test_labour_requests_one_per_filter_group() {
        use crate::activities::LabourFilterGroup;
        let mut tree = ActivityTree::new("Farm");
        let id = tree.add_child(
            tree.root(),
            NodeSpec::activity("Work", ResourceUse::default()).with_labour(
                LabourRequirement::fixed(3.0)
                    .with_filter_group(LabourFilterGroup::new("A", vec![]))
                    .with_filter_group(LabourFilterGroup::new("B", vec![])),
            ),
        );
        let requests = labour_requests(tree.get(id).unwrap());
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.required == 3.0 && r.requirement == Some(0)));
    }

    #[test]
    fn test_folder_reports_no_task() {
        let mut tree = ActivityTree::new("Farm");
        let folder = tree.add_child(tree.root(), NodeSpec::folder("Herd"));
        let mut store = ResourceStore::new();
        let mut events = EventLog::new();
        let mut ctx = AllocationContext {
            catalog: &mut store,
            transmuter: &NoTransmutation,
            events: &mut events,
            date: date(),
            pass: PassId::new(),
        };
        run_phase(&mut tree, Phase::GetResourcesRequired, &mut ctx).unwrap();
        assert_eq!(tree.status(folder), Some(ActivityStatus::NoTask));
        assert!(matches!(
            events.drain().as_slice(),
            [FarmEvent::ActivityPerformed(r)] if r.kind == ReportKind::Folder
        ));
    }

    #[test]
    fn test_start_of_step_resets_statuses() {
        let mut tree = ActivityTree::new("Farm");
        let id = tree.add_child(
            tree.root(),
            NodeSpec::activity(
                "Feed",
                ResourceUse {
                    demands: vec![Demand::new(ResourceGroupId::AnimalFoodStore, "Hay", 1.0)],
                    ..Default::default()
                },
            ),
        );
        let mut store = ResourceStore::new();
        let mut events = EventLog::new();
        let mut ctx = AllocationContext {
            catalog: &mut store,
            transmuter: &NoTransmutation,
            events: &mut events,
            date: date(),
            pass: PassId::new(),
        };
        run_phase(&mut tree, Phase::GetResourcesRequired, &mut ctx).unwrap();
        assert_eq!(tree.status(id), Some(ActivityStatus::Success));
        run_phase(&mut tree, Phase::StartOfTimeStep, &mut ctx).unwrap();
        assert_eq!(tree.status(id), None);
    }
}
