//! Labour allocation.
//!
//! A labour request is matched against the pool one filter level at a time,
//! most specific first. At each level:
//!
//! 1. Exhaustive pass: pick the individual whose capacity covers the whole
//!    remaining need with the least to spare. If even that amount is below
//!    the requirement's minimum per person, allocation stops outright.
//! 2. Partial pass (only under `UseResourcesAvailable`): take from the
//!    remaining candidates, most capacity first, skipping anyone who would
//!    give less than the minimum.
//!
//! An individual's capacity is the lesser of their remaining days and the
//! per-person cap less what they already gave to the same pass.

use std::cmp::Ordering;
use std::collections::HashMap;

use farmstead_logic::labour_limits::LabourLimits;
use hecs::Entity;

use super::{Claimant, PassId, ResourceRequest, ShortfallReason, EPSILON};
use crate::activities::{LabourFilter, LabourRequirement, PartialResourcePolicy};
use crate::resources::LabourPool;

const NO_FILTERS: &[LabourFilter] = &[];

/// Tentative draws made while checking a batch, so requests in the same
/// check do not count the same days twice. Never touches the pool.
#[derive(Debug, Clone, Default)]
pub struct DryRunLedger {
    tentative: HashMap<Entity, f64>,
}

impl DryRunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drawn(&self, entity: Entity) -> f64 {
        self.tentative.get(&entity).copied().unwrap_or(0.0)
    }

    fn add(&mut self, entity: Entity, days: f64) {
        *self.tentative.entry(entity).or_insert(0.0) += days;
    }
}

pub enum LabourMode<'l> {
    /// Work out what could be provided without drawing anything
    DryRun(&'l mut DryRunLedger),
    /// Draw from individuals and accumulate cost on the request
    Commit,
}

impl LabourMode<'_> {
    fn tentative(&self, entity: Entity) -> f64 {
        match self {
            LabourMode::DryRun(ledger) => ledger.drawn(entity),
            LabourMode::Commit => 0.0,
        }
    }
}

/// The requirement governing a request: the one it names, or, for an
/// unfiltered request with no named requirement, the claimant's first.
fn resolve_requirement<'a>(
    request: &ResourceRequest,
    claimant: &Claimant<'a>,
) -> Option<&'a LabourRequirement> {
    match (request.requirement, &request.filter) {
        (Some(index), _) => claimant.labour.get(index),
        (None, None) => claimant.labour.first(),
        (None, Some(_)) => None,
    }
}

fn capacity(
    pool: &LabourPool,
    mode: &LabourMode<'_>,
    entity: Entity,
    pass: PassId,
    per_person: f64,
) -> f64 {
    pool.capacity_for(entity, pass, per_person, mode.tentative(entity))
}

fn allocate(
    request: &mut ResourceRequest,
    mode: &mut LabourMode<'_>,
    pool: &mut LabourPool,
    entity: Entity,
    days: f64,
    pass: PassId,
) {
    match mode {
        LabourMode::DryRun(ledger) => ledger.add(entity, days),
        LabourMode::Commit => {
            request.value += pool.draw(entity, days, pass);
            log::debug!(
                "{}: {:.2} days from {}",
                request.activity_name,
                days,
                pool.name(entity)
            );
        }
    }
}

/// Allocate labour for `request` and return the days provided.
///
/// A dry run resolves and stores the request's limits, trimming `required`
/// to the per-group cap. A commit reuses those limits and never provides
/// more than the request's `available`.
pub fn take_labour(
    request: &mut ResourceRequest,
    mut mode: LabourMode<'_>,
    claimant: &Claimant<'_>,
    pool: &mut LabourPool,
    pass: PassId,
) -> f64 {
    let dry_run = matches!(mode, LabourMode::DryRun(_));
    let limits = match (dry_run, request.limits) {
        (_, Some(limits)) => limits,
        (true, None) => {
            let limits = resolve_requirement(request, claimant)
                .map(|r| r.limits(request.required))
                .unwrap_or_else(LabourLimits::permissive);
            request.required = limits.cap_request(request.required);
            request.limits = Some(limits);
            limits
        }
        (false, None) => LabourLimits::permissive(),
    };
    if dry_run && limits.person_cap_binds(request.required) {
        request.note(ShortfallReason::LabourRulesLimited);
    }

    let needed = if dry_run {
        request.required
    } else {
        request.required.min(request.available)
    };
    let partial_allowed = claimant.policy == PartialResourcePolicy::UseResourcesAvailable;

    let filter = request.filter.clone();
    let levels: Vec<&[LabourFilter]> = match &filter {
        Some(group) => group.chain().into_iter().map(|g| g.filters.as_slice()).collect(),
        None => vec![NO_FILTERS],
    };

    let mut provided = 0.0;
    let mut found_candidates = false;
    let mut stopped = false;

    for filters in levels {
        if needed - provided <= EPSILON {
            break;
        }
        let candidates: Vec<Entity> = pool
            .individuals()
            .iter()
            .copied()
            .filter(|&e| pool.matches(e, filters))
            .filter(|&e| capacity(pool, &mode, e, pass, limits.per_person) > EPSILON)
            .collect();
        if candidates.is_empty() {
            continue;
        }
        found_candidates = true;

        let remaining = needed - provided;
        let best = candidates
            .iter()
            .map(|&e| (e, capacity(pool, &mode, e, pass, limits.per_person)))
            .filter(|(_, cap)| *cap >= remaining - EPSILON)
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        if let Some((entity, cap)) = best {
            let days = remaining.min(cap).min(limits.per_person);
            if days < limits.minimum_per_person - EPSILON {
                request.note(ShortfallReason::MinimumIndividualLabourRestricted);
                stopped = true;
                break;
            }
            allocate(request, &mut mode, pool, entity, days, pass);
            provided += days;
            continue;
        }

        if !partial_allowed {
            continue;
        }
        let mut ranked: Vec<(Entity, f64)> = candidates
            .iter()
            .map(|&e| (e, capacity(pool, &mode, e, pass, limits.per_person)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        for (entity, _) in ranked {
            let remaining = needed - provided;
            if remaining <= EPSILON {
                break;
            }
            let days = remaining.min(capacity(pool, &mode, entity, pass, limits.per_person));
            if days <= EPSILON || days < limits.minimum_per_person - EPSILON {
                continue;
            }
            allocate(request, &mut mode, pool, entity, days, pass);
            provided += days;
        }
    }

    if !stopped && needed - provided > EPSILON {
        request.note(if found_candidates {
            ShortfallReason::LabourIssues
        } else {
            ShortfallReason::NoSuitableLabour
        });
    }
    provided
}
