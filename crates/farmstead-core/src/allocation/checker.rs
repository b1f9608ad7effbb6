//! Availability check for a batch of requests.
//!
//! Nothing is withdrawn here except by a committed transmutation. The check
//! runs in two passes: find shortfalls, then ask the transmuter whether they
//! can be covered, and only spend on substitutions if the whole batch (or,
//! under `UseResourcesAvailable`, any part of it) benefits.

use super::labour::{take_labour, DryRunLedger, LabourMode};
use super::{AllocationContext, Claimant, ResourceRequest, ShortfallReason};
use crate::activities::{ActivityStatus, PartialResourcePolicy};
use crate::resources::ResourceCatalog;

/// Whether transmutations found possible in the dry run should be carried
/// out: all of the candidates resolve, or some do and the activity accepts
/// partial resources.
pub fn should_transmute(
    resolvable: usize,
    candidates: usize,
    policy: PartialResourcePolicy,
) -> bool {
    resolvable > 0
        && (resolvable == candidates || policy == PartialResourcePolicy::UseResourcesAvailable)
}

/// Availability of a non-labour request. Unregistered groups are
/// unconstrained; a missing item in a registered group has nothing.
fn generic_available(request: &ResourceRequest, catalog: &dyn ResourceCatalog) -> f64 {
    if !catalog.has_group(request.group) {
        return request.required;
    }
    match catalog.find_item(request.group, &request.type_name) {
        Some(item) => catalog.amount(item).min(request.required).max(0.0),
        None => {
            log::warn!(
                "{}: {} is not in the {} store",
                request.activity_name,
                request.type_name,
                request.group
            );
            0.0
        }
    }
}

/// Set `available` on every request in a registered group from the current
/// pools. Labour requests share one dry-run ledger, which is returned.
fn derive_available(
    requests: &mut [ResourceRequest],
    claimant: &Claimant<'_>,
    ctx: &mut AllocationContext<'_>,
) -> DryRunLedger {
    let mut ledger = DryRunLedger::new();
    let pass = ctx.pass;
    for request in requests.iter_mut() {
        if !ctx.catalog.has_group(request.group) {
            continue;
        }
        if request.is_labour() {
            if let Some(pool) = ctx.catalog.labour_mut() {
                request.available = take_labour(
                    request,
                    LabourMode::DryRun(&mut ledger),
                    claimant,
                    pool,
                    pass,
                );
            }
        } else {
            request.available = generic_available(request, &*ctx.catalog);
        }
    }
    ledger
}

/// Fill in `available` on every request and return `Success` or `Partial`.
///
/// Raises one shortfall event per request still short after transmutation.
pub fn check(
    requests: &mut [ResourceRequest],
    claimant: &Claimant<'_>,
    ctx: &mut AllocationContext<'_>,
) -> ActivityStatus {
    if requests.is_empty() {
        return ActivityStatus::Success;
    }

    for request in requests.iter_mut() {
        request.available = 0.0;
        request.provided = 0.0;
        request.transmutation_possible = false;
        request.shortfall_reasons.clear();

        if !ctx.catalog.has_group(request.group) {
            request.available = request.required;
            request.provided = request.required;
        }
    }
    let ledger = derive_available(requests, claimant, ctx);

    let candidates: Vec<usize> = requests
        .iter()
        .enumerate()
        .filter(|(_, r)| r.is_short() && r.allow_transmutation)
        .map(|(i, _)| i)
        .collect();
    if !candidates.is_empty() {
        let transmuter = ctx.transmuter;
        let flags = transmuter.try_resolve(requests, &candidates, claimant, ctx, &ledger, true);
        let mut resolvable = Vec::new();
        for (&index, &ok) in candidates.iter().zip(&flags) {
            requests[index].transmutation_possible = ok;
            if ok {
                resolvable.push(index);
            }
        }

        if should_transmute(resolvable.len(), candidates.len(), claimant.policy) {
            let done = transmuter.try_resolve(requests, &resolvable, claimant, ctx, &ledger, false);
            for (&index, &ok) in resolvable.iter().zip(&done) {
                requests[index].note(if ok {
                    ShortfallReason::Transmuted
                } else {
                    ShortfallReason::TransmuteFailed
                });
            }
            // Labour paid out above is gone from the pool
            derive_available(requests, claimant, ctx);
        } else {
            for &index in &candidates {
                requests[index].note(ShortfallReason::TransmuteFailed);
            }
        }
    }

    let mut status = ActivityStatus::Success;
    for request in requests.iter().filter(|r| r.is_short()) {
        ctx.events.shortfall(ctx.date, request);
        status = ActivityStatus::Partial;
    }
    status
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transmute_when_all_candidates_resolve() {
        assert!(should_transmute(2, 2, PartialResourcePolicy::ReportErrorAndStop));
        assert!(should_transmute(1, 1, PartialResourcePolicy::SkipActivity));
    }

    #[test]
    fn test_partial_resolution_needs_use_available_policy() {
        assert!(!should_transmute(1, 2, PartialResourcePolicy::ReportErrorAndStop));
        assert!(!should_transmute(1, 2, PartialResourcePolicy::SkipActivity));
        assert!(should_transmute(1, 2, PartialResourcePolicy::UseResourcesAvailable));
    }

    #[test]
    fn test_nothing_resolvable_never_transmutes() {
        assert!(!should_transmute(0, 0, PartialResourcePolicy::UseResourcesAvailable));
        assert!(!should_transmute(0, 3, PartialResourcePolicy::UseResourcesAvailable));
    }
}
