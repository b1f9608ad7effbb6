//! Committing a checked batch of requests.

use super::labour::{take_labour, LabourMode};
use super::{AllocationContext, Claimant, ResourceRequest, EPSILON};
use crate::activities::{ActivityStatus, PartialResourcePolicy};
use crate::error::AllocationError;
use crate::resources::{ResourceCatalog, ResourceGroupId, Transaction, TransactionTag};

/// Book days drawn from the labour pool in the catalog's ledger.
pub(crate) fn record_labour(catalog: &mut dyn ResourceCatalog, tag: &TransactionTag, days: f64) {
    if days <= EPSILON {
        return;
    }
    catalog.record(Transaction {
        date: tag.date,
        group: ResourceGroupId::Labour,
        resource: ResourceGroupId::Labour.name().to_string(),
        activity: tag.activity.clone(),
        category: tag.category.clone(),
        gain: 0.0,
        loss: days,
    });
}

/// Take the resources found by [`super::check`].
///
/// With a shortfall, `SkipActivity` takes nothing and sets `Ignored`, and
/// `ReportErrorAndStop` sets `Critical` and fails. Otherwise every request
/// is withdrawn, never beyond what the check found available. Returns
/// whether the activity may go ahead (status is not `Ignored`).
pub fn take(
    requests: &mut [ResourceRequest],
    claimant: &Claimant<'_>,
    status: &mut ActivityStatus,
    ctx: &mut AllocationContext<'_>,
) -> Result<bool, AllocationError> {
    let short: Vec<String> = requests
        .iter()
        .filter(|r| r.is_short())
        .map(ResourceRequest::label)
        .collect();

    if !short.is_empty() {
        match claimant.policy {
            PartialResourcePolicy::SkipActivity => {
                log::warn!(
                    "{}: skipped, insufficient [{}]",
                    claimant.name,
                    short.join(", ")
                );
                *status = ActivityStatus::Ignored;
                return Ok(false);
            }
            PartialResourcePolicy::ReportErrorAndStop => {
                log::error!(
                    "Insufficient resources [{}] for activity \"{}\"",
                    short.join(", "),
                    claimant.name
                );
                *status = ActivityStatus::Critical;
                return Err(AllocationError::Fatal {
                    activity: claimant.name.to_string(),
                    resources: short,
                });
            }
            PartialResourcePolicy::UseResourcesAvailable => {}
        }
    }

    let tag = ctx.tag(claimant);
    for request in requests.iter_mut() {
        if !ctx.catalog.has_group(request.group) {
            request.provided = request.required;
            continue;
        }
        if request.is_labour() {
            let pass = ctx.pass;
            let days = match ctx.catalog.labour_mut() {
                Some(pool) => take_labour(request, LabourMode::Commit, claimant, pool, pass),
                None => 0.0,
            };
            request.provided = days;
            record_labour(&mut *ctx.catalog, &tag, days);
            continue;
        }
        request.provided = match ctx.catalog.find_item(request.group, &request.type_name) {
            Some(item) => {
                let stock = ctx.catalog.amount(item);
                let amount = request.required.min(request.available).min(stock);
                ctx.catalog.withdraw(item, amount, &tag)
            }
            None => 0.0,
        };
        debug_assert!(request.provided <= request.available + EPSILON);
    }

    Ok(*status != ActivityStatus::Ignored)
}
