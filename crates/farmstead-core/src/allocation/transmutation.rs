//! Transmutation: covering a shortfall in one resource by spending others,
//! e.g. buying hay with cash.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::labour::{take_labour, DryRunLedger, LabourMode};
use super::taker::record_labour;
use super::{AllocationContext, Claimant, ResourceRequest, EPSILON};
use crate::resources::ResourceGroupId;

/// Converts shortfalls into spending on other resources.
pub trait Transmuter {
    /// For each index in `shortfalls`, whether that request's shortfall can
    /// be covered. `tentative` holds the labour the batch's own requests were
    /// found to have, which a labour cost may not reuse. With `dry_run` false
    /// the substitutions are carried out and the target pools topped up.
    fn try_resolve(
        &self,
        requests: &mut [ResourceRequest],
        shortfalls: &[usize],
        claimant: &Claimant<'_>,
        ctx: &mut AllocationContext<'_>,
        tentative: &DryRunLedger,
        dry_run: bool,
    ) -> Vec<bool>;
}

/// A transmuter that can never resolve anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTransmutation;

impl Transmuter for NoTransmutation {
    fn try_resolve(
        &self,
        _requests: &mut [ResourceRequest],
        shortfalls: &[usize],
        _claimant: &Claimant<'_>,
        _ctx: &mut AllocationContext<'_>,
        _tentative: &DryRunLedger,
        _dry_run: bool,
    ) -> Vec<bool> {
        vec![false; shortfalls.len()]
    }
}

/// What one packet of the target costs in another resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmuteCost {
    pub group: ResourceGroupId,
    /// Ignored for labour
    #[serde(default)]
    pub item: String,
    pub amount_per_packet: f64,
}

/// How to obtain more of one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransmutationRule {
    pub group: ResourceGroupId,
    pub item: String,
    /// Smallest amount that can be obtained; shortfalls round up to packets
    pub packet_size: f64,
    pub costs: Vec<TransmuteCost>,
}

impl TransmutationRule {
    pub fn packets(&self, shortfall: f64) -> f64 {
        if self.packet_size <= 0.0 {
            return 0.0;
        }
        (shortfall / self.packet_size - EPSILON).ceil().max(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransmutationTable {
    pub rules: Vec<TransmutationRule>,
}

impl TransmutationTable {
    pub fn new(rules: Vec<TransmutationRule>) -> Self {
        Self { rules }
    }

    pub fn find(&self, group: ResourceGroupId, item: &str) -> Option<&TransmutationRule> {
        self.rules
            .iter()
            .find(|r| r.group == group && r.item == item)
    }

    fn can_pay(
        &self,
        rule: &TransmutationRule,
        packets: f64,
        requests: &[ResourceRequest],
        reserved: &mut HashMap<(ResourceGroupId, String), f64>,
        claimant: &Claimant<'_>,
        ctx: &mut AllocationContext<'_>,
        tentative: &DryRunLedger,
    ) -> bool {
        let mut demands = Vec::with_capacity(rule.costs.len());
        for cost in &rule.costs {
            let needed = packets * cost.amount_per_packet;
            let key = (cost.group, cost.item.clone());
            let total = needed + reserved.get(&key).copied().unwrap_or(0.0);
            let ok = if cost.group == ResourceGroupId::Labour {
                match ctx.catalog.labour_mut() {
                    Some(pool) => {
                        let mut request = ResourceRequest::labour(total, None, None);
                        request.stamp(claimant.id, claimant.name, claimant.category, ctx.pass);
                        let mut ledger = tentative.clone();
                        let got = take_labour(
                            &mut request,
                            LabourMode::DryRun(&mut ledger),
                            claimant,
                            pool,
                            ctx.pass,
                        );
                        got >= total - EPSILON
                    }
                    None => true,
                }
            } else if !ctx.catalog.has_group(cost.group) {
                true
            } else {
                match ctx.catalog.find_item(cost.group, &cost.item) {
                    Some(item) => {
                        let batch: f64 = requests
                            .iter()
                            .filter(|r| r.group == cost.group && r.type_name == cost.item)
                            .map(|r| r.available)
                            .sum();
                        ctx.catalog.amount(item) - batch >= total - EPSILON
                    }
                    None => false,
                }
            };
            if !ok {
                return false;
            }
            demands.push((key, needed));
        }
        for (key, needed) in demands {
            *reserved.entry(key).or_insert(0.0) += needed;
        }
        true
    }

    fn pay_and_deliver(
        &self,
        rule: &TransmutationRule,
        packets: f64,
        claimant: &Claimant<'_>,
        ctx: &mut AllocationContext<'_>,
    ) -> bool {
        let Some(target) = ctx.catalog.find_item(rule.group, &rule.item) else {
            return false;
        };
        let tag = ctx.tag(claimant);
        for cost in &rule.costs {
            let needed = packets * cost.amount_per_packet;
            if cost.group == ResourceGroupId::Labour {
                let pass = ctx.pass;
                let Some(pool) = ctx.catalog.labour_mut() else {
                    continue;
                };
                let mut request = ResourceRequest::labour(needed, None, None);
                request.stamp(claimant.id, claimant.name, claimant.category, pass);
                let mut ledger = DryRunLedger::new();
                request.available =
                    take_labour(&mut request, LabourMode::DryRun(&mut ledger), claimant, pool, pass);
                let days = take_labour(&mut request, LabourMode::Commit, claimant, pool, pass);
                record_labour(&mut *ctx.catalog, &tag, days);
            } else if let Some(item) = ctx.catalog.find_item(cost.group, &cost.item) {
                ctx.catalog.withdraw(item, needed, &tag);
            }
        }
        let amount = packets * rule.packet_size;
        ctx.catalog.deposit(target, amount, &tag);
        log::info!(
            "{}: transmuted {:.2} into {}.{}",
            claimant.name,
            amount,
            rule.group,
            rule.item
        );
        true
    }
}

impl Transmuter for TransmutationTable {
    fn try_resolve(
        &self,
        requests: &mut [ResourceRequest],
        shortfalls: &[usize],
        claimant: &Claimant<'_>,
        ctx: &mut AllocationContext<'_>,
        tentative: &DryRunLedger,
        dry_run: bool,
    ) -> Vec<bool> {
        let mut reserved = HashMap::new();
        let mut resolved = Vec::with_capacity(shortfalls.len());
        for &index in shortfalls {
            let Some(request) = requests.get(index) else {
                resolved.push(false);
                continue;
            };
            let Some(rule) = self.find(request.group, &request.type_name) else {
                resolved.push(false);
                continue;
            };
            let packets = rule.packets(request.shortfall());
            if packets <= 0.0 {
                resolved.push(false);
                continue;
            }
            let ok = if dry_run {
                self.can_pay(rule, packets, requests, &mut reserved, claimant, ctx, tentative)
            } else {
                self.pay_and_deliver(rule, packets, claimant, ctx)
            };
            resolved.push(ok);
        }
        resolved
    }
}
