//! Property tests: allocation invariants hold for arbitrary stocks, pools and
//! request batches.

use chrono::NaiveDate;
use farmstead_core::activities::{ActivityId, LabourRequirement, PartialResourcePolicy};
use farmstead_core::allocation::{
    check, take, take_labour, AllocationContext, Claimant, DryRunLedger, LabourMode,
    NoTransmutation, PassId, ResourceRequest, TransmutationRule, TransmutationTable,
    TransmuteCost, Transmuter, EPSILON,
};
use farmstead_core::components::{Availability, Demographics};
use farmstead_core::events::EventLog;
use farmstead_core::resources::{LabourPool, ResourceCatalog, ResourceGroupId, ResourceStore};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 5, 1).unwrap()
}

fn claimant<'a>(labour: &'a [LabourRequirement], policy: PartialResourcePolicy) -> Claimant<'a> {
    Claimant {
        id: ActivityId(1),
        name: "Feed",
        policy,
        labour,
        category: "Herd",
    }
}

fn arb_policy() -> impl Strategy<Value = PartialResourcePolicy> {
    prop_oneof![
        Just(PartialResourcePolicy::ReportErrorAndStop),
        Just(PartialResourcePolicy::SkipActivity),
        Just(PartialResourcePolicy::UseResourcesAvailable),
    ]
}

fn pool_of(days: &[f64]) -> LabourPool {
    let mut pool = LabourPool::new();
    for (i, &d) in days.iter().enumerate() {
        pool.add_person(
            &format!("Worker {i}"),
            Demographics::default(),
            Availability::new(d),
            5.0,
        );
    }
    pool
}

fn hay_requests(amounts: &[f64], transmutable: bool) -> Vec<ResourceRequest> {
    amounts
        .iter()
        .map(|&a| {
            ResourceRequest::new(ResourceGroupId::AnimalFoodStore, "Hay", a)
                .allow_transmutation(transmutable)
        })
        .collect()
}

/// Check then take one batch, returning whether the take succeeded.
fn allocate(
    store: &mut ResourceStore,
    transmuter: &dyn Transmuter,
    requests: &mut [ResourceRequest],
    claimant: &Claimant<'_>,
) -> bool {
    let mut events = EventLog::new();
    let mut ctx = AllocationContext {
        catalog: store,
        transmuter,
        events: &mut events,
        date: date(),
        pass: PassId::new(),
    };
    let mut status = check(requests, claimant, &mut ctx);
    take(requests, claimant, &mut status, &mut ctx).is_ok()
}

fn total(store: &ResourceStore, item: &str, gain: bool) -> f64 {
    store
        .ledger()
        .iter()
        .filter(|t| t.resource == item)
        .map(|t| if gain { t.gain } else { t.loss })
        .sum()
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Nothing is provided beyond what the check found, and stock never goes
    /// negative.
    #[test]
    fn provided_bounded_by_available_and_stock(
        stock in 0.0f64..100.0,
        amounts in prop::collection::vec(0.0f64..60.0, 1..5),
        policy in arb_policy(),
    ) {
        let mut store = ResourceStore::new();
        store.add_item(ResourceGroupId::AnimalFoodStore, "Hay", stock);
        let mut requests = hay_requests(&amounts, false);
        let labour: [LabourRequirement; 0] = [];
        let c = claimant(&labour, policy);

        allocate(&mut store, &NoTransmutation, &mut requests, &c);

        let provided: f64 = requests.iter().map(|r| r.provided).sum();
        for r in &requests {
            prop_assert!(r.provided <= r.available + EPSILON);
            prop_assert!(r.available <= r.required + EPSILON);
        }
        prop_assert!(provided <= stock + EPSILON);
        let left = store.balance(ResourceGroupId::AnimalFoodStore, "Hay").unwrap();
        prop_assert!(left >= 0.0);
        prop_assert!((left + provided - stock).abs() < 1e-6);
    }

    /// Withdrawals never exceed the opening balance plus what was bought,
    /// and buying never overdraws the cost source.
    #[test]
    fn transmutation_never_overdraws(
        hay in 0.0f64..50.0,
        bank in 0.0f64..200.0,
        packet in 1.0f64..20.0,
        price in 0.5f64..30.0,
        amounts in prop::collection::vec(0.0f64..80.0, 1..4),
        policy in arb_policy(),
    ) {
        let mut store = ResourceStore::new();
        store.add_item(ResourceGroupId::AnimalFoodStore, "Hay", hay);
        store.add_item(ResourceGroupId::Finance, "Bank", bank);
        let table = TransmutationTable::new(vec![TransmutationRule {
            group: ResourceGroupId::AnimalFoodStore,
            item: "Hay".into(),
            packet_size: packet,
            costs: vec![TransmuteCost {
                group: ResourceGroupId::Finance,
                item: "Bank".into(),
                amount_per_packet: price,
            }],
        }]);
        let mut requests = hay_requests(&amounts, true);
        let labour: [LabourRequirement; 0] = [];
        let c = claimant(&labour, policy);

        allocate(&mut store, &table, &mut requests, &c);

        let bought = total(&store, "Hay", true);
        let taken = total(&store, "Hay", false);
        prop_assert!(taken <= hay + bought + EPSILON);
        prop_assert!(store.balance(ResourceGroupId::AnimalFoodStore, "Hay").unwrap() >= 0.0);
        let left = store.balance(ResourceGroupId::Finance, "Bank").unwrap();
        prop_assert!(left >= 0.0);
        prop_assert!((bank - left - total(&store, "Bank", false)).abs() < 1e-6);
    }

    /// Nobody gives more than their remaining days or the per-person cap.
    #[test]
    fn labour_respects_person_bounds(
        days in prop::collection::vec(0.0f64..20.0, 1..6),
        per_person in 1.0f64..12.0,
        required in 0.0f64..60.0,
        policy in arb_policy(),
    ) {
        let mut pool = pool_of(&days);
        let labour = [LabourRequirement {
            maximum_per_person: per_person,
            ..Default::default()
        }];
        let c = claimant(&labour, policy);
        let pass = PassId::new();

        let mut request = ResourceRequest::labour(required, None, Some(0));
        let mut ledger = DryRunLedger::new();
        request.available =
            take_labour(&mut request, LabourMode::DryRun(&mut ledger), &c, &mut pool, pass);
        let provided = take_labour(&mut request, LabourMode::Commit, &c, &mut pool, pass);

        prop_assert!(provided <= request.available + EPSILON);
        prop_assert!(provided <= required + EPSILON);
        let individuals: Vec<_> = pool.individuals().to_vec();
        for (&entity, &start) in individuals.iter().zip(&days) {
            let drawn = pool.drawn_for(entity, pass);
            prop_assert!(drawn <= per_person + EPSILON);
            prop_assert!(drawn <= start + EPSILON);
            prop_assert!(pool.remaining(entity) >= 0.0);
        }
    }

    /// Two requests in one pass share each person's cap instead of each
    /// getting it afresh.
    #[test]
    fn one_pass_counts_each_draw_once(
        days in prop::collection::vec(1.0f64..20.0, 1..5),
        per_person in 1.0f64..8.0,
        first in 0.0f64..30.0,
        second in 0.0f64..30.0,
    ) {
        let mut pool = pool_of(&days);
        let labour = [LabourRequirement {
            maximum_per_person: per_person,
            ..Default::default()
        }];
        let c = claimant(&labour, PartialResourcePolicy::UseResourcesAvailable);
        let pass = PassId::new();

        for required in [first, second] {
            let mut request = ResourceRequest::labour(required, None, Some(0));
            let mut ledger = DryRunLedger::new();
            request.available =
                take_labour(&mut request, LabourMode::DryRun(&mut ledger), &c, &mut pool, pass);
            take_labour(&mut request, LabourMode::Commit, &c, &mut pool, pass);
        }

        let individuals: Vec<_> = pool.individuals().to_vec();
        let mut drawn_total = 0.0;
        for (&entity, &start) in individuals.iter().zip(&days) {
            let drawn = pool.drawn_for(entity, pass);
            prop_assert!(drawn <= per_person + EPSILON);
            prop_assert!((start - pool.remaining(entity) - drawn).abs() < 1e-6);
            drawn_total += drawn;
        }
        prop_assert!(drawn_total <= first + second + EPSILON);
    }

    /// Without transmutation, checking the same batch twice finds the same
    /// availability and reasons and leaves the store untouched.
    #[test]
    fn check_is_repeatable(
        stock in 0.0f64..50.0,
        amounts in prop::collection::vec(0.0f64..40.0, 1..4),
        days in prop::collection::vec(0.0f64..15.0, 0..4),
        labour_days in 0.0f64..30.0,
        per_person in 1.0f64..10.0,
        policy in arb_policy(),
    ) {
        let mut store = ResourceStore::new();
        store.add_item(ResourceGroupId::AnimalFoodStore, "Hay", stock);
        store.set_labour(pool_of(&days));
        let labour = [LabourRequirement {
            maximum_per_person: per_person,
            ..Default::default()
        }];
        let c = claimant(&labour, policy);
        let mut requests = hay_requests(&amounts, false);
        requests.push(ResourceRequest::labour(labour_days, None, Some(0)));

        let mut events = EventLog::new();
        let mut ctx = AllocationContext {
            catalog: &mut store,
            transmuter: &NoTransmutation,
            events: &mut events,
            date: date(),
            pass: PassId::new(),
        };
        let first_status = check(&mut requests, &c, &mut ctx);
        let first: Vec<_> = requests
            .iter()
            .map(|r| (r.required, r.available, r.shortfall_reasons.clone()))
            .collect();
        let second_status = check(&mut requests, &c, &mut ctx);
        let second: Vec<_> = requests
            .iter()
            .map(|r| (r.required, r.available, r.shortfall_reasons.clone()))
            .collect();

        prop_assert_eq!(first_status, second_status);
        prop_assert_eq!(first, second);
        prop_assert_eq!(store.balance(ResourceGroupId::AnimalFoodStore, "Hay"), Some(stock));
        let pool = store.labour().unwrap();
        let remaining: f64 = pool.total_remaining();
        prop_assert!((remaining - days.iter().sum::<f64>()).abs() < 1e-6);
    }
}
