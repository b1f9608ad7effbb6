//! Labour pool: the individuals who supply person-days.
//!
//! Each individual is an entity in a private `hecs::World`. `order` keeps the
//! declaration order so allocation tie-breaks are deterministic.

use hecs::{Entity, World};

use crate::activities::LabourFilter;
use crate::allocation::PassId;
use crate::components::*;

pub struct LabourPool {
    world: World,
    order: Vec<Entity>,
}

impl LabourPool {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            order: Vec::new(),
        }
    }

    /// Add one individual with fresh claim bookkeeping.
    pub fn add_person(
        &mut self,
        name: impl Into<String>,
        demographics: Demographics,
        availability: Availability,
        pay_rate: f64,
    ) -> Entity {
        self.insert(
            Name(name.into()),
            demographics,
            availability,
            PayRate(pay_rate),
            ClaimLedger::default(),
        )
    }

    pub(crate) fn insert(
        &mut self,
        name: Name,
        demographics: Demographics,
        availability: Availability,
        pay_rate: PayRate,
        claims: ClaimLedger,
    ) -> Entity {
        let entity = self
            .world
            .spawn((Person, name, demographics, availability, pay_rate, claims));
        self.order.push(entity);
        entity
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Individuals in declaration order.
    pub fn individuals(&self) -> &[Entity] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn name(&self, entity: Entity) -> String {
        self.world
            .get::<&Name>(entity)
            .map(|n| n.0.clone())
            .unwrap_or_default()
    }

    pub fn find(&self, name: &str) -> Option<Entity> {
        self.order
            .iter()
            .copied()
            .find(|&e| self.world.get::<&Name>(e).map(|n| n.0 == name).unwrap_or(false))
    }

    pub fn demographics(&self, entity: Entity) -> Option<Demographics> {
        self.world.get::<&Demographics>(entity).ok().map(|d| *d)
    }

    pub fn remaining(&self, entity: Entity) -> f64 {
        self.world
            .get::<&Availability>(entity)
            .map(|a| a.remaining)
            .unwrap_or(0.0)
    }

    pub fn total_remaining(&self) -> f64 {
        self.order.iter().map(|&e| self.remaining(e)).sum()
    }

    pub fn pay_rate(&self, entity: Entity) -> f64 {
        self.world
            .get::<&PayRate>(entity)
            .map(|p| p.0)
            .unwrap_or(0.0)
    }

    /// Days this individual has already given to `pass`.
    pub fn drawn_for(&self, entity: Entity, pass: PassId) -> f64 {
        self.world
            .get::<&ClaimLedger>(entity)
            .map(|c| c.drawn_for(pass))
            .unwrap_or(0.0)
    }

    /// Days this individual could still give to `pass` under `per_person`,
    /// after `tentative` days already promised elsewhere in the same check.
    pub fn capacity_for(
        &self,
        entity: Entity,
        pass: PassId,
        per_person: f64,
        tentative: f64,
    ) -> f64 {
        let remaining = self.remaining(entity) - tentative;
        let headroom = per_person - self.drawn_for(entity, pass) - tentative;
        remaining.min(headroom).max(0.0)
    }

    /// Whether the individual passes every filter.
    pub fn matches(&self, entity: Entity, filters: &[LabourFilter]) -> bool {
        let Ok(mut q) = self.world.query_one::<(&Name, &Demographics)>(entity) else {
            return false;
        };
        match q.get() {
            Some((name, demographics)) => filters.iter().all(|f| f.matches(name, demographics)),
            None => false,
        }
    }

    /// Remove `days` from an individual's availability and book them against
    /// `pass`. Returns the cost of the draw.
    pub fn draw(&mut self, entity: Entity, days: f64, pass: PassId) -> f64 {
        if let Ok(mut availability) = self.world.get::<&mut Availability>(entity) {
            availability.remaining = (availability.remaining - days).max(0.0);
        }
        if let Ok(mut claims) = self.world.get::<&mut ClaimLedger>(entity) {
            claims.record(pass, days);
        }
        days * self.pay_rate(entity)
    }

    /// Refill every individual's days for the month (0-based).
    pub fn reset_availability(&mut self, month0: usize) {
        for (_entity, availability) in self.world.query_mut::<&mut Availability>() {
            availability.remaining = availability.days_in_month(month0);
        }
    }

    /// Age household members; hired labour keeps its age.
    pub fn age_individuals(&mut self, months: u32) {
        for (_entity, demographics) in self.world.query_mut::<&mut Demographics>() {
            if !demographics.hired {
                demographics.age_months += months;
            }
        }
    }
}

impl Default for LabourPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> (LabourPool, Entity, Entity) {
        let mut pool = LabourPool::new();
        let a = pool.add_person(
            "Owner",
            Demographics {
                gender: Gender::Male,
                age_months: 40 * 12,
                hired: false,
            },
            Availability::new(20.0),
            0.0,
        );
        let b = pool.add_person(
            "Hand",
            Demographics {
                gender: Gender::Female,
                age_months: 25 * 12,
                hired: true,
            },
            Availability::new(10.0),
            150.0,
        );
        (pool, a, b)
    }

    #[test]
    fn test_draw_reduces_remaining_and_returns_cost() {
        let (mut pool, _, hand) = pool();
        let pass = PassId::new();
        let cost = pool.draw(hand, 4.0, pass);
        assert_eq!(cost, 600.0);
        assert_eq!(pool.remaining(hand), 6.0);
        assert_eq!(pool.drawn_for(hand, pass), 4.0);
    }

    #[test]
    fn test_capacity_respects_per_person_within_pass() {
        let (mut pool, owner, _) = pool();
        let pass = PassId::new();
        assert_eq!(pool.capacity_for(owner, pass, 5.0, 0.0), 5.0);
        pool.draw(owner, 3.0, pass);
        assert_eq!(pool.capacity_for(owner, pass, 5.0, 0.0), 2.0);
        // A different pass is not limited by the earlier draw
        assert_eq!(pool.capacity_for(owner, PassId::new(), 5.0, 0.0), 5.0);
    }

    #[test]
    fn test_capacity_less_tentative_days() {
        let (mut pool, _, hand) = pool();
        let pass = PassId::new();
        pool.draw(hand, 4.0, pass);
        // 6 left, 4 already given to the pass
        assert_eq!(pool.capacity_for(hand, pass, 8.0, 1.0), 3.0);
        assert_eq!(pool.capacity_for(hand, pass, 100.0, 5.0), 1.0);
        assert_eq!(pool.capacity_for(hand, pass, 100.0, 7.0), 0.0);
    }

    #[test]
    fn test_reset_and_age() {
        let (mut pool, owner, hand) = pool();
        pool.draw(owner, 20.0, PassId::new());
        pool.reset_availability(3);
        assert_eq!(pool.remaining(owner), 20.0);

        pool.age_individuals(1);
        assert_eq!(pool.demographics(owner).unwrap().age_months, 40 * 12 + 1);
        assert_eq!(pool.demographics(hand).unwrap().age_months, 25 * 12);
    }

    #[test]
    fn test_filters() {
        let (pool, owner, hand) = pool();
        let females = [LabourFilter::Gender(Gender::Female)];
        assert!(!pool.matches(owner, &females));
        assert!(pool.matches(hand, &females));
        assert!(pool.matches(owner, &[]));
        assert_eq!(pool.find("Hand"), Some(hand));
        assert_eq!(pool.total_remaining(), 30.0);
    }
}
