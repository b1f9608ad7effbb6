//! Labour generation: expanding configured labour types into individuals,
//! and random smallholder households for demos and benchmarks.

use hecs::Entity;
use rand::Rng;

use super::names::generate_name;
use crate::components::{Availability, Demographics, Gender};
use crate::config::LabourTypeConfig;
use crate::resources::LabourPool;

/// Add the individuals of one labour type. A type with more than one
/// individual is expanded to `name_1 .. name_n`.
pub fn spawn_labour_type(pool: &mut LabourPool, config: &LabourTypeConfig) -> Vec<Entity> {
    let count = config.individuals.max(1);
    let demographics = Demographics {
        gender: config.gender,
        age_months: (config.age_years.max(0.0) * 12.0).round() as u32,
        hired: config.hired,
    };
    let mut availability = Availability::new(config.days_per_month);
    if let Some(profile) = config.monthly_profile {
        availability = availability.with_profile(profile);
    }

    (1..=count)
        .map(|i| {
            let name = if count == 1 {
                config.name.clone()
            } else {
                format!("{}_{}", config.name, i)
            };
            pool.add_person(name, demographics, availability, config.pay_rate)
        })
        .collect()
}

pub fn build_labour_pool(types: &[LabourTypeConfig]) -> LabourPool {
    let mut pool = LabourPool::new();
    for config in types {
        spawn_labour_type(&mut pool, config);
    }
    pool
}

/// Household make-up for [`generate_household`].
#[derive(Debug, Clone, Copy)]
pub struct HouseholdConfig {
    pub adults: u32,
    pub children: u32,
    pub hired: u32,
}

impl Default for HouseholdConfig {
    fn default() -> Self {
        Self {
            adults: 2,
            children: 2,
            hired: 1,
        }
    }
}

/// Add a random household to the pool. Children work a few days a month,
/// hired hands work most days and are paid.
pub fn generate_household(
    pool: &mut LabourPool,
    config: &HouseholdConfig,
    rng: &mut impl Rng,
) -> Vec<Entity> {
    let mut people = Vec::new();

    for _ in 0..config.adults {
        let demographics = Demographics {
            gender: random_gender(rng),
            age_months: rng.gen_range(18..65) * 12,
            hired: false,
        };
        let days = rng.gen_range(18.0..24.0);
        people.push(pool.add_person(
            generate_name(rng).0,
            demographics,
            Availability::new(days),
            0.0,
        ));
    }

    for _ in 0..config.children {
        let demographics = Demographics {
            gender: random_gender(rng),
            age_months: rng.gen_range(6..18) * 12,
            hired: false,
        };
        let days = rng.gen_range(4.0..10.0);
        people.push(pool.add_person(
            generate_name(rng).0,
            demographics,
            Availability::new(days),
            0.0,
        ));
    }

    for _ in 0..config.hired {
        let demographics = Demographics {
            gender: random_gender(rng),
            age_months: rng.gen_range(20..50) * 12,
            hired: true,
        };
        let days = rng.gen_range(20.0..22.0);
        let pay = rng.gen_range(80.0..150.0);
        people.push(pool.add_person(
            generate_name(rng).0,
            demographics,
            Availability::new(days),
            pay,
        ));
    }

    people
}

fn random_gender(rng: &mut impl Rng) -> Gender {
    if rng.gen_bool(0.5) {
        Gender::Female
    } else {
        Gender::Male
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn labour_type(name: &str, individuals: u32) -> LabourTypeConfig {
        LabourTypeConfig {
            name: name.into(),
            individuals,
            gender: Gender::Female,
            age_years: 25.0,
            hired: false,
            days_per_month: 20.0,
            monthly_profile: None,
            pay_rate: 0.0,
        }
    }

    #[test]
    fn test_individuals_expand_with_suffix() {
        let mut pool = LabourPool::new();
        spawn_labour_type(&mut pool, &labour_type("Hand", 3));
        spawn_labour_type(&mut pool, &labour_type("Owner", 1));

        assert_eq!(pool.len(), 4);
        assert!(pool.find("Hand_1").is_some());
        assert!(pool.find("Hand_3").is_some());
        assert!(pool.find("Owner").is_some());
        assert_eq!(pool.total_remaining(), 80.0);
    }

    #[test]
    fn test_age_converted_to_months() {
        let mut pool = LabourPool::new();
        let people = spawn_labour_type(&mut pool, &labour_type("Hand", 1));
        let demographics = pool.demographics(people[0]).unwrap();
        assert_eq!(demographics.age_months, 300);
    }

    #[test]
    fn test_household_is_seeded() {
        let config = HouseholdConfig::default();
        let mut a = LabourPool::new();
        let mut b = LabourPool::new();
        generate_household(&mut a, &config, &mut StdRng::seed_from_u64(3));
        generate_household(&mut b, &config, &mut StdRng::seed_from_u64(3));

        assert_eq!(a.len(), 5);
        let names_a: Vec<String> = a.individuals().iter().map(|&e| a.name(e)).collect();
        let names_b: Vec<String> = b.individuals().iter().map(|&e| b.name(e)).collect();
        assert_eq!(names_a, names_b);
        let hired = a
            .individuals()
            .iter()
            .filter(|&&e| a.demographics(e).map(|d| d.hired).unwrap_or(false))
            .count();
        assert_eq!(hired, 1);
    }
}
