//! Name generation utilities

use crate::components::Name;
use rand::Rng;

/// Generate a random "Given Family" name
pub fn generate_name(rng: &mut impl Rng) -> Name {
    let given = GIVEN_NAMES[rng.gen_range(0..GIVEN_NAMES.len())];
    let family = FAMILY_NAMES[rng.gen_range(0..FAMILY_NAMES.len())];

    Name(format!("{given} {family}"))
}

static GIVEN_NAMES: &[&str] = &[
    "Amina", "Baraka", "Chausiku", "Daudi", "Eshe", "Faraji", "Gathoni", "Hamisi", "Imani",
    "Jabali", "Kamau", "Lulu", "Makena", "Njeri", "Omari", "Pendo", "Rehema", "Sefu", "Tumaini",
    "Wanjiru", "Zawadi", "Ana", "Bui", "Chau", "Duc", "Hoa", "Lan", "Minh", "Ngoc", "Thu",
    "Arjun", "Devi", "Kiran", "Lakshmi", "Ravi", "Sita",
];

static FAMILY_NAMES: &[&str] = &[
    "Achieng", "Kiprono", "Mwangi", "Njoroge", "Odhiambo", "Otieno", "Wafula", "Kimani",
    "Nguyen", "Tran", "Le", "Pham", "Hoang", "Vu", "Patel", "Reddy", "Naidu", "Rao",
    "Banda", "Phiri", "Moyo", "Dube",
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_name() {
        let mut rng = StdRng::seed_from_u64(7);
        let name = generate_name(&mut rng);

        assert_eq!(name.as_str().split(' ').count(), 2);
    }

    #[test]
    fn test_name_variety() {
        let mut rng = StdRng::seed_from_u64(11);
        let names: std::collections::HashSet<String> =
            (0..100).map(|_| generate_name(&mut rng).0).collect();

        assert!(names.len() > 20);
    }
}
