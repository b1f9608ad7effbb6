//! Save/Load functionality for persisting farm state
//!
//! Uses bincode for compact binary serialization. Only mutable state is
//! saved: date, balances, the transaction ledger, labour individuals and
//! the enabled flags of the tree. The tree's structure and behaviours come
//! from the farm description, so a save is loaded into an engine built from
//! the same description.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::activities::ActivityTree;
use crate::components::*;
use crate::error::SaveError;
use crate::resources::{LabourPool, ResourceCatalog, ResourceGroupId, ResourceStore, Transaction};

/// Version number for save file format (increment when format changes)
pub const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of the farm state
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveData {
    /// Save format version
    pub version: u32,
    pub name: String,
    /// Date of the next step
    pub date: NaiveDate,
    pub steps: u32,
    pub initialised: bool,
    pub balances: Vec<SerializableItem>,
    pub ledger: Vec<Transaction>,
    /// `None` when the farm has no labour pool
    pub labour: Option<Vec<SerializablePerson>>,
    /// Enabled flag of every node, in id order
    pub enabled: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializableItem {
    pub group: ResourceGroupId,
    pub name: String,
    pub amount: f64,
}

/// All components of a labour individual, serialized as optionals
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct SerializablePerson {
    pub person: Option<Person>,
    pub name: Option<Name>,
    pub demographics: Option<Demographics>,
    pub availability: Option<Availability>,
    pub pay_rate: Option<PayRate>,
    pub claims: Option<ClaimLedger>,
}

/// Extract every individual in pool order
fn serialize_people(pool: &LabourPool) -> Vec<SerializablePerson> {
    let world = pool.world();
    let mut people = Vec::with_capacity(pool.len());

    for &entity in pool.individuals() {
        let Ok(entity_ref) = world.entity(entity) else {
            continue;
        };
        let mut sp = SerializablePerson::default();
        if let Some(c) = entity_ref.get::<&Person>() {
            sp.person = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Name>() {
            sp.name = Some((*c).clone());
        }
        if let Some(c) = entity_ref.get::<&Demographics>() {
            sp.demographics = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&Availability>() {
            sp.availability = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&PayRate>() {
            sp.pay_rate = Some(*c);
        }
        if let Some(c) = entity_ref.get::<&ClaimLedger>() {
            sp.claims = Some(*c);
        }
        people.push(sp);
    }

    people
}

/// Rebuild a pool from serialized individuals, keeping their order
pub fn rebuild_pool(people: Vec<SerializablePerson>) -> LabourPool {
    let mut pool = LabourPool::new();
    for sp in people.into_iter().filter(|sp| sp.person.is_some()) {
        pool.insert(
            sp.name.unwrap_or_default(),
            sp.demographics.unwrap_or_default(),
            sp.availability.unwrap_or_else(|| Availability::new(0.0)),
            sp.pay_rate.unwrap_or_default(),
            sp.claims.unwrap_or_default(),
        );
    }
    pool
}

/// Save the farm state to a writer
pub fn save_farm<W: Write>(
    writer: W,
    name: &str,
    date: NaiveDate,
    steps: u32,
    initialised: bool,
    store: &ResourceStore,
    tree: &ActivityTree,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        name: name.to_string(),
        date,
        steps,
        initialised,
        balances: store
            .balances()
            .into_iter()
            .map(|(group, name, amount)| SerializableItem {
                group,
                name,
                amount,
            })
            .collect(),
        ledger: store.ledger().to_vec(),
        labour: store.labour().map(serialize_people),
        enabled: tree.enabled_flags(),
    };

    bincode::serialize_into(writer, &save_data)?;
    Ok(())
}

/// Load farm state from a reader
pub fn load_farm<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    Ok(save_data)
}
