//! Farm engine - main entry point for running the simulation
//!
//! Owns the resource store, the activity tree and the event log, and fires
//! the phase sequence once per monthly step.

use std::io::{Read, Write};

use chrono::{Datelike, NaiveDate};
use farmstead_logic::timing::add_months;

use crate::activities::{ActivityId, ActivityStatus, ActivityTree};
use crate::allocation::{AllocationContext, PassId, TransmutationTable, Transmuter};
use crate::config::FarmConfig;
use crate::error::{AllocationError, FarmError, SaveError};
use crate::events::{EventLog, EventSubscriber, FarmEvent, PerformedReport, ReportKind, ShortfallReport};
use crate::persistence;
use crate::resources::{ResourceCatalog, ResourceGroupId, ResourceStore};
use crate::walker::{self, Phase};

/// What happened during one step
#[derive(Debug, Clone)]
pub struct StepSummary {
    pub date: NaiveDate,
    pub performed: Vec<PerformedReport>,
    pub shortfalls: Vec<ShortfallReport>,
}

impl StepSummary {
    fn from_events(date: NaiveDate, events: Vec<FarmEvent>) -> Self {
        let mut summary = Self {
            date,
            performed: Vec::new(),
            shortfalls: Vec::new(),
        };
        for event in events {
            match event {
                FarmEvent::ActivityPerformed(report) => summary.performed.push(report),
                FarmEvent::ShortfallOccurred(report) => summary.shortfalls.push(report),
            }
        }
        summary
    }

    /// Last status reported for a named activity (timer reports excluded)
    pub fn status_of(&self, name: &str) -> Option<ActivityStatus> {
        self.performed
            .iter()
            .rev()
            .find(|r| r.kind != ReportKind::Timer && r.name == name)
            .map(|r| r.status)
    }

    pub fn shortfalls_for(&self, name: &str) -> impl Iterator<Item = &ShortfallReport> + '_ {
        let name = name.to_string();
        self.shortfalls
            .iter()
            .filter(move |s| s.activity_name == name)
    }
}

/// Main farm engine
pub struct FarmEngine {
    pub name: String,
    /// Resource balances, labour pool and ledger
    pub store: ResourceStore,
    pub tree: ActivityTree,
    pub events: EventLog,
    transmuter: Box<dyn Transmuter>,
    date: NaiveDate,
    steps: u32,
    initialised: bool,
}

impl FarmEngine {
    /// Create an empty farm starting at `start_date`
    pub fn new(name: impl Into<String>, start_date: NaiveDate) -> Self {
        let name = name.into();
        Self {
            tree: ActivityTree::new(name.clone()),
            name,
            store: ResourceStore::new(),
            events: EventLog::new(),
            transmuter: Box::new(TransmutationTable::default()),
            date: start_date,
            steps: 0,
            initialised: false,
        }
    }

    pub fn from_config(config: &FarmConfig) -> Result<Self, FarmError> {
        config.validate()?;
        let mut engine = Self::new(config.name.clone(), config.start_date);
        engine.store = config.build_store();
        engine.tree = config.build_tree();
        engine.transmuter = Box::new(TransmutationTable::new(config.transmutations.clone()));
        log::info!(
            "Loaded farm \"{}\": {} activities, {} labour individuals",
            engine.name,
            engine.tree.len() - 1,
            engine.store.labour().map(|p| p.len()).unwrap_or(0)
        );
        Ok(engine)
    }

    pub fn set_transmuter(&mut self, transmuter: Box<dyn Transmuter>) {
        self.transmuter = transmuter;
    }

    pub fn subscribe(&mut self, subscriber: Box<dyn EventSubscriber>) {
        self.events.subscribe(subscriber);
    }

    /// Date of the next step
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    pub fn find(&self, name: &str) -> Option<ActivityId> {
        self.tree.find(name)
    }

    pub fn status(&self, name: &str) -> Option<ActivityStatus> {
        self.find(name).and_then(|id| self.tree.status(id))
    }

    pub fn balance(&self, group: ResourceGroupId, item: &str) -> Option<f64> {
        self.store.balance(group, item)
    }

    /// Enable or disable an activity and its subtree
    pub fn set_enabled(&mut self, id: ActivityId, enabled: bool) -> Result<(), FarmError> {
        if self.tree.set_enabled(id, enabled) {
            Ok(())
        } else {
            Err(FarmError::UnknownActivity(id))
        }
    }

    fn with_context<T>(
        &mut self,
        f: impl FnOnce(&mut ActivityTree, &mut AllocationContext<'_>) -> T,
    ) -> T {
        let mut ctx = AllocationContext {
            catalog: &mut self.store,
            transmuter: &*self.transmuter,
            events: &mut self.events,
            date: self.date,
            pass: PassId::new(),
        };
        f(&mut self.tree, &mut ctx)
    }

    /// Fire one phase: pool bookkeeping first, then the tree
    pub fn fire(&mut self, phase: Phase) -> Result<(), AllocationError> {
        match phase {
            Phase::UpdateLabourAvailability => {
                let month0 = self.date.month0() as usize;
                if let Some(pool) = self.store.labour_mut() {
                    pool.reset_availability(month0);
                }
            }
            Phase::AgeResources => {
                if let Some(pool) = self.store.labour_mut() {
                    pool.age_individuals(1);
                }
            }
            _ => {}
        }
        self.with_context(|tree, ctx| walker::run_phase(tree, phase, ctx))
    }

    /// Create dynamic activities and take initialisation resources. Runs
    /// once; later calls do nothing.
    pub fn initialise(&mut self) -> Result<(), FarmError> {
        if self.initialised {
            return Ok(());
        }
        for phase in Phase::SETUP {
            self.fire(phase)?;
        }
        self.initialised = true;
        log::debug!("{}: initialised, {} nodes", self.name, self.tree.len());
        Ok(())
    }

    /// Run one monthly step.
    ///
    /// A fatal allocation error stops the step: the date does not advance
    /// and the events raised so far stay queued on [`Self::events`].
    pub fn step(&mut self) -> Result<StepSummary, FarmError> {
        self.initialise()?;
        let date = self.date;
        for phase in Phase::STEP {
            if let Err(err) = self.fire(phase) {
                log::error!("{}: stopped at {:?} on {}: {}", self.name, phase, date, err);
                return Err(err.into());
            }
        }

        let summary = StepSummary::from_events(date, self.events.drain());
        self.date = add_months(self.date, 1);
        self.steps += 1;
        log::info!(
            "{} {}: {} reports, {} shortfalls",
            self.name,
            date.format("%Y-%m"),
            summary.performed.len(),
            summary.shortfalls.len()
        );
        Ok(summary)
    }

    pub fn run(&mut self, months: u32) -> Result<Vec<StepSummary>, FarmError> {
        (0..months).map(|_| self.step()).collect()
    }

    /// Run a manually allocated activity now. Its events stay queued until
    /// the next step drains them.
    pub fn perform_manually(&mut self, id: ActivityId) -> Result<ActivityStatus, FarmError> {
        let node = self.tree.get(id).ok_or(FarmError::UnknownActivity(id))?;
        if !node.is_manual() {
            return Err(FarmError::NotManual(node.name.clone()));
        }
        let status = self.with_context(|tree, ctx| walker::perform_manual(tree, id, ctx))?;
        Ok(status)
    }

    /// Save farm state to a writer
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        persistence::save_farm(
            writer,
            &self.name,
            self.date,
            self.steps,
            self.initialised,
            &self.store,
            &self.tree,
        )
    }

    /// Load farm state saved from an engine built from the same description
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = persistence::load_farm(reader)?;

        if loaded.initialised {
            self.tree.spawn_dynamic_children();
        }
        if loaded.enabled.len() != self.tree.len() {
            return Err(SaveError::TreeMismatch {
                expected: self.tree.len(),
                found: loaded.enabled.len(),
            });
        }

        self.tree.apply_enabled_flags(&loaded.enabled);
        self.tree.reset_statuses();
        for item in loaded.balances {
            self.store.set_balance(item.group, &item.name, item.amount);
        }
        self.store.replace_ledger(loaded.ledger);
        if let Some(people) = loaded.labour {
            self.store.set_labour(persistence::rebuild_pool(people));
        }
        self.name = loaded.name;
        self.date = loaded.date;
        self.steps = loaded.steps;
        self.initialised = loaded.initialised;
        self.events.drain();

        Ok(())
    }
}
