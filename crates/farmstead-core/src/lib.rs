//! Farmstead Core - Farm Activity Resource Allocation Engine
//!
//! A monthly simulation of a farm as a tree of activities that compete for
//! finite resource pools: money, feed, pasture, products and person-days of
//! labour.
//!
//! # Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`activities`] | Activity arena, behaviours, timers, labour requirements, status |
//! | [`allocation`] | Check, transmute and take requests; tiered labour allocation |
//! | [`components`] | Pure data attached to labour individuals (`hecs` components) |
//! | [`config`] | JSON farm description and validation |
//! | [`engine`] | [`engine::FarmEngine`]: owns the state and fires phases per step |
//! | [`error`] | Error types |
//! | [`events`] | Shortfall and activity-performed notifications |
//! | [`generation`] | Labour pools from config, random households |
//! | [`persistence`] | Binary save/load |
//! | [`resources`] | Resource groups, the labour pool, the transaction ledger |
//! | [`walker`] | Phase handling and the per-node allocation pipeline |
//!
//! # Example
//!
//! ```rust,no_run
//! use farmstead_core::prelude::*;
//!
//! let config = FarmConfig::from_path("data/demo_farm.json")?;
//! let mut engine = FarmEngine::from_config(&config)?;
//!
//! for summary in engine.run(12)? {
//!     println!("{}: {} shortfalls", summary.date, summary.shortfalls.len());
//! }
//! # Ok::<(), FarmError>(())
//! ```

pub mod activities;
pub mod allocation;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod generation;
pub mod persistence;
pub mod resources;
pub mod walker;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::activities::{
        ActivityId, ActivityStatus, ActivityTree, AllocationStyle, LabourFilter,
        LabourFilterGroup, LabourRequirement, NodeSpec, PartialResourcePolicy,
    };
    pub use crate::allocation::{ResourceRequest, ShortfallReason};
    pub use crate::config::FarmConfig;
    pub use crate::engine::{FarmEngine, StepSummary};
    pub use crate::error::{AllocationError, ConfigError, FarmError, SaveError};
    pub use crate::events::{FarmEvent, PerformedReport, ShortfallReport};
    pub use crate::resources::{ResourceCatalog, ResourceGroupId, ResourceStore};
    pub use crate::walker::Phase;
}
