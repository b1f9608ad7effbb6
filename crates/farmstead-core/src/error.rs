//! Error types for the farm engine.
//!
//! Soft shortfalls are never errors; they surface through activity status
//! and shortfall events. The only allocation error is the fatal
//! `ReportErrorAndStop` case, which every caller has to handle explicitly.

use thiserror::Error;

use crate::activities::ActivityId;

/// Run-terminating allocation failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    /// An activity with `ReportErrorAndStop` could not obtain its resources.
    #[error("insufficient [{}] for activity \"{activity}\"", .resources.join(", "))]
    Fatal {
        activity: String,
        resources: Vec<String>,
    },
}

/// Problems loading or validating a farm description.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid farm JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("\"{what}\" has negative amount {amount}")]
    NegativeAmount { what: String, amount: f64 },
    #[error("activity \"{activity}\": invalid labour requirement: {reason}")]
    InvalidLabourRequirement { activity: String, reason: String },
    #[error("activity \"{activity}\": invalid timer \"{timer}\"")]
    InvalidTimer { activity: String, timer: String },
    #[error("transmutation target {group}.{item} is not a registered resource")]
    UnknownTransmutationTarget { group: String, item: String },
    #[error("transmutation for {group}.{item} has a non-positive packet size")]
    InvalidPacketSize { group: String, item: String },
    #[error("activity name must not be empty")]
    EmptyActivityName,
}

/// Errors that can occur during save/load.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Bincode(#[from] Box<bincode::ErrorKind>),
    #[error("Save version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
    #[error("Activity tree mismatch: engine has {expected} nodes, save has {found}")]
    TreeMismatch { expected: usize, found: usize },
}

/// Umbrella error returned by [`crate::engine::FarmEngine`].
#[derive(Debug, Error)]
pub enum FarmError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Save(#[from] SaveError),
    #[error("no activity with id {0}")]
    UnknownActivity(ActivityId),
    #[error("activity \"{0}\" is not manually allocated")]
    NotManual(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_message_names_activity_and_resources() {
        let err = AllocationError::Fatal {
            activity: "Feed herd".into(),
            resources: vec!["AnimalFoodStore.Hay".into(), "Labour".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Feed herd"));
        assert!(msg.contains("AnimalFoodStore.Hay, Labour"));
    }

    #[test]
    fn test_farm_error_wraps_allocation() {
        let err: FarmError = AllocationError::Fatal {
            activity: "x".into(),
            resources: vec![],
        }
        .into();
        assert!(matches!(err, FarmError::Allocation(_)));
    }
}
