//! Error types.
//!
//! `AbilityError` never reaches the invoker of an ability: the scheduler
//! logs it and reports it as an activation outcome. `ConfigError` is
//! returned from loadout loading, before any engine exists.

use std::path::PathBuf;

use thiserror::Error;

use crate::enums::{ErrorKind, OverrideKind};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbilityError {
    #[error("{ability}: required {what} is not configured")]
    ConfigurationMissing { ability: String, what: &'static str },
    #[error("{ability}: precondition failed: {reason}")]
    PreconditionFailed { ability: String, reason: &'static str },
    #[error("{ability}: activation ignored while {phase}")]
    InvalidStateTransition { ability: String, phase: &'static str },
    #[error("{ability}: {kind:?} is held by slot {holder}")]
    ResourceConflict {
        ability: String,
        kind: OverrideKind,
        holder: usize,
    },
}

impl AbilityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AbilityError::ConfigurationMissing { .. } => ErrorKind::ConfigurationMissing,
            AbilityError::PreconditionFailed { .. } => ErrorKind::PreconditionFailed,
            AbilityError::InvalidStateTransition { .. } => ErrorKind::InvalidStateTransition,
            AbilityError::ResourceConflict { .. } => ErrorKind::ResourceConflict,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read loadout {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse loadout: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid loadout: {0}")]
    Invalid(String),
}
