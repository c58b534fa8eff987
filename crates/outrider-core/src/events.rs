//! Events emitted by the engine for audio, UI and logs.

use serde::{Deserialize, Serialize};

use crate::enums::{EndReason, ErrorKind};
use crate::types::EntityId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AbilityEvent {
    AbilityActivated {
        agent: EntityId,
        slot: usize,
        ability: String,
    },
    AbilityEnded {
        agent: EntityId,
        slot: usize,
        ability: String,
        reason: EndReason,
    },
    /// An activation request was refused. Nothing changed.
    ActivationDenied {
        agent: EntityId,
        slot: usize,
        error: ErrorKind,
    },
    TargetLocked { agent: EntityId, target: EntityId },
    TargetDropped { agent: EntityId, target: EntityId },
    DamageDealt {
        agent: EntityId,
        target: EntityId,
        amount: f64,
        lethal: bool,
    },
    TransientSpawned { agent: EntityId, instance: EntityId },
    RewindStarted { agent: EntityId, snapshots: usize },
    RewindEnded { agent: EntityId },
}
