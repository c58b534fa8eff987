//! Commands sent to the engine by input handling or scripts.
//!
//! Commands are queued and processed at the start of the next frame.

use serde::{Deserialize, Serialize};

use crate::types::EntityId;

/// All possible external requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AbilityCommand {
    // --- Ability slots ---
    /// Press the ability key bound to `slot`.
    Activate { agent: EntityId, slot: usize },
    /// Fire key while an aimed ability is running in `slot`.
    Fire { agent: EntityId, slot: usize },
    /// Cancel the run in `slot`.
    Cancel { agent: EntityId, slot: usize },
    /// Stop every run of the agent immediately, restoring overrides.
    ForceInterrupt { agent: EntityId },

    // --- Control input ---
    /// Movement axes: strafe and forward, each in [-1, 1].
    SetMoveInput { agent: EntityId, strafe: f64, forward: f64 },
    /// Absolute view direction in radians.
    SetLook { agent: EntityId, yaw: f64, pitch: f64 },

    // --- Simulation control ---
    Pause,
    Resume,
}

impl AbilityCommand {
    /// Agent the command targets, if any.
    pub fn agent(&self) -> Option<EntityId> {
        match self {
            AbilityCommand::Activate { agent, .. }
            | AbilityCommand::Fire { agent, .. }
            | AbilityCommand::Cancel { agent, .. }
            | AbilityCommand::ForceInterrupt { agent }
            | AbilityCommand::SetMoveInput { agent, .. }
            | AbilityCommand::SetLook { agent, .. } => Some(*agent),
            AbilityCommand::Pause | AbilityCommand::Resume => None,
        }
    }
}
