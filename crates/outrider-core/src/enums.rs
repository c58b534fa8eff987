//! Enumeration types used throughout the engine.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of one ability slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityPhase {
    #[default]
    Idle,
    /// One setup step before the effect starts (camera swap, visuals).
    Arming,
    Active,
    /// Ended early by a cancel, an obstacle or a forced stop. Teardown already ran.
    Interrupted,
    /// Ended normally. May still be winding down (slowdown, projectile return).
    Completed,
}

impl AbilityPhase {
    /// Arming or Active.
    pub fn is_running(self) -> bool {
        matches!(self, AbilityPhase::Arming | AbilityPhase::Active)
    }

    /// Interrupted or Completed.
    pub fn is_ending(self) -> bool {
        matches!(self, AbilityPhase::Interrupted | AbilityPhase::Completed)
    }
}

/// What a second activation does while a run is in progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReentryPolicy {
    /// Ignore the request.
    #[default]
    Reject,
    /// End the current run immediately.
    Toggle,
}

/// Why a run left the Active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// Nominal duration elapsed.
    Expired,
    /// The policy finished its effect on its own (instant abilities, landed beacons).
    Resolved,
    /// Fire input resolved the effect early.
    Fired,
    /// Re-activated under a toggle policy.
    Toggled,
    /// Explicit cancel input.
    Cancelled,
    /// World geometry blocked the effect.
    Obstructed,
    /// A transient the run depended on vanished.
    Lost,
    /// Stopped by the driver (agent removed, engine reset).
    Forced,
}

impl EndReason {
    /// Whether this reason leads to Interrupted rather than Completed.
    pub fn is_interrupt(self) -> bool {
        matches!(
            self,
            EndReason::Cancelled | EndReason::Obstructed | EndReason::Lost | EndReason::Forced
        )
    }
}

/// Agent resources an ability can claim exclusively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OverrideKind {
    /// Authority to move or place the agent. Carries no restorable value.
    Transform,
    SpeedMultiplier,
    Gravity,
    FieldOfView,
    MovementController,
    Camera,
}

/// Which camera rig renders the agent's view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CameraRig {
    #[default]
    FirstPerson,
    /// Pulled-back rig used while charging.
    Charge,
}

/// Error category reported in events; mirrors `AbilityError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    ConfigurationMissing,
    PreconditionFailed,
    InvalidStateTransition,
    ResourceConflict,
}

/// Built-in ability loadouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadoutId {
    /// Deadeye + rewind.
    #[default]
    Gunslinger,
    /// Charge + boosters.
    Bruiser,
    /// Blink + throw-and-return blade.
    Skirmisher,
    /// Timed aura + translocator.
    Scout,
    /// Dash + rewind.
    Striker,
    /// Snow drone + rush path.
    Frostbite,
}

impl LoadoutId {
    pub const ALL: [LoadoutId; 6] = [
        LoadoutId::Gunslinger,
        LoadoutId::Bruiser,
        LoadoutId::Skirmisher,
        LoadoutId::Scout,
        LoadoutId::Striker,
        LoadoutId::Frostbite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LoadoutId::Gunslinger => "gunslinger",
            LoadoutId::Bruiser => "bruiser",
            LoadoutId::Skirmisher => "skirmisher",
            LoadoutId::Scout => "scout",
            LoadoutId::Striker => "striker",
            LoadoutId::Frostbite => "frostbite",
        }
    }

    pub fn from_name(name: &str) -> Option<LoadoutId> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }
}
