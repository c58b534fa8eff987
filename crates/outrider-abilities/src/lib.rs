//! Ability orchestration for OUTRIDER.
//!
//! Implements the ability lifecycle state machine and its policies,
//! per-agent slot scheduling with exclusive override claims, target
//! lock-on with phased damage, and the rewind history buffer.
//! No ECS dependency: everything talks to the world through the
//! collaborator traits in `outrider_core::world`.

pub mod clock;
pub mod damage;
pub mod fsm;
pub mod overrides;
pub mod policies;
pub mod rewind;
pub mod scheduler;
pub mod targeting;

pub use outrider_core as core;

pub use clock::EffectClock;
pub use fsm::{AbilityRun, AgentEnv, StepContext};
pub use rewind::{RewindBuffer, Snapshot};
pub use scheduler::{AbilityScheduler, ActivationOutcome};
