//! Ability policies: the behaviour plugged into the lifecycle machine.
//!
//! The machine owns timing, phases and override bookkeeping. A policy only
//! answers hooks: what it claims, what it does at start, per step and at
//! the end. Every hook has a no-op default so a policy implements only the
//! parts it cares about.

mod aura;
mod blink;
mod boosters;
mod charge;
mod dash;
mod deadeye;
mod drone;
mod rewind;
mod rush_path;
mod throw_return;
mod translocator;

use glam::DVec3;

use outrider_core::constants::AGENT_CENTER_HEIGHT;
use outrider_core::descriptor::{AbilityDescriptor, AbilityKind};
use outrider_core::enums::{EndReason, OverrideKind};
use outrider_core::error::AbilityError;
use outrider_core::types::Transform;

use crate::fsm::{StepContext, Timing};
use crate::targeting::TargetTracker;

pub use aura::AuraRun;
pub use blink::{blink_destination, BlinkRun};
pub use boosters::BoosterRun;
pub use charge::ChargeRun;
pub use dash::DashRun;
pub use deadeye::DeadeyeRun;
pub use drone::{DroneRun, DroneStage};
pub use rewind::RewindRun;
pub use rush_path::RushPathRun;
pub use throw_return::ThrowRun;
pub use translocator::TranslocatorRun;

/// Lifecycle hooks. Called only by `AbilityRun`.
pub(crate) trait Policy {
    /// Overrides claimed atomically before `start`.
    fn claims(&self) -> &'static [OverrideKind] {
        &[]
    }

    /// Whether one Arming step precedes Active.
    fn needs_arming(&self) -> bool {
        false
    }

    /// Side effects at activation, after claims succeeded.
    fn start(&mut self, _ctx: &mut StepContext<'_>) {}

    /// The single Arming step.
    fn arm(&mut self, _ctx: &mut StepContext<'_>) {}

    /// Target acquisition, first thing each Active step.
    fn track(&mut self, _ctx: &mut StepContext<'_>) {}

    /// Interrupt conditions, after targeting.
    fn check(&mut self, _ctx: &mut StepContext<'_>) -> Option<EndReason> {
        None
    }

    /// Whether fire input ends the run with `resolve`.
    fn resolves_on_fire(&self) -> bool {
        false
    }

    fn resolve(&mut self, _ctx: &mut StepContext<'_>) {}

    /// Movement and effects. Returning a reason ends the run this step.
    fn apply(&mut self, _ctx: &mut StepContext<'_>, _timing: Timing) -> Option<EndReason> {
        None
    }

    /// Cleanup when leaving Active, and again with `Forced` if a wind-down
    /// is cut short.
    fn on_end(&mut self, _reason: EndReason, _ctx: &mut StepContext<'_>) {}

    /// One Completed step. True once the run can go back to Idle.
    fn wind_down(&mut self, _ctx: &mut StepContext<'_>) -> bool {
        true
    }

    fn tracker(&self) -> Option<&TargetTracker> {
        None
    }
}

/// Per-run policy state, one variant per ability kind.
#[derive(Debug)]
pub enum PolicyState {
    Blink(BlinkRun),
    Charge(ChargeRun),
    Dash(DashRun),
    Boosters(BoosterRun),
    ThrowAndReturn(ThrowRun),
    Deadeye(DeadeyeRun),
    TimedAura(AuraRun),
    Translocator(TranslocatorRun),
    Rewind(RewindRun),
    Drone(DroneRun),
    RushPath(RushPathRun),
}

impl PolicyState {
    /// Validate configuration and preconditions and build fresh run state.
    /// Has no side effects on the world.
    pub fn prepare(
        descriptor: &AbilityDescriptor,
        ctx: &StepContext<'_>,
    ) -> Result<Self, AbilityError> {
        Ok(match &descriptor.kind {
            AbilityKind::Blink(t) => PolicyState::Blink(BlinkRun::new(t.clone())),
            AbilityKind::Charge(t) => PolicyState::Charge(ChargeRun::new(t.clone())),
            AbilityKind::Dash(t) => PolicyState::Dash(DashRun::prepare(descriptor, t)?),
            AbilityKind::Boosters(t) => PolicyState::Boosters(BoosterRun::new(t.clone())),
            AbilityKind::ThrowAndReturn(t) => {
                PolicyState::ThrowAndReturn(ThrowRun::prepare(descriptor, t)?)
            }
            AbilityKind::Deadeye(t) => PolicyState::Deadeye(DeadeyeRun::prepare(descriptor, t)?),
            AbilityKind::TimedAura(t) => PolicyState::TimedAura(AuraRun::prepare(descriptor, t)?),
            AbilityKind::Translocator(t) => {
                PolicyState::Translocator(TranslocatorRun::prepare(descriptor, t)?)
            }
            AbilityKind::Rewind => PolicyState::Rewind(RewindRun::prepare(descriptor, ctx)?),
            AbilityKind::Drone(t) => PolicyState::Drone(DroneRun::prepare(descriptor, t)?),
            AbilityKind::RushPath(t) => {
                PolicyState::RushPath(RushPathRun::prepare(descriptor, t, ctx)?)
            }
        })
    }

    pub(crate) fn get(&self) -> &dyn Policy {
        match self {
            PolicyState::Blink(p) => p,
            PolicyState::Charge(p) => p,
            PolicyState::Dash(p) => p,
            PolicyState::Boosters(p) => p,
            PolicyState::ThrowAndReturn(p) => p,
            PolicyState::Deadeye(p) => p,
            PolicyState::TimedAura(p) => p,
            PolicyState::Translocator(p) => p,
            PolicyState::Rewind(p) => p,
            PolicyState::Drone(p) => p,
            PolicyState::RushPath(p) => p,
        }
    }

    pub(crate) fn get_mut(&mut self) -> &mut dyn Policy {
        match self {
            PolicyState::Blink(p) => p,
            PolicyState::Charge(p) => p,
            PolicyState::Dash(p) => p,
            PolicyState::Boosters(p) => p,
            PolicyState::ThrowAndReturn(p) => p,
            PolicyState::Deadeye(p) => p,
            PolicyState::TimedAura(p) => p,
            PolicyState::Translocator(p) => p,
            PolicyState::Rewind(p) => p,
            PolicyState::Drone(p) => p,
            PolicyState::RushPath(p) => p,
        }
    }
}

fn missing(descriptor: &AbilityDescriptor, what: &'static str) -> AbilityError {
    AbilityError::ConfigurationMissing {
        ability: descriptor.name.clone(),
        what,
    }
}

fn precondition(descriptor: &AbilityDescriptor, reason: &'static str) -> AbilityError {
    AbilityError::PreconditionFailed {
        ability: descriptor.name.clone(),
        reason,
    }
}

/// Nominal duration, required to be positive.
fn positive_duration(
    descriptor: &AbilityDescriptor,
    what: &'static str,
) -> Result<f64, AbilityError> {
    match descriptor.duration_secs {
        Some(d) if d > 0.0 && d.is_finite() => Ok(d),
        _ => Err(missing(descriptor, what)),
    }
}

/// Body center of an agent standing at `t`.
fn center(t: &Transform) -> DVec3 {
    t.position + DVec3::Y * AGENT_CENTER_HEIGHT
}
