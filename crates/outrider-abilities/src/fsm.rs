//! Ability lifecycle state machine.
//!
//! One `AbilityRun` exists per activation and lives in its slot until the
//! run is back at Idle. The machine is driven one step per frame; all state
//! that would survive a yield lives in the run and its policy.
//!
//! Per Active step the order is fixed: targeting, then interrupt checks,
//! then fire resolution, then movement and effects. A target found this
//! step is therefore visible to this step's effects.

use std::sync::Arc;

use glam::DVec3;
use tracing::debug;

use outrider_core::constants::AGENT_EYE_HEIGHT;
use outrider_core::descriptor::AbilityDescriptor;
use outrider_core::enums::{AbilityPhase, EndReason, ReentryPolicy};
use outrider_core::error::AbilityError;
use outrider_core::events::AbilityEvent;
use outrider_core::types::{AgentInput, EntityId, ParamValue, Transform};
use outrider_core::world::AbilityWorld;

use crate::clock::EffectClock;
use crate::overrides::OverrideLedger;
use crate::policies::PolicyState;
use crate::rewind::RewindBuffer;
use crate::targeting::TargetTracker;

/// Everything the driver supplies for one agent's frame.
pub struct AgentEnv<'a> {
    pub agent: EntityId,
    pub clock: &'a EffectClock,
    pub input: AgentInput,
    pub world: &'a mut dyn AbilityWorld,
    pub rewind: Option<&'a mut RewindBuffer>,
    pub events: &'a mut Vec<AbilityEvent>,
}

/// What a policy sees while it runs.
pub struct StepContext<'a> {
    pub agent: EntityId,
    pub slot: usize,
    /// Seconds this step covers, clamped to what is left of the Active phase.
    pub dt: f64,
    pub clock: &'a EffectClock,
    pub input: AgentInput,
    pub world: &'a mut dyn AbilityWorld,
    pub overrides: &'a mut OverrideLedger,
    pub rewind: Option<&'a mut RewindBuffer>,
    pub events: &'a mut Vec<AbilityEvent>,
}

impl<'a> StepContext<'a> {
    pub fn new(env: &'a mut AgentEnv<'_>, overrides: &'a mut OverrideLedger, slot: usize) -> Self {
        Self {
            agent: env.agent,
            slot,
            dt: env.clock.delta(),
            clock: env.clock,
            input: env.input,
            world: &mut *env.world,
            overrides,
            rewind: env.rewind.as_deref_mut(),
            events: &mut *env.events,
        }
    }

    pub fn agent_transform(&self) -> Option<Transform> {
        self.world.transform(self.agent)
    }

    /// Camera transform: agent orientation at eye height.
    pub fn eye(&self) -> Option<Transform> {
        self.agent_transform().map(|t| Transform {
            position: t.position + DVec3::Y * AGENT_EYE_HEIGHT,
            orientation: t.orientation,
        })
    }

    pub fn set_param(&mut self, value: ParamValue) {
        self.world.set_param(self.agent, value);
    }

    pub fn emit(&mut self, event: AbilityEvent) {
        self.events.push(event);
    }
}

/// Progress through the Active phase, handed to `apply`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    pub elapsed: f64,
    pub duration: Option<f64>,
}

impl Timing {
    /// Fraction of the Active phase still ahead, in [0, 1].
    pub fn remaining_fraction(&self) -> Option<f64> {
        self.duration.map(|d| {
            if d > 0.0 {
                ((d - self.elapsed) / d).clamp(0.0, 1.0)
            } else {
                0.0
            }
        })
    }
}

#[derive(Debug)]
pub struct AbilityRun {
    descriptor: Arc<AbilityDescriptor>,
    phase: AbilityPhase,
    elapsed: f64,
    end_reason: Option<EndReason>,
    fire_requested: bool,
    cancel_requested: bool,
    policy: PolicyState,
}

impl AbilityRun {
    /// Start a run: configuration and precondition checks, then the
    /// all-or-nothing override claim, then side effects. Any error leaves
    /// the agent untouched.
    pub fn begin(
        descriptor: Arc<AbilityDescriptor>,
        ctx: &mut StepContext<'_>,
    ) -> Result<Self, AbilityError> {
        let mut policy = PolicyState::prepare(&descriptor, ctx)?;

        let params =
            ctx.world
                .params(ctx.agent)
                .ok_or_else(|| AbilityError::PreconditionFailed {
                    ability: descriptor.name.clone(),
                    reason: "agent has no movement parameters",
                })?;
        ctx.overrides
            .claim_all(ctx.slot, policy.get().claims(), &params)
            .map_err(|conflict| AbilityError::ResourceConflict {
                ability: descriptor.name.clone(),
                kind: conflict.kind,
                holder: conflict.holder,
            })?;

        policy.get_mut().start(ctx);
        let phase = if policy.get().needs_arming() {
            AbilityPhase::Arming
        } else {
            AbilityPhase::Active
        };
        debug!(
            agent = ctx.agent.0,
            slot = ctx.slot,
            ability = %descriptor.name,
            ?phase,
            "ability_started"
        );

        Ok(Self {
            descriptor,
            phase,
            elapsed: 0.0,
            end_reason: None,
            fire_requested: false,
            cancel_requested: false,
            policy,
        })
    }

    /// Advance the run by one frame.
    pub fn step(&mut self, ctx: &mut StepContext<'_>) {
        ctx.dt = ctx.clock.delta();
        match self.phase {
            AbilityPhase::Idle => {}
            AbilityPhase::Arming => {
                if self.cancel_requested {
                    self.finish(EndReason::Cancelled, ctx);
                    return;
                }
                self.policy.get_mut().arm(ctx);
                self.phase = AbilityPhase::Active;
            }
            AbilityPhase::Active => self.step_active(ctx),
            AbilityPhase::Completed => {
                if self.policy.get_mut().wind_down(ctx) {
                    self.teardown(ctx);
                }
            }
            AbilityPhase::Interrupted => self.teardown(ctx),
        }
    }

    fn step_active(&mut self, ctx: &mut StepContext<'_>) {
        if self.cancel_requested {
            self.finish(EndReason::Cancelled, ctx);
            return;
        }

        let duration = self.descriptor.duration_secs;
        let remaining = duration.map(|d| (d - self.elapsed).max(0.0));
        let last_frame = remaining.is_some_and(|r| ctx.dt >= r);
        if let (true, Some(r)) = (last_frame, remaining) {
            ctx.dt = r;
        }

        // 1. Targeting
        self.policy.get_mut().track(ctx);

        // 2. Interrupt checks
        if let Some(reason) = self.policy.get_mut().check(ctx) {
            self.finish(reason, ctx);
            return;
        }

        // Early resolution on fire input
        if std::mem::take(&mut self.fire_requested) && self.policy.get().resolves_on_fire() {
            self.policy.get_mut().resolve(ctx);
            self.finish(EndReason::Fired, ctx);
            return;
        }

        // 3. Movement and effects
        let timing = Timing {
            elapsed: self.elapsed,
            duration,
        };
        if let Some(reason) = self.policy.get_mut().apply(ctx, timing) {
            self.finish(reason, ctx);
            return;
        }

        self.elapsed += ctx.dt;
        if last_frame {
            self.finish(EndReason::Expired, ctx);
        }
    }

    /// Activation while a run exists. Toggle policies end the run now;
    /// everything else is refused.
    pub fn reenter(&mut self, ctx: &mut StepContext<'_>) -> Result<(), AbilityError> {
        if self.phase.is_running() && self.descriptor.reentry() == ReentryPolicy::Toggle {
            self.finish(EndReason::Toggled, ctx);
            return Ok(());
        }
        Err(AbilityError::InvalidStateTransition {
            ability: self.descriptor.name.clone(),
            phase: phase_label(self.phase),
        })
    }

    /// End the run immediately, whatever phase it is in.
    pub fn force_interrupt(&mut self, ctx: &mut StepContext<'_>) {
        match self.phase {
            AbilityPhase::Idle => {}
            AbilityPhase::Arming | AbilityPhase::Active => {
                self.finish(EndReason::Forced, ctx);
                self.teardown(ctx);
            }
            AbilityPhase::Completed | AbilityPhase::Interrupted => {
                self.policy.get_mut().on_end(EndReason::Forced, ctx);
                self.teardown(ctx);
            }
        }
    }

    /// Queue fire input for the next Active step.
    pub fn request_fire(&mut self) -> bool {
        if self.phase.is_running() {
            self.fire_requested = true;
        }
        self.fire_requested
    }

    /// Queue a cancel for the next step.
    pub fn request_cancel(&mut self) -> bool {
        if self.phase.is_running() {
            self.cancel_requested = true;
        }
        self.cancel_requested
    }

    /// Leave Active: restore parameter overrides, then let the policy clean up.
    fn finish(&mut self, reason: EndReason, ctx: &mut StepContext<'_>) {
        self.end_reason = Some(reason);
        self.phase = if reason.is_interrupt() {
            AbilityPhase::Interrupted
        } else {
            AbilityPhase::Completed
        };
        self.fire_requested = false;
        self.cancel_requested = false;

        for value in ctx.overrides.restore_parameters(ctx.slot) {
            ctx.set_param(value);
        }
        self.policy.get_mut().on_end(reason, ctx);

        debug!(
            agent = ctx.agent.0,
            slot = ctx.slot,
            ability = %self.descriptor.name,
            ?reason,
            elapsed = self.elapsed,
            "ability_ended"
        );
        ctx.emit(AbilityEvent::AbilityEnded {
            agent: ctx.agent,
            slot: ctx.slot,
            ability: self.descriptor.name.clone(),
            reason,
        });
    }

    fn teardown(&mut self, ctx: &mut StepContext<'_>) {
        for value in ctx.overrides.release(ctx.slot) {
            ctx.set_param(value);
        }
        self.phase = AbilityPhase::Idle;
    }

    pub fn descriptor(&self) -> &Arc<AbilityDescriptor> {
        &self.descriptor
    }

    pub fn phase(&self) -> AbilityPhase {
        self.phase
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Seconds left in Active; None when unbounded or no longer Active.
    pub fn remaining(&self) -> Option<f64> {
        if !self.phase.is_running() {
            return None;
        }
        self.descriptor
            .duration_secs
            .map(|d| (d - self.elapsed).max(0.0))
    }

    pub fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    pub fn tracker(&self) -> Option<&TargetTracker> {
        self.policy.get().tracker()
    }

    pub fn policy(&self) -> &PolicyState {
        &self.policy
    }
}

fn phase_label(phase: AbilityPhase) -> &'static str {
    match phase {
        AbilityPhase::Idle => "idle",
        AbilityPhase::Arming => "arming",
        AbilityPhase::Active => "active",
        AbilityPhase::Interrupted => "interrupted",
        AbilityPhase::Completed => "winding down",
    }
}
