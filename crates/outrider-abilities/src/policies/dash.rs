//! Dash: fixed-distance burst along facing over the nominal duration,
//! with gravity suspended.

use outrider_core::descriptor::{AbilityDescriptor, DashTunables};
use outrider_core::enums::{EndReason, OverrideKind};
use outrider_core::error::AbilityError;
use outrider_core::types::ParamValue;

use super::{positive_duration, Policy};
use crate::fsm::{StepContext, Timing};

#[derive(Debug)]
pub struct DashRun {
    /// Distance per second.
    speed: f64,
}

impl DashRun {
    pub fn prepare(
        descriptor: &AbilityDescriptor,
        tunables: &DashTunables,
    ) -> Result<Self, AbilityError> {
        let duration = positive_duration(descriptor, "dash duration")?;
        Ok(Self {
            speed: tunables.distance / duration,
        })
    }
}

impl Policy for DashRun {
    fn claims(&self) -> &'static [OverrideKind] {
        &[OverrideKind::Transform, OverrideKind::Gravity]
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        ctx.set_param(ParamValue::Gravity(0.0));
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, _timing: Timing) -> Option<EndReason> {
        let Some(agent) = ctx.agent_transform() else {
            return Some(EndReason::Lost);
        };
        ctx.world
            .move_by(ctx.agent, agent.forward() * self.speed * ctx.dt);
        None
    }
}
