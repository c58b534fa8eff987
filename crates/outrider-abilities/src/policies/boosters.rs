//! Boosters: sustained forward thrust with lifted gravity, easing back to
//! a stop over the slowdown window once the boost ends normally.

use outrider_core::descriptor::BoosterTunables;
use outrider_core::enums::{EndReason, OverrideKind};
use outrider_core::types::ParamValue;

use super::Policy;
use crate::fsm::{StepContext, Timing};

#[derive(Debug)]
pub struct BoosterRun {
    tunables: BoosterTunables,
    slowdown_elapsed: f64,
}

impl BoosterRun {
    pub fn new(tunables: BoosterTunables) -> Self {
        Self {
            tunables,
            slowdown_elapsed: 0.0,
        }
    }
}

impl Policy for BoosterRun {
    fn claims(&self) -> &'static [OverrideKind] {
        &[OverrideKind::Transform, OverrideKind::Gravity]
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        ctx.set_param(ParamValue::Gravity(self.tunables.gravity));
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, _timing: Timing) -> Option<EndReason> {
        let Some(agent) = ctx.agent_transform() else {
            return Some(EndReason::Lost);
        };
        ctx.world
            .move_by(ctx.agent, agent.forward() * self.tunables.speed * ctx.dt);
        None
    }

    fn wind_down(&mut self, ctx: &mut StepContext<'_>) -> bool {
        if self.tunables.slowdown_secs <= 0.0 {
            return true;
        }
        let Some(agent) = ctx.agent_transform() else {
            return true;
        };
        self.slowdown_elapsed += ctx.dt;
        let progress = (self.slowdown_elapsed / self.tunables.slowdown_secs).min(1.0);
        let speed = self.tunables.speed * (1.0 - progress);
        ctx.world
            .move_by(ctx.agent, agent.forward() * speed * ctx.dt);
        progress >= 1.0
    }
}
