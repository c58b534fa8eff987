//! Rush path: a strip of floor grows out ahead of the agent and speeds the
//! agent up while it stands on the strip. Growth stops at the first
//! obstacle or drop; the strip disappears when the run ends.

use glam::{DQuat, DVec3};
use tracing::{debug, info};

use outrider_core::constants::{AGENT_CENTER_HEIGHT, RUSH_OBSTACLE_CLEARANCE};
use outrider_core::descriptor::{AbilityDescriptor, RushPathTunables};
use outrider_core::enums::{EndReason, OverrideKind};
use outrider_core::error::AbilityError;
use outrider_core::events::AbilityEvent;
use outrider_core::types::{EntityId, LayerMask, ParamValue, PrefabRef};
use outrider_core::world::AbilityWorld;

use super::{missing, positive_duration, precondition, Policy};
use crate::fsm::{StepContext, Timing};

#[derive(Debug)]
pub struct RushPathRun {
    tunables: RushPathTunables,
    prefab: PrefabRef,
    /// Floor point under the near end of the path.
    origin: DVec3,
    direction: DVec3,
    orientation: DQuat,
    length: f64,
    growing: bool,
    path: Option<EntityId>,
    base_speed: f64,
    boosted: bool,
}

/// Floor point below `point`, if one is close enough to stand on.
fn floor_below(world: &dyn AbilityWorld, point: DVec3, reach: f64) -> Option<DVec3> {
    world
        .raycast(
            point + DVec3::Y * AGENT_CENTER_HEIGHT,
            DVec3::NEG_Y,
            AGENT_CENTER_HEIGHT + reach,
            LayerMask::GROUND,
        )
        .map(|hit| hit.point)
}

impl RushPathRun {
    /// Needs floor under the spawn point. Nothing is spawned if there is none.
    pub fn prepare(
        descriptor: &AbilityDescriptor,
        tunables: &RushPathTunables,
        ctx: &StepContext<'_>,
    ) -> Result<Self, AbilityError> {
        let prefab = tunables
            .prefab
            .clone()
            .ok_or_else(|| missing(descriptor, "path prefab"))?;
        positive_duration(descriptor, "path lifetime")?;
        if tunables.growth_secs.is_nan() || tunables.growth_secs <= 0.0 {
            return Err(missing(descriptor, "path growth time"));
        }
        let agent = ctx
            .agent_transform()
            .ok_or_else(|| precondition(descriptor, "agent has no transform"))?;

        let direction = agent.flat_forward();
        let spawn = agent.position + direction * tunables.spawn_distance;
        let origin = floor_below(&*ctx.world, spawn, tunables.height_threshold)
            .ok_or_else(|| precondition(descriptor, "no floor under the path"))?;

        Ok(Self {
            tunables: tunables.clone(),
            prefab,
            origin,
            direction,
            orientation: DQuat::from_rotation_y(direction.x.atan2(direction.z)),
            length: 0.0,
            growing: true,
            path: None,
            base_speed: 1.0,
            boosted: false,
        })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn is_growing(&self) -> bool {
        self.growing
    }

    /// Whether a point at foot level lies on the strip.
    pub fn covers(&self, feet: DVec3) -> bool {
        let rel = feet - self.origin;
        let along = rel.dot(self.direction);
        let across = rel.dot(self.orientation * DVec3::X);
        (0.0..=self.length).contains(&along)
            && across.abs() <= self.tunables.width / 2.0
            && rel.y.abs() <= self.tunables.height_threshold
    }

    /// Extend the far end by one step unless something is in the way.
    fn grow(&mut self, ctx: &mut StepContext<'_>) {
        let t = &self.tunables;
        let step = (t.max_length / t.growth_secs * ctx.dt).min(t.max_length - self.length);
        if step <= 0.0 {
            self.growing = false;
            return;
        }
        let front = self.origin + self.direction * self.length;
        let blocked = ctx
            .world
            .raycast(
                front + DVec3::Y * AGENT_CENTER_HEIGHT,
                self.direction,
                step + RUSH_OBSTACLE_CLEARANCE,
                t.obstacle_mask,
            )
            .is_some();
        let next = front + self.direction * step;
        let floored = floor_below(&*ctx.world, next, t.height_threshold)
            .is_some_and(|floor| (next.y - floor.y).abs() <= t.height_threshold);
        if blocked || !floored {
            debug!(agent = ctx.agent.0, length = self.length, blocked, "path_growth_stopped");
            self.growing = false;
            return;
        }

        self.length += step;
        if self.length >= t.max_length {
            self.growing = false;
        }
        if let Some(path) = self.path {
            let middle = self.origin + self.direction * (self.length / 2.0);
            ctx.world.set_transform(path, middle, self.orientation);
        }
    }
}

impl Policy for RushPathRun {
    fn claims(&self) -> &'static [OverrideKind] {
        &[OverrideKind::SpeedMultiplier]
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        if let Some(params) = ctx.world.params(ctx.agent) {
            self.base_speed = params.speed_multiplier;
        }
        let path = ctx.world.spawn(&self.prefab, self.origin, self.orientation);
        ctx.emit(AbilityEvent::TransientSpawned {
            agent: ctx.agent,
            instance: path,
        });
        self.path = Some(path);
        info!(
            agent = ctx.agent.0,
            x = self.origin.x,
            z = self.origin.z,
            "rush_path_started"
        );
    }

    fn check(&mut self, ctx: &mut StepContext<'_>) -> Option<EndReason> {
        match self.path {
            Some(p) if ctx.world.transform(p).is_some() => None,
            _ => Some(EndReason::Lost),
        }
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, _timing: Timing) -> Option<EndReason> {
        if self.growing {
            self.grow(ctx);
        }

        let on_path = ctx
            .agent_transform()
            .is_some_and(|agent| self.covers(agent.position));
        if on_path != self.boosted {
            let multiplier = if on_path {
                self.tunables.speed_multiplier
            } else {
                self.base_speed
            };
            ctx.set_param(ParamValue::SpeedMultiplier(multiplier));
            debug!(agent = ctx.agent.0, on_path, multiplier, "rush_speed_changed");
            self.boosted = on_path;
        }
        None
    }

    fn on_end(&mut self, _reason: EndReason, ctx: &mut StepContext<'_>) {
        self.boosted = false;
        if let Some(path) = self.path.take() {
            ctx.world.destroy(path);
        }
    }
}
