//! Charge: forward rush steered by strafe input that picks up the first
//! enemy in its path and carries it until something solid gets in the way.

use glam::{DQuat, DVec3};
use tracing::info;

use outrider_core::descriptor::ChargeTunables;
use outrider_core::enums::{CameraRig, EndReason, OverrideKind};
use outrider_core::events::AbilityEvent;
use outrider_core::types::{EntityId, ParamValue, Transform};
use outrider_core::world::deal_damage;

use super::{center, Policy};
use crate::fsm::{StepContext, Timing};

#[derive(Debug)]
pub struct ChargeRun {
    tunables: ChargeTunables,
    /// Facing at activation; the obstacle probe keeps using it.
    heading: DVec3,
    pinned: Option<EntityId>,
}

impl ChargeRun {
    pub fn new(tunables: ChargeTunables) -> Self {
        Self {
            tunables,
            heading: DVec3::Z,
            pinned: None,
        }
    }

    pub fn pinned(&self) -> Option<EntityId> {
        self.pinned
    }
}

impl Policy for ChargeRun {
    fn claims(&self) -> &'static [OverrideKind] {
        &[
            OverrideKind::Transform,
            OverrideKind::MovementController,
            OverrideKind::Camera,
        ]
    }

    fn needs_arming(&self) -> bool {
        true
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        if let Some(agent) = ctx.agent_transform() {
            self.heading = agent.flat_forward();
        }
        ctx.set_param(ParamValue::MovementController(false));
    }

    fn arm(&mut self, ctx: &mut StepContext<'_>) {
        ctx.set_param(ParamValue::Camera(CameraRig::Charge));
    }

    fn track(&mut self, ctx: &mut StepContext<'_>) {
        let Some(agent) = ctx.agent_transform() else {
            return;
        };
        let forward = agent.flat_forward();
        let hit = ctx.world.raycast(
            center(&agent),
            forward,
            self.tunables.probe_distance,
            self.tunables.enemy_mask,
        );
        let Some(hit) = hit else {
            self.pinned = None;
            return;
        };
        let Some(enemy) = ctx.world.transform(hit.hit) else {
            self.pinned = None;
            return;
        };

        let carry = agent.position + forward * self.tunables.pin_offset;
        ctx.world.set_transform(
            hit.hit,
            DVec3::new(carry.x, enemy.position.y, carry.z),
            enemy.orientation,
        );
        ctx.world.set_velocity(hit.hit, DVec3::ZERO);
        self.pinned = Some(hit.hit);
    }

    fn check(&mut self, ctx: &mut StepContext<'_>) -> Option<EndReason> {
        let Some(agent) = ctx.agent_transform() else {
            return Some(EndReason::Lost);
        };
        let t = &self.tunables;

        // A carried enemy hits the wall first and takes the impact.
        if let Some(enemy) = self.pinned {
            if let Some(enemy_t) = ctx.world.transform(enemy) {
                let blocked = ctx
                    .world
                    .raycast(enemy_t.position, agent.flat_forward(), t.probe_distance, t.obstacle_mask)
                    .is_some();
                if blocked {
                    if let Some(lethal) = deal_damage(&mut *ctx.world, enemy, t.collision_damage) {
                        info!(agent = ctx.agent.0, target = enemy.0, lethal, "charge_impact");
                        ctx.emit(AbilityEvent::DamageDealt {
                            agent: ctx.agent,
                            target: enemy,
                            amount: t.collision_damage,
                            lethal,
                        });
                    }
                    return Some(EndReason::Obstructed);
                }
            }
        }

        ctx.world
            .raycast(center(&agent), self.heading, t.probe_distance, t.obstacle_mask)
            .map(|_| EndReason::Obstructed)
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, _timing: Timing) -> Option<EndReason> {
        let Some(agent) = ctx.agent_transform() else {
            return Some(EndReason::Lost);
        };
        let t = &self.tunables;
        let strafe = ctx.input.move_axis.x.clamp(-1.0, 1.0);

        // Strafe input also steers.
        let orientation = DQuat::from_rotation_y(strafe * t.turn_rate * ctx.dt) * agent.orientation;
        ctx.world
            .set_transform(ctx.agent, agent.position, orientation);

        let turned = Transform::new(agent.position, orientation);
        let velocity = turned.flat_forward() * t.speed + turned.right() * strafe * t.strafe_speed;
        let mut delta = velocity * ctx.dt;
        if let Some(ground) = ctx.world.ground_height(agent.position + delta) {
            delta.y = ground - agent.position.y;
        }
        ctx.world.move_by(ctx.agent, delta);

        if let Some(enemy) = self.pinned {
            ctx.world.set_velocity(enemy, velocity);
        }
        None
    }

    fn on_end(&mut self, _reason: EndReason, ctx: &mut StepContext<'_>) {
        if let Some(enemy) = self.pinned.take() {
            ctx.world.set_velocity(enemy, DVec3::ZERO);
        }
    }
}
