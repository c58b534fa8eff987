//! Throw-and-return: a projectile flies out on activation and, once the
//! run ends normally, homes back to the thrower. A projectile that strikes
//! an enemy stays lodged in it until recalled, and the enemy is yanked
//! toward the thrower as the return starts.

use std::f64::consts::FRAC_PI_2;

use glam::{DQuat, DVec3};
use tracing::debug;

use outrider_core::descriptor::{AbilityDescriptor, ThrowTunables};
use outrider_core::enums::EndReason;
use outrider_core::error::AbilityError;
use outrider_core::events::AbilityEvent;
use outrider_core::types::{EntityId, LayerMask, PrefabRef};

use super::{center, missing, Policy};
use crate::fsm::{StepContext, Timing};

#[derive(Debug)]
pub struct ThrowRun {
    tunables: ThrowTunables,
    prefab: PrefabRef,
    projectile: Option<EntityId>,
    struck: Option<EntityId>,
    /// Projectile position relative to the struck enemy at impact.
    lodged_offset: DVec3,
    pulled: bool,
}

impl ThrowRun {
    pub fn prepare(
        descriptor: &AbilityDescriptor,
        tunables: &ThrowTunables,
    ) -> Result<Self, AbilityError> {
        let prefab = tunables
            .prefab
            .clone()
            .ok_or_else(|| missing(descriptor, "projectile prefab"))?;
        Ok(Self {
            tunables: tunables.clone(),
            prefab,
            projectile: None,
            struck: None,
            lodged_offset: DVec3::ZERO,
            pulled: false,
        })
    }

    pub fn projectile(&self) -> Option<EntityId> {
        self.projectile
    }
}

impl Policy for ThrowRun {
    fn start(&mut self, ctx: &mut StepContext<'_>) {
        let Some(eye) = ctx.eye() else {
            return;
        };
        let forward = eye.forward();
        let position = eye.position + forward * self.tunables.spawn_distance;
        // Blade model lies flat across the throw direction.
        let orientation = eye.orientation * DQuat::from_rotation_y(FRAC_PI_2);
        let projectile = ctx.world.spawn(&self.prefab, position, orientation);
        ctx.world
            .apply_impulse(projectile, forward * self.tunables.throw_force);
        ctx.emit(AbilityEvent::TransientSpawned {
            agent: ctx.agent,
            instance: projectile,
        });
        self.projectile = Some(projectile);
    }

    fn track(&mut self, ctx: &mut StepContext<'_>) {
        if self.struck.is_some() {
            return;
        }
        let Some(contact) = self.projectile.and_then(|p| ctx.world.contact(p)) else {
            return;
        };
        if let Some(other) = contact.other {
            if ctx.world.layer(other).contains(LayerMask::ENEMY) {
                debug!(agent = ctx.agent.0, target = other.0, "projectile_struck");
                let anchor = ctx.world.transform(other).map(|t| t.position);
                let blade = self.projectile.and_then(|p| ctx.world.transform(p));
                if let (Some(anchor), Some(blade)) = (anchor, blade) {
                    self.lodged_offset = blade.position - anchor;
                }
                self.struck = Some(other);
            }
        }
    }

    fn check(&mut self, ctx: &mut StepContext<'_>) -> Option<EndReason> {
        match self.projectile {
            Some(p) if ctx.world.transform(p).is_some() => None,
            _ => Some(EndReason::Lost),
        }
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, _timing: Timing) -> Option<EndReason> {
        // A lodged projectile rides along with its enemy.
        let (Some(p), Some(enemy)) = (self.projectile, self.struck) else {
            return None;
        };
        let (Some(blade), Some(anchor)) = (ctx.world.transform(p), ctx.world.transform(enemy)) else {
            return None;
        };
        ctx.world
            .set_transform(p, anchor.position + self.lodged_offset, blade.orientation);
        ctx.world.set_velocity(p, DVec3::ZERO);
        None
    }

    fn on_end(&mut self, reason: EndReason, ctx: &mut StepContext<'_>) {
        if reason.is_interrupt() {
            if let Some(p) = self.projectile.take() {
                ctx.world.destroy(p);
            }
        }
    }

    fn wind_down(&mut self, ctx: &mut StepContext<'_>) -> bool {
        let Some(p) = self.projectile else {
            return true;
        };
        let (Some(blade), Some(agent)) = (ctx.world.transform(p), ctx.agent_transform()) else {
            self.projectile = None;
            return true;
        };
        let home = center(&agent);

        if !self.pulled {
            self.pulled = true;
            if let Some(enemy) = self.struck {
                if let Some(enemy_t) = ctx.world.transform(enemy) {
                    let toward = (home - enemy_t.position).try_normalize().unwrap_or(DVec3::ZERO);
                    ctx.world.set_velocity(enemy, DVec3::ZERO);
                    ctx.world.apply_impulse(
                        enemy,
                        toward * self.tunables.pull_force + DVec3::Y * self.tunables.vertical_lift,
                    );
                }
            }
        }

        ctx.world.set_velocity(p, DVec3::ZERO);
        let to_home = home - blade.position;
        let distance = to_home.length();
        let travel = (self.tunables.return_speed * ctx.dt).min(distance);
        if distance - travel <= self.tunables.catch_radius {
            ctx.world.destroy(p);
            self.projectile = None;
            return true;
        }
        ctx.world
            .set_transform(p, blade.position + to_home / distance * travel, blade.orientation);
        false
    }
}
