//! Snow drone: thrown like a grenade, it climbs straight up from where it
//! lands and then holds a slow zone on the landing spot. Enemies inside
//! the zone move at a fraction of their speed until they leave it or the
//! zone goes away.

use std::collections::BTreeSet;

use glam::{DQuat, DVec3};
use tracing::{debug, info};

use outrider_core::descriptor::{AbilityDescriptor, DroneTunables};
use outrider_core::enums::EndReason;
use outrider_core::error::AbilityError;
use outrider_core::events::AbilityEvent;
use outrider_core::types::{EntityId, PrefabRef};

use super::{missing, Policy};
use crate::fsm::{StepContext, Timing};

/// Where the drone is in its flight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DroneStage {
    Flying,
    Rising { landed_at: DVec3, secs: f64 },
    Holding { landed_at: DVec3, secs: f64 },
}

#[derive(Debug)]
pub struct DroneRun {
    tunables: DroneTunables,
    prefab: PrefabRef,
    drone: Option<EntityId>,
    zone: Option<EntityId>,
    stage: DroneStage,
    slowed: BTreeSet<EntityId>,
}

impl DroneRun {
    pub fn prepare(
        descriptor: &AbilityDescriptor,
        tunables: &DroneTunables,
    ) -> Result<Self, AbilityError> {
        let prefab = tunables
            .prefab
            .clone()
            .ok_or_else(|| missing(descriptor, "drone prefab"))?;
        if tunables.zone_radius.is_nan() || tunables.zone_radius <= 0.0 {
            return Err(missing(descriptor, "slow zone radius"));
        }
        Ok(Self {
            tunables: tunables.clone(),
            prefab,
            drone: None,
            zone: None,
            stage: DroneStage::Flying,
            slowed: BTreeSet::new(),
        })
    }

    pub fn stage(&self) -> DroneStage {
        self.stage
    }

    pub fn slowed(&self) -> &BTreeSet<EntityId> {
        &self.slowed
    }

    fn open_zone(&mut self, ctx: &mut StepContext<'_>, landed_at: DVec3) {
        if let Some(prefab) = &self.tunables.zone_prefab {
            let zone = ctx.world.spawn(prefab, landed_at, DQuat::IDENTITY);
            ctx.emit(AbilityEvent::TransientSpawned {
                agent: ctx.agent,
                instance: zone,
            });
            self.zone = Some(zone);
        }
        info!(
            agent = ctx.agent.0,
            x = landed_at.x,
            z = landed_at.z,
            radius = self.tunables.zone_radius,
            "slow_zone_opened"
        );
    }

    /// Slow enemies that walked in, release the ones that walked out.
    fn refresh_zone(&mut self, ctx: &mut StepContext<'_>, landed_at: DVec3) {
        let inside =
            ctx.world
                .overlap_sphere(landed_at, self.tunables.zone_radius, self.tunables.enemy_mask);
        for left in self.slowed.difference(&inside) {
            ctx.world.set_speed_scale(*left, 1.0);
            debug!(agent = ctx.agent.0, target = left.0, "slow_released");
        }
        for entered in inside.difference(&self.slowed) {
            ctx.world.set_speed_scale(*entered, self.tunables.slow_factor);
            debug!(agent = ctx.agent.0, target = entered.0, "slow_applied");
        }
        self.slowed = inside;
    }
}

impl Policy for DroneRun {
    fn start(&mut self, ctx: &mut StepContext<'_>) {
        let Some(eye) = ctx.eye() else {
            return;
        };
        let forward = eye.forward();
        let drone = ctx.world.spawn(
            &self.prefab,
            eye.position + forward * self.tunables.spawn_distance,
            eye.orientation,
        );
        ctx.world
            .apply_impulse(drone, forward * self.tunables.throw_force);
        ctx.emit(AbilityEvent::TransientSpawned {
            agent: ctx.agent,
            instance: drone,
        });
        self.drone = Some(drone);
    }

    fn check(&mut self, ctx: &mut StepContext<'_>) -> Option<EndReason> {
        match self.drone {
            Some(d) if ctx.world.transform(d).is_some() => None,
            _ => Some(EndReason::Lost),
        }
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, _timing: Timing) -> Option<EndReason> {
        let drone = self.drone?;
        let current = ctx.world.transform(drone)?;
        match self.stage {
            DroneStage::Flying => {
                if let Some(contact) = ctx.world.contact(drone) {
                    ctx.world.set_velocity(drone, DVec3::ZERO);
                    ctx.world
                        .set_transform(drone, contact.point, current.orientation);
                    debug!(agent = ctx.agent.0, instance = drone.0, "drone_landed");
                    self.stage = DroneStage::Rising {
                        landed_at: contact.point,
                        secs: 0.0,
                    };
                }
            }
            DroneStage::Rising { landed_at, secs } => {
                let rise_secs = self.tunables.rise_secs();
                let secs = secs + ctx.dt;
                let progress = if rise_secs > 0.0 {
                    (secs / rise_secs).min(1.0)
                } else {
                    1.0
                };
                let height = self.tunables.rise_height.max(0.0) * progress;
                ctx.world
                    .set_transform(drone, landed_at + DVec3::Y * height, current.orientation);
                if progress >= 1.0 {
                    self.open_zone(ctx, landed_at);
                    self.refresh_zone(ctx, landed_at);
                    self.stage = DroneStage::Holding { landed_at, secs: 0.0 };
                } else {
                    self.stage = DroneStage::Rising { landed_at, secs };
                }
            }
            DroneStage::Holding { landed_at, secs } => {
                self.refresh_zone(ctx, landed_at);
                let secs = secs + ctx.dt;
                self.stage = DroneStage::Holding { landed_at, secs };
                if secs >= self.tunables.linger_secs {
                    return Some(EndReason::Resolved);
                }
            }
        }
        None
    }

    fn on_end(&mut self, _reason: EndReason, ctx: &mut StepContext<'_>) {
        for enemy in std::mem::take(&mut self.slowed) {
            ctx.world.set_speed_scale(enemy, 1.0);
        }
        if let Some(zone) = self.zone.take() {
            ctx.world.destroy(zone);
        }
        if let Some(drone) = self.drone.take() {
            ctx.world.destroy(drone);
        }
    }
}
