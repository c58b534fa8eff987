//! Translocator: throw a beacon, then teleport to it when it lands or the
//! timeout runs out.

use tracing::{debug, warn};

use outrider_core::descriptor::{AbilityDescriptor, TranslocatorTunables};
use outrider_core::enums::{EndReason, OverrideKind};
use outrider_core::error::AbilityError;
use outrider_core::events::AbilityEvent;
use outrider_core::types::{EntityId, ParamValue, PrefabRef};

use super::{missing, Policy};
use crate::fsm::{StepContext, Timing};

#[derive(Debug)]
pub struct TranslocatorRun {
    tunables: TranslocatorTunables,
    prefab: PrefabRef,
    beacon: Option<EntityId>,
}

impl TranslocatorRun {
    pub fn prepare(
        descriptor: &AbilityDescriptor,
        tunables: &TranslocatorTunables,
    ) -> Result<Self, AbilityError> {
        let prefab = tunables
            .prefab
            .clone()
            .ok_or_else(|| missing(descriptor, "beacon prefab"))?;
        Ok(Self {
            tunables: tunables.clone(),
            prefab,
            beacon: None,
        })
    }

    pub fn beacon(&self) -> Option<EntityId> {
        self.beacon
    }

    /// Move the agent onto the beacon. Skipped while another slot holds the
    /// agent's transform.
    fn teleport(&self, ctx: &mut StepContext<'_>) {
        let Some(beacon) = self.beacon.and_then(|b| ctx.world.transform(b)) else {
            return;
        };
        let Some(agent) = ctx.agent_transform() else {
            return;
        };
        if let Some(holder) = ctx.overrides.holder(OverrideKind::Transform) {
            if holder != ctx.slot {
                warn!(agent = ctx.agent.0, slot = ctx.slot, holder, "translocator_blocked");
                return;
            }
        }

        let mut destination = beacon.position;
        if let Some(ground) = ctx.world.ground_height(destination) {
            destination.y = destination.y.max(ground);
        }
        let controller = ctx
            .world
            .params(ctx.agent)
            .map_or(true, |p| p.controller_enabled);
        ctx.set_param(ParamValue::MovementController(false));
        ctx.world
            .set_transform(ctx.agent, destination, agent.orientation);
        ctx.set_param(ParamValue::MovementController(controller));
        debug!(agent = ctx.agent.0, x = destination.x, z = destination.z, "translocated");
    }
}

impl Policy for TranslocatorRun {
    fn start(&mut self, ctx: &mut StepContext<'_>) {
        let Some(eye) = ctx.eye() else {
            return;
        };
        let forward = eye.forward();
        let beacon = ctx.world.spawn(
            &self.prefab,
            eye.position + forward * self.tunables.spawn_distance,
            eye.orientation,
        );
        ctx.world
            .apply_impulse(beacon, forward * self.tunables.throw_force);
        ctx.emit(AbilityEvent::TransientSpawned {
            agent: ctx.agent,
            instance: beacon,
        });
        self.beacon = Some(beacon);
    }

    fn check(&mut self, ctx: &mut StepContext<'_>) -> Option<EndReason> {
        match self.beacon {
            Some(b) if ctx.world.transform(b).is_some() => None,
            _ => Some(EndReason::Lost),
        }
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, _timing: Timing) -> Option<EndReason> {
        let landed = self.beacon.is_some_and(|b| ctx.world.contact(b).is_some());
        if landed {
            self.teleport(ctx);
            return Some(EndReason::Resolved);
        }
        None
    }

    fn on_end(&mut self, reason: EndReason, ctx: &mut StepContext<'_>) {
        if reason == EndReason::Expired {
            self.teleport(ctx);
        }
        if let Some(beacon) = self.beacon.take() {
            ctx.world.destroy(beacon);
        }
    }
}
