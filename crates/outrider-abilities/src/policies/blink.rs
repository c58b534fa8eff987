//! Blink: instant short-range teleport along the movement direction,
//! stopping short of the first obstacle in the way.

use glam::DVec3;

use outrider_core::constants::AGENT_CENTER_HEIGHT;
use outrider_core::descriptor::BlinkTunables;
use outrider_core::enums::{EndReason, OverrideKind};
use outrider_core::types::{AgentInput, ParamValue, RayHit, Transform};

use super::{center, Policy};
use crate::fsm::{StepContext, Timing};

#[derive(Debug)]
pub struct BlinkRun {
    tunables: BlinkTunables,
}

impl BlinkRun {
    pub fn new(tunables: BlinkTunables) -> Self {
        Self { tunables }
    }
}

impl Policy for BlinkRun {
    fn claims(&self) -> &'static [OverrideKind] {
        &[OverrideKind::Transform, OverrideKind::MovementController]
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        ctx.set_param(ParamValue::MovementController(false));
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, _timing: Timing) -> Option<EndReason> {
        let Some(agent) = ctx.agent_transform() else {
            return Some(EndReason::Lost);
        };
        let mask = self.tunables.obstacle_mask;
        let world = &*ctx.world;
        let destination = blink_destination(&agent, ctx.input, &self.tunables, |origin, dir, max| {
            world.raycast(origin, dir, max, mask)
        });
        ctx.world
            .set_transform(ctx.agent, destination, agent.orientation);
        Some(EndReason::Resolved)
    }
}

/// Horizontal blink direction: the movement input if any, else facing.
fn blink_direction(agent: &Transform, input: AgentInput) -> DVec3 {
    let axis = input.move_axis;
    let wish = agent.right() * axis.x + agent.flat_forward() * axis.y;
    DVec3::new(wish.x, 0.0, wish.z)
        .try_normalize()
        .unwrap_or_else(|| agent.flat_forward())
}

/// Where the agent's feet land after a blink.
///
/// The probe runs from body center; a hit stops the blink `standoff`
/// short of the hit point.
pub fn blink_destination<F>(
    agent: &Transform,
    input: AgentInput,
    tunables: &BlinkTunables,
    mut raycast: F,
) -> DVec3
where
    F: FnMut(DVec3, DVec3, f64) -> Option<RayHit>,
{
    let dir = blink_direction(agent, input);
    let origin = center(agent);
    let landing = match raycast(origin, dir, tunables.distance) {
        Some(hit) => {
            let back_off = tunables.standoff.min(hit.distance);
            origin + dir * (hit.distance - back_off)
        }
        None => origin + dir * tunables.distance,
    };
    landing - DVec3::Y * AGENT_CENTER_HEIGHT
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DQuat, DVec2};
    use outrider_core::types::EntityId;

    fn tunables(distance: f64) -> BlinkTunables {
        BlinkTunables {
            distance,
            ..Default::default()
        }
    }

    #[test]
    fn test_open_space_full_distance() {
        let agent = Transform::default();
        let dest = blink_destination(&agent, AgentInput::default(), &tunables(8.0), |_, _, _| None);
        assert!((dest - DVec3::new(0.0, 0.0, 8.0)).length() < 1e-9, "Got {dest}");
    }

    #[test]
    fn test_stops_short_of_obstacle() {
        let agent = Transform::default();
        let dest = blink_destination(&agent, AgentInput::default(), &tunables(8.0), |o, d, _| {
            Some(RayHit {
                distance: 3.0,
                hit: EntityId(7),
                point: o + d * 3.0,
            })
        });
        assert!((dest.z - 2.5).abs() < 1e-9, "Expected standoff of 0.5, got {dest}");
        assert_eq!(dest.y, 0.0);
    }

    #[test]
    fn test_follows_strafe_input() {
        let agent = Transform::new(DVec3::ZERO, DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2));
        let input = AgentInput {
            move_axis: DVec2::new(1.0, 0.0),
        };
        // Facing +X, so right is -Z.
        let dest = blink_destination(&agent, input, &tunables(4.0), |_, _, _| None);
        assert!((dest - DVec3::new(0.0, 0.0, -4.0)).length() < 1e-9, "Got {dest}");
    }

    #[test]
    fn test_hit_closer_than_standoff() {
        let agent = Transform::default();
        let dest = blink_destination(&agent, AgentInput::default(), &tunables(8.0), |o, d, _| {
            Some(RayHit {
                distance: 0.2,
                hit: EntityId(1),
                point: o + d * 0.2,
            })
        });
        assert_eq!(dest, DVec3::ZERO, "Never moves backwards");
    }
}
