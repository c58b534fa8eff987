//! Deadeye: slowed movement and a narrowing view while targets in sight
//! accrue lock time. Fire input resolves phased damage on every target
//! still locked and in view; letting the timer run out deals nothing.

use glam::DVec3;
use tracing::{debug, info};

use outrider_core::constants::{
    GROUND_PROBE_HEIGHT, TUMBLEWEED_FORWARD_OFFSET, TUMBLEWEED_SIDE_OFFSET,
};
use outrider_core::descriptor::{AbilityDescriptor, DeadeyeTunables};
use outrider_core::enums::{EndReason, OverrideKind};
use outrider_core::error::AbilityError;
use outrider_core::events::AbilityEvent;
use outrider_core::types::{EntityId, LayerMask, ParamValue, PrefabRef, WidgetId};
use outrider_core::world::{deal_damage, health_of};

use super::{missing, positive_duration, Policy};
use crate::damage::compute_magnitude;
use crate::fsm::{StepContext, Timing};
use crate::targeting::{Candidate, TargetTracker, TrackerConfig};

#[derive(Debug)]
pub struct DeadeyeRun {
    tunables: DeadeyeTunables,
    lock_prefab: PrefabRef,
    tracker: TargetTracker,
    start_fov: f64,
    timer: Option<WidgetId>,
    tumbleweed: Option<EntityId>,
}

impl DeadeyeRun {
    pub fn prepare(
        descriptor: &AbilityDescriptor,
        tunables: &DeadeyeTunables,
    ) -> Result<Self, AbilityError> {
        let lock_prefab = tunables
            .lock_widget
            .clone()
            .ok_or_else(|| missing(descriptor, "lock widget"))?;
        let duration = positive_duration(descriptor, "lock-on duration")?;
        Ok(Self {
            tracker: TargetTracker::new(TrackerConfig {
                fov_angle_deg: tunables.fov_angle_deg,
                detection_radius: tunables.detection_radius,
                max_lock_secs: duration,
            }),
            tunables: tunables.clone(),
            lock_prefab,
            start_fov: tunables.fov_angle_deg,
            timer: None,
            tumbleweed: None,
        })
    }

    /// Colliders that block sight of a target.
    fn sight_mask(&self) -> LayerMask {
        LayerMask::SOLID.union(self.tunables.enemy_mask)
    }

    fn spawn_tumbleweed(&mut self, ctx: &mut StepContext<'_>) {
        let Some(prefab) = self.tunables.tumbleweed.clone() else {
            return;
        };
        let Some(agent) = ctx.agent_transform() else {
            return;
        };
        let mut position = agent.position - agent.right() * TUMBLEWEED_SIDE_OFFSET
            + agent.flat_forward() * TUMBLEWEED_FORWARD_OFFSET;
        let probe = position + DVec3::Y * GROUND_PROBE_HEIGHT;
        position.y = ctx
            .world
            .raycast(probe, DVec3::NEG_Y, GROUND_PROBE_HEIGHT * 2.0, LayerMask::GROUND)
            .map(|hit| hit.point.y)
            .or_else(|| ctx.world.ground_height(position))
            .unwrap_or(agent.position.y);

        let weed = ctx.world.spawn(&prefab, position, agent.orientation);
        ctx.world
            .apply_impulse(weed, agent.right() * self.tunables.wind_force);
        self.tumbleweed = Some(weed);
    }
}

/// Share of a target's remaining health the locked damage would take, in [0, 1].
fn lock_fill(potential: f64, health: Option<(f64, f64)>) -> f64 {
    match health {
        Some((health, _)) if health > 0.0 => {
            let fill = potential / health;
            if fill.is_nan() {
                0.0
            } else {
                fill.clamp(0.0, 1.0)
            }
        }
        _ => 1.0,
    }
}

impl Policy for DeadeyeRun {
    fn claims(&self) -> &'static [OverrideKind] {
        &[OverrideKind::SpeedMultiplier, OverrideKind::FieldOfView]
    }

    fn needs_arming(&self) -> bool {
        true
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        if let Some(params) = ctx.world.params(ctx.agent) {
            self.start_fov = params.field_of_view;
        }
        ctx.set_param(ParamValue::SpeedMultiplier(self.tunables.speed_multiplier));
    }

    fn arm(&mut self, ctx: &mut StepContext<'_>) {
        if let Some(prefab) = &self.tunables.timer_widget {
            let timer = ctx.world.create_widget(prefab, None);
            ctx.world.set_fill_amount(timer, 1.0);
            self.timer = Some(timer);
        }
        self.spawn_tumbleweed(ctx);
    }

    fn track(&mut self, ctx: &mut StepContext<'_>) {
        let Some(eye) = ctx.eye() else {
            return;
        };
        let candidates: Vec<Candidate> = ctx
            .world
            .overlap_sphere(eye.position, self.tunables.detection_radius, self.tunables.enemy_mask)
            .into_iter()
            .filter_map(|id| {
                ctx.world
                    .transform(id)
                    .map(|t| Candidate { id, position: t.position })
            })
            .collect();

        let mask = self.sight_mask();
        let world = &*ctx.world;
        let delta = self.tracker.update(&eye, &candidates, ctx.dt, |origin, dir, max| {
            world.raycast(origin, dir, max, mask).map(|hit| hit.hit)
        });

        for lock in delta.dropped {
            if let Some(widget) = lock.widget {
                ctx.world.remove_widget(widget);
            }
            debug!(agent = ctx.agent.0, target = lock.target.0, progress = lock.progress_secs, "target_dropped");
            ctx.emit(AbilityEvent::TargetDropped {
                agent: ctx.agent,
                target: lock.target,
            });
        }
        for target in delta.admitted {
            let widget = ctx.world.create_widget(&self.lock_prefab, Some(target));
            self.tracker.set_widget(target, widget);
            ctx.emit(AbilityEvent::TargetLocked {
                agent: ctx.agent,
                target,
            });
        }

        // Lock circles fill toward a lethal hit.
        for lock in self.tracker.locks() {
            let Some(widget) = lock.widget else {
                continue;
            };
            let potential = compute_magnitude(lock.progress_secs, &self.tunables.segments);
            let health = health_of(&mut *ctx.world, lock.target);
            ctx.world.set_fill_amount(widget, lock_fill(potential, health));
        }
    }

    fn resolves_on_fire(&self) -> bool {
        true
    }

    fn resolve(&mut self, ctx: &mut StepContext<'_>) {
        let Some(eye) = ctx.eye() else {
            return;
        };
        let half_view = ctx
            .world
            .params(ctx.agent)
            .map_or(self.tunables.fov_angle_deg, |p| p.field_of_view)
            / 2.0;
        let mask = self.sight_mask();

        let locks: Vec<_> = self.tracker.locks().copied().collect();
        for lock in locks {
            let Some(target) = ctx.world.transform(lock.target) else {
                continue;
            };
            if eye.angle_to(target.position) >= half_view {
                continue;
            }
            let to = target.position - eye.position;
            let distance = to.length();
            let visible = distance > f64::EPSILON
                && ctx
                    .world
                    .raycast(eye.position, to / distance, distance + 1.0, mask)
                    .is_some_and(|hit| hit.hit == lock.target);
            if !visible {
                continue;
            }

            let amount = compute_magnitude(lock.progress_secs, &self.tunables.segments);
            if let Some(lethal) = deal_damage(&mut *ctx.world, lock.target, amount) {
                info!(
                    agent = ctx.agent.0,
                    target = lock.target.0,
                    amount,
                    lethal,
                    "deadeye_hit"
                );
                ctx.emit(AbilityEvent::DamageDealt {
                    agent: ctx.agent,
                    target: lock.target,
                    amount,
                    lethal,
                });
            }
        }
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, timing: Timing) -> Option<EndReason> {
        let t = &self.tunables;
        let progress = if t.fov_transition_secs > 0.0 {
            ((timing.elapsed + ctx.dt) / t.fov_transition_secs).min(1.0)
        } else {
            1.0
        };
        let fov = self.start_fov + (t.fov_angle_deg - self.start_fov) * progress;
        ctx.set_param(ParamValue::FieldOfView(fov));

        if let (Some(timer), Some(remaining)) = (self.timer, timing.remaining_fraction()) {
            ctx.world.set_fill_amount(timer, remaining);
        }
        None
    }

    fn on_end(&mut self, _reason: EndReason, ctx: &mut StepContext<'_>) {
        for lock in self.tracker.clear() {
            if let Some(widget) = lock.widget {
                ctx.world.remove_widget(widget);
            }
        }
        if let Some(timer) = self.timer.take() {
            ctx.world.remove_widget(timer);
        }
        if let Some(weed) = self.tumbleweed.take() {
            ctx.world.destroy(weed);
        }
    }

    fn tracker(&self) -> Option<&TargetTracker> {
        Some(&self.tracker)
    }
}
