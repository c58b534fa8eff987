//! Snapshot system: queries the sandbox and the registry and builds a
//! complete FrameSnapshot.
//!
//! This system is read-only: it never modifies the world.

use hecs::World;

use outrider_abilities::EffectClock;
use outrider_core::components::{Chill, Enemy, Trail, TransientBody, Vitals};
use outrider_core::events::AbilityEvent;
use outrider_core::state::*;
use outrider_core::types::{AgentParams, Transform};

use crate::registry::AbilityRegistry;
use crate::sandbox::{entity_of, id_of, SandboxWorld};

/// Build a complete FrameSnapshot from the current state.
pub fn build_snapshot(
    sandbox: &SandboxWorld,
    registry: &AbilityRegistry,
    clock: &EffectClock,
    paused: bool,
    events: Vec<AbilityEvent>,
) -> FrameSnapshot {
    FrameSnapshot {
        time: TimeView {
            frame: clock.frame(),
            fixed_tick: clock.fixed_tick(),
            elapsed_secs: clock.now(),
        },
        paused,
        agents: build_agents(sandbox.world(), registry),
        enemies: build_enemies(sandbox.world()),
        transients: build_transients(sandbox.world()),
        widgets: build_widgets(sandbox),
        events,
    }
}

/// One view per registered agent that still exists, in id order.
fn build_agents(world: &World, registry: &AbilityRegistry) -> Vec<AgentView> {
    registry
        .iter()
        .filter_map(|(id, entry)| {
            let entity = entity_of(id)?;
            let transform = *world.get::<&Transform>(entity).ok()?;
            let params = world
                .get::<&AgentParams>(entity)
                .map(|p| *p)
                .unwrap_or_default();
            let trail = world
                .get::<&Trail>(entity)
                .map(|t| t.points.clone())
                .unwrap_or_default();
            Some(AgentView {
                id,
                transform,
                params,
                slots: entry.scheduler.views(),
                claims: entry.scheduler.claims(),
                rewind: RewindView {
                    recorded: entry.rewind.len(),
                    capacity: entry.rewind.capacity(),
                    playing: entry.rewind.is_playing(),
                },
                trail,
            })
        })
        .collect()
}

fn build_enemies(world: &World) -> Vec<EnemyView> {
    let mut enemies: Vec<EnemyView> = world
        .query::<(&Enemy, &Transform, &Vitals, Option<&Chill>)>()
        .iter()
        .map(|(entity, (_, transform, vitals, chill))| EnemyView {
            id: id_of(entity),
            position: transform.position,
            health: vitals.health,
            max_health: vitals.max_health,
            speed_scale: chill.map_or(1.0, |c| c.speed_scale),
        })
        .collect();

    enemies.sort_by_key(|e| e.id);
    enemies
}

fn build_transients(world: &World) -> Vec<TransientView> {
    let mut transients: Vec<TransientView> = world
        .query::<(&TransientBody, &Transform)>()
        .iter()
        .map(|(entity, (body, transform))| TransientView {
            id: id_of(entity),
            prefab: body.prefab.as_str().to_string(),
            position: transform.position,
            landed: body.contact.is_some(),
        })
        .collect();

    transients.sort_by_key(|t| t.id);
    transients
}

fn build_widgets(sandbox: &SandboxWorld) -> Vec<WidgetView> {
    sandbox
        .widgets()
        .map(|(id, widget)| WidgetView {
            id,
            prefab: widget.prefab.as_str().to_string(),
            anchor: widget.anchor,
            fill: widget.fill,
            visible: widget.visible,
        })
        .collect()
}
