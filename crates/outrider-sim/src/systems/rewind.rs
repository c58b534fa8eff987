//! Rewind systems: history recording on the fixed tick and playback on the
//! variable frame.

use tracing::info;

use outrider_abilities::Snapshot;
use outrider_core::events::AbilityEvent;
use outrider_core::world::{MovementCommands, PhysicsQueries};

use crate::registry::AbilityRegistry;
use crate::sandbox::SandboxWorld;

/// Record one pose per agent. Buffers in playback ignore the sample.
pub fn record(registry: &mut AbilityRegistry, sandbox: &SandboxWorld) {
    for (agent, entry) in registry.iter_mut() {
        if let Some(transform) = sandbox.transform(agent) {
            entry.rewind.record(Snapshot {
                position: transform.position,
                orientation: transform.orientation,
            });
        }
    }
}

/// Advance playback to `now` and move each rewinding agent to its pose.
pub fn playback(
    registry: &mut AbilityRegistry,
    sandbox: &mut SandboxWorld,
    now: f64,
    events: &mut Vec<AbilityEvent>,
) {
    for (agent, entry) in registry.iter_mut() {
        if !entry.rewind.is_playing() {
            continue;
        }
        if let Some(pose) = entry.rewind.tick(now) {
            sandbox.set_transform(agent, pose.position, pose.orientation);
        }
        if !entry.rewind.is_playing() {
            info!(agent = agent.0, remaining = entry.rewind.len(), "rewind_ended");
            events.push(AbilityEvent::RewindEnded { agent });
        }
    }
}
