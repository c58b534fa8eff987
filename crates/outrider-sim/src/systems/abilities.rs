//! Ability step: advances every agent's runs by one variable frame.

use outrider_abilities::EffectClock;
use outrider_core::events::AbilityEvent;

use crate::registry::AbilityRegistry;
use crate::sandbox::SandboxWorld;

/// Step every registered agent, lowest id first.
pub fn run(
    registry: &mut AbilityRegistry,
    sandbox: &mut SandboxWorld,
    clock: &EffectClock,
    events: &mut Vec<AbilityEvent>,
) {
    for (_agent, entry) in registry.iter_mut() {
        entry.with_env(clock, sandbox, events, |scheduler, env| scheduler.step(env));
    }
}
