//! Ability registry: every agent's scheduler and rewind history, keyed by
//! agent id and owned by the engine.
//!
//! Iteration is in ascending agent id so a frame always steps agents in
//! the same order.

use std::collections::{BTreeMap, BTreeSet};

use outrider_abilities::{AbilityScheduler, AgentEnv, EffectClock, RewindBuffer};
use outrider_core::enums::OverrideKind;
use outrider_core::events::AbilityEvent;
use outrider_core::types::EntityId;

use crate::sandbox::SandboxWorld;

/// Ability state of one agent.
#[derive(Debug)]
pub struct AgentAbilities {
    pub scheduler: AbilityScheduler,
    pub rewind: RewindBuffer,
}

impl AgentAbilities {
    /// Run `f` with this agent's scheduler and a fully wired environment.
    pub fn with_env<R>(
        &mut self,
        clock: &EffectClock,
        sandbox: &mut SandboxWorld,
        events: &mut Vec<AbilityEvent>,
        f: impl FnOnce(&mut AbilityScheduler, &mut AgentEnv<'_>) -> R,
    ) -> R {
        let agent = self.scheduler.agent();
        let input = sandbox.input(agent);
        let mut env = AgentEnv {
            agent,
            clock,
            input,
            world: sandbox,
            rewind: Some(&mut self.rewind),
            events,
        };
        f(&mut self.scheduler, &mut env)
    }

    /// Whether a running ability holds authority over the agent's transform.
    pub fn holds_transform(&self) -> bool {
        self.scheduler
            .claims()
            .iter()
            .any(|(kind, _)| *kind == OverrideKind::Transform)
    }
}

#[derive(Debug, Default)]
pub struct AbilityRegistry {
    agents: BTreeMap<EntityId, AgentAbilities>,
}

impl AbilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an agent. Returns the entry it replaced, if any.
    pub fn register(
        &mut self,
        scheduler: AbilityScheduler,
        rewind: RewindBuffer,
    ) -> Option<AgentAbilities> {
        self.agents
            .insert(scheduler.agent(), AgentAbilities { scheduler, rewind })
    }

    pub fn remove(&mut self, agent: EntityId) -> Option<AgentAbilities> {
        self.agents.remove(&agent)
    }

    pub fn get(&self, agent: EntityId) -> Option<&AgentAbilities> {
        self.agents.get(&agent)
    }

    pub fn get_mut(&mut self, agent: EntityId) -> Option<&mut AgentAbilities> {
        self.agents.get_mut(&agent)
    }

    pub fn contains(&self, agent: EntityId) -> bool {
        self.agents.contains_key(&agent)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &AgentAbilities)> {
        self.agents.iter().map(|(id, entry)| (*id, entry))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut AgentAbilities)> {
        self.agents.iter_mut().map(|(id, entry)| (*id, entry))
    }

    /// Agents whose pose is currently driven by rewind playback.
    pub fn playing_agents(&self) -> BTreeSet<EntityId> {
        self.agents
            .iter()
            .filter(|(_, entry)| entry.rewind.is_playing())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
