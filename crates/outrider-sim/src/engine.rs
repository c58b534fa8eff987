//! Simulation engine: the driver around the ability engine.
//!
//! `SimulationEngine` owns the sandbox world, the ability registry and the
//! effect clock, processes queued commands, runs all systems, and produces
//! `FrameSnapshot`s. Completely headless, enabling deterministic testing.

use std::collections::VecDeque;

use glam::{DVec2, DVec3};
use hecs::Entity;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use outrider_abilities::{AbilityScheduler, EffectClock, RewindBuffer};
use outrider_core::commands::AbilityCommand;
use outrider_core::config::Loadout;
use outrider_core::constants::{
    ENEMY_COUNT, FIXED_DT, FRAME_DT, MAX_FRAME_DT, PILLAR_COUNT, PILLAR_RADIUS, REWIND_SPEED_MULTIPLIER,
    REWIND_WINDOW_SECS,
};
use outrider_core::events::AbilityEvent;
use outrider_core::state::FrameSnapshot;
use outrider_core::types::{AgentInput, EntityId};

use crate::registry::AbilityRegistry;
use crate::sandbox::SandboxWorld;
use crate::systems;
use crate::world_setup;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// RNG seed for the arena layout. Same seed = same simulation.
    pub seed: u64,
    /// Frame length used by `tick()` (seconds).
    pub frame_dt: f64,
    /// Fixed step for history recording and physics (seconds).
    pub fixed_dt: f64,
    /// Seconds of rewind history kept per agent.
    pub rewind_window_secs: f64,
    pub rewind_speed_multiplier: f64,
    /// Abilities bound to the primary agent.
    pub loadout: Loadout,
    pub pillar_count: usize,
    pub enemy_count: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            frame_dt: FRAME_DT,
            fixed_dt: FIXED_DT,
            rewind_window_secs: REWIND_WINDOW_SECS,
            rewind_speed_multiplier: REWIND_SPEED_MULTIPLIER,
            loadout: Loadout::default(),
            pillar_count: PILLAR_COUNT,
            enemy_count: ENEMY_COUNT,
        }
    }
}

/// Positive finite value, or the fallback.
fn positive_or(value: f64, fallback: f64, name: &'static str) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        warn!(field = name, value, fallback, "config_value_replaced");
        fallback
    }
}

/// The simulation engine. Owns the sandbox world and all ability state.
pub struct SimulationEngine {
    sandbox: SandboxWorld,
    registry: AbilityRegistry,
    clock: EffectClock,
    frame_dt: f64,
    accumulator: f64,
    paused: bool,
    rewind_window_secs: f64,
    rewind_speed_multiplier: f64,
    primary_agent: EntityId,
    command_queue: VecDeque<AbilityCommand>,
    despawn_buffer: Vec<Entity>,
    events: Vec<AbilityEvent>,
}

impl SimulationEngine {
    /// Build the arena and bind the loadout to an agent at the origin.
    pub fn new(config: SimConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let terrain = world_setup::build_terrain(&mut rng);
        let mut sandbox = SandboxWorld::new(terrain);
        let primary_agent = sandbox.spawn_agent(DVec3::ZERO, 0.0);
        world_setup::setup_arena(&mut sandbox, &mut rng, config.pillar_count, config.enemy_count);

        let fixed_dt = positive_or(config.fixed_dt, FIXED_DT, "fixed_dt");
        let mut engine = Self {
            sandbox,
            registry: AbilityRegistry::new(),
            clock: EffectClock::new(fixed_dt),
            frame_dt: positive_or(config.frame_dt, FRAME_DT, "frame_dt"),
            accumulator: 0.0,
            paused: false,
            rewind_window_secs: positive_or(config.rewind_window_secs, REWIND_WINDOW_SECS, "rewind_window_secs"),
            rewind_speed_multiplier: positive_or(
                config.rewind_speed_multiplier,
                REWIND_SPEED_MULTIPLIER,
                "rewind_speed_multiplier",
            ),
            primary_agent,
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
            events: Vec::new(),
        };
        engine.register_agent(primary_agent, &config.loadout);
        info!(
            seed = config.seed,
            agent = primary_agent.0,
            pillars = config.pillar_count,
            enemies = config.enemy_count,
            "arena_ready"
        );
        engine
    }

    /// Queue a command for processing at the next frame boundary.
    pub fn queue_command(&mut self, command: AbilityCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = AbilityCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance one frame of the configured length.
    pub fn tick(&mut self) -> FrameSnapshot {
        self.frame(self.frame_dt)
    }

    /// Advance one variable frame of `dt` seconds and return the snapshot.
    ///
    /// Stalls longer than `MAX_FRAME_DT` are clamped. While paused only
    /// commands are processed.
    pub fn frame(&mut self, dt: f64) -> FrameSnapshot {
        self.process_commands();

        if !self.paused {
            let dt = if dt.is_finite() { dt.clamp(0.0, MAX_FRAME_DT) } else { 0.0 };
            self.clock.advance(dt);
            self.run_systems(dt);
        }

        let events = std::mem::take(&mut self.events);
        systems::snapshot::build_snapshot(&self.sandbox, &self.registry, &self.clock, self.paused, events)
    }

    /// Add an agent with its own scheduler and rewind history.
    pub fn add_agent(&mut self, position: DVec3, yaw: f64, loadout: &Loadout) -> EntityId {
        let agent = self.sandbox.spawn_agent(position, yaw);
        self.register_agent(agent, loadout);
        agent
    }

    /// Stop the agent's abilities, restoring everything they changed,
    /// then remove it from the world.
    pub fn remove_agent(&mut self, agent: EntityId) -> bool {
        let Some(mut entry) = self.registry.remove(agent) else {
            return false;
        };
        entry.with_env(&self.clock, &mut self.sandbox, &mut self.events, |scheduler, env| {
            scheduler.force_interrupt_all(env)
        });
        info!(agent = agent.0, "agent_removed");
        self.sandbox.despawn(agent)
    }

    /// Place an extra enemy on the ground below `position`.
    pub fn spawn_enemy(&mut self, position: DVec3) -> EntityId {
        self.sandbox.spawn_enemy(position)
    }

    /// Place an extra pillar on the ground below `position`.
    pub fn spawn_pillar(&mut self, position: DVec3) -> EntityId {
        self.sandbox.spawn_obstacle(position, PILLAR_RADIUS)
    }

    /// The agent created with the engine.
    pub fn agent(&self) -> EntityId {
        self.primary_agent
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn clock(&self) -> &EffectClock {
        &self.clock
    }

    /// Read-only access to the sandbox world.
    pub fn sandbox(&self) -> &SandboxWorld {
        &self.sandbox
    }

    pub fn registry(&self) -> &AbilityRegistry {
        &self.registry
    }

    fn register_agent(&mut self, agent: EntityId, loadout: &Loadout) {
        let scheduler = AbilityScheduler::with_loadout(agent, loadout);
        let rewind = RewindBuffer::new(
            self.rewind_window_secs,
            self.clock.fixed_delta(),
            self.rewind_speed_multiplier,
        );
        debug!(agent = agent.0, capacity = rewind.capacity(), slots = scheduler.slot_count(), "agent_registered");
        self.registry.register(scheduler, rewind);
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single command.
    fn handle_command(&mut self, command: AbilityCommand) {
        if let Some(agent) = command.agent() {
            if !self.registry.contains(agent) {
                warn!(agent = agent.0, ?command, "unknown_agent");
                return;
            }
        }

        match command {
            AbilityCommand::Activate { agent, slot } => {
                if let Some(entry) = self.registry.get_mut(agent) {
                    let outcome = entry.with_env(&self.clock, &mut self.sandbox, &mut self.events, |scheduler, env| {
                        scheduler.activate(slot, env)
                    });
                    debug!(agent = agent.0, slot, ?outcome, "activate_handled");
                }
            }
            AbilityCommand::Fire { agent, slot } => {
                let accepted = self
                    .registry
                    .get_mut(agent)
                    .is_some_and(|entry| entry.scheduler.fire(slot));
                if !accepted {
                    debug!(agent = agent.0, slot, "fire_ignored");
                }
            }
            AbilityCommand::Cancel { agent, slot } => {
                let accepted = self
                    .registry
                    .get_mut(agent)
                    .is_some_and(|entry| entry.scheduler.cancel(slot));
                if !accepted {
                    debug!(agent = agent.0, slot, "cancel_ignored");
                }
            }
            AbilityCommand::ForceInterrupt { agent } => {
                if let Some(entry) = self.registry.get_mut(agent) {
                    entry.with_env(&self.clock, &mut self.sandbox, &mut self.events, |scheduler, env| {
                        scheduler.force_interrupt_all(env)
                    });
                }
            }
            AbilityCommand::SetMoveInput {
                agent,
                strafe,
                forward,
            } => {
                let axis = DVec2::new(strafe, forward);
                let axis = if axis.is_finite() {
                    axis.clamp(DVec2::splat(-1.0), DVec2::splat(1.0))
                } else {
                    DVec2::ZERO
                };
                self.sandbox.set_input(agent, AgentInput { move_axis: axis });
            }
            AbilityCommand::SetLook { agent, yaw, pitch } => {
                // Abilities that move the agent own its orientation too.
                if self.registry.get(agent).is_some_and(|entry| entry.holds_transform()) {
                    debug!(agent = agent.0, "look_ignored");
                } else if yaw.is_finite() && pitch.is_finite() {
                    self.sandbox.set_look(agent, yaw, pitch);
                }
            }
            AbilityCommand::Pause => {
                self.paused = true;
            }
            AbilityCommand::Resume => {
                self.paused = false;
            }
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64) {
        // 1. Ability state machines
        systems::abilities::run(&mut self.registry, &mut self.sandbox, &self.clock, &mut self.events);
        // 2. Rewind playback
        systems::rewind::playback(&mut self.registry, &mut self.sandbox, self.clock.now(), &mut self.events);
        // 3. Fixed ticks: history, then physics, then trails
        let fixed_dt = self.clock.fixed_delta();
        self.accumulator += dt;
        while self.accumulator >= fixed_dt {
            self.accumulator -= fixed_dt;
            self.clock.advance_fixed();
            systems::rewind::record(&mut self.registry, &self.sandbox);
            let frozen = self.registry.playing_agents();
            systems::movement::run(&mut self.sandbox, &frozen, fixed_dt);
            systems::movement::update_trails(&mut self.sandbox, self.clock.fixed_tick());
        }
        // 4. Cleanup (dead enemies, lost transients)
        systems::cleanup::run(&mut self.sandbox, &mut self.despawn_buffer);
    }
}
