//! Per-agent ability slots.
//!
//! The scheduler owns one agent's bound descriptors, their in-flight runs
//! and the override ledger they share. Slots are stepped in index order so
//! two runs touching the same agent always resolve the same way.

use std::sync::Arc;

use tracing::{debug, info, warn};

use outrider_core::config::Loadout;
use outrider_core::constants::MAX_ABILITY_SLOTS;
use outrider_core::descriptor::{AbilityDescriptor, AbilityKind};
use outrider_core::enums::{AbilityPhase, ErrorKind, OverrideKind};
use outrider_core::error::AbilityError;
use outrider_core::events::AbilityEvent;
use outrider_core::state::{SlotView, TargetLockView};
use outrider_core::types::EntityId;

use crate::damage::compute_magnitude;
use crate::fsm::{AbilityRun, AgentEnv, StepContext};
use crate::overrides::OverrideLedger;

/// A bound descriptor and its current run, if any.
#[derive(Debug)]
struct AbilitySlot {
    descriptor: Arc<AbilityDescriptor>,
    run: Option<AbilityRun>,
}

/// What an activation request did.
#[derive(Debug)]
pub enum ActivationOutcome {
    /// A new run began, in the given phase.
    Started(AbilityPhase),
    /// A toggle ability was running and has been ended.
    Toggled,
    /// Nothing is bound to the slot.
    Unbound,
    Denied(AbilityError),
}

#[derive(Debug)]
pub struct AbilityScheduler {
    agent: EntityId,
    slots: Vec<Option<AbilitySlot>>,
    overrides: OverrideLedger,
}

impl AbilityScheduler {
    pub fn new(agent: EntityId) -> Self {
        Self {
            agent,
            slots: (0..MAX_ABILITY_SLOTS).map(|_| None).collect(),
            overrides: OverrideLedger::new(),
        }
    }

    pub fn with_loadout(agent: EntityId, loadout: &Loadout) -> Self {
        let mut scheduler = Self::new(agent);
        for (slot, descriptor) in loadout.slots.iter().enumerate() {
            if let Some(descriptor) = descriptor {
                scheduler.bind(slot, descriptor.clone());
            }
        }
        scheduler
    }

    pub fn agent(&self) -> EntityId {
        self.agent
    }

    /// Bind a descriptor to an idle slot.
    pub fn bind(&mut self, slot: usize, descriptor: AbilityDescriptor) -> bool {
        match self.slots.get_mut(slot) {
            Some(entry) if entry.as_ref().map_or(true, |s| s.run.is_none()) => {
                *entry = Some(AbilitySlot {
                    descriptor: Arc::new(descriptor),
                    run: None,
                });
                true
            }
            _ => false,
        }
    }

    /// Clear an idle slot.
    pub fn unbind(&mut self, slot: usize) -> bool {
        match self.slots.get_mut(slot) {
            Some(entry) if entry.as_ref().is_some_and(|s| s.run.is_none()) => {
                *entry = None;
                true
            }
            _ => false,
        }
    }

    /// Handle an activation request for `slot`.
    ///
    /// Denials leave the agent exactly as it was and are reported both in
    /// the outcome and as an `ActivationDenied` event.
    pub fn activate(&mut self, slot: usize, env: &mut AgentEnv<'_>) -> ActivationOutcome {
        let agent = self.agent;
        let Some(descriptor) = self.descriptor(slot).cloned() else {
            warn!(agent = agent.0, slot, "ability_slot_unbound");
            return ActivationOutcome::Unbound;
        };

        // One run per ability per agent, whichever slot it sits in.
        let duplicate = self.slots.iter().enumerate().any(|(index, entry)| {
            index != slot
                && entry
                    .as_ref()
                    .is_some_and(|s| s.run.is_some() && s.descriptor.name == descriptor.name)
        });

        let mark = env.events.len();
        let result = {
            let mut ctx = StepContext::new(env, &mut self.overrides, slot);
            match self.slots[slot].as_mut() {
                None => return ActivationOutcome::Unbound,
                Some(AbilitySlot { run: Some(run), .. }) => {
                    run.reenter(&mut ctx).map(|()| ActivationOutcome::Toggled)
                }
                Some(_) if duplicate => Err(AbilityError::InvalidStateTransition {
                    ability: descriptor.name.clone(),
                    phase: "running in another slot",
                }),
                Some(bound) => AbilityRun::begin(descriptor.clone(), &mut ctx).map(|run| {
                    let phase = run.phase();
                    bound.run = Some(run);
                    ActivationOutcome::Started(phase)
                }),
            }
        };

        match result {
            Ok(outcome) => {
                if let ActivationOutcome::Started(phase) = &outcome {
                    info!(agent = agent.0, slot, ability = %descriptor.name, ?phase, "ability_activated");
                    env.events.insert(
                        mark,
                        AbilityEvent::AbilityActivated {
                            agent,
                            slot,
                            ability: descriptor.name.clone(),
                        },
                    );
                }
                outcome
            }
            Err(error) => {
                match error.kind() {
                    ErrorKind::ConfigurationMissing | ErrorKind::ResourceConflict => {
                        warn!(agent = agent.0, slot, error = %error, "activation_denied")
                    }
                    ErrorKind::PreconditionFailed => {
                        info!(agent = agent.0, slot, error = %error, "activation_denied")
                    }
                    ErrorKind::InvalidStateTransition => {
                        debug!(agent = agent.0, slot, error = %error, "activation_denied")
                    }
                }
                env.events.push(AbilityEvent::ActivationDenied {
                    agent,
                    slot,
                    error: error.kind(),
                });
                ActivationOutcome::Denied(error)
            }
        }
    }

    /// Forward fire input to a running slot.
    pub fn fire(&mut self, slot: usize) -> bool {
        self.run_mut(slot).is_some_and(AbilityRun::request_fire)
    }

    /// Ask a running slot to stop on its next step.
    pub fn cancel(&mut self, slot: usize) -> bool {
        self.run_mut(slot).is_some_and(AbilityRun::request_cancel)
    }

    /// Advance every run by one frame, lowest slot first.
    pub fn step(&mut self, env: &mut AgentEnv<'_>) {
        for (index, entry) in self.slots.iter_mut().enumerate() {
            let Some(bound) = entry.as_mut() else {
                continue;
            };
            let Some(run) = bound.run.as_mut() else {
                continue;
            };
            let mut ctx = StepContext::new(env, &mut self.overrides, index);
            run.step(&mut ctx);
            if run.phase() == AbilityPhase::Idle {
                bound.run = None;
            }
        }
    }

    /// Stop everything now and hand every claimed resource back.
    pub fn force_interrupt_all(&mut self, env: &mut AgentEnv<'_>) {
        for (index, entry) in self.slots.iter_mut().enumerate() {
            let Some(bound) = entry.as_mut() else {
                continue;
            };
            if let Some(mut run) = bound.run.take() {
                let mut ctx = StepContext::new(env, &mut self.overrides, index);
                run.force_interrupt(&mut ctx);
            }
        }
    }

    pub fn descriptor(&self, slot: usize) -> Option<&Arc<AbilityDescriptor>> {
        self.slots
            .get(slot)
            .and_then(Option::as_ref)
            .map(|s| &s.descriptor)
    }

    pub fn run(&self, slot: usize) -> Option<&AbilityRun> {
        self.slots
            .get(slot)
            .and_then(Option::as_ref)
            .and_then(|s| s.run.as_ref())
    }

    fn run_mut(&mut self, slot: usize) -> Option<&mut AbilityRun> {
        self.slots
            .get_mut(slot)
            .and_then(Option::as_mut)
            .and_then(|s| s.run.as_mut())
    }

    pub fn phase(&self, slot: usize) -> AbilityPhase {
        self.run(slot).map_or(AbilityPhase::Idle, AbilityRun::phase)
    }

    /// Whether any slot has a run in flight.
    pub fn is_busy(&self) -> bool {
        self.slots
            .iter()
            .flatten()
            .any(|s| s.run.is_some())
    }

    pub fn claims(&self) -> Vec<(OverrideKind, usize)> {
        self.overrides.claims()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Read-only view of every slot for snapshots.
    pub fn views(&self) -> Vec<SlotView> {
        self.slots
            .iter()
            .enumerate()
            .map(|(slot, entry)| {
                let Some(bound) = entry else {
                    return SlotView {
                        slot,
                        ability: None,
                        phase: AbilityPhase::Idle,
                        elapsed_secs: 0.0,
                        remaining_secs: None,
                        locked_targets: Vec::new(),
                    };
                };
                let run = bound.run.as_ref();
                let segments = match &bound.descriptor.kind {
                    AbilityKind::Deadeye(t) => t.segments.as_slice(),
                    _ => &[][..],
                };
                let locked_targets = run
                    .and_then(AbilityRun::tracker)
                    .map(|tracker| {
                        tracker
                            .locks()
                            .map(|lock| TargetLockView {
                                target: lock.target,
                                progress_secs: lock.progress_secs,
                                potential: compute_magnitude(lock.progress_secs, segments),
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                SlotView {
                    slot,
                    ability: Some(bound.descriptor.name.clone()),
                    phase: run.map_or(AbilityPhase::Idle, AbilityRun::phase),
                    elapsed_secs: run.map_or(0.0, AbilityRun::elapsed),
                    remaining_secs: run.and_then(AbilityRun::remaining),
                    locked_targets,
                }
            })
            .collect()
    }
}
