//! Rewind: plays the agent's recorded history backwards. The driver applies
//! the poses; the run only starts playback and waits for it to finish.

use tracing::info;

use outrider_core::descriptor::AbilityDescriptor;
use outrider_core::enums::{EndReason, OverrideKind};
use outrider_core::error::AbilityError;
use outrider_core::events::AbilityEvent;

use super::{missing, positive_duration, precondition, Policy};
use crate::fsm::StepContext;

#[derive(Debug)]
pub struct RewindRun {
    playback_secs: f64,
}

impl RewindRun {
    pub fn prepare(
        descriptor: &AbilityDescriptor,
        ctx: &StepContext<'_>,
    ) -> Result<Self, AbilityError> {
        let playback_secs = positive_duration(descriptor, "playback duration")?;
        let buffer = ctx
            .rewind
            .as_deref()
            .ok_or_else(|| missing(descriptor, "rewind history"))?;
        if buffer.is_playing() {
            return Err(precondition(descriptor, "rewind already playing"));
        }
        if buffer.is_empty() {
            return Err(precondition(descriptor, "no recorded history"));
        }
        Ok(Self { playback_secs })
    }
}

impl Policy for RewindRun {
    fn claims(&self) -> &'static [OverrideKind] {
        &[OverrideKind::Transform]
    }

    fn start(&mut self, ctx: &mut StepContext<'_>) {
        let now = ctx.clock.now();
        let Some(buffer) = ctx.rewind.as_deref_mut() else {
            return;
        };
        let snapshots = buffer.len();
        if buffer.start_playback(self.playback_secs, now) {
            info!(agent = ctx.agent.0, snapshots, "rewind_started");
            ctx.emit(AbilityEvent::RewindStarted {
                agent: ctx.agent,
                snapshots,
            });
        }
    }

    fn check(&mut self, ctx: &mut StepContext<'_>) -> Option<EndReason> {
        let playing = ctx.rewind.as_deref().is_some_and(|b| b.is_playing());
        (!playing).then_some(EndReason::Resolved)
    }

    fn on_end(&mut self, _reason: EndReason, ctx: &mut StepContext<'_>) {
        let stopped = ctx
            .rewind
            .as_deref_mut()
            .is_some_and(|b| b.stop_playback());
        if stopped {
            info!(agent = ctx.agent.0, "rewind_stopped");
            ctx.emit(AbilityEvent::RewindEnded { agent: ctx.agent });
        }
    }
}
