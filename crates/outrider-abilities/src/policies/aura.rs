//! Timed aura: marks every enemy within range at activation and keeps the
//! markers on them until the aura runs out.

use tracing::debug;

use outrider_core::descriptor::{AbilityDescriptor, AuraTunables};
use outrider_core::enums::EndReason;
use outrider_core::error::AbilityError;
use outrider_core::events::AbilityEvent;
use outrider_core::types::{EntityId, PrefabRef, WidgetId};

use super::{missing, Policy};
use crate::fsm::{StepContext, Timing};

#[derive(Debug)]
pub struct AuraRun {
    tunables: AuraTunables,
    marker: PrefabRef,
    /// (enemy, marker) pairs.
    markers: Vec<(EntityId, EntityId)>,
    widget: Option<WidgetId>,
}

impl AuraRun {
    pub fn prepare(
        descriptor: &AbilityDescriptor,
        tunables: &AuraTunables,
    ) -> Result<Self, AbilityError> {
        let marker = tunables
            .marker
            .clone()
            .ok_or_else(|| missing(descriptor, "marker prefab"))?;
        Ok(Self {
            tunables: tunables.clone(),
            marker,
            markers: Vec::new(),
            widget: None,
        })
    }

    pub fn marked(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.markers.iter().map(|(enemy, _)| *enemy)
    }
}

impl Policy for AuraRun {
    fn start(&mut self, ctx: &mut StepContext<'_>) {
        let Some(agent) = ctx.agent_transform() else {
            return;
        };
        let in_range =
            ctx.world
                .overlap_sphere(agent.position, self.tunables.radius, self.tunables.enemy_mask);
        for enemy in in_range {
            let Some(t) = ctx.world.transform(enemy) else {
                continue;
            };
            let marker = ctx.world.spawn(&self.marker, t.position, t.orientation);
            ctx.emit(AbilityEvent::TransientSpawned {
                agent: ctx.agent,
                instance: marker,
            });
            self.markers.push((enemy, marker));
        }
        if let Some(prefab) = &self.tunables.widget {
            let widget = ctx.world.create_widget(prefab, None);
            ctx.world.set_fill_amount(widget, 1.0);
            self.widget = Some(widget);
        }
        debug!(agent = ctx.agent.0, marked = self.markers.len(), "aura_started");
    }

    fn apply(&mut self, ctx: &mut StepContext<'_>, timing: Timing) -> Option<EndReason> {
        let world = &mut *ctx.world;
        self.markers.retain(|&(enemy, marker)| match world.transform(enemy) {
            Some(t) => {
                world.set_transform(marker, t.position, t.orientation);
                true
            }
            None => {
                world.destroy(marker);
                false
            }
        });
        if let (Some(widget), Some(remaining)) = (self.widget, timing.remaining_fraction()) {
            ctx.world.set_fill_amount(widget, remaining);
        }
        None
    }

    fn on_end(&mut self, _reason: EndReason, ctx: &mut StepContext<'_>) {
        for (_, marker) in self.markers.drain(..) {
            ctx.world.destroy(marker);
        }
        if let Some(widget) = self.widget.take() {
            ctx.world.remove_widget(widget);
        }
    }
}
