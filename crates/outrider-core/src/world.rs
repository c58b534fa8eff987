//! Collaborator traits: everything the ability engine needs from the world.
//!
//! The engine never owns physics, rendering or UI. It issues abstract
//! queries and commands through these traits; the sim crate's sandbox
//! implements them over hecs, tests implement them with scripted fakes.

use std::collections::BTreeSet;

use glam::{DQuat, DVec3};

use crate::components::Vitals;
use crate::types::{
    AgentParams, Contact, EntityId, LayerMask, ParamValue, PrefabRef, RayHit, Transform, WidgetId,
};

/// Read-only spatial queries.
pub trait PhysicsQueries {
    /// First collider hit along `direction` within `max_distance`.
    fn raycast(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
        mask: LayerMask,
    ) -> Option<RayHit>;

    /// Entities whose colliders intersect the sphere.
    fn overlap_sphere(&self, origin: DVec3, radius: f64, mask: LayerMask) -> BTreeSet<EntityId>;

    /// Terrain height directly below (or above) `point`.
    fn ground_height(&self, point: DVec3) -> Option<f64>;

    fn transform(&self, entity: EntityId) -> Option<Transform>;

    /// Collision layer of an entity, `LayerMask::NONE` if it has no collider.
    fn layer(&self, entity: EntityId) -> LayerMask;

    /// First contact a transient made since it was spawned.
    fn contact(&self, entity: EntityId) -> Option<Contact>;
}

/// Commands that move things.
pub trait MovementCommands {
    /// Character-controller style displacement of an agent.
    fn move_by(&mut self, agent: EntityId, delta: DVec3);

    /// Instant velocity change of a rigid body.
    fn apply_impulse(&mut self, entity: EntityId, impulse: DVec3);

    fn set_velocity(&mut self, entity: EntityId, velocity: DVec3);

    fn set_transform(&mut self, entity: EntityId, position: DVec3, orientation: DQuat);

    fn params(&self, agent: EntityId) -> Option<AgentParams>;

    fn set_param(&mut self, agent: EntityId, value: ParamValue);

    /// Scale an enemy's own movement speed. 1.0 is normal speed.
    fn set_speed_scale(&mut self, entity: EntityId, scale: f64);
}

/// Spawning and removal of ability-owned objects.
pub trait TransientObjects {
    fn spawn(&mut self, prefab: &PrefabRef, position: DVec3, orientation: DQuat) -> EntityId;

    fn destroy(&mut self, instance: EntityId);
}

/// One-way UI updates. The UI never calls back into the engine.
pub trait UiSink {
    /// Create a widget, optionally pinned over an entity.
    fn create_widget(&mut self, prefab: &PrefabRef, anchor: Option<EntityId>) -> WidgetId;

    fn remove_widget(&mut self, widget: WidgetId);

    /// Fill fraction, clamped to `[0, 1]` by the implementation.
    fn set_fill_amount(&mut self, widget: WidgetId, amount: f64);

    fn set_visible(&mut self, widget: WidgetId, visible: bool);
}

/// Anything that can be hurt.
pub trait Damageable {
    fn take_damage(&mut self, amount: f64);
    fn is_dead(&self) -> bool;
    fn health(&self) -> f64;
    fn max_health(&self) -> f64;
}

/// Access to damageable entities.
pub trait DamageSink {
    /// Run `f` against the entity's damage capability. False if it has none.
    fn with_damageable(&mut self, entity: EntityId, f: &mut dyn FnMut(&mut dyn Damageable))
        -> bool;
}

/// The full collaborator surface handed to ability policies.
pub trait AbilityWorld: PhysicsQueries + MovementCommands + TransientObjects + UiSink + DamageSink {}

impl<T> AbilityWorld for T where
    T: PhysicsQueries + MovementCommands + TransientObjects + UiSink + DamageSink
{
}

/// Current and maximum health of an entity, if it is damageable.
pub fn health_of(world: &mut dyn AbilityWorld, entity: EntityId) -> Option<(f64, f64)> {
    let mut out = None;
    world.with_damageable(entity, &mut |d| out = Some((d.health(), d.max_health())));
    out
}

/// Damage an entity. Returns `Some(true)` when the hit was lethal, None when
/// the entity cannot take damage.
pub fn deal_damage(world: &mut dyn AbilityWorld, entity: EntityId, amount: f64) -> Option<bool> {
    let mut lethal = None;
    world.with_damageable(entity, &mut |d| {
        let was_dead = d.is_dead();
        d.take_damage(amount);
        lethal = Some(!was_dead && d.is_dead());
    });
    lethal
}

impl Damageable for Vitals {
    fn take_damage(&mut self, amount: f64) {
        if self.is_dead() {
            return;
        }
        self.health = (self.health - amount).clamp(0.0, self.max_health);
    }

    fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    fn health(&self) -> f64 {
        self.health
    }

    fn max_health(&self) -> f64 {
        self.max_health
    }
}
