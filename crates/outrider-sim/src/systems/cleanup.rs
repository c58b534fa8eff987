//! Cleanup system: removes dead enemies and transients that are lost or
//! never landed.

use hecs::Entity;
use tracing::debug;

use outrider_core::components::{Enemy, TransientBody, Vitals};
use outrider_core::constants::TRANSIENT_MAX_LIFETIME_SECS;
use outrider_core::types::Transform;

use crate::sandbox::{id_of, SandboxWorld};

/// Depth below the lowest terrain at which a body counts as lost (m).
const FALL_LIMIT: f64 = 50.0;

/// Despawn finished entities. Uses a pre-allocated buffer to avoid
/// per-frame allocation.
pub fn run(sandbox: &mut SandboxWorld, despawn_buffer: &mut Vec<Entity>) {
    despawn_buffer.clear();

    // Dead enemies.
    for (entity, (_enemy, vitals)) in sandbox.world().query::<(&Enemy, &Vitals)>().iter() {
        if vitals.health <= 0.0 {
            despawn_buffer.push(entity);
        }
    }

    // Transients off the map, fallen through it, or flying too long.
    let floor = sandbox.terrain().min_elevation() - FALL_LIMIT;
    for (entity, (body, transform)) in sandbox
        .world()
        .query::<(&TransientBody, &Transform)>()
        .iter()
    {
        let lost = !sandbox.terrain().contains(transform.position) || transform.position.y < floor;
        let expired = !body.stuck && body.age_secs > TRANSIENT_MAX_LIFETIME_SECS;
        if lost || expired {
            despawn_buffer.push(entity);
        }
    }

    for entity in despawn_buffer.drain(..) {
        debug!(entity = id_of(entity).0, "entity_despawned");
        let _ = sandbox.world_mut().despawn(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DQuat, DVec3};
    use outrider_core::types::PrefabRef;
    use outrider_core::world::{deal_damage, MovementCommands, PhysicsQueries, TransientObjects};
    use outrider_terrain::{TerrainGrid, TerrainHeader};

    fn make_sandbox() -> SandboxWorld {
        SandboxWorld::new(TerrainGrid::flat(TerrainHeader::centered(61, 2.0), 0.0))
    }

    #[test]
    fn test_dead_enemy_despawned() {
        let mut sandbox = make_sandbox();
        let alive = sandbox.spawn_enemy(DVec3::new(5.0, 0.0, 0.0));
        let dead = sandbox.spawn_enemy(DVec3::new(-5.0, 0.0, 0.0));
        deal_damage(&mut sandbox, dead, 1_000.0);

        let mut buffer = Vec::new();
        run(&mut sandbox, &mut buffer);
        assert!(sandbox.transform(alive).is_some());
        assert!(sandbox.transform(dead).is_none(), "Dead enemy should be despawned");
    }

    #[test]
    fn test_transient_lifetime() {
        let mut sandbox = make_sandbox();
        let prefab = PrefabRef::new("jagged_blade");
        let flying = sandbox.spawn(&prefab, DVec3::new(0.0, 2.0, 0.0), DQuat::IDENTITY);
        let placed = sandbox.spawn(&prefab, DVec3::new(1.0, 2.0, 0.0), DQuat::IDENTITY);
        sandbox.set_transform(placed, DVec3::new(1.0, 2.0, 0.0), DQuat::IDENTITY);
        for (_entity, body) in sandbox.world_mut().query_mut::<&mut TransientBody>() {
            body.age_secs = TRANSIENT_MAX_LIFETIME_SECS + 1.0;
        }

        let mut buffer = Vec::new();
        run(&mut sandbox, &mut buffer);
        assert!(sandbox.transform(flying).is_none(), "Unlanded transient should expire");
        assert!(sandbox.transform(placed).is_some(), "Stuck transient should stay");
    }

    #[test]
    fn test_transient_off_map_despawned() {
        let mut sandbox = make_sandbox();
        let prefab = PrefabRef::new("translocator_beacon");
        let beacon = sandbox.spawn(&prefab, DVec3::new(500.0, 2.0, 0.0), DQuat::IDENTITY);
        let mut buffer = Vec::new();
        run(&mut sandbox, &mut buffer);
        assert!(sandbox.transform(beacon).is_none());
    }
}
