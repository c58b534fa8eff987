//! Fixed-tick integration.
//!
//! Agents walk from their input and fall under their own gravity
//! parameter. Enemies and thrown transients integrate velocity under world
//! gravity; a transient stops at the first thing it touches and records
//! the contact. Also records agent trails for rendering.

use std::collections::BTreeSet;

use glam::DVec3;
use hecs::Entity;

use outrider_core::components::{Agent, Chill, Collider, Enemy, Motion, Trail, TransientBody};
use outrider_core::constants::{
    AGENT_WALK_SPEED, ARENA_RADIUS, DEFAULT_GRAVITY, GROUND_FRICTION, MAX_TRAIL_POINTS,
    TRAIL_INTERVAL_TICKS,
};
use outrider_core::types::{AgentInput, AgentParams, Contact, EntityId, LayerMask, Transform};
use outrider_core::world::PhysicsQueries;

use crate::sandbox::{id_of, SandboxWorld};

/// Layers a flying transient can hit.
const TRANSIENT_HIT_MASK: LayerMask = LayerMask(LayerMask::SOLID.0 | LayerMask::ENEMY.0);

/// Run all integration for one fixed tick. Agents in `frozen` are posed
/// by someone else this tick and are left alone.
pub fn run(sandbox: &mut SandboxWorld, frozen: &BTreeSet<EntityId>, dt: f64) {
    integrate_agents(sandbox, frozen, dt);
    integrate_enemies(sandbox, dt);
    integrate_transients(sandbox, dt);
}

/// Walk, gravity and ground contact for agents.
pub fn integrate_agents(sandbox: &mut SandboxWorld, frozen: &BTreeSet<EntityId>, dt: f64) {
    let (world, terrain) = sandbox.split_mut();
    for (entity, (agent, transform, params, input)) in world
        .query_mut::<(&mut Agent, &mut Transform, &AgentParams, &AgentInput)>()
    {
        if frozen.contains(&id_of(entity)) {
            continue;
        }
        let mut position = transform.position;

        if params.controller_enabled {
            let axis = input.move_axis;
            let wish = transform.right() * axis.x + transform.flat_forward() * axis.y;
            let mut flat = DVec3::new(wish.x, 0.0, wish.z);
            if flat.length_squared() > 1.0 {
                flat = flat.normalize();
            }
            position += flat * AGENT_WALK_SPEED * params.speed_multiplier * dt;

            agent.vertical_velocity += params.gravity * dt;
            position.y += agent.vertical_velocity * dt;
        }

        // Keep agents inside the arena.
        let horizontal = DVec3::new(position.x, 0.0, position.z);
        if horizontal.length() > ARENA_RADIUS {
            let clamped = horizontal.normalize() * ARENA_RADIUS;
            position.x = clamped.x;
            position.z = clamped.z;
        }

        let ground = terrain.elevation_at(position).unwrap_or(0.0);
        if position.y <= ground {
            position.y = ground;
            agent.vertical_velocity = agent.vertical_velocity.max(0.0);
            agent.grounded = true;
        } else {
            agent.grounded = false;
        }
        transform.position = position;
    }
}

/// Ballistic motion and ground friction for enemies. Chilled enemies
/// cover less ground but fall normally.
pub fn integrate_enemies(sandbox: &mut SandboxWorld, dt: f64) {
    let (world, terrain) = sandbox.split_mut();
    for (_entity, (_enemy, transform, motion, collider, chill)) in world
        .query_mut::<(&Enemy, &mut Transform, &mut Motion, &Collider, Option<&Chill>)>()
    {
        if motion.use_gravity {
            motion.velocity.y += DEFAULT_GRAVITY * dt;
        }
        let scale = chill.map_or(1.0, |c| c.speed_scale);
        let travel = DVec3::new(motion.velocity.x * scale, motion.velocity.y, motion.velocity.z * scale);
        let mut position = transform.position + travel * dt;

        let floor = terrain.elevation_at(position).unwrap_or(0.0) + collider.radius;
        if position.y <= floor {
            position.y = floor;
            motion.velocity.y = motion.velocity.y.max(0.0);
            let keep = GROUND_FRICTION.powf(dt);
            motion.velocity.x *= keep;
            motion.velocity.z *= keep;
        }
        transform.position = position;
    }
}

/// Age every transient and sweep the free-flying ones.
pub fn integrate_transients(sandbox: &mut SandboxWorld, dt: f64) {
    // Sweep first against a read-only view, then write back.
    let mut moves: Vec<(Entity, DVec3, DVec3, Option<Contact>)> = Vec::new();
    for (entity, (body, transform, motion)) in sandbox
        .world()
        .query::<(&TransientBody, &Transform, &Motion)>()
        .iter()
    {
        if body.stuck || !motion.use_gravity {
            continue;
        }
        let mut velocity = motion.velocity;
        velocity.y += DEFAULT_GRAVITY * dt;
        let travel = velocity * dt;
        let distance = travel.length();
        if distance <= f64::EPSILON {
            continue;
        }

        match sandbox.raycast(transform.position, travel, distance, TRANSIENT_HIT_MASK) {
            Some(hit) => {
                let other = (hit.hit != sandbox.ground_id()).then_some(hit.hit);
                moves.push((
                    entity,
                    hit.point,
                    DVec3::ZERO,
                    Some(Contact {
                        other,
                        point: hit.point,
                    }),
                ));
            }
            None => moves.push((entity, transform.position + travel, velocity, None)),
        }
    }

    for (_entity, body) in sandbox.world_mut().query_mut::<&mut TransientBody>() {
        body.age_secs += dt;
    }

    let world = sandbox.world_mut();
    for (entity, position, velocity, contact) in moves {
        if let Ok(mut transform) = world.get::<&mut Transform>(entity) {
            transform.position = position;
        }
        if let Ok(mut motion) = world.get::<&mut Motion>(entity) {
            motion.velocity = velocity;
        }
        if let (Some(contact), Ok(mut body)) = (contact, world.get::<&mut TransientBody>(entity)) {
            body.stuck = true;
            if body.contact.is_none() {
                body.contact = Some(contact);
            }
        }
    }
}

/// Record agent trail points.
/// Only records a point every TRAIL_INTERVAL_TICKS ticks.
pub fn update_trails(sandbox: &mut SandboxWorld, fixed_tick: u64) {
    if fixed_tick == 0 || fixed_tick % TRAIL_INTERVAL_TICKS != 0 {
        return;
    }

    for (_entity, (transform, trail)) in sandbox
        .world_mut()
        .query_mut::<(&Transform, &mut Trail)>()
    {
        trail.points.insert(0, transform.position);
        trail.points.truncate(MAX_TRAIL_POINTS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DQuat;
    use outrider_core::types::PrefabRef;
    use outrider_core::world::{MovementCommands, TransientObjects};
    use outrider_terrain::{TerrainGrid, TerrainHeader};

    fn make_sandbox() -> SandboxWorld {
        SandboxWorld::new(TerrainGrid::flat(TerrainHeader::centered(61, 2.0), 0.0))
    }

    #[test]
    fn test_agent_walks_forward() {
        let mut sandbox = make_sandbox();
        let agent = sandbox.spawn_agent(DVec3::ZERO, 0.0);
        sandbox.set_input(agent, AgentInput { move_axis: glam::DVec2::new(0.0, 1.0) });
        for _ in 0..50 {
            integrate_agents(&mut sandbox, &BTreeSet::new(), 0.02);
        }
        let position = sandbox.transform(agent).unwrap().position;
        assert!((position.z - AGENT_WALK_SPEED).abs() < 1e-6, "Agent should walk 6m in 1s, got {}", position.z);
        assert_eq!(position.y, 0.0, "Agent should stay on flat ground");
    }

    #[test]
    fn test_frozen_agent_not_integrated() {
        let mut sandbox = make_sandbox();
        let agent = sandbox.spawn_agent(DVec3::ZERO, 0.0);
        sandbox.set_input(agent, AgentInput { move_axis: glam::DVec2::new(1.0, 0.0) });
        let frozen: BTreeSet<EntityId> = [agent].into_iter().collect();
        integrate_agents(&mut sandbox, &frozen, 0.02);
        assert_eq!(sandbox.transform(agent).unwrap().position, DVec3::ZERO);
    }

    #[test]
    fn test_agent_falls_to_ground() {
        let mut sandbox = make_sandbox();
        let agent = sandbox.spawn_agent(DVec3::ZERO, 0.0);
        sandbox.set_transform(agent, DVec3::new(0.0, 3.0, 0.0), DQuat::IDENTITY);
        for _ in 0..100 {
            integrate_agents(&mut sandbox, &BTreeSet::new(), 0.02);
        }
        assert_eq!(sandbox.transform(agent).unwrap().position.y, 0.0);
    }

    #[test]
    fn test_thrown_transient_lands_and_records_contact() {
        let mut sandbox = make_sandbox();
        let prefab = PrefabRef::new("translocator_beacon");
        let beacon = sandbox.spawn(&prefab, DVec3::new(0.0, 1.6, 0.0), DQuat::IDENTITY);
        sandbox.apply_impulse(beacon, DVec3::Z * 10.0);
        for _ in 0..100 {
            integrate_transients(&mut sandbox, 0.02);
        }
        let contact = sandbox.contact(beacon).expect("Beacon should have landed");
        assert_eq!(contact.other, None, "Bare terrain has no entity");
        let position = sandbox.transform(beacon).unwrap().position;
        assert!(position.y.abs() < 0.05, "Beacon should rest on the ground, got y={}", position.y);
        assert!(position.z > 3.0, "Beacon should have flown forward, got z={}", position.z);
    }

    #[test]
    fn test_transient_sticks_in_enemy() {
        let mut sandbox = make_sandbox();
        let enemy = sandbox.spawn_enemy(DVec3::new(0.0, 0.0, 3.0));
        let prefab = PrefabRef::new("jagged_blade");
        let blade = sandbox.spawn(&prefab, DVec3::new(0.0, 0.8, 0.0), DQuat::IDENTITY);
        sandbox.apply_impulse(blade, DVec3::Z * 20.0);
        for _ in 0..20 {
            integrate_transients(&mut sandbox, 0.02);
        }
        let contact = sandbox.contact(blade).expect("Blade should hit the enemy");
        assert_eq!(contact.other, Some(enemy));
    }

    #[test]
    fn test_enemy_friction_stops_slide() {
        let mut sandbox = make_sandbox();
        let enemy = sandbox.spawn_enemy(DVec3::ZERO);
        sandbox.set_velocity(enemy, DVec3::X * 5.0);
        for _ in 0..250 {
            integrate_enemies(&mut sandbox, 0.02);
        }
        let entity = crate::sandbox::entity_of(enemy).unwrap();
        let velocity = sandbox.world().get::<&Motion>(entity).unwrap().velocity;
        assert!(velocity.x.abs() < 0.01, "Friction should stop the slide, got {}", velocity.x);
        assert!(sandbox.transform(enemy).unwrap().position.x > 0.5);
    }

    #[test]
    fn test_chilled_enemy_slides_slower() {
        let mut sandbox = make_sandbox();
        let free = sandbox.spawn_enemy(DVec3::new(0.0, 0.0, 0.0));
        let chilled = sandbox.spawn_enemy(DVec3::new(0.0, 0.0, 10.0));
        sandbox.set_speed_scale(chilled, 0.25);
        for id in [free, chilled] {
            sandbox.set_velocity(id, DVec3::X * 4.0);
        }
        integrate_enemies(&mut sandbox, 0.02);
        let free_x = sandbox.transform(free).unwrap().position.x;
        let chilled_x = sandbox.transform(chilled).unwrap().position.x;
        assert!((chilled_x - free_x * 0.25).abs() < 1e-9, "free {free_x}, chilled {chilled_x}");

        sandbox.set_speed_scale(chilled, 1.0);
        let entity = crate::sandbox::entity_of(chilled).unwrap();
        assert!(sandbox.world().get::<&Chill>(entity).is_err(), "Full speed clears the chill");
    }

    #[test]
    fn test_trail_interval() {
        let mut sandbox = make_sandbox();
        let agent = sandbox.spawn_agent(DVec3::ZERO, 0.0);
        for tick in 1..=TRAIL_INTERVAL_TICKS * 3 {
            update_trails(&mut sandbox, tick);
        }
        let entity = crate::sandbox::entity_of(agent).unwrap();
        assert_eq!(sandbox.world().get::<&Trail>(entity).unwrap().points.len(), 3);
    }
}
