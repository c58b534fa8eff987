//! Sandbox world: the collaborator traits implemented over a hecs world.
//!
//! Every collider is a sphere. Agents are positioned by their feet and
//! their sphere sits at body-center height; everything else is positioned
//! by its sphere center. Terrain is a heightfield owned alongside the ECS
//! and reported in hits as a single ground entity.

use std::collections::{BTreeMap, BTreeSet};

use glam::{DQuat, DVec3, EulerRot};
use hecs::{Entity, World};
use tracing::debug;

use outrider_core::components::*;
use outrider_core::constants::{AGENT_CENTER_HEIGHT, AGENT_RADIUS, ENEMY_MAX_HEALTH, ENEMY_RADIUS, TRANSIENT_RADIUS};
use outrider_core::types::{
    AgentInput, AgentParams, Contact, EntityId, LayerMask, ParamValue, PrefabRef, RayHit, Transform, WidgetId,
};
use outrider_core::world::{DamageSink, Damageable, MovementCommands, PhysicsQueries, TransientObjects, UiSink};
use outrider_terrain::{raycast_terrain, TerrainGrid};

/// Engine-facing id of a hecs entity.
pub fn id_of(entity: Entity) -> EntityId {
    EntityId(entity.to_bits().get())
}

/// hecs entity behind an engine-facing id.
pub fn entity_of(id: EntityId) -> Option<Entity> {
    Entity::from_bits(id.0)
}

/// A UI element created through `UiSink`.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub prefab: PrefabRef,
    pub anchor: Option<EntityId>,
    pub fill: f64,
    pub visible: bool,
}

pub struct SandboxWorld {
    world: World,
    terrain: TerrainGrid,
    ground: Entity,
    widgets: BTreeMap<WidgetId, Widget>,
    next_widget: u64,
}

/// Distance along a unit ray to a sphere's surface. None if the origin is inside.
fn ray_sphere(origin: DVec3, dir: DVec3, center: DVec3, radius: f64) -> Option<f64> {
    let oc = origin - center;
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        return None;
    }
    let b = oc.dot(dir);
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Sphere center of a collider on an entity with the given transform.
pub fn collider_center(transform: &Transform, is_agent: bool) -> DVec3 {
    if is_agent {
        transform.position + DVec3::Y * AGENT_CENTER_HEIGHT
    } else {
        transform.position
    }
}

impl SandboxWorld {
    pub fn new(terrain: TerrainGrid) -> Self {
        let mut world = World::new();
        let ground = world.spawn((Collider {
            radius: 0.0,
            layer: LayerMask::GROUND,
        },));
        Self {
            world,
            terrain,
            ground,
            widgets: BTreeMap::new(),
            next_widget: 0,
        }
    }

    /// Read-only access to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// The ECS world and the terrain, borrowed together.
    pub(crate) fn split_mut(&mut self) -> (&mut World, &TerrainGrid) {
        (&mut self.world, &self.terrain)
    }

    pub fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    /// Id reported for terrain hits.
    pub fn ground_id(&self) -> EntityId {
        id_of(self.ground)
    }

    /// Terrain height at `point`, or zero off the grid.
    pub fn ground_or_zero(&self, point: DVec3) -> f64 {
        self.terrain.elevation_at(point).unwrap_or(0.0)
    }

    /// Spawn an agent standing on the ground at `position`.
    pub fn spawn_agent(&mut self, position: DVec3, yaw: f64) -> EntityId {
        let position = DVec3::new(position.x, self.ground_or_zero(position), position.z);
        let entity = self.world.spawn((
            Agent {
                vertical_velocity: 0.0,
                grounded: true,
            },
            Transform::new(position, DQuat::from_rotation_y(yaw)),
            AgentParams::default(),
            AgentInput::default(),
            Collider {
                radius: AGENT_RADIUS,
                layer: LayerMask::AGENT,
            },
            Trail::default(),
        ));
        id_of(entity)
    }

    /// Spawn an enemy resting on the ground below `position`.
    pub fn spawn_enemy(&mut self, position: DVec3) -> EntityId {
        let y = self.ground_or_zero(position) + ENEMY_RADIUS;
        let entity = self.world.spawn((
            Enemy,
            Transform::from_position(DVec3::new(position.x, y, position.z)),
            Collider {
                radius: ENEMY_RADIUS,
                layer: LayerMask::ENEMY,
            },
            Motion {
                velocity: DVec3::ZERO,
                use_gravity: true,
            },
            Vitals {
                health: ENEMY_MAX_HEALTH,
                max_health: ENEMY_MAX_HEALTH,
            },
        ));
        id_of(entity)
    }

    /// Spawn a static obstacle whose sphere rests on the ground.
    pub fn spawn_obstacle(&mut self, position: DVec3, radius: f64) -> EntityId {
        let y = self.ground_or_zero(position) + radius;
        let entity = self.world.spawn((
            Obstacle,
            Transform::from_position(DVec3::new(position.x, y, position.z)),
            Collider {
                radius,
                layer: LayerMask::OBSTACLE,
            },
        ));
        id_of(entity)
    }

    /// Remove any entity. Returns whether it existed.
    pub fn despawn(&mut self, id: EntityId) -> bool {
        match entity_of(id) {
            Some(entity) if entity != self.ground => self.world.despawn(entity).is_ok(),
            _ => false,
        }
    }

    pub fn input(&self, agent: EntityId) -> AgentInput {
        entity_of(agent)
            .and_then(|e| self.world.get::<&AgentInput>(e).ok().map(|i| *i))
            .unwrap_or_default()
    }

    pub fn set_input(&mut self, agent: EntityId, input: AgentInput) -> bool {
        let Some(entity) = entity_of(agent) else {
            return false;
        };
        match self.world.get::<&mut AgentInput>(entity) {
            Ok(mut current) => {
                *current = input;
                true
            }
            Err(_) => false,
        }
    }

    /// Point an agent's view: yaw about +Y, positive pitch looks up.
    pub fn set_look(&mut self, agent: EntityId, yaw: f64, pitch: f64) -> bool {
        let Some(entity) = entity_of(agent) else {
            return false;
        };
        if self.world.get::<&Agent>(entity).is_err() {
            return false;
        }
        match self.world.get::<&mut Transform>(entity) {
            Ok(mut transform) => {
                let pitch = pitch.clamp(-1.5, 1.5);
                transform.orientation = DQuat::from_euler(EulerRot::YXZ, yaw, -pitch, 0.0);
                true
            }
            Err(_) => false,
        }
    }

    pub fn vitals(&self, id: EntityId) -> Option<Vitals> {
        entity_of(id).and_then(|e| self.world.get::<&Vitals>(e).ok().map(|v| *v))
    }

    pub fn widget(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(&id)
    }

    /// All live widgets in creation order.
    pub fn widgets(&self) -> impl Iterator<Item = (WidgetId, &Widget)> {
        self.widgets.iter().map(|(id, w)| (*id, w))
    }

    fn is_transient(&self, entity: Entity) -> bool {
        self.world.get::<&TransientBody>(entity).is_ok()
    }
}

impl PhysicsQueries for SandboxWorld {
    fn raycast(
        &self,
        origin: DVec3,
        direction: DVec3,
        max_distance: f64,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let dir = direction.try_normalize()?;
        if max_distance.is_nan() || max_distance <= 0.0 {
            return None;
        }

        let mut best: Option<RayHit> = None;
        for (entity, (transform, collider, agent)) in self
            .world
            .query::<(&Transform, &Collider, Option<&Agent>)>()
            .iter()
        {
            if !mask.contains(collider.layer) {
                continue;
            }
            let center = collider_center(transform, agent.is_some());
            let Some(t) = ray_sphere(origin, dir, center, collider.radius) else {
                continue;
            };
            if t <= max_distance && best.map_or(true, |b| t < b.distance) {
                best = Some(RayHit {
                    distance: t,
                    hit: id_of(entity),
                    point: origin + dir * t,
                });
            }
        }

        if mask.contains(LayerMask::GROUND) {
            if let Some(t) = raycast_terrain(&self.terrain, origin, dir, max_distance) {
                if best.map_or(true, |b| t < b.distance) {
                    best = Some(RayHit {
                        distance: t,
                        hit: id_of(self.ground),
                        point: origin + dir * t,
                    });
                }
            }
        }
        best
    }

    fn overlap_sphere(&self, origin: DVec3, radius: f64, mask: LayerMask) -> BTreeSet<EntityId> {
        self.world
            .query::<(&Transform, &Collider, Option<&Agent>)>()
            .iter()
            .filter(|(_, (_, collider, _))| mask.contains(collider.layer))
            .filter(|(_, (transform, collider, agent))| {
                collider_center(transform, agent.is_some()).distance(origin) <= radius + collider.radius
            })
            .map(|(entity, _)| id_of(entity))
            .collect()
    }

    fn ground_height(&self, point: DVec3) -> Option<f64> {
        self.terrain.elevation_at(point)
    }

    fn transform(&self, entity: EntityId) -> Option<Transform> {
        let entity = entity_of(entity)?;
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    fn layer(&self, entity: EntityId) -> LayerMask {
        entity_of(entity)
            .and_then(|e| self.world.get::<&Collider>(e).ok().map(|c| c.layer))
            .unwrap_or(LayerMask::NONE)
    }

    fn contact(&self, entity: EntityId) -> Option<Contact> {
        let entity = entity_of(entity)?;
        self.world
            .get::<&TransientBody>(entity)
            .ok()
            .and_then(|body| body.contact)
    }
}

impl MovementCommands for SandboxWorld {
    fn move_by(&mut self, agent: EntityId, delta: DVec3) {
        let Some(entity) = entity_of(agent) else {
            return;
        };
        let Ok(mut transform) = self.world.get::<&mut Transform>(entity) else {
            return;
        };
        let mut position = transform.position + delta;
        if let Some(ground) = self.terrain.elevation_at(position) {
            position.y = position.y.max(ground);
        }
        transform.position = position;
    }

    /// Unit-mass velocity change. A transient that gets thrown starts falling.
    fn apply_impulse(&mut self, entity: EntityId, impulse: DVec3) {
        let Some(entity) = entity_of(entity) else {
            return;
        };
        if let Ok(mut motion) = self.world.get::<&mut Motion>(entity) {
            motion.velocity += impulse;
            if let Ok(mut body) = self.world.get::<&mut TransientBody>(entity) {
                motion.use_gravity = true;
                body.stuck = false;
            }
        }
    }

    fn set_velocity(&mut self, entity: EntityId, velocity: DVec3) {
        let Some(entity) = entity_of(entity) else {
            return;
        };
        if let Ok(mut motion) = self.world.get::<&mut Motion>(entity) {
            motion.velocity = velocity;
        }
    }

    fn set_transform(&mut self, entity: EntityId, position: DVec3, orientation: DQuat) {
        let Some(entity) = entity_of(entity) else {
            return;
        };
        if let Ok(mut transform) = self.world.get::<&mut Transform>(entity) {
            *transform = Transform::new(position, orientation);
        }
        // Placed bodies stay where they were put.
        if let Ok(mut body) = self.world.get::<&mut TransientBody>(entity) {
            body.stuck = true;
        }
        if let Ok(mut agent) = self.world.get::<&mut Agent>(entity) {
            agent.vertical_velocity = 0.0;
        }
    }

    fn params(&self, agent: EntityId) -> Option<AgentParams> {
        let entity = entity_of(agent)?;
        self.world.get::<&AgentParams>(entity).ok().map(|p| *p)
    }

    fn set_param(&mut self, agent: EntityId, value: ParamValue) {
        let Some(entity) = entity_of(agent) else {
            return;
        };
        if let Ok(mut params) = self.world.get::<&mut AgentParams>(entity) {
            params.set(value);
        }
    }

    /// Full speed removes the slow entirely.
    fn set_speed_scale(&mut self, entity: EntityId, scale: f64) {
        let Some(entity) = entity_of(entity) else {
            return;
        };
        if self.world.get::<&Enemy>(entity).is_err() {
            return;
        }
        let scale = if scale.is_nan() { 1.0 } else { scale.clamp(0.0, 1.0) };
        if scale >= 1.0 {
            let _ = self.world.remove_one::<Chill>(entity);
        } else {
            let _ = self.world.insert_one(entity, Chill { speed_scale: scale });
        }
    }
}

impl TransientObjects for SandboxWorld {
    fn spawn(&mut self, prefab: &PrefabRef, position: DVec3, orientation: DQuat) -> EntityId {
        let entity = self.world.spawn((
            TransientBody {
                prefab: prefab.clone(),
                age_secs: 0.0,
                contact: None,
                stuck: false,
            },
            Transform::new(position, orientation),
            Motion {
                velocity: DVec3::ZERO,
                use_gravity: false,
            },
            Collider {
                radius: TRANSIENT_RADIUS,
                layer: LayerMask::TRANSIENT,
            },
        ));
        debug!(prefab = prefab.as_str(), instance = id_of(entity).0, "transient_spawned");
        id_of(entity)
    }

    /// Only transients can be destroyed this way.
    fn destroy(&mut self, instance: EntityId) {
        let Some(entity) = entity_of(instance) else {
            return;
        };
        if self.is_transient(entity) {
            let _ = self.world.despawn(entity);
        } else {
            debug!(instance = instance.0, "destroy_ignored");
        }
    }
}

impl UiSink for SandboxWorld {
    fn create_widget(&mut self, prefab: &PrefabRef, anchor: Option<EntityId>) -> WidgetId {
        self.next_widget += 1;
        let id = WidgetId(self.next_widget);
        self.widgets.insert(
            id,
            Widget {
                prefab: prefab.clone(),
                anchor,
                fill: 0.0,
                visible: true,
            },
        );
        id
    }

    fn remove_widget(&mut self, widget: WidgetId) {
        self.widgets.remove(&widget);
    }

    fn set_fill_amount(&mut self, widget: WidgetId, amount: f64) {
        if let Some(w) = self.widgets.get_mut(&widget) {
            w.fill = if amount.is_nan() { 0.0 } else { amount.clamp(0.0, 1.0) };
        }
    }

    fn set_visible(&mut self, widget: WidgetId, visible: bool) {
        if let Some(w) = self.widgets.get_mut(&widget) {
            w.visible = visible;
        }
    }
}

impl DamageSink for SandboxWorld {
    fn with_damageable(
        &mut self,
        entity: EntityId,
        f: &mut dyn FnMut(&mut dyn Damageable),
    ) -> bool {
        let Some(entity) = entity_of(entity) else {
            return false;
        };
        match self.world.get::<&mut Vitals>(entity) {
            Ok(mut vitals) => {
                f(&mut *vitals);
                true
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use outrider_terrain::TerrainHeader;

    fn make_sandbox() -> SandboxWorld {
        SandboxWorld::new(TerrainGrid::flat(TerrainHeader::centered(61, 2.0), 0.0))
    }

    #[test]
    fn test_id_round_trip() {
        let mut sandbox = make_sandbox();
        let enemy = sandbox.spawn_enemy(DVec3::new(3.0, 0.0, 4.0));
        let entity = entity_of(enemy).expect("Spawned id should map back to an entity");
        assert_eq!(id_of(entity), enemy);
        assert_eq!(sandbox.layer(enemy), LayerMask::ENEMY);
        assert_eq!(sandbox.layer(sandbox.ground_id()), LayerMask::GROUND);
    }

    #[test]
    fn test_raycast_prefers_nearest_and_filters_mask() {
        let mut sandbox = make_sandbox();
        let near = sandbox.spawn_enemy(DVec3::new(0.0, 0.0, 5.0));
        let wall = sandbox.spawn_obstacle(DVec3::new(0.0, 0.0, 10.0), 1.0);
        let origin = DVec3::new(0.0, ENEMY_RADIUS, 0.0);

        let hit = sandbox
            .raycast(origin, DVec3::Z, 20.0, LayerMask::ENEMY.union(LayerMask::OBSTACLE))
            .expect("Ray should hit the enemy");
        assert_eq!(hit.hit, near);
        assert!((hit.distance - (5.0 - ENEMY_RADIUS)).abs() < 1e-9);

        let hit = sandbox
            .raycast(origin, DVec3::Z, 20.0, LayerMask::OBSTACLE)
            .expect("Obstacle mask should skip the enemy");
        assert_eq!(hit.hit, wall);
        assert!(sandbox.raycast(origin, DVec3::Z, 3.0, LayerMask::ALL).is_none());
    }

    #[test]
    fn test_raycast_reports_terrain_as_ground() {
        let sandbox = make_sandbox();
        let hit = sandbox
            .raycast(DVec3::new(1.0, 4.0, 1.0), DVec3::NEG_Y, 10.0, LayerMask::SOLID)
            .expect("Downward ray should hit terrain");
        assert_eq!(hit.hit, sandbox.ground_id());
        assert!((hit.point.y).abs() < 1e-2, "Hit point should be on the ground, got {}", hit.point.y);
    }

    #[test]
    fn test_raycast_ignores_sphere_around_origin() {
        let mut sandbox = make_sandbox();
        let agent = sandbox.spawn_agent(DVec3::ZERO, 0.0);
        let enemy = sandbox.spawn_enemy(DVec3::new(0.0, 0.0, 4.0));
        let center = collider_center(&sandbox.transform(agent).unwrap(), true);
        let hit = sandbox
            .raycast(center, DVec3::Z, 10.0, LayerMask::ALL)
            .expect("Ray from inside the agent should reach the enemy");
        assert_eq!(hit.hit, enemy);
    }

    #[test]
    fn test_overlap_sphere() {
        let mut sandbox = make_sandbox();
        let a = sandbox.spawn_enemy(DVec3::new(5.0, 0.0, 0.0));
        let b = sandbox.spawn_enemy(DVec3::new(0.0, 0.0, 30.0));
        let found = sandbox.overlap_sphere(DVec3::ZERO, 10.0, LayerMask::ENEMY);
        assert!(found.contains(&a));
        assert!(!found.contains(&b));
        assert!(sandbox.overlap_sphere(DVec3::ZERO, 10.0, LayerMask::OBSTACLE).is_empty());
    }

    #[test]
    fn test_vitals_clamped_and_dead_stays_dead() {
        let mut sandbox = make_sandbox();
        let enemy = sandbox.spawn_enemy(DVec3::new(5.0, 0.0, 0.0));
        let lethal = outrider_core::world::deal_damage(&mut sandbox, enemy, 10_000.0);
        assert_eq!(lethal, Some(true));
        assert_eq!(sandbox.vitals(enemy).unwrap().health, 0.0);
        let again = outrider_core::world::deal_damage(&mut sandbox, enemy, 10.0);
        assert_eq!(again, Some(false), "Damage after death should not be lethal again");
        let ground = sandbox.ground_id();
        assert_eq!(outrider_core::world::deal_damage(&mut sandbox, ground, 1.0), None);
    }

    #[test]
    fn test_thrown_transient_falls_placed_one_sticks() {
        let mut sandbox = make_sandbox();
        let prefab = PrefabRef::new("jagged_blade");
        let blade = sandbox.spawn(&prefab, DVec3::new(0.0, 2.0, 0.0), DQuat::IDENTITY);
        let entity = entity_of(blade).unwrap();
        assert!(!sandbox.world().get::<&Motion>(entity).unwrap().use_gravity);

        sandbox.apply_impulse(blade, DVec3::Z * 10.0);
        assert!(sandbox.world().get::<&Motion>(entity).unwrap().use_gravity);

        sandbox.set_transform(blade, DVec3::new(0.0, 1.0, 1.0), DQuat::IDENTITY);
        assert!(sandbox.world().get::<&TransientBody>(entity).unwrap().stuck);
    }

    #[test]
    fn test_destroy_only_removes_transients() {
        let mut sandbox = make_sandbox();
        let enemy = sandbox.spawn_enemy(DVec3::new(5.0, 0.0, 0.0));
        sandbox.destroy(enemy);
        assert!(sandbox.transform(enemy).is_some(), "Enemies are not ability-owned");

        let marker = sandbox.spawn(&PrefabRef::new("heat_silhouette"), DVec3::ZERO, DQuat::IDENTITY);
        sandbox.destroy(marker);
        assert!(sandbox.transform(marker).is_none());
    }

    #[test]
    fn test_widget_fill_clamped() {
        let mut sandbox = make_sandbox();
        let widget = sandbox.create_widget(&PrefabRef::new("lock_circle"), None);
        sandbox.set_fill_amount(widget, 3.0);
        assert_eq!(sandbox.widget(widget).unwrap().fill, 1.0);
        sandbox.set_fill_amount(widget, -1.0);
        assert_eq!(sandbox.widget(widget).unwrap().fill, 0.0);
        sandbox.set_visible(widget, false);
        assert!(!sandbox.widget(widget).unwrap().visible);
        sandbox.remove_widget(widget);
        assert!(sandbox.widget(widget).is_none());
    }

    #[test]
    fn test_move_by_stays_above_ground() {
        let mut sandbox = make_sandbox();
        let agent = sandbox.spawn_agent(DVec3::ZERO, 0.0);
        sandbox.move_by(agent, DVec3::new(1.0, -5.0, 0.0));
        let t = sandbox.transform(agent).unwrap();
        assert_eq!(t.position, DVec3::new(1.0, 0.0, 0.0));
    }
}
