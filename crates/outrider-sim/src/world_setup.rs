//! Arena construction: terrain, pillars and enemies placed from a seeded RNG.
//!
//! The ground is flat around the origin and rolls into low hills toward
//! the arena edge. Same seed, same arena.

use glam::DVec3;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use outrider_core::constants::{ARENA_RADIUS, PILLAR_RADIUS, TERRAIN_CELL_SIZE};
use outrider_core::types::EntityId;
use outrider_terrain::{TerrainGrid, TerrainHeader};

use crate::sandbox::SandboxWorld;

/// Radius of the flat plaza around the spawn point (m).
const PLAZA_RADIUS: f64 = 20.0;

/// Distance over which the plaza blends into the hills (m).
const HILL_RAMP: f64 = 20.0;

/// Peak hill height (m).
const HILL_HEIGHT: f64 = 6.0;

/// Spatial frequency of the hills (radians per meter).
const HILL_FREQUENCY: f64 = 0.08;

/// Terrain extends this far past the arena edge (m).
const TERRAIN_MARGIN: f64 = 10.0;

/// Range band for placed pillars (m).
const PILLAR_RANGE: (f64, f64) = (10.0, 40.0);

/// Range band for placed enemies (m).
const ENEMY_RANGE: (f64, f64) = (8.0, 35.0);

/// Build the arena heightfield.
pub fn build_terrain(rng: &mut ChaCha8Rng) -> TerrainGrid {
    let extent = 2.0 * (ARENA_RADIUS + TERRAIN_MARGIN);
    let cells = (extent / TERRAIN_CELL_SIZE).ceil() as u32 + 1;
    let header = TerrainHeader::centered(cells, TERRAIN_CELL_SIZE);

    let phase_x: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let phase_z: f64 = rng.gen_range(0.0..std::f64::consts::TAU);

    TerrainGrid::from_fn(header, |x, z| {
        let range = (x * x + z * z).sqrt();
        let t = ((range - PLAZA_RADIUS) / HILL_RAMP).clamp(0.0, 1.0);
        let blend = t * t * (3.0 - 2.0 * t);
        let wave = 0.5
            + 0.25 * ((x * HILL_FREQUENCY + phase_x).sin() + (z * HILL_FREQUENCY + phase_z).cos());
        HILL_HEIGHT * blend * wave
    })
}

/// Random point on the ground plane at a range inside `band`.
fn random_point(rng: &mut ChaCha8Rng, band: (f64, f64)) -> DVec3 {
    let bearing: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
    let range: f64 = rng.gen_range(band.0..band.1);
    DVec3::new(range * bearing.sin(), 0.0, range * bearing.cos())
}

/// Populate the arena: pillars first, then enemies.
pub fn setup_arena(
    sandbox: &mut SandboxWorld,
    rng: &mut ChaCha8Rng,
    pillar_count: usize,
    enemy_count: usize,
) {
    spawn_pillars(sandbox, rng, pillar_count);
    spawn_enemies(sandbox, rng, enemy_count);
}

pub fn spawn_pillars(sandbox: &mut SandboxWorld, rng: &mut ChaCha8Rng, count: usize) -> Vec<EntityId> {
    (0..count)
        .map(|_| {
            let position = random_point(rng, PILLAR_RANGE);
            sandbox.spawn_obstacle(position, PILLAR_RADIUS)
        })
        .collect()
}

pub fn spawn_enemies(sandbox: &mut SandboxWorld, rng: &mut ChaCha8Rng, count: usize) -> Vec<EntityId> {
    (0..count)
        .map(|_| {
            let position = random_point(rng, ENEMY_RANGE);
            sandbox.spawn_enemy(position)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_terrain_covers_arena_and_plaza_is_flat() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let terrain = build_terrain(&mut rng);
        assert!(terrain.contains(DVec3::new(ARENA_RADIUS, 0.0, 0.0)));
        assert!(terrain.contains(DVec3::new(0.0, 0.0, -ARENA_RADIUS)));
        assert_eq!(terrain.elevation_at(DVec3::ZERO), Some(0.0));
        assert_eq!(terrain.elevation_at(DVec3::new(10.0, 0.0, 10.0)), Some(0.0));
        assert!(terrain.max_elevation() <= HILL_HEIGHT);
    }

    #[test]
    fn test_same_seed_same_terrain() {
        let a = build_terrain(&mut ChaCha8Rng::seed_from_u64(3));
        let b = build_terrain(&mut ChaCha8Rng::seed_from_u64(3));
        assert_eq!(a.elevations, b.elevations);
    }
}
