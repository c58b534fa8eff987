//! Ray traversal against the heightfield.
//!
//! Steps along the ray at a fraction of the cell size and compares the ray
//! height against the terrain below each sample. The first crossing is
//! refined by bisection.

use glam::DVec3;

use crate::grid::TerrainGrid;

/// Samples per grid cell along a ray.
const SAMPLES_PER_CELL: f64 = 4.0;

/// Bisection passes used to refine a crossing.
const REFINE_STEPS: usize = 12;

/// Height of the ray above the terrain at `point`. None off the grid.
fn clearance(grid: &TerrainGrid, point: DVec3) -> Option<f64> {
    grid.elevation_at(point).map(|e| point.y - e)
}

/// Distance along `direction` to the first terrain crossing within
/// `max_distance`, or None if the ray stays above ground (or leaves the grid).
///
/// A ray that starts below the surface reports a hit at distance zero.
pub fn raycast_terrain(
    grid: &TerrainGrid,
    origin: DVec3,
    direction: DVec3,
    max_distance: f64,
) -> Option<f64> {
    let dir = direction.try_normalize()?;
    if max_distance.is_nan() || max_distance <= 0.0 {
        return None;
    }
    if clearance(grid, origin).is_some_and(|c| c < 0.0) {
        return Some(0.0);
    }

    let step = (grid.header.cell_size / SAMPLES_PER_CELL).max(1e-3);
    let num_samples = (max_distance / step).ceil().max(1.0) as usize;

    let mut prev_t = 0.0;
    for i in 1..=num_samples {
        let t = (i as f64 * step).min(max_distance);
        let below = clearance(grid, origin + dir * t).is_some_and(|c| c <= 0.0);
        if below {
            // Bisect between the last clear sample and this one.
            let (mut lo, mut hi) = (prev_t, t);
            for _ in 0..REFINE_STEPS {
                let mid = 0.5 * (lo + hi);
                if clearance(grid, origin + dir * mid).is_some_and(|c| c <= 0.0) {
                    hi = mid;
                } else {
                    lo = mid;
                }
            }
            return Some(hi);
        }
        prev_t = t;
    }
    None
}

/// Check line-of-sight between two world points.
///
/// Returns true if no terrain lies between `from` and `to`.
pub fn has_line_of_sight(grid: &TerrainGrid, from: DVec3, to: DVec3) -> bool {
    let delta = to - from;
    let distance = delta.length();
    if distance <= f64::EPSILON {
        return true;
    }
    raycast_terrain(grid, from, delta, distance).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TerrainHeader;

    /// Create a flat terrain grid (all elevation = 0).
    fn make_flat_grid() -> TerrainGrid {
        TerrainGrid::flat(TerrainHeader::centered(101, 2.0), 0.0)
    }

    /// Create a grid with a 20m wall across z = 0.
    fn make_ridge_grid() -> TerrainGrid {
        TerrainGrid::from_fn(TerrainHeader::centered(101, 2.0), |_, z| {
            if z.abs() <= 2.0 {
                20.0
            } else {
                0.0
            }
        })
    }

    #[test]
    fn test_downward_ray_hits_ground() {
        let grid = make_flat_grid();
        let d = raycast_terrain(&grid, DVec3::new(3.0, 5.0, -7.0), DVec3::NEG_Y, 10.0)
            .expect("Ray straight down should hit flat ground");
        assert!((d - 5.0).abs() < 1e-2, "Hit distance should be ~5m, got {d}");
    }

    #[test]
    fn test_ray_out_of_range() {
        let grid = make_flat_grid();
        assert!(raycast_terrain(&grid, DVec3::new(0.0, 5.0, 0.0), DVec3::NEG_Y, 4.0).is_none());
        assert!(raycast_terrain(&grid, DVec3::new(0.0, 5.0, 0.0), DVec3::Y, 50.0).is_none());
    }

    #[test]
    fn test_start_below_ground() {
        let grid = make_flat_grid();
        assert_eq!(
            raycast_terrain(&grid, DVec3::new(0.0, -1.0, 0.0), DVec3::X, 10.0),
            Some(0.0)
        );
    }

    #[test]
    fn test_los_flat_terrain() {
        let grid = make_flat_grid();
        let from = DVec3::new(0.0, 2.0, -40.0);
        let to = DVec3::new(0.0, 2.0, 40.0);
        assert!(has_line_of_sight(&grid, from, to), "LOS should be clear on flat terrain");
    }

    #[test]
    fn test_los_blocked_by_ridge() {
        let grid = make_ridge_grid();
        let from = DVec3::new(0.0, 2.0, -40.0);
        let to = DVec3::new(0.0, 2.0, 40.0);
        assert!(!has_line_of_sight(&grid, from, to), "LOS should be blocked by the 20m ridge");
    }

    #[test]
    fn test_los_over_ridge() {
        let grid = make_ridge_grid();
        let from = DVec3::new(0.0, 50.0, -40.0);
        let to = DVec3::new(0.0, 50.0, 40.0);
        assert!(has_line_of_sight(&grid, from, to), "LOS should be clear at 50m over the ridge");
    }

    #[test]
    fn test_los_same_point() {
        let grid = make_ridge_grid();
        let p = DVec3::new(0.0, 1.0, 0.0);
        assert!(has_line_of_sight(&grid, p, p));
    }
}
