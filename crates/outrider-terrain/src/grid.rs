//! TerrainGrid: heightfield with elevation queries.

use glam::DVec3;

/// Terrain grid header metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainHeader {
    /// World x of the first column (meters).
    pub origin_x: f64,
    /// World z of the first row (meters).
    pub origin_z: f64,
    /// Meters per grid cell.
    pub cell_size: f64,
    /// Number of columns (along +x).
    pub width: u32,
    /// Number of rows (along +z).
    pub depth: u32,
}

impl TerrainHeader {
    /// Header for a square grid of `cells` per side centered on the world origin.
    pub fn centered(cells: u32, cell_size: f64) -> Self {
        let half = (cells.saturating_sub(1)) as f64 * cell_size / 2.0;
        Self {
            origin_x: -half,
            origin_z: -half,
            cell_size,
            width: cells,
            depth: cells,
        }
    }

    /// Far x edge (meters).
    pub fn max_x(&self) -> f64 {
        self.origin_x + self.width.saturating_sub(1) as f64 * self.cell_size
    }

    /// Far z edge (meters).
    pub fn max_z(&self) -> f64 {
        self.origin_z + self.depth.saturating_sub(1) as f64 * self.cell_size
    }
}

/// Heightfield sampled at grid vertices.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    pub header: TerrainHeader,
    /// Elevation values in meters, row-major (z rows, x columns).
    pub elevations: Vec<f64>,
    min_elevation: f64,
    max_elevation: f64,
}

impl TerrainGrid {
    /// Create a TerrainGrid from pre-computed elevations.
    ///
    /// Missing samples read as zero; extra samples are ignored.
    pub fn new(header: TerrainHeader, mut elevations: Vec<f64>) -> Self {
        elevations.resize(header.width as usize * header.depth as usize, 0.0);
        let (min_elevation, max_elevation) = elevations
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &e| {
                (lo.min(e), hi.max(e))
            });
        Self {
            header,
            elevations,
            min_elevation: if min_elevation.is_finite() { min_elevation } else { 0.0 },
            max_elevation: if max_elevation.is_finite() { max_elevation } else { 0.0 },
        }
    }

    /// Flat grid at a constant elevation.
    pub fn flat(header: TerrainHeader, elevation: f64) -> Self {
        let n = header.width as usize * header.depth as usize;
        Self::new(header, vec![elevation; n])
    }

    /// Build a grid by sampling `f(x, z)` at every vertex.
    pub fn from_fn(header: TerrainHeader, mut f: impl FnMut(f64, f64) -> f64) -> Self {
        let mut elevations = Vec::with_capacity(header.width as usize * header.depth as usize);
        for row in 0..header.depth {
            for col in 0..header.width {
                let x = header.origin_x + col as f64 * header.cell_size;
                let z = header.origin_z + row as f64 * header.cell_size;
                elevations.push(f(x, z));
            }
        }
        Self::new(header, elevations)
    }

    pub fn min_elevation(&self) -> f64 {
        self.min_elevation
    }

    pub fn max_elevation(&self) -> f64 {
        self.max_elevation
    }

    /// Convert world x/z to grid row/col (fractional).
    /// Returns None if outside grid bounds.
    fn world_to_grid(&self, x: f64, z: f64) -> Option<(f64, f64)> {
        let h = &self.header;
        if h.width == 0 || h.depth == 0 || h.cell_size <= 0.0 {
            return None;
        }
        let col = (x - h.origin_x) / h.cell_size;
        let row = (z - h.origin_z) / h.cell_size;

        let max_col = (h.width - 1) as f64;
        let max_row = (h.depth - 1) as f64;
        if !(0.0..=max_col).contains(&col) || !(0.0..=max_row).contains(&row) {
            return None;
        }
        Some((row, col))
    }

    /// Get raw elevation at integer grid coordinates.
    fn raw_elevation(&self, row: usize, col: usize) -> f64 {
        let h = &self.header;
        if row >= h.depth as usize || col >= h.width as usize {
            return 0.0;
        }
        self.elevations[row * h.width as usize + col]
    }

    /// Elevation below a world position with bilinear interpolation.
    /// Returns None if the position is outside the grid.
    pub fn elevation_at(&self, point: DVec3) -> Option<f64> {
        let (row, col) = self.world_to_grid(point.x, point.z)?;
        Some(self.bilinear(row, col))
    }

    /// Whether a world position lies over the grid.
    pub fn contains(&self, point: DVec3) -> bool {
        self.world_to_grid(point.x, point.z).is_some()
    }

    /// Bilinear interpolation at fractional row/col.
    fn bilinear(&self, row: f64, col: f64) -> f64 {
        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.header.depth as usize - 1);
        let c1 = (c0 + 1).min(self.header.width as usize - 1);

        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let e00 = self.raw_elevation(r0, c0);
        let e01 = self.raw_elevation(r0, c1);
        let e10 = self.raw_elevation(r1, c0);
        let e11 = self.raw_elevation(r1, c1);

        let near = e00 * (1.0 - fc) + e01 * fc;
        let far = e10 * (1.0 - fc) + e11 * fc;
        near * (1.0 - fr) + far * fr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5×5 grid, 1m cells, centered on the origin, with a 10m peak in the middle.
    fn make_test_grid() -> TerrainGrid {
        #[rustfmt::skip]
        let elevations = vec![
            0.0, 0.0,  0.0, 0.0, 0.0,
            0.0, 5.0,  5.0, 5.0, 0.0,
            0.0, 5.0, 10.0, 5.0, 0.0,
            0.0, 5.0,  5.0, 5.0, 0.0,
            0.0, 0.0,  0.0, 0.0, 0.0,
        ];
        TerrainGrid::new(TerrainHeader::centered(5, 1.0), elevations)
    }

    #[test]
    fn test_elevation_query_center() {
        let grid = make_test_grid();
        let e = grid.elevation_at(DVec3::ZERO).expect("Origin should be within grid");
        assert!((e - 10.0).abs() < 1e-9, "Peak elevation should be 10m, got {e}");
    }

    #[test]
    fn test_elevation_query_edges() {
        let grid = make_test_grid();
        assert!(grid.elevation_at(DVec3::new(2.0, 0.0, -2.0)).is_some(), "Corner vertex is inside");
        assert!(
            grid.elevation_at(DVec3::new(2.01, 0.0, 0.0)).is_none(),
            "Past the last column should be outside grid"
        );
        assert!(grid.elevation_at(DVec3::new(0.0, 0.0, -40.0)).is_none());
    }

    #[test]
    fn test_elevation_bilinear_interpolation() {
        let grid = make_test_grid();
        // Halfway between the ring (5m) and the peak (10m).
        let e = grid.elevation_at(DVec3::new(0.0, 0.0, 0.5)).unwrap();
        assert!((e - 7.5).abs() < 1e-9, "Interpolated elevation should be 7.5m, got {e}");
        // Query height is ignored.
        assert_eq!(grid.elevation_at(DVec3::new(0.0, 99.0, 0.5)), Some(e));
    }

    #[test]
    fn test_from_fn_samples_world_coordinates() {
        let grid = TerrainGrid::from_fn(TerrainHeader::centered(3, 2.0), |x, z| x + 10.0 * z);
        assert_eq!(grid.elevation_at(DVec3::new(-2.0, 0.0, -2.0)), Some(-22.0));
        assert_eq!(grid.elevation_at(DVec3::new(2.0, 0.0, 2.0)), Some(22.0));
        assert_eq!(grid.min_elevation(), -22.0);
        assert_eq!(grid.max_elevation(), 22.0);
    }

    #[test]
    fn test_short_elevation_data_padded() {
        let grid = TerrainGrid::new(TerrainHeader::centered(4, 1.0), vec![3.0; 5]);
        assert_eq!(grid.elevations.len(), 16);
        assert_eq!(grid.min_elevation(), 0.0);
    }
}
