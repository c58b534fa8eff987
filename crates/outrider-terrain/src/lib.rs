//! Terrain for the OUTRIDER sandbox.
//!
//! A regular heightfield with bilinear elevation queries and stepped
//! ray traversal for ground hits and line of sight.

pub mod grid;
pub mod los;

// Re-export key types for convenience.
pub use grid::{TerrainGrid, TerrainHeader};
pub use los::{has_line_of_sight, raycast_terrain};
