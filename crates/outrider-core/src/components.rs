//! ECS components for the sandbox world's hecs entities.
//!
//! Components are plain data. Behaviour lives in the sim crate's systems
//! and in the collaborator implementations.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::types::{Contact, LayerMask, PrefabRef};

/// Marks a controllable agent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Agent {
    /// Vertical speed accumulated from gravity (m/s).
    pub vertical_velocity: f64,
    pub grounded: bool,
}

/// Marks a hostile target.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Enemy;

/// Marks static level geometry.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Obstacle;

/// Sphere collider.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Collider {
    pub radius: f64,
    pub layer: LayerMask,
}

/// Rigid-body velocity for enemies and thrown transients.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Motion {
    pub velocity: DVec3,
    pub use_gravity: bool,
}

/// Slowed movement. Enemies without one move at full speed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Chill {
    /// Fraction of normal horizontal speed, in [0, 1].
    pub speed_scale: f64,
}

/// Health pool. Clamped to `[0, max_health]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f64,
    pub max_health: f64,
}

/// An object spawned on an ability's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransientBody {
    pub prefab: PrefabRef,
    pub age_secs: f64,
    /// First thing the body touched, if anything.
    pub contact: Option<Contact>,
    /// Stuck bodies stop integrating until an ability moves them.
    pub stuck: bool,
}

/// Recent agent positions, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trail {
    pub points: Vec<DVec3>,
}
