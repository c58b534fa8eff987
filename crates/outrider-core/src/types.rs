//! Fundamental geometric and identity types.
//!
//! World space is y-up. An entity's forward axis is its local +Z and its
//! right axis is local +X.

use glam::{DQuat, DVec2, DVec3};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FIELD_OF_VIEW_DEG, DEFAULT_GRAVITY, DEFAULT_SPEED_MULTIPLIER};
use crate::enums::{CameraRig, OverrideKind};

/// Stable identity of anything in the world: agents, enemies, obstacles, transients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// Identity of a UI widget owned by the external UI layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WidgetId(pub u64);

/// Authoring-time reference to a spawnable asset (projectile, marker, widget).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabRef(pub String);

impl PrefabRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Bit set of collision layers used to filter physics queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);

    pub const GROUND: LayerMask = LayerMask(1 << 0);
    pub const OBSTACLE: LayerMask = LayerMask(1 << 1);
    pub const ENEMY: LayerMask = LayerMask(1 << 2);
    pub const AGENT: LayerMask = LayerMask(1 << 3);
    pub const TRANSIENT: LayerMask = LayerMask(1 << 4);

    /// Everything that blocks movement.
    pub const SOLID: LayerMask = LayerMask((1 << 0) | (1 << 1));

    pub fn contains(self, other: LayerMask) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: LayerMask) -> LayerMask {
        LayerMask(self.0 | other.0)
    }
}

/// Position and orientation of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: DVec3,
    pub orientation: DQuat,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
        }
    }
}

impl Transform {
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Facing direction (unit length).
    pub fn forward(&self) -> DVec3 {
        self.orientation * DVec3::Z
    }

    pub fn right(&self) -> DVec3 {
        self.orientation * DVec3::X
    }

    pub fn up(&self) -> DVec3 {
        self.orientation * DVec3::Y
    }

    /// Forward projected onto the ground plane. Falls back to world +Z when
    /// the entity looks straight up or down.
    pub fn flat_forward(&self) -> DVec3 {
        let f = self.forward();
        DVec3::new(f.x, 0.0, f.z).try_normalize().unwrap_or(DVec3::Z)
    }

    /// Angle in degrees between the forward axis and the direction to `point`.
    pub fn angle_to(&self, point: DVec3) -> f64 {
        let to = point - self.position;
        if to.length_squared() <= f64::EPSILON {
            return 0.0;
        }
        self.forward().angle_between(to).to_degrees()
    }
}

/// First hit reported by a raycast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RayHit {
    pub distance: f64,
    pub hit: EntityId,
    pub point: DVec3,
}

/// First contact recorded for a transient object since it was spawned.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    /// The entity touched, or None for bare terrain.
    pub other: Option<EntityId>,
    pub point: DVec3,
}

/// Per-frame control input for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentInput {
    /// Strafe (x) and forward (y) axes, each in [-1, 1].
    pub move_axis: DVec2,
}

/// Agent movement parameters that abilities may temporarily override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentParams {
    pub speed_multiplier: f64,
    /// Vertical acceleration (m/s², negative is down).
    pub gravity: f64,
    /// Camera vertical field of view in degrees.
    pub field_of_view: f64,
    pub controller_enabled: bool,
    pub camera: CameraRig,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            speed_multiplier: DEFAULT_SPEED_MULTIPLIER,
            gravity: DEFAULT_GRAVITY,
            field_of_view: DEFAULT_FIELD_OF_VIEW_DEG,
            controller_enabled: true,
            camera: CameraRig::default(),
        }
    }
}

/// A single overridable parameter value, tagged with the parameter it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    SpeedMultiplier(f64),
    Gravity(f64),
    FieldOfView(f64),
    MovementController(bool),
    Camera(CameraRig),
}

impl ParamValue {
    pub fn kind(&self) -> OverrideKind {
        match self {
            ParamValue::SpeedMultiplier(_) => OverrideKind::SpeedMultiplier,
            ParamValue::Gravity(_) => OverrideKind::Gravity,
            ParamValue::FieldOfView(_) => OverrideKind::FieldOfView,
            ParamValue::MovementController(_) => OverrideKind::MovementController,
            ParamValue::Camera(_) => OverrideKind::Camera,
        }
    }
}

impl AgentParams {
    /// Current value of a parameter. `Transform` is exclusive-only and has no value.
    pub fn get(&self, kind: OverrideKind) -> Option<ParamValue> {
        match kind {
            OverrideKind::Transform => None,
            OverrideKind::SpeedMultiplier => Some(ParamValue::SpeedMultiplier(self.speed_multiplier)),
            OverrideKind::Gravity => Some(ParamValue::Gravity(self.gravity)),
            OverrideKind::FieldOfView => Some(ParamValue::FieldOfView(self.field_of_view)),
            OverrideKind::MovementController => {
                Some(ParamValue::MovementController(self.controller_enabled))
            }
            OverrideKind::Camera => Some(ParamValue::Camera(self.camera)),
        }
    }

    pub fn set(&mut self, value: ParamValue) {
        match value {
            ParamValue::SpeedMultiplier(v) => self.speed_multiplier = v,
            ParamValue::Gravity(v) => self.gravity = v,
            ParamValue::FieldOfView(v) => self.field_of_view = v,
            ParamValue::MovementController(v) => self.controller_enabled = v,
            ParamValue::Camera(v) => self.camera = v,
        }
    }
}
