//! Ability descriptors: immutable, authoring-time configuration.
//!
//! A descriptor is created once (built in or loaded from a loadout file),
//! wrapped in an `Arc`, and shared by every activation of that ability.

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::enums::ReentryPolicy;
use crate::types::{LayerMask, PrefabRef};

/// Static configuration of one ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDescriptor {
    pub name: String,
    #[serde(default)]
    pub icon: Option<PrefabRef>,
    /// Nominal duration of the Active phase. None runs until toggled or resolved.
    #[serde(default)]
    pub duration_secs: Option<f64>,
    pub kind: AbilityKind,
}

/// Ability behaviour and its tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AbilityKind {
    Blink(BlinkTunables),
    Charge(ChargeTunables),
    Dash(DashTunables),
    Boosters(BoosterTunables),
    ThrowAndReturn(ThrowTunables),
    Deadeye(DeadeyeTunables),
    TimedAura(AuraTunables),
    Translocator(TranslocatorTunables),
    Rewind,
    Drone(DroneTunables),
    RushPath(RushPathTunables),
}

impl AbilityKind {
    pub fn reentry(&self) -> ReentryPolicy {
        match self {
            AbilityKind::Charge(_) | AbilityKind::Boosters(_) | AbilityKind::ThrowAndReturn(_) => {
                ReentryPolicy::Toggle
            }
            _ => ReentryPolicy::Reject,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AbilityKind::Blink(_) => "blink",
            AbilityKind::Charge(_) => "charge",
            AbilityKind::Dash(_) => "dash",
            AbilityKind::Boosters(_) => "boosters",
            AbilityKind::ThrowAndReturn(_) => "throw_and_return",
            AbilityKind::Deadeye(_) => "deadeye",
            AbilityKind::TimedAura(_) => "timed_aura",
            AbilityKind::Translocator(_) => "translocator",
            AbilityKind::Rewind => "rewind",
            AbilityKind::Drone(_) => "drone",
            AbilityKind::RushPath(_) => "rush_path",
        }
    }
}

/// Piecewise-constant rate tier for time-accumulated magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSegment {
    /// Elapsed time at which this tier ends. None never ends.
    #[serde(default)]
    pub until_secs: Option<f64>,
    pub rate_per_sec: f64,
}

impl PhaseSegment {
    pub fn bounded(until_secs: f64, rate_per_sec: f64) -> Self {
        Self {
            until_secs: Some(until_secs),
            rate_per_sec,
        }
    }

    pub fn open(rate_per_sec: f64) -> Self {
        Self {
            until_secs: None,
            rate_per_sec,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.until_secs.unwrap_or(f64::INFINITY)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkTunables {
    pub distance: f64,
    pub obstacle_mask: LayerMask,
    pub standoff: f64,
}

impl Default for BlinkTunables {
    fn default() -> Self {
        Self {
            distance: BLINK_DISTANCE,
            obstacle_mask: LayerMask::SOLID,
            standoff: BLINK_STANDOFF,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargeTunables {
    pub speed: f64,
    pub strafe_speed: f64,
    pub turn_rate: f64,
    pub probe_distance: f64,
    pub pin_offset: f64,
    pub collision_damage: f64,
    pub enemy_mask: LayerMask,
    pub obstacle_mask: LayerMask,
}

impl Default for ChargeTunables {
    fn default() -> Self {
        Self {
            speed: CHARGE_SPEED,
            strafe_speed: CHARGE_STRAFE_SPEED,
            turn_rate: CHARGE_TURN_RATE,
            probe_distance: CHARGE_PROBE_DISTANCE,
            pin_offset: CHARGE_PIN_OFFSET,
            collision_damage: CHARGE_COLLISION_DAMAGE,
            enemy_mask: LayerMask::ENEMY,
            obstacle_mask: LayerMask::OBSTACLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashTunables {
    pub distance: f64,
}

impl Default for DashTunables {
    fn default() -> Self {
        Self {
            distance: DASH_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoosterTunables {
    pub speed: f64,
    pub gravity: f64,
    pub slowdown_secs: f64,
}

impl Default for BoosterTunables {
    fn default() -> Self {
        Self {
            speed: BOOST_SPEED,
            gravity: BOOST_GRAVITY,
            slowdown_secs: BOOST_SLOWDOWN_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowTunables {
    pub prefab: Option<PrefabRef>,
    pub throw_force: f64,
    pub spawn_distance: f64,
    pub return_speed: f64,
    pub catch_radius: f64,
    pub pull_force: f64,
    pub vertical_lift: f64,
}

impl Default for ThrowTunables {
    fn default() -> Self {
        Self {
            prefab: None,
            throw_force: BLADE_THROW_FORCE,
            spawn_distance: BLADE_SPAWN_DISTANCE,
            return_speed: BLADE_RETURN_SPEED,
            catch_radius: BLADE_CATCH_RADIUS,
            pull_force: BLADE_PULL_FORCE,
            vertical_lift: BLADE_VERTICAL_LIFT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeadeyeTunables {
    pub speed_multiplier: f64,
    pub fov_transition_secs: f64,
    pub fov_angle_deg: f64,
    pub detection_radius: f64,
    pub segments: Vec<PhaseSegment>,
    pub enemy_mask: LayerMask,
    pub lock_widget: Option<PrefabRef>,
    pub timer_widget: Option<PrefabRef>,
    pub tumbleweed: Option<PrefabRef>,
    pub wind_force: f64,
}

impl Default for DeadeyeTunables {
    fn default() -> Self {
        Self {
            speed_multiplier: DEADEYE_SPEED_MULTIPLIER,
            fov_transition_secs: DEADEYE_FOV_TRANSITION_SECS,
            fov_angle_deg: DEADEYE_FOV_ANGLE_DEG,
            detection_radius: DEADEYE_DETECTION_RADIUS,
            segments: vec![
                PhaseSegment::bounded(DEADEYE_PHASE1_SECS, DEADEYE_PHASE1_DPS),
                PhaseSegment::open(DEADEYE_PHASE2_DPS),
            ],
            enemy_mask: LayerMask::ENEMY,
            lock_widget: None,
            timer_widget: None,
            tumbleweed: None,
            wind_force: DEADEYE_WIND_FORCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuraTunables {
    pub radius: f64,
    pub enemy_mask: LayerMask,
    pub marker: Option<PrefabRef>,
    pub widget: Option<PrefabRef>,
}

impl Default for AuraTunables {
    fn default() -> Self {
        Self {
            radius: AURA_RADIUS,
            enemy_mask: LayerMask::ENEMY,
            marker: None,
            widget: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslocatorTunables {
    pub prefab: Option<PrefabRef>,
    pub throw_force: f64,
    pub spawn_distance: f64,
}

impl Default for TranslocatorTunables {
    fn default() -> Self {
        Self {
            prefab: None,
            throw_force: TRANSLOCATOR_THROW_FORCE,
            spawn_distance: TRANSLOCATOR_SPAWN_DISTANCE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneTunables {
    pub prefab: Option<PrefabRef>,
    /// Visual for the slow zone. The zone works without one.
    pub zone_prefab: Option<PrefabRef>,
    pub throw_force: f64,
    pub spawn_distance: f64,
    pub rise_height: f64,
    pub rise_speed: f64,
    pub linger_secs: f64,
    pub zone_radius: f64,
    pub slow_factor: f64,
    pub enemy_mask: LayerMask,
}

impl Default for DroneTunables {
    fn default() -> Self {
        Self {
            prefab: None,
            zone_prefab: None,
            throw_force: DRONE_THROW_FORCE,
            spawn_distance: DRONE_SPAWN_DISTANCE,
            rise_height: DRONE_RISE_HEIGHT,
            rise_speed: DRONE_RISE_SPEED,
            linger_secs: DRONE_LINGER_SECS,
            zone_radius: DRONE_ZONE_RADIUS,
            slow_factor: DRONE_SLOW_FACTOR,
            enemy_mask: LayerMask::ENEMY,
        }
    }
}

impl DroneTunables {
    /// Seconds from landing to full height.
    pub fn rise_secs(&self) -> f64 {
        if self.rise_speed > 0.0 {
            self.rise_height.max(0.0) / self.rise_speed
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RushPathTunables {
    pub prefab: Option<PrefabRef>,
    pub max_length: f64,
    pub growth_secs: f64,
    pub lifetime_secs: f64,
    pub speed_multiplier: f64,
    pub spawn_distance: f64,
    pub width: f64,
    pub height_threshold: f64,
    pub obstacle_mask: LayerMask,
}

impl Default for RushPathTunables {
    fn default() -> Self {
        Self {
            prefab: None,
            max_length: RUSH_MAX_LENGTH,
            growth_secs: RUSH_GROWTH_SECS,
            lifetime_secs: RUSH_LIFETIME_SECS,
            speed_multiplier: RUSH_SPEED_MULTIPLIER,
            spawn_distance: RUSH_SPAWN_DISTANCE,
            width: RUSH_WIDTH,
            height_threshold: RUSH_HEIGHT_THRESHOLD,
            obstacle_mask: LayerMask::OBSTACLE,
        }
    }
}

impl AbilityDescriptor {
    pub fn new(name: impl Into<String>, duration_secs: Option<f64>, kind: AbilityKind) -> Self {
        Self {
            name: name.into(),
            icon: None,
            duration_secs,
            kind,
        }
    }

    pub fn reentry(&self) -> ReentryPolicy {
        self.kind.reentry()
    }

    // --- Presets with the stock tunables ---

    pub fn blink() -> Self {
        Self::new("Blink", Some(0.0), AbilityKind::Blink(BlinkTunables::default()))
    }

    pub fn charge() -> Self {
        Self::new(
            "Charge",
            Some(CHARGE_DURATION_SECS),
            AbilityKind::Charge(ChargeTunables::default()),
        )
    }

    pub fn dash() -> Self {
        Self::new(
            "Swift Strike",
            Some(DASH_DURATION_SECS),
            AbilityKind::Dash(DashTunables::default()),
        )
    }

    pub fn boosters() -> Self {
        Self::new(
            "Boosters",
            Some(BOOST_DURATION_SECS),
            AbilityKind::Boosters(BoosterTunables::default()),
        )
    }

    pub fn jagged_blade() -> Self {
        Self::new(
            "Jagged Blade",
            None,
            AbilityKind::ThrowAndReturn(ThrowTunables {
                prefab: Some(PrefabRef::new("jagged_blade")),
                ..Default::default()
            }),
        )
    }

    pub fn deadeye() -> Self {
        Self::new(
            "Deadeye",
            Some(DEADEYE_LOCK_ON_SECS),
            AbilityKind::Deadeye(DeadeyeTunables {
                lock_widget: Some(PrefabRef::new("lock_circle")),
                timer_widget: Some(PrefabRef::new("deadeye_timer")),
                tumbleweed: Some(PrefabRef::new("tumbleweed")),
                ..Default::default()
            }),
        )
    }

    pub fn infra_sight() -> Self {
        Self::new(
            "Infra Sight",
            Some(AURA_DURATION_SECS),
            AbilityKind::TimedAura(AuraTunables {
                marker: Some(PrefabRef::new("heat_silhouette")),
                widget: Some(PrefabRef::new("infra_slider")),
                ..Default::default()
            }),
        )
    }

    pub fn translocator() -> Self {
        Self::new(
            "Translocator",
            Some(TRANSLOCATOR_TIMEOUT_SECS),
            AbilityKind::Translocator(TranslocatorTunables {
                prefab: Some(PrefabRef::new("translocator_beacon")),
                ..Default::default()
            }),
        )
    }

    pub fn rewind() -> Self {
        Self::new("Rewind", Some(REWIND_PLAYBACK_SECS), AbilityKind::Rewind)
    }

    pub fn snow_drone() -> Self {
        Self::new(
            "Blizzard",
            Some(DRONE_TIMEOUT_SECS),
            AbilityKind::Drone(DroneTunables {
                prefab: Some(PrefabRef::new("snow_drone")),
                zone_prefab: Some(PrefabRef::new("snow_field")),
                ..Default::default()
            }),
        )
    }

    /// Lasts for the growth plus the lifetime of the path.
    pub fn rush_path() -> Self {
        Self::new(
            "Rush",
            Some(RUSH_GROWTH_SECS + RUSH_LIFETIME_SECS),
            AbilityKind::RushPath(RushPathTunables {
                prefab: Some(PrefabRef::new("rush_path")),
                ..Default::default()
            }),
        )
    }
}
