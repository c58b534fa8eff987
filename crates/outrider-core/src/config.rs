//! Loadout configuration: which ability descriptors an agent's slots hold.
//!
//! Loadouts are plain JSON. Validation runs once at load time so that the
//! engine never sees malformed tunables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_ABILITY_SLOTS;
use crate::descriptor::{AbilityDescriptor, AbilityKind, PhaseSegment};
use crate::enums::LoadoutId;
use crate::error::ConfigError;

/// Ordered slot bindings. Index 0 is the primary slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loadout {
    pub slots: Vec<Option<AbilityDescriptor>>,
}

impl Default for Loadout {
    fn default() -> Self {
        Self::preset(LoadoutId::default())
    }
}

impl Loadout {
    pub fn preset(id: LoadoutId) -> Self {
        let (primary, secondary) = match id {
            LoadoutId::Gunslinger => (AbilityDescriptor::deadeye(), AbilityDescriptor::rewind()),
            LoadoutId::Bruiser => (AbilityDescriptor::charge(), AbilityDescriptor::boosters()),
            LoadoutId::Skirmisher => (AbilityDescriptor::blink(), AbilityDescriptor::jagged_blade()),
            LoadoutId::Scout => (
                AbilityDescriptor::infra_sight(),
                AbilityDescriptor::translocator(),
            ),
            LoadoutId::Striker => (AbilityDescriptor::dash(), AbilityDescriptor::rewind()),
            LoadoutId::Frostbite => (
                AbilityDescriptor::snow_drone(),
                AbilityDescriptor::rush_path(),
            ),
        };
        Self {
            slots: vec![Some(primary), Some(secondary)],
        }
    }

    /// Parse and validate a loadout from JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let loadout: Loadout = serde_json::from_str(json)?;
        loadout.validate()?;
        Ok(loadout)
    }

    /// Read, parse and validate a loadout file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slots.len() > MAX_ABILITY_SLOTS {
            return Err(ConfigError::Invalid(format!(
                "{} slots configured, at most {MAX_ABILITY_SLOTS} supported",
                self.slots.len()
            )));
        }
        for descriptor in self.slots.iter().flatten() {
            validate_descriptor(descriptor)?;
        }
        Ok(())
    }
}

fn validate_descriptor(d: &AbilityDescriptor) -> Result<(), ConfigError> {
    let invalid = |msg: &str| ConfigError::Invalid(format!("{}: {msg}", d.name));

    if d.name.trim().is_empty() {
        return Err(ConfigError::Invalid("ability name must not be empty".into()));
    }
    if let Some(duration) = d.duration_secs {
        if !duration.is_finite() || duration < 0.0 {
            return Err(invalid("duration must be a finite non-negative number"));
        }
    }

    match &d.kind {
        AbilityKind::Blink(t) => {
            require_positive(t.distance, "distance").map_err(|m| invalid(&m))?;
            if t.standoff < 0.0 {
                return Err(invalid("standoff must be non-negative"));
            }
        }
        AbilityKind::Charge(t) => {
            require_positive(t.speed, "speed").map_err(|m| invalid(&m))?;
            require_positive(t.probe_distance, "probe_distance").map_err(|m| invalid(&m))?;
        }
        AbilityKind::Dash(t) => {
            require_positive(t.distance, "distance").map_err(|m| invalid(&m))?;
            if d.duration_secs.is_none_or(|secs| secs <= 0.0) {
                return Err(invalid("dash needs a positive duration"));
            }
        }
        AbilityKind::Boosters(t) => {
            require_positive(t.speed, "speed").map_err(|m| invalid(&m))?;
            require_positive(t.slowdown_secs, "slowdown_secs").map_err(|m| invalid(&m))?;
        }
        AbilityKind::ThrowAndReturn(t) => {
            require_positive(t.return_speed, "return_speed").map_err(|m| invalid(&m))?;
            require_positive(t.catch_radius, "catch_radius").map_err(|m| invalid(&m))?;
        }
        AbilityKind::Deadeye(t) => {
            require_positive(t.detection_radius, "detection_radius").map_err(|m| invalid(&m))?;
            if t.fov_angle_deg <= 0.0 || t.fov_angle_deg > 180.0 {
                return Err(invalid("fov_angle_deg must be in (0, 180]"));
            }
            validate_segments(&t.segments).map_err(|m| invalid(&m))?;
        }
        AbilityKind::TimedAura(t) => {
            require_positive(t.radius, "radius").map_err(|m| invalid(&m))?;
        }
        AbilityKind::Drone(t) => {
            require_positive(t.zone_radius, "zone_radius").map_err(|m| invalid(&m))?;
            require_positive(t.rise_speed, "rise_speed").map_err(|m| invalid(&m))?;
            if !(0.0..=1.0).contains(&t.slow_factor) {
                return Err(invalid("slow_factor must be in [0, 1]"));
            }
            if !t.linger_secs.is_finite() || t.linger_secs < 0.0 {
                return Err(invalid("linger_secs must be non-negative"));
            }
        }
        AbilityKind::RushPath(t) => {
            require_positive(t.max_length, "max_length").map_err(|m| invalid(&m))?;
            require_positive(t.growth_secs, "growth_secs").map_err(|m| invalid(&m))?;
            require_positive(t.speed_multiplier, "speed_multiplier").map_err(|m| invalid(&m))?;
            require_positive(t.width, "width").map_err(|m| invalid(&m))?;
        }
        AbilityKind::Translocator(_) | AbilityKind::Rewind => {}
    }
    Ok(())
}

fn require_positive(value: f64, field: &str) -> Result<(), String> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(format!("{field} must be positive, got {value}"))
    }
}

/// Thresholds strictly ascending, rates non-negative, only the last tier open.
fn validate_segments(segments: &[PhaseSegment]) -> Result<(), String> {
    if segments.is_empty() {
        return Err("at least one damage segment is required".into());
    }
    let mut previous = 0.0;
    for (i, segment) in segments.iter().enumerate() {
        if !segment.rate_per_sec.is_finite() || segment.rate_per_sec < 0.0 {
            return Err(format!("segment {i} rate must be non-negative"));
        }
        match segment.until_secs {
            Some(until) if until <= previous || !until.is_finite() => {
                return Err(format!("segment {i} threshold {until} is not ascending"));
            }
            Some(until) => previous = until,
            None if i + 1 != segments.len() => {
                return Err(format!("segment {i} is open-ended but not last"));
            }
            None => {}
        }
    }
    Ok(())
}
