//! Frame snapshot: the complete visible state produced after each frame.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::{AbilityPhase, OverrideKind};
use crate::events::AbilityEvent;
use crate::types::{AgentParams, EntityId, Transform, WidgetId};

/// Engine clock readout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeView {
    pub frame: u64,
    pub fixed_tick: u64,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub time: TimeView,
    pub paused: bool,
    pub agents: Vec<AgentView>,
    pub enemies: Vec<EnemyView>,
    pub transients: Vec<TransientView>,
    pub widgets: Vec<WidgetView>,
    pub events: Vec<AbilityEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentView {
    pub id: EntityId,
    pub transform: Transform,
    pub params: AgentParams,
    pub slots: Vec<SlotView>,
    /// Overrides currently claimed, with the slot holding each.
    pub claims: Vec<(OverrideKind, usize)>,
    pub rewind: RewindView,
    /// Recent positions for trail rendering, newest first.
    pub trail: Vec<DVec3>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotView {
    pub slot: usize,
    pub ability: Option<String>,
    pub phase: AbilityPhase,
    pub elapsed_secs: f64,
    /// Seconds left in the Active phase, None when unbounded or idle.
    pub remaining_secs: Option<f64>,
    pub locked_targets: Vec<TargetLockView>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TargetLockView {
    pub target: EntityId,
    pub progress_secs: f64,
    /// Damage the target would take if fired now.
    pub potential: f64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RewindView {
    pub recorded: usize,
    pub capacity: usize,
    pub playing: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: EntityId,
    pub position: DVec3,
    pub health: f64,
    pub max_health: f64,
    /// Fraction of normal speed; below 1 while slowed.
    pub speed_scale: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransientView {
    pub id: EntityId,
    pub prefab: String,
    pub position: DVec3,
    pub landed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetView {
    pub id: WidgetId,
    pub prefab: String,
    pub anchor: Option<EntityId>,
    pub fill: f64,
    pub visible: bool,
}
