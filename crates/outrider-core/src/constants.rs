//! Engine constants and tuning defaults.

/// Variable frame rate used by the headless driver (Hz).
pub const FRAME_RATE: u32 = 60;

/// Seconds per variable frame at the nominal frame rate.
pub const FRAME_DT: f64 = 1.0 / FRAME_RATE as f64;

/// Fixed tick rate for history recording and physics (Hz).
pub const FIXED_TICK_RATE: u32 = 50;

/// Seconds per fixed tick.
pub const FIXED_DT: f64 = 1.0 / FIXED_TICK_RATE as f64;

/// Largest frame delta the driver will accept; longer stalls are clamped.
pub const MAX_FRAME_DT: f64 = 0.25;

/// Ability slots per agent.
pub const MAX_ABILITY_SLOTS: usize = 2;

// --- Agent defaults ---

pub const DEFAULT_SPEED_MULTIPLIER: f64 = 1.0;

/// Default vertical acceleration (m/s²).
pub const DEFAULT_GRAVITY: f64 = -9.81;

/// Default camera field of view (degrees).
pub const DEFAULT_FIELD_OF_VIEW_DEG: f64 = 60.0;

/// Walking speed before the speed multiplier (m/s).
pub const AGENT_WALK_SPEED: f64 = 6.0;

/// Height of the camera above the agent's feet (m).
pub const AGENT_EYE_HEIGHT: f64 = 1.6;

pub const AGENT_RADIUS: f64 = 0.5;

/// Height of the agent's body center above its feet (m).
pub const AGENT_CENTER_HEIGHT: f64 = 0.9;

// --- Rewind ---

/// Seconds of history the rewind buffer holds.
pub const REWIND_WINDOW_SECS: f64 = 3.0;

/// Playback acceleration factor.
pub const REWIND_SPEED_MULTIPLIER: f64 = 2.0;

/// Default playback duration for the rewind ability (seconds).
pub const REWIND_PLAYBACK_SECS: f64 = 3.0;

// --- Blink ---

pub const BLINK_DISTANCE: f64 = 1.0;

/// Gap kept between the agent and an obstacle the blink ray hits (m).
pub const BLINK_STANDOFF: f64 = 0.5;

// --- Charge ---

pub const CHARGE_DURATION_SECS: f64 = 3.0;
pub const CHARGE_SPEED: f64 = 10.0;
pub const CHARGE_STRAFE_SPEED: f64 = 5.0;

/// Yaw rate per unit of strafe input (radians per second).
pub const CHARGE_TURN_RATE: f64 = 1.0;

/// Look-ahead distance for enemy pickup and obstacle checks (m).
pub const CHARGE_PROBE_DISTANCE: f64 = 5.0;

/// Distance ahead of the agent at which a pinned enemy is carried (m).
pub const CHARGE_PIN_OFFSET: f64 = 1.0;

pub const CHARGE_COLLISION_DAMAGE: f64 = 100.0;

// --- Dash ---

pub const DASH_DISTANCE: f64 = 10.0;
pub const DASH_DURATION_SECS: f64 = 0.2;

// --- Boosters ---

pub const BOOST_DURATION_SECS: f64 = 3.0;
pub const BOOST_SPEED: f64 = 10.0;

/// Gravity while boosting. Positive lifts the agent.
pub const BOOST_GRAVITY: f64 = 2.2;

/// Seconds for boost speed to ease back to zero.
pub const BOOST_SLOWDOWN_SECS: f64 = 2.0;

// --- Throw-and-return blade ---

pub const BLADE_THROW_FORCE: f64 = 10.0;
pub const BLADE_SPAWN_DISTANCE: f64 = 1.0;
pub const BLADE_RETURN_SPEED: f64 = 20.0;

/// Distance at which a returning blade counts as caught (m).
pub const BLADE_CATCH_RADIUS: f64 = 1.0;

pub const BLADE_PULL_FORCE: f64 = 50.0;
pub const BLADE_VERTICAL_LIFT: f64 = 5.0;

// --- Deadeye ---

/// Lock-on window, also the longest progress any one target can accrue.
pub const DEADEYE_LOCK_ON_SECS: f64 = 5.0;
pub const DEADEYE_SPEED_MULTIPLIER: f64 = 0.5;
pub const DEADEYE_FOV_TRANSITION_SECS: f64 = 1.0;

/// Aim field of view; targets must sit within half of it (degrees).
pub const DEADEYE_FOV_ANGLE_DEG: f64 = 60.0;
pub const DEADEYE_DETECTION_RADIUS: f64 = 50.0;

/// First damage tier: rate and the lock time at which it ends.
pub const DEADEYE_PHASE1_SECS: f64 = 2.0;
pub const DEADEYE_PHASE1_DPS: f64 = 150.0;
pub const DEADEYE_PHASE2_DPS: f64 = 300.0;

pub const DEADEYE_WIND_FORCE: f64 = 10.0;

/// Where the tumbleweed appears relative to the agent: left, then forward (m).
pub const TUMBLEWEED_SIDE_OFFSET: f64 = 4.0;
pub const TUMBLEWEED_FORWARD_OFFSET: f64 = 1.8;

/// Height above the spawn point from which the ground probe starts (m).
pub const GROUND_PROBE_HEIGHT: f64 = 5.0;

// --- Timed aura ---

pub const AURA_DURATION_SECS: f64 = 10.0;
pub const AURA_RADIUS: f64 = 200.0;

// --- Translocator ---

/// Seconds before an unlanded beacon teleports the agent anyway.
pub const TRANSLOCATOR_TIMEOUT_SECS: f64 = 5.0;
pub const TRANSLOCATOR_THROW_FORCE: f64 = 10.0;
pub const TRANSLOCATOR_SPAWN_DISTANCE: f64 = 1.0;

// --- Snow drone ---

/// Seconds before a drone that never settles gives up.
pub const DRONE_TIMEOUT_SECS: f64 = 15.0;
pub const DRONE_THROW_FORCE: f64 = 10.0;
pub const DRONE_SPAWN_DISTANCE: f64 = 1.0;

/// Height the drone climbs to after landing (m), and its climb rate (m/s).
pub const DRONE_RISE_HEIGHT: f64 = 5.0;
pub const DRONE_RISE_SPEED: f64 = 2.0;

/// Seconds the slow zone lasts once the drone is up.
pub const DRONE_LINGER_SECS: f64 = 5.0;
pub const DRONE_ZONE_RADIUS: f64 = 4.0;

/// Speed scale applied to enemies inside the zone (0..1).
pub const DRONE_SLOW_FACTOR: f64 = 0.3;

// --- Rush path ---

pub const RUSH_MAX_LENGTH: f64 = 10.0;
pub const RUSH_GROWTH_SECS: f64 = 5.0;

/// Seconds the path stays after it has finished growing.
pub const RUSH_LIFETIME_SECS: f64 = 3.0;
pub const RUSH_SPEED_MULTIPLIER: f64 = 2.0;

/// Distance ahead of the agent where the path starts (m).
pub const RUSH_SPAWN_DISTANCE: f64 = 1.25;
pub const RUSH_WIDTH: f64 = 2.0;

/// Largest drop or rise between the path and the agent or floor (m).
pub const RUSH_HEIGHT_THRESHOLD: f64 = 1.0;

/// Clearance the growing end needs in front of it (m).
pub const RUSH_OBSTACLE_CLEARANCE: f64 = 0.2;

// --- Sandbox world ---

/// Radius of the playable arena around the origin (m).
pub const ARENA_RADIUS: f64 = 60.0;

/// Terrain cell size (m).
pub const TERRAIN_CELL_SIZE: f64 = 2.0;

pub const ENEMY_COUNT: usize = 8;
pub const ENEMY_RADIUS: f64 = 0.6;
pub const ENEMY_MAX_HEALTH: f64 = 500.0;

pub const PILLAR_COUNT: usize = 6;
pub const PILLAR_RADIUS: f64 = 1.5;

pub const TRANSIENT_RADIUS: f64 = 0.2;

/// Transients that never land are removed after this long (seconds).
pub const TRANSIENT_MAX_LIFETIME_SECS: f64 = 20.0;

/// Horizontal velocity kept per second by sliding bodies (0..1).
pub const GROUND_FRICTION: f64 = 0.1;

/// Ticks between agent trail samples in snapshots.
pub const TRAIL_INTERVAL_TICKS: u64 = 10;

/// Maximum trail samples kept per agent.
pub const MAX_TRAIL_POINTS: usize = 30;
