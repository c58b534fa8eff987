//! Headless simulation for OUTRIDER.
//!
//! Owns a hecs sandbox world that implements every collaborator trait,
//! drives the ability engine once per variable frame and the history and
//! physics systems on a fixed tick, and produces `FrameSnapshot`s.

pub mod engine;
pub mod registry;
pub mod sandbox;
pub mod systems;
pub mod world_setup;

pub use outrider_core as core;
pub use engine::{SimConfig, SimulationEngine};
