//! Outrider headless runner.
//!
//! This crate wires the simulation engine to a command line: arguments,
//! logging, the game loop thread and scripted command timelines.

pub mod cli;
pub mod game_loop;
pub mod script;
pub mod state;

pub use outrider_core as core;
