//! Core types and definitions for the OUTRIDER ability engine.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry, ability descriptors, commands, events, snapshots, errors,
//! and the collaborator traits the engine talks to the world through.
//! It has no dependency on any runtime or ECS.

pub mod commands;
pub mod components;
pub mod config;
pub mod constants;
pub mod descriptor;
pub mod enums;
pub mod error;
pub mod events;
pub mod state;
pub mod types;
pub mod world;

#[cfg(test)]
mod tests;
