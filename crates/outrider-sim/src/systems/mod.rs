//! Systems that operate on the sandbox each frame or fixed tick.
//!
//! Systems are plain functions over the sandbox and the registry.
//! They do not own state: all state lives in components and the registry.

pub mod abilities;
pub mod cleanup;
pub mod movement;
pub mod rewind;
pub mod snapshot;
