//! State shared between the main thread and the game loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use outrider_core::commands::AbilityCommand;
use outrider_core::error::ConfigError;
use outrider_core::state::FrameSnapshot;

use crate::script::ScriptError;

/// Commands sent from the main thread to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// An ability or input command to forward to the simulation engine.
    Command(AbilityCommand),
    /// Shut down the game loop thread gracefully.
    Shutdown,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Script(#[from] ScriptError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to spawn game loop: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("game loop is not running")]
    NotRunning,
    #[error("game loop thread panicked")]
    LoopPanicked,
}

/// Shared application state.
///
/// - `command_tx` is `None` until a game loop is attached.
/// - `latest_snapshot` is written by the game loop after every frame.
pub struct AppState {
    pub command_tx: Mutex<Option<mpsc::Sender<GameLoopCommand>>>,
    pub latest_snapshot: Arc<Mutex<Option<FrameSnapshot>>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            command_tx: Mutex::new(None),
            latest_snapshot: Arc::new(Mutex::new(None)),
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route future commands to a running game loop.
    pub fn attach(&self, command_tx: mpsc::Sender<GameLoopCommand>) {
        if let Ok(mut lock) = self.command_tx.lock() {
            *lock = Some(command_tx);
        }
    }

    /// Forward a command to the game loop.
    pub fn send(&self, command: AbilityCommand) -> Result<(), AppError> {
        let lock = self.command_tx.lock().map_err(|_| AppError::NotRunning)?;
        let tx = lock.as_ref().ok_or(AppError::NotRunning)?;
        tx.send(GameLoopCommand::Command(command))
            .map_err(|_| AppError::NotRunning)
    }

    /// Ask the game loop to stop and detach from it. Returns false when no
    /// loop was listening.
    pub fn shutdown(&self) -> bool {
        let Ok(mut lock) = self.command_tx.lock() else {
            return false;
        };
        lock.take()
            .is_some_and(|tx| tx.send(GameLoopCommand::Shutdown).is_ok())
    }

    pub fn latest(&self) -> Option<FrameSnapshot> {
        self.latest_snapshot.lock().ok().and_then(|s| s.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new();
        assert!(state.command_tx.lock().unwrap().is_none());
        assert!(state.latest().is_none());
        assert!(matches!(state.send(AbilityCommand::Pause), Err(AppError::NotRunning)));
        assert!(!state.shutdown());
    }

    #[test]
    fn test_attach_forwards_commands() {
        let state = AppState::new();
        let (tx, rx) = mpsc::channel();
        state.attach(tx);

        state.send(AbilityCommand::Pause).unwrap();
        assert!(state.shutdown());
        assert!(!state.shutdown(), "Already detached");

        let received: Vec<GameLoopCommand> = rx.try_iter().collect();
        assert_eq!(received.len(), 2);
        assert!(matches!(received[0], GameLoopCommand::Command(AbilityCommand::Pause)));
        assert!(matches!(received[1], GameLoopCommand::Shutdown));
    }
}
