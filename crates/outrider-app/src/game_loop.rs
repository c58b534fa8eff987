//! Game loop thread: runs the simulation engine and publishes snapshots.
//!
//! The engine is created inside this thread so it never crosses threads.
//! Commands arrive via an `mpsc` channel, scripted steps are queued when
//! their time comes up, and every snapshot is sent back on a second channel
//! and stored in shared state for polling.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use outrider_core::constants::FRAME_DT;
use outrider_core::state::FrameSnapshot;
use outrider_sim::engine::{SimConfig, SimulationEngine};

use crate::script::Script;
use crate::state::{AppError, GameLoopCommand};

/// How long to run and how to pace it.
#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    /// Frames to run before the loop ends on its own.
    pub frames: u64,
    /// Sleep between frames to match the wall clock.
    pub realtime: bool,
}

/// Channels and thread handle of a running game loop.
pub struct GameLoopHandle {
    pub commands: mpsc::Sender<GameLoopCommand>,
    pub snapshots: mpsc::Receiver<FrameSnapshot>,
    /// Resolves to the number of frames run.
    pub thread: JoinHandle<u64>,
}

/// Wall-clock length of one frame.
pub fn frame_duration(frame_dt: f64) -> Duration {
    if frame_dt.is_finite() && frame_dt > 0.0 {
        Duration::from_secs_f64(frame_dt)
    } else {
        Duration::from_secs_f64(FRAME_DT)
    }
}

/// Spawns the game loop in a new thread.
pub fn spawn_game_loop(
    config: SimConfig,
    script: Script,
    settings: LoopSettings,
    latest_snapshot: Arc<Mutex<Option<FrameSnapshot>>>,
) -> Result<GameLoopHandle, AppError> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameLoopCommand>();
    let (snapshot_tx, snapshot_rx) = mpsc::channel::<FrameSnapshot>();

    let thread = std::thread::Builder::new()
        .name("outrider-game-loop".into())
        .spawn(move || {
            run_game_loop(config, &script, settings, cmd_rx, snapshot_tx, &latest_snapshot)
        })
        .map_err(AppError::Spawn)?;

    Ok(GameLoopHandle {
        commands: cmd_tx,
        snapshots: snapshot_rx,
        thread,
    })
}

/// The game loop. Runs until the frame budget is spent, a Shutdown
/// command arrives, or either channel disconnects.
fn run_game_loop(
    config: SimConfig,
    script: &Script,
    settings: LoopSettings,
    cmd_rx: mpsc::Receiver<GameLoopCommand>,
    snapshot_tx: mpsc::Sender<FrameSnapshot>,
    latest_snapshot: &Mutex<Option<FrameSnapshot>>,
) -> u64 {
    let frame_dt = config.frame_dt;
    let tick_duration = frame_duration(frame_dt);
    let mut engine = SimulationEngine::new(config);
    let agent = engine.agent();
    let mut cursor = script.cursor();
    let mut next_tick_time = Instant::now();

    for frame in 0..settings.frames {
        // 1. Drain all pending commands
        loop {
            match cmd_rx.try_recv() {
                Ok(GameLoopCommand::Command(cmd)) => engine.queue_command(cmd),
                Ok(GameLoopCommand::Shutdown) => {
                    info!(frame, "game_loop_shutdown");
                    return frame;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => return frame,
            }
        }

        // 2. Scripted steps due by loop time
        let loop_time = frame as f64 * frame_dt;
        let due = cursor.take_due(loop_time);
        if !due.is_empty() {
            debug!(frame, steps = due.len(), "script_steps_queued");
        }
        engine.queue_commands(due.iter().map(|step| step.action.for_agent(agent)));

        // 3. Advance one frame
        let snapshot = engine.tick();

        // 4. Store latest snapshot for polling
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot.clone());
        }

        // 5. Publish; a dropped receiver ends the run
        if snapshot_tx.send(snapshot).is_err() {
            return frame + 1;
        }

        // 6. Sleep until the next frame
        if settings.realtime {
            next_tick_time += tick_duration;
            let now = Instant::now();
            if next_tick_time > now {
                std::thread::sleep(next_tick_time - now);
            } else if now - next_tick_time > tick_duration * 2 {
                // Too far behind; reset to avoid a catch-up spiral.
                next_tick_time = now;
            }
        }
    }
    info!(frames = settings.frames, "game_loop_finished");
    settings.frames
}
