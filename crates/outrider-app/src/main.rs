use std::io::Write;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use outrider_app::cli::{self, Args};
use outrider_app::game_loop::{self, LoopSettings};
use outrider_app::state::{AppError, AppState};
use outrider_core::events::AbilityEvent;
use outrider_core::state::FrameSnapshot;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let args = cli::parse_args();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "run_failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let config = args.sim_config()?;
    let script = args.load_script()?;
    let settings = LoopSettings {
        frames: args.frame_count()?,
        realtime: args.realtime,
    };
    info!(
        loadout = %args.loadout,
        seed = args.seed,
        frames = settings.frames,
        steps = script.len(),
        "run_starting"
    );

    let state = AppState::new();
    let handle = game_loop::spawn_game_loop(config, script, settings, state.latest_snapshot.clone())?;
    state.attach(handle.commands);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for snapshot in handle.snapshots.iter() {
        if args.json {
            serde_json::to_writer(&mut out, &snapshot)?;
            writeln!(out)?;
        } else {
            log_events(&snapshot);
        }
    }
    out.flush()?;

    state.shutdown();
    let frames = handle.thread.join().map_err(|_| AppError::LoopPanicked)?;
    if let Some(last) = state.latest() {
        log_summary(frames, &last);
    }
    Ok(())
}

fn log_events(snapshot: &FrameSnapshot) {
    for event in &snapshot.events {
        match event {
            AbilityEvent::AbilityActivated { slot, ability, .. } => {
                info!(frame = snapshot.time.frame, slot, ability = %ability, "activated")
            }
            AbilityEvent::AbilityEnded { slot, ability, reason, .. } => {
                info!(frame = snapshot.time.frame, slot, ability = %ability, ?reason, "ended")
            }
            AbilityEvent::DamageDealt { target, amount, lethal, .. } => {
                info!(frame = snapshot.time.frame, target = target.0, amount, lethal, "damage")
            }
            other => info!(frame = snapshot.time.frame, event = ?other, "event"),
        }
    }
}

fn log_summary(frames: u64, snapshot: &FrameSnapshot) {
    let alive = snapshot.enemies.iter().filter(|e| e.health > 0.0).count();
    let damage: f64 = snapshot
        .enemies
        .iter()
        .map(|e| e.max_health - e.health)
        .sum();
    info!(
        frames,
        elapsed = snapshot.time.elapsed_secs,
        enemies_alive = alive,
        enemy_damage = damage,
        "run_finished"
    );
    for agent in &snapshot.agents {
        let p = agent.transform.position;
        info!(
            agent = agent.id.0,
            x = p.x,
            y = p.y,
            z = p.z,
            recorded = agent.rewind.recorded,
            "agent_final"
        );
    }
}
