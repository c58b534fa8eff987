//! Command-line interface for the outrider runner.

use std::path::{Path, PathBuf};

use clap::Parser;

use outrider_core::config::Loadout;
use outrider_core::enums::LoadoutId;
use outrider_sim::engine::SimConfig;

use crate::script::Script;
use crate::state::AppError;

/// Headless ability engine sandbox
#[derive(Parser, Debug)]
#[command(name = "outrider")]
#[command(about = "Headless ability engine sandbox")]
#[command(version)]
pub struct Args {
    /// Loadout preset (gunslinger, bruiser, skirmisher, scout, striker, frostbite) or a loadout JSON file
    #[arg(long, default_value = "gunslinger")]
    pub loadout: String,

    /// JSON command script; runs the built-in demo when omitted
    #[arg(long, value_name = "SCRIPT_FILE")]
    pub script: Option<PathBuf>,

    /// Simulated seconds to run
    #[arg(long, default_value = "8")]
    pub seconds: f64,

    /// Arena layout seed
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Frames per simulated second
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u32).range(1..=1000))]
    pub frame_rate: u32,

    /// Pace frames against the wall clock
    #[arg(long)]
    pub realtime: bool,

    /// Print every snapshot as one JSON line on stdout
    #[arg(long)]
    pub json: bool,
}

pub fn parse_args() -> Args {
    Args::parse()
}

impl Args {
    /// Preset by name, otherwise a loadout file.
    pub fn resolve_loadout(&self) -> Result<Loadout, AppError> {
        match LoadoutId::from_name(&self.loadout) {
            Some(id) => Ok(Loadout::preset(id)),
            None => Ok(Loadout::from_path(Path::new(&self.loadout))?),
        }
    }

    pub fn load_script(&self) -> Result<Script, AppError> {
        match &self.script {
            Some(path) => Ok(Script::from_path(path)?),
            None => Ok(Script::demo()),
        }
    }

    pub fn frame_dt(&self) -> f64 {
        1.0 / f64::from(self.frame_rate.max(1))
    }

    pub fn frame_count(&self) -> Result<u64, AppError> {
        if !self.seconds.is_finite() || self.seconds < 0.0 {
            return Err(AppError::InvalidArgument(format!(
                "--seconds must be a non-negative number, got {}",
                self.seconds
            )));
        }
        Ok((self.seconds * f64::from(self.frame_rate)).ceil() as u64)
    }

    pub fn sim_config(&self) -> Result<SimConfig, AppError> {
        Ok(SimConfig {
            seed: self.seed,
            frame_dt: self.frame_dt(),
            loadout: self.resolve_loadout()?,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("outrider").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.loadout, "gunslinger");
        assert_eq!(args.frame_rate, 60);
        assert_eq!(args.frame_count().unwrap(), 480);
        assert!(!args.json);
        assert_eq!(args.load_script().unwrap(), Script::demo());
    }

    #[test]
    fn test_preset_loadout() {
        let args = parse(&["--loadout", "bruiser", "--seed", "9", "--frame-rate", "50"]);
        let config = args.sim_config().unwrap();
        assert_eq!(config.seed, 9);
        assert!((config.frame_dt - 0.02).abs() < 1e-12);
        assert_eq!(config.loadout, Loadout::preset(LoadoutId::Bruiser));
    }

    #[test]
    fn test_unknown_loadout_is_a_path() {
        let args = parse(&["--loadout", "/nonexistent/loadout.json"]);
        assert!(matches!(args.resolve_loadout(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Args::try_parse_from(["outrider", "--frame-rate", "0"]).is_err());
        let args = parse(&["--seconds=-2"]);
        assert!(matches!(args.frame_count(), Err(AppError::InvalidArgument(_))));
    }
}
