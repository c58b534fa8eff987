//! Command scripts: a timeline of agent actions replayed by the game loop.
//!
//! Scripts are JSON files with one entry per action:
//!
//! ```json
//! { "steps": [
//!     { "at_secs": 0.5, "type": "Activate", "slot": 0 },
//!     { "at_secs": 2.0, "type": "Fire", "slot": 0 }
//! ] }
//! ```
//!
//! Times are loop time (frames run × frame length), so a scripted `Pause`
//! does not stall the rest of the timeline.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use outrider_core::commands::AbilityCommand;
use outrider_core::types::EntityId;

/// Slack for comparing step times against accumulated frame time.
const TIME_EPSILON: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid script: {0}")]
    Invalid(String),
}

/// One action for the scripted agent. The agent id is filled in at run time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScriptAction {
    Activate { slot: usize },
    Fire { slot: usize },
    Cancel { slot: usize },
    ForceInterrupt,
    Move { strafe: f64, forward: f64 },
    Look { yaw: f64, pitch: f64 },
    Pause,
    Resume,
}

impl ScriptAction {
    pub fn for_agent(&self, agent: EntityId) -> AbilityCommand {
        match *self {
            ScriptAction::Activate { slot } => AbilityCommand::Activate { agent, slot },
            ScriptAction::Fire { slot } => AbilityCommand::Fire { agent, slot },
            ScriptAction::Cancel { slot } => AbilityCommand::Cancel { agent, slot },
            ScriptAction::ForceInterrupt => AbilityCommand::ForceInterrupt { agent },
            ScriptAction::Move { strafe, forward } => AbilityCommand::SetMoveInput {
                agent,
                strafe,
                forward,
            },
            ScriptAction::Look { yaw, pitch } => AbilityCommand::SetLook { agent, yaw, pitch },
            ScriptAction::Pause => AbilityCommand::Pause,
            ScriptAction::Resume => AbilityCommand::Resume,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_secs: f64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

impl ScriptStep {
    pub fn new(at_secs: f64, action: ScriptAction) -> Self {
        Self { at_secs, action }
    }
}

/// A validated timeline, sorted by time. Steps sharing a time keep file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

impl Script {
    pub fn new(mut steps: Vec<ScriptStep>) -> Result<Self, ScriptError> {
        if let Some(bad) = steps
            .iter()
            .position(|s| !s.at_secs.is_finite() || s.at_secs < 0.0)
        {
            return Err(ScriptError::Invalid(format!(
                "step {bad} has time {}; times must be finite and non-negative",
                steps[bad].at_secs
            )));
        }
        steps.sort_by(|a, b| a.at_secs.total_cmp(&b.at_secs));
        Ok(Self { steps })
    }

    pub fn from_json_str(json: &str) -> Result<Self, ScriptError> {
        let raw: Script = serde_json::from_str(json)?;
        Self::new(raw.steps)
    }

    pub fn from_path(path: &Path) -> Result<Self, ScriptError> {
        let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Walk forward, lock on with slot 0, fire, then use slot 1.
    pub fn demo() -> Self {
        let steps = vec![
            ScriptStep::new(0.0, ScriptAction::Move { strafe: 0.0, forward: 1.0 }),
            ScriptStep::new(1.0, ScriptAction::Move { strafe: 0.0, forward: 0.0 }),
            ScriptStep::new(1.0, ScriptAction::Activate { slot: 0 }),
            ScriptStep::new(1.5, ScriptAction::Look { yaw: 0.3, pitch: 0.0 }),
            ScriptStep::new(2.5, ScriptAction::Fire { slot: 0 }),
            ScriptStep::new(3.0, ScriptAction::Move { strafe: 0.5, forward: 1.0 }),
            ScriptStep::new(4.0, ScriptAction::Activate { slot: 1 }),
            ScriptStep::new(4.5, ScriptAction::Move { strafe: 0.0, forward: 0.0 }),
            ScriptStep::new(6.0, ScriptAction::Look { yaw: 0.0, pitch: 0.0 }),
        ];
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time of the last step, zero when empty.
    pub fn duration_secs(&self) -> f64 {
        self.steps.last().map_or(0.0, |s| s.at_secs)
    }

    pub fn cursor(&self) -> ScriptCursor<'_> {
        ScriptCursor {
            steps: &self.steps,
            next: 0,
        }
    }
}

/// Read position in a script.
#[derive(Debug)]
pub struct ScriptCursor<'a> {
    steps: &'a [ScriptStep],
    next: usize,
}

impl<'a> ScriptCursor<'a> {
    /// Steps due at or before `now` that have not been taken yet.
    pub fn take_due(&mut self, now: f64) -> &'a [ScriptStep] {
        let start = self.next;
        while self
            .steps
            .get(self.next)
            .is_some_and(|s| s.at_secs <= now + TIME_EPSILON)
        {
            self.next += 1;
        }
        &self.steps[start..self.next]
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_sort() {
        let script = Script::from_json_str(
            r#"{ "steps": [
                { "at_secs": 2.0, "type": "Fire", "slot": 0 },
                { "at_secs": 0.5, "type": "Activate", "slot": 0 },
                { "at_secs": 0.5, "type": "Move", "strafe": 0.0, "forward": 1.0 },
                { "at_secs": 3.0, "type": "Pause" }
            ] }"#,
        )
        .unwrap();
        assert_eq!(script.len(), 4);
        assert_eq!(script.steps[0].action, ScriptAction::Activate { slot: 0 });
        assert_eq!(
            script.steps[1].action,
            ScriptAction::Move { strafe: 0.0, forward: 1.0 },
            "Same-time steps keep file order"
        );
        assert_eq!(script.duration_secs(), 3.0);
    }

    #[test]
    fn test_rejects_negative_time() {
        let err = Script::from_json_str(r#"{ "steps": [ { "at_secs": -1.0, "type": "Pause" } ] }"#)
            .unwrap_err();
        assert!(matches!(err, ScriptError::Invalid(_)), "Got {err:?}");
    }

    #[test]
    fn test_rejects_unknown_action() {
        let err = Script::from_json_str(r#"{ "steps": [ { "at_secs": 1.0, "type": "Jump" } ] }"#)
            .unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Script::from_path(Path::new("/nonexistent/script.json")).unwrap_err();
        assert!(matches!(err, ScriptError::Io { .. }));
    }

    #[test]
    fn test_cursor_takes_each_step_once() {
        let script = Script::demo();
        let mut cursor = script.cursor();
        assert_eq!(cursor.take_due(0.0).len(), 1);
        assert!(cursor.take_due(0.5).is_empty());
        assert_eq!(cursor.take_due(1.0).len(), 2, "Both 1.0s steps are due");
        let rest = cursor.take_due(100.0).len();
        assert_eq!(rest, script.len() - 3);
        assert!(cursor.is_finished());
        assert!(cursor.take_due(200.0).is_empty());
    }

    #[test]
    fn test_action_targets_agent() {
        let agent = EntityId(7);
        assert!(matches!(
            ScriptAction::Look { yaw: 1.0, pitch: 0.0 }.for_agent(agent),
            AbilityCommand::SetLook { agent: EntityId(7), .. }
        ));
        assert_eq!(ScriptAction::Pause.for_agent(agent).agent(), None);
    }
}
