// cistern/src/core/control.rs

//! Defines the states a full pipeline run moves through.

use std::fmt;

/// Which batch operation was in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Prepare,
  Run,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Phase::Prepare => f.write_str("prepare"),
      Phase::Run => f.write_str("run"),
    }
  }
}

/// State of a full run:
/// `NotStarted -> Preparing -> Running(stage) -> ... -> Completed`,
/// with `Aborted` reachable from `Preparing` or any `Running`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunState {
  NotStarted,
  /// Every registered stage is being prepared.
  Preparing,
  /// The named lifecycle stage is executing.
  Running { stage: String },
  /// All canonical stages ran without error.
  Completed,
  /// Terminal. No later stage runs, `after_failure` included.
  Aborted {
    stage: String,
    phase: Phase,
    message: String,
  },
}

impl RunState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, RunState::Completed | RunState::Aborted { .. })
  }
}

impl fmt::Display for RunState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunState::NotStarted => f.write_str("not started"),
      RunState::Preparing => f.write_str("preparing"),
      RunState::Running { stage } => write!(f, "running '{}'", stage),
      RunState::Completed => f.write_str("completed"),
      RunState::Aborted { stage, phase, .. } => write!(f, "aborted during {} of '{}'", phase, stage),
    }
  }
}
