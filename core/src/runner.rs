// cistern/src/runner.rs

//! Runs stages from a registry: a single named stage, the canonical
//! lifecycle, or every stage's preparation pass.
//!
//! Every operation takes the registry explicitly; nothing here keeps state
//! between calls. Errors are returned exactly as the failing step produced them.

use crate::core::control::{Phase, RunState};
use crate::core::lifecycle::LifecycleStage;
use crate::error::CisternError;
use crate::workflow::StageRegistry;
use std::backtrace::Backtrace;
use tracing::{event, instrument, Level};

/// Runs the stage registered under `name`.
///
/// A name absent from the registry is not an error: not every workflow
/// defines every stage, so this returns `Ok(())` without doing anything.
#[instrument(name = "runner::run_stage", skip(registry), err(Display))]
pub fn run_stage<Err, R>(name: &str, registry: &R) -> Result<(), Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
  R: StageRegistry<Err> + ?Sized,
{
  match registry.lookup(name) {
    Some(stage) => stage.run_all(),
    None => {
      event!(Level::DEBUG, "Stage not defined, nothing to run.");
      Ok(())
    }
  }
}

/// Runs the ten canonical lifecycle stages in order, stopping at the first error.
///
/// `after_failure` is not part of this sequence.
#[instrument(name = "runner::run_all_lifecycle", skip_all, err(Display))]
pub fn run_all_lifecycle<Err, R>(registry: &R) -> Result<(), Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
  R: StageRegistry<Err> + ?Sized,
{
  for stage in LifecycleStage::CANONICAL {
    event!(Level::INFO, stage = stage.as_str(), "Running lifecycle stage.");
    run_stage(stage.as_str(), registry)?;
  }
  event!(Level::INFO, "Lifecycle completed.");
  Ok(())
}

/// Prepares every registered stage (not only the canonical ten), in registry order.
///
/// On failure the error's causal trace is reported before it is returned unchanged.
#[instrument(name = "runner::prepare_all_lifecycle", skip_all, err(Display))]
pub fn prepare_all_lifecycle<Err, R>(registry: &R) -> Result<(), Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
  R: StageRegistry<Err> + ?Sized,
{
  prepare_registered(registry).map_err(|(_, err)| err)
}

// Shared prepare pass. On failure, reports the trace and hands back the failing stage's name.
fn prepare_registered<Err, R>(registry: &R) -> Result<(), (String, Err)>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
  R: StageRegistry<Err> + ?Sized,
{
  for stage in registry.stages() {
    if let Err(err) = stage.prepare_all() {
      report_causal_trace(stage.name(), &err);
      return Err((stage.name().to_string(), err));
    }
  }
  Ok(())
}

/// Prepares every stage, then runs the canonical lifecycle.
pub fn run_all_stages<Err, R>(registry: &R) -> Result<(), Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
  R: StageRegistry<Err> + ?Sized,
{
  PipelineRun::new().execute(registry)
}

/// The error's display text, each of its `source()` causes, and a backtrace
/// captured at the point of reporting (subject to `RUST_BACKTRACE`).
pub fn causal_trace(err: &(dyn std::error::Error + 'static)) -> String {
  let mut trace = format!("{}", err);
  let mut source = err.source();
  let mut depth = 0;
  while let Some(cause) = source {
    depth += 1;
    trace.push_str(&format!("\n  {}: {}", depth, cause));
    source = cause.source();
  }
  let backtrace = Backtrace::capture();
  trace.push_str(&format!("\nbacktrace:\n{}", backtrace));
  trace
}

fn report_causal_trace<Err>(stage_name: &str, err: &Err)
where
  Err: std::error::Error + 'static,
{
  event!(
    Level::ERROR,
    stage = stage_name,
    trace = %causal_trace(err),
    "Stage preparation failed."
  );
}

/// Tracks one full run (prepare every stage, then run the lifecycle) through
/// the [`RunState`] machine.
#[derive(Debug)]
pub struct PipelineRun {
  state: RunState,
}

impl PipelineRun {
  pub fn new() -> Self {
    Self {
      state: RunState::NotStarted,
    }
  }

  pub fn state(&self) -> &RunState {
    &self.state
  }

  /// Prepares every stage in `registry`, then runs the canonical lifecycle.
  ///
  /// The first error moves the run to `Aborted` and is returned unchanged.
  /// `after_failure` is never invoked from here. A run that already reached
  /// `Completed` or `Aborted` fails with [`CisternError::RunFinished`].
  #[instrument(name = "PipelineRun::execute", skip_all, err(Display))]
  pub fn execute<Err, R>(&mut self, registry: &R) -> Result<(), Err>
  where
    Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
    R: StageRegistry<Err> + ?Sized,
  {
    if self.state.is_terminal() {
      return Err(Err::from(CisternError::RunFinished {
        state: self.state.to_string(),
      }));
    }

    self.transition(RunState::Preparing);
    if let Err((stage, err)) = prepare_registered(registry) {
      self.abort(&stage, Phase::Prepare, &err);
      return Err(err);
    }

    for stage in LifecycleStage::CANONICAL {
      self.transition(RunState::Running {
        stage: stage.as_str().to_string(),
      });
      if let Err(err) = run_stage(stage.as_str(), registry) {
        self.abort(stage.as_str(), Phase::Run, &err);
        return Err(err);
      }
    }

    self.transition(RunState::Completed);
    Ok(())
  }

  fn transition(&mut self, next: RunState) {
    event!(Level::DEBUG, from = %self.state, to = %next, "Run state transition.");
    self.state = next;
  }

  fn abort<Err>(&mut self, stage: &str, phase: Phase, err: &Err)
  where
    Err: std::error::Error,
  {
    self.transition(RunState::Aborted {
      stage: stage.to_string(),
      phase,
      message: err.to_string(),
    });
  }
}

impl Default for PipelineRun {
  fn default() -> Self {
    Self::new()
  }
}
