// cistern/src/stage/execution.rs

//! Contains `Stage::prepare_all()` and `Stage::run_all()`, the two batch passes
//! over a stage's steps. Both gate every step on its check and stop at the
//! first error, returning it unchanged.

use crate::core::control::Phase;
use crate::core::step::Step;
use crate::error::CisternError;
use crate::stage::definition::Stage;
use tracing::{event, instrument, span, Level};

impl<Err> Stage<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  /// Prepares every step whose check holds, in order.
  ///
  /// Stops at the first check or prepare error; later steps are not attempted.
  #[instrument(
        name = "Stage::prepare_all",
        skip_all,
        fields(stage = %self.name, num_steps = self.steps.len()),
        err(Display)
    )]
  pub fn prepare_all(&self) -> Result<(), Err> {
    self.for_each_applicable(Phase::Prepare, |step| step.prepare())
  }

  /// Executes every step whose check holds, in order.
  ///
  /// Stops at the first check or execute error; later steps are not attempted.
  #[instrument(
        name = "Stage::run_all",
        skip_all,
        fields(stage = %self.name, num_steps = self.steps.len()),
        err(Display)
    )]
  pub fn run_all(&self) -> Result<(), Err> {
    self.for_each_applicable(Phase::Run, |step| step.execute())
  }

  fn for_each_applicable<F>(&self, phase: Phase, mut act: F) -> Result<(), Err>
  where
    F: FnMut(&dyn Step<Err>) -> Result<(), Err>,
  {
    event!(Level::DEBUG, %phase, "Stage pass starting.");

    for (step_idx, step) in self.steps.iter().enumerate() {
      let step_span = span!(
        Level::INFO,
        "stage_step",
        step_name = step.name(),
        step_index = step_idx,
        %phase
      );
      let _step_span_guard = step_span.enter();

      match step.should_run() {
        Ok(true) => {}
        Ok(false) => {
          event!(Level::DEBUG, "Step skipped, check returned false.");
          continue;
        }
        Err(e) => {
          event!(Level::ERROR, error = %e, "Step check failed.");
          return Err(e);
        }
      }

      if let Err(e) = act(step.as_ref()) {
        event!(Level::ERROR, error = %e, "Step failed.");
        return Err(e);
      }
      event!(Level::DEBUG, "Step finished.");
    }

    event!(Level::DEBUG, %phase, "Stage pass completed.");
    Ok(())
  }
}
