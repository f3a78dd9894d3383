// cistern/src/stage/definition.rs

//! Contains the `Stage<Err>` struct definition and the methods that build up
//! or clear its ordered step sequence.

use crate::core::step::{Step, Task, TaskDef};
use crate::error::CisternError;
use std::sync::Arc;
use tracing::{event, Level};

/// A named, ordered collection of steps.
///
/// Insertion order is execution order, for both `prepare_all` and `run_all`.
/// The same step may appear more than once.
///
/// `Err` is the error type of every step in the stage. It must be
/// `From<CisternError>` so framework failures (a task without a run action,
/// a failing built-in step) surface through the same type.
pub struct Stage<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<Arc<dyn Step<Err>>>,
}

impl<Err> Stage<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  /// Creates an empty stage.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      steps: Vec::new(),
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  /// Names of the registered steps, in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|step| step.name()).collect()
  }

  /// Appends a step. No deduplication.
  pub fn add_step<S>(&mut self, step: S) -> &mut Self
  where
    S: Step<Err> + 'static,
  {
    self.add_shared_step(Arc::new(step))
  }

  /// Appends an already shared step, e.g. the same step registered twice in this stage.
  ///
  /// The stage holds an `Arc`, so the step may also sit in other stages. Steps
  /// take `&self` only, and resetting a stage drops its handles without
  /// affecting the others.
  pub fn add_shared_step(&mut self, step: Arc<dyn Step<Err>>) -> &mut Self {
    event!(Level::DEBUG, stage = %self.name, step = step.name(), position = self.steps.len(), "Step added.");
    self.steps.push(step);
    self
  }

  /// Builds a task from `def` and appends it.
  ///
  /// Fails without touching the stage if `def` has no run action.
  pub fn add_task(&mut self, def: TaskDef<Err>) -> Result<&mut Self, Err> {
    let task = def.build().map_err(|err| {
      event!(Level::ERROR, stage = %self.name, error = %err, "Rejected task definition.");
      Err::from(err)
    })?;
    Ok(self.add_step(task))
  }

  /// Appends a named task that always runs and needs no preparation.
  pub fn add_run<E>(&mut self, name: impl Into<String>, run: impl Fn() -> Result<(), E> + Send + Sync + 'static) -> &mut Self
  where
    E: Into<Err> + 'static,
  {
    self.add_step(Task::new(run).with_name(name))
  }

  /// Removes every step, returning the stage to its empty initial state.
  pub fn reset(&mut self) {
    event!(Level::DEBUG, stage = %self.name, removed = self.steps.len(), "Stage reset.");
    self.steps.clear();
  }
}

impl<Err> std::fmt::Debug for Stage<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Stage")
      .field("name", &self.name)
      .field("steps", &self.step_names())
      .finish()
  }
}
