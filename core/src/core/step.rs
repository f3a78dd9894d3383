// cistern/src/core/step.rs

//! Defines a single step of a stage: an applicability check, an optional
//! preparation action and the mandatory run action.

use crate::error::CisternError;
use std::sync::Arc;

// Type alias for a step's applicability check.
// Takes no pipeline arguments: anything it inspects (environment, CI metadata)
// is captured when the workflow is constructed.
pub type Check<Err> = Arc<dyn Fn() -> Result<bool, Err> + Send + Sync + 'static>;

// Type alias for a prepare or run action.
pub type Action<Err> = Arc<dyn Fn() -> Result<(), Err> + Send + Sync + 'static>;

/// Diagnostic name reported by tasks built without one.
pub const UNNAMED_TASK: &str = "<unnamed task>";

/// A unit of work within a stage.
///
/// The owning stage calls `should_run` before every `prepare` and every
/// `execute`; a step is prepared and executed only while its check holds.
/// Returning `Ok(false)` from `should_run` skips the step, returning `Err`
/// fails the enclosing batch operation.
pub trait Step<Err>: Send + Sync {
  /// Name used in logs and diagnostics.
  fn name(&self) -> &str;

  /// Evaluates the applicability check. Must not mutate stage or step state.
  fn should_run(&self) -> Result<bool, Err> {
    Ok(true)
  }

  /// Setup side effects, kept separate from the main action.
  fn prepare(&self) -> Result<(), Err> {
    Ok(())
  }

  /// The step's main side effect.
  fn execute(&self) -> Result<(), Err>;
}

impl<Err, S> Step<Err> for Arc<S>
where
  S: Step<Err> + ?Sized,
{
  fn name(&self) -> &str {
    (**self).name()
  }

  fn should_run(&self) -> Result<bool, Err> {
    (**self).should_run()
  }

  fn prepare(&self) -> Result<(), Err> {
    (**self).prepare()
  }

  fn execute(&self) -> Result<(), Err> {
    (**self).execute()
  }
}

/// A closure-backed step. Built from a [`TaskDef`].
pub struct Task<Err> {
  name: Option<String>,
  check: Option<Check<Err>>,
  prepare: Option<Action<Err>>,
  run: Action<Err>,
}

impl<Err> Task<Err>
where
  Err: Send + Sync + 'static,
{
  /// Creates a task with only a run action: always applicable, nothing to prepare.
  pub fn new<E>(run: impl Fn() -> Result<(), E> + Send + Sync + 'static) -> Self
  where
    E: Into<Err> + 'static,
  {
    Self {
      name: None,
      check: None,
      prepare: None,
      run: wrap_action(run),
    }
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  pub fn has_check(&self) -> bool {
    self.check.is_some()
  }

  pub fn has_prepare(&self) -> bool {
    self.prepare.is_some()
  }
}

impl<Err> Step<Err> for Task<Err>
where
  Err: Send + Sync + 'static,
{
  fn name(&self) -> &str {
    self.name.as_deref().unwrap_or(UNNAMED_TASK)
  }

  fn should_run(&self) -> Result<bool, Err> {
    match &self.check {
      Some(check) => check(),
      None => Ok(true),
    }
  }

  fn prepare(&self) -> Result<(), Err> {
    match &self.prepare {
      Some(prepare) => prepare(),
      None => Ok(()),
    }
  }

  fn execute(&self) -> Result<(), Err> {
    (self.run)()
  }
}

impl<Err> std::fmt::Debug for Task<Err> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Task")
      .field("name", &self.name)
      .field("check_present", &self.check.is_some())
      .field("prepare_present", &self.prepare.is_some())
      .finish()
  }
}

/// Builder for a [`Task`]. Every field is optional here; `build` rejects a
/// definition without a run action.
pub struct TaskDef<Err> {
  name: Option<String>,
  check: Option<Check<Err>>,
  prepare: Option<Action<Err>>,
  run: Option<Action<Err>>,
}

impl<Err> Default for TaskDef<Err> {
  fn default() -> Self {
    Self {
      name: None,
      check: None,
      prepare: None,
      run: None,
    }
  }
}

impl<Err> TaskDef<Err>
where
  Err: Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self::default()
  }

  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Sets the applicability check. The check's own error type only has to convert into `Err`.
  pub fn check<E>(mut self, check: impl Fn() -> Result<bool, E> + Send + Sync + 'static) -> Self
  where
    E: Into<Err> + 'static,
  {
    self.check = Some(Arc::new(move || check().map_err(Into::into)));
    self
  }

  pub fn prepare<E>(mut self, prepare: impl Fn() -> Result<(), E> + Send + Sync + 'static) -> Self
  where
    E: Into<Err> + 'static,
  {
    self.prepare = Some(wrap_action(prepare));
    self
  }

  pub fn run<E>(mut self, run: impl Fn() -> Result<(), E> + Send + Sync + 'static) -> Self
  where
    E: Into<Err> + 'static,
  {
    self.run = Some(wrap_action(run));
    self
  }

  /// Finishes the definition. Fails with [`CisternError::RunMissing`] if no run action was set.
  pub fn build(self) -> Result<Task<Err>, CisternError> {
    let run = self.run.ok_or_else(|| CisternError::RunMissing {
      task_name: self.name.clone().unwrap_or_else(|| UNNAMED_TASK.to_string()),
    })?;
    Ok(Task {
      name: self.name,
      check: self.check,
      prepare: self.prepare,
      run,
    })
  }
}

fn wrap_action<Err, E>(action: impl Fn() -> Result<(), E> + Send + Sync + 'static) -> Action<Err>
where
  Err: 'static,
  E: Into<Err> + 'static,
{
  Arc::new(move || action().map_err(Into::into))
}

/// A step whose applicability is its inner step's check AND an extra predicate.
pub struct Gated<S, Err> {
  inner: S,
  check: Check<Err>,
}

impl<S, Err> Step<Err> for Gated<S, Err>
where
  S: Step<Err>,
  Err: Send + Sync + 'static,
{
  fn name(&self) -> &str {
    self.inner.name()
  }

  fn should_run(&self) -> Result<bool, Err> {
    // The inner check goes first; a false short-circuits the extra predicate.
    if !self.inner.should_run()? {
      return Ok(false);
    }
    (self.check)()
  }

  fn prepare(&self) -> Result<(), Err> {
    self.inner.prepare()
  }

  fn execute(&self) -> Result<(), Err> {
    self.inner.execute()
  }
}

/// Extension methods available on every step.
pub trait StepExt<Err>: Step<Err> + Sized
where
  Err: Send + Sync + 'static,
{
  /// Restricts this step to run only when `check` also holds.
  fn only_if<E>(self, check: impl Fn() -> Result<bool, E> + Send + Sync + 'static) -> Gated<Self, Err>
  where
    E: Into<Err> + 'static,
  {
    Gated {
      inner: self,
      check: Arc::new(move || check().map_err(Into::into)),
    }
  }
}

impl<S, Err> StepExt<Err> for S
where
  S: Step<Err>,
  Err: Send + Sync + 'static,
{
}
