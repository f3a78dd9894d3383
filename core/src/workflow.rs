// cistern/src/workflow.rs

//! Defines the `Workflow<Err>` registry mapping stage names to stages, and the
//! `StageRegistry` lookup contract the runner consumes.

use crate::core::lifecycle::LifecycleStage;
use crate::error::CisternError;
use crate::stage::Stage;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::{event, Level};

/// What the runner needs from a registry: lookup by name and iteration over all stages.
pub trait StageRegistry<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  /// Returns the stage registered under `name`, if any.
  fn lookup(&self, name: &str) -> Option<&Stage<Err>>;

  /// Every registered stage, in registry-iteration order.
  fn stages(&self) -> Vec<&Stage<Err>>;
}

/// An insertion-ordered registry of named stages.
pub struct Workflow<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  stages: IndexMap<String, Stage<Err>>,
}

impl<Err> Workflow<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  /// Creates a registry with no stages.
  pub fn new() -> Self {
    Self { stages: IndexMap::new() }
  }

  /// Creates a registry holding an empty stage for every lifecycle name,
  /// canonical order first and `after_failure` last.
  pub fn lifecycle() -> Self {
    let mut workflow = Self::new();
    for stage in LifecycleStage::ALL {
      workflow.insert_stage(Stage::new(stage.as_str()));
    }
    workflow
  }

  pub fn stage(&self, name: &str) -> Option<&Stage<Err>> {
    self.stages.get(name)
  }

  /// Returns the stage named `name`, appending an empty one if it does not exist yet.
  pub fn stage_mut(&mut self, name: &str) -> &mut Stage<Err> {
    if !self.stages.contains_key(name) {
      event!(Level::DEBUG, stage = name, "Creating stage on first use.");
    }
    self
      .stages
      .entry(name.to_string())
      .or_insert_with(|| Stage::new(name))
  }

  /// Shorthand for `stage_mut(stage.as_str())`.
  pub fn lifecycle_stage_mut(&mut self, stage: LifecycleStage) -> &mut Stage<Err> {
    self.stage_mut(stage.as_str())
  }

  /// Registers `stage` under its own name. A stage already registered under
  /// that name is replaced in place and returned.
  pub fn insert_stage(&mut self, stage: Stage<Err>) -> Option<Stage<Err>> {
    event!(Level::DEBUG, stage = stage.name(), num_steps = stage.len(), "Registering stage.");
    self.stages.insert(stage.name().to_string(), stage)
  }

  /// Removes and returns the named stage, keeping the order of the others.
  pub fn remove_stage(&mut self, name: &str) -> Option<Stage<Err>> {
    self.stages.shift_remove(name)
  }

  pub fn stage_names(&self) -> Vec<&str> {
    self.stages.keys().map(String::as_str).collect()
  }

  pub fn len(&self) -> usize {
    self.stages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stages.is_empty()
  }

  /// Clears the steps of every stage. Stage names and order are kept.
  pub fn reset(&mut self) {
    for stage in self.stages.values_mut() {
      stage.reset();
    }
  }
}

impl<Err> Default for Workflow<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<Err> std::fmt::Debug for Workflow<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list().entries(self.stages.values()).finish()
  }
}

impl<Err> StageRegistry<Err> for Workflow<Err>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  fn lookup(&self, name: &str) -> Option<&Stage<Err>> {
    self.stage(name)
  }

  fn stages(&self) -> Vec<&Stage<Err>> {
    self.stages.values().collect()
  }
}

// Plain maps work as registries too; iteration order is the map's.
impl<Err> StageRegistry<Err> for HashMap<String, Stage<Err>>
where
  Err: std::error::Error + From<CisternError> + Send + Sync + 'static,
{
  fn lookup(&self, name: &str) -> Option<&Stage<Err>> {
    self.get(name)
  }

  fn stages(&self) -> Vec<&Stage<Err>> {
    self.values().collect()
  }
}
