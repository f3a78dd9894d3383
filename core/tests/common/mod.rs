// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use cistern::{CisternError, Task, TaskDef};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)] // Clone, PartialEq, Eq for assertions
pub enum TestError {
  #[error("Cistern framework error: {0}")]
  Cistern(String), // Store as String for Eq comparison

  #[error("Test step failed: {0}")]
  Step(String),

  #[error("Test check failed: {0}")]
  Check(String),
}

impl From<CisternError> for TestError {
  fn from(ce: CisternError) -> Self {
    TestError::Cistern(format!("{:?}", ce))
  }
}

// --- Shared log that steps append markers to ---
#[derive(Clone, Debug, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&self, entry: impl Into<String>) {
    self.0.lock().push(entry.into());
  }

  pub fn entries(&self) -> Vec<String> {
    self.0.lock().clone()
  }

  pub fn clear(&self) {
    self.0.lock().clear();
  }
}

// --- Common Task Creators ---
pub fn recording_task(journal: &Journal, marker: &'static str) -> Task<TestError> {
  let journal = journal.clone();
  Task::new(move || {
    journal.push(marker);
    Ok::<(), TestError>(())
  })
  .with_name(marker)
}

pub fn failing_task(journal: &Journal, marker: &'static str, error_message: &'static str) -> Task<TestError> {
  let journal = journal.clone();
  Task::new(move || {
    journal.push(marker);
    tracing::warn!(target: "test_steps", step = marker, "failing with: '{}'", error_message);
    Err(TestError::Step(error_message.to_string()))
  })
  .with_name(marker)
}

/// A task that records "prepare:<marker>" and "run:<marker>" and is gated by `applies`.
pub fn gated_task(journal: &Journal, marker: &'static str, applies: bool) -> TaskDef<TestError> {
  let prep_journal = journal.clone();
  let run_journal = journal.clone();
  TaskDef::new()
    .name(marker)
    .check(move || Ok::<bool, TestError>(applies))
    .prepare(move || {
      prep_journal.push(format!("prepare:{}", marker));
      Ok::<(), TestError>(())
    })
    .run(move || {
      run_journal.push(format!("run:{}", marker));
      Ok::<(), TestError>(())
    })
}

// --- Counts how often a check was evaluated ---
#[derive(Clone, Debug, Default)]
pub struct CheckCounter(Arc<AtomicUsize>);

impl CheckCounter {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn check_returning(&self, applies: bool) -> impl Fn() -> Result<bool, TestError> + Send + Sync + 'static {
    let counter = self.0.clone();
    move || {
      counter.fetch_add(1, Ordering::SeqCst);
      Ok(applies)
    }
  }

  pub fn count(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
