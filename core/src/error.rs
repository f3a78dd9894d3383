// cistern/src/error.rs
use anyhow::Error as AnyhowError;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CisternError {
  #[error("Task '{task_name}' has no run action")]
  RunMissing { task_name: String },

  #[error("Unknown lifecycle stage: {name}")]
  UnknownStage { name: String },

  #[error("Pipeline run already finished in state '{state}'")]
  RunFinished { state: String },

  #[error("Failed to start command '{program}'. Source: {source}")]
  CommandSpawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("Command '{program}' exited with {status}")]
  CommandFailed { program: String, status: ExitStatus },

  #[error("I/O error on '{}'. Source: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("Error in user-provided step action. Source: {source}")]
  Step {
    #[source]
    source: AnyhowError,
  },
}

// Lets step actions written against anyhow plug into stages whose error type is CisternError.
impl From<AnyhowError> for CisternError {
  fn from(err: AnyhowError) -> Self {
    // An anyhow error that already wraps a CisternError is unwrapped rather than nested.
    match err.downcast::<CisternError>() {
      Ok(cistern_err) => cistern_err,
      Err(other) => CisternError::Step { source: other },
    }
  }
}

pub type CisternResult<T, E = CisternError> = std::result::Result<T, E>;
