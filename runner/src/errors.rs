// runner/src/errors.rs

use cistern::CisternError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from] // Allows conversion from cistern::CisternError
    source: CisternError,
  },

  #[error("Internal Error: {0}")]
  Internal(String),
}

// Step actions written against anyhow convert into RunnerError::Internal.
impl From<anyhow::Error> for RunnerError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<RunnerError>() {
      Ok(runner_err) => runner_err,
      Err(other) => RunnerError::Internal(format!("{:#}", other)),
    }
  }
}

pub type Result<T, E = RunnerError> = std::result::Result<T, E>;
