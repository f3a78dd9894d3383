// cistern/src/checks.rs

//! Ready-made applicability checks for tasks and gated steps.
//!
//! Each constructor captures its context (an [`Environment`] or a
//! [`CiProvider`]) when the workflow is built and returns a zero-argument
//! predicate, e.g. `TaskDef::new().check(on_branch(ci.clone(), "main"))`.

use crate::ci::{CiProvider, Environment};
use crate::error::CisternResult;
use std::sync::Arc;

/// True when `key` is set to exactly `value`.
pub fn env_equals(
  env: Arc<dyn Environment>,
  key: impl Into<String>,
  value: impl Into<String>,
) -> impl Fn() -> CisternResult<bool> + Send + Sync + 'static {
  let key = key.into();
  let value = value.into();
  move || Ok(env.var(&key).as_deref() == Some(value.as_str()))
}

/// True when `key` is set to a non-empty value.
pub fn env_is_set(env: Arc<dyn Environment>, key: impl Into<String>) -> impl Fn() -> CisternResult<bool> + Send + Sync + 'static {
  let key = key.into();
  move || Ok(env.var(&key).is_some())
}

/// True when building `branch`.
pub fn on_branch(ci: Arc<dyn CiProvider>, branch: impl Into<String>) -> impl Fn() -> CisternResult<bool> + Send + Sync + 'static {
  let branch = branch.into();
  move || Ok(ci.branch().as_deref() == Some(branch.as_str()))
}

/// True when the build was triggered by a tag.
pub fn on_tag(ci: Arc<dyn CiProvider>) -> impl Fn() -> CisternResult<bool> + Send + Sync + 'static {
  move || Ok(ci.is_tag())
}

pub fn not_pull_request(ci: Arc<dyn CiProvider>) -> impl Fn() -> CisternResult<bool> + Send + Sync + 'static {
  move || Ok(!ci.is_pull_request())
}

/// True on a CI service, false on a developer machine.
pub fn non_interactive(ci: Arc<dyn CiProvider>) -> impl Fn() -> CisternResult<bool> + Send + Sync + 'static {
  move || Ok(!ci.is_interactive())
}

/// Both checks hold. `second` is not evaluated when `first` is false;
/// an error from either is returned as is.
pub fn both<E: 'static>(
  first: impl Fn() -> Result<bool, E> + Send + Sync + 'static,
  second: impl Fn() -> Result<bool, E> + Send + Sync + 'static,
) -> impl Fn() -> Result<bool, E> + Send + Sync + 'static {
  move || Ok(first()? && second()?)
}

/// Inverts a check. Errors are not inverted.
pub fn negate<E: 'static>(check: impl Fn() -> Result<bool, E> + Send + Sync + 'static) -> impl Fn() -> Result<bool, E> + Send + Sync + 'static {
  move || check().map(|applies| !applies)
}
