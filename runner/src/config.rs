// runner/src/config.rs

use crate::errors::{Result, RunnerError};
use cistern::ci::ProcessEnv;
use cistern::Environment;
use dotenvy::dotenv;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerConfig {
  /// Default tracing filter when `RUST_LOG` is unset.
  pub log_filter: String,
  pub cargo: String,
  /// Branch whose builds may deploy.
  pub deploy_branch: String,
  /// Program and arguments run by the deploy stage. No deploy step when unset.
  pub deploy_command: Option<Vec<String>>,
  pub test_args: Vec<String>,
  pub build_info_path: PathBuf,
}

impl RunnerConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_vars(&ProcessEnv)
  }

  pub fn from_vars(env: &dyn Environment) -> Result<Self> {
    let get_env = |var_name: &str, default: &str| env.var(var_name).unwrap_or_else(|| default.to_string());

    let log_filter = get_env("CISTERN_LOG", "info");
    let cargo = get_env("CISTERN_CARGO", "cargo");
    let deploy_branch = get_env("CISTERN_DEPLOY_BRANCH", "main");

    let deploy_command = match env.var("CISTERN_DEPLOY_COMMAND") {
      Some(raw) => {
        let parts = split_words(&raw);
        if parts.is_empty() {
          return Err(RunnerError::Config(
            "CISTERN_DEPLOY_COMMAND must name a program".to_string(),
          ));
        }
        Some(parts)
      }
      None => None,
    };

    let test_args = env.var("CISTERN_TEST_ARGS").map(|raw| split_words(&raw)).unwrap_or_default();

    let build_info_path = PathBuf::from(get_env("CISTERN_BUILD_INFO", "target/cistern/build-info.txt"));
    if build_info_path.file_name().is_none() {
      return Err(RunnerError::Config(format!(
        "Invalid CISTERN_BUILD_INFO: '{}' does not name a file",
        build_info_path.display()
      )));
    }

    Ok(RunnerConfig {
      log_filter,
      cargo,
      deploy_branch,
      deploy_command,
      test_args,
      build_info_path,
    })
  }
}

fn split_words(raw: &str) -> Vec<String> {
  raw.split_whitespace().map(str::to_string).collect()
}
