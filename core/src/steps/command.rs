// cistern/src/steps/command.rs

use crate::core::step::Step;
use crate::error::CisternError;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use tracing::{event, Level};

/// Runs an external program and fails if it exits unsuccessfully.
///
/// Output is inherited, so it lands in the CI log as the command writes it.
#[derive(Debug, Clone)]
pub struct RunCommand {
  name: String,
  program: OsString,
  args: Vec<OsString>,
  envs: Vec<(OsString, OsString)>,
  current_dir: Option<PathBuf>,
}

impl RunCommand {
  /// Creates the step. Its diagnostic name defaults to the program name.
  pub fn new(program: impl Into<OsString>) -> Self {
    let program = program.into();
    Self {
      name: program.to_string_lossy().into_owned(),
      program,
      args: Vec::new(),
      envs: Vec::new(),
      current_dir: None,
    }
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
    self.args.push(arg.into());
    self
  }

  pub fn args<I, A>(mut self, args: I) -> Self
  where
    I: IntoIterator<Item = A>,
    A: Into<OsString>,
  {
    self.args.extend(args.into_iter().map(Into::into));
    self
  }

  pub fn env(mut self, key: impl Into<OsString>, value: impl Into<OsString>) -> Self {
    self.envs.push((key.into(), value.into()));
    self
  }

  pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
    self.current_dir = Some(dir.into());
    self
  }

  /// The command line as it would be typed, for logs.
  pub fn display_command(&self) -> String {
    std::iter::once(&self.program)
      .chain(self.args.iter())
      .map(|part| part.to_string_lossy())
      .collect::<Vec<_>>()
      .join(" ")
  }

  fn program_name(&self) -> String {
    self.program.to_string_lossy().into_owned()
  }
}

impl<Err> Step<Err> for RunCommand
where
  Err: From<CisternError>,
{
  fn name(&self) -> &str {
    &self.name
  }

  fn execute(&self) -> Result<(), Err> {
    event!(Level::INFO, command = %self.display_command(), "Running command.");
    let mut command = Command::new(&self.program);
    command.args(&self.args).envs(self.envs.iter().map(|(k, v)| (k, v)));
    if let Some(dir) = &self.current_dir {
      command.current_dir(dir);
    }

    let status = command.status().map_err(|source| CisternError::CommandSpawn {
      program: self.program_name(),
      source,
    })?;

    if !status.success() {
      return Err(Err::from(CisternError::CommandFailed {
        program: self.program_name(),
        status,
      }));
    }
    Ok(())
  }
}
