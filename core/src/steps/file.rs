// cistern/src/steps/file.rs

use crate::core::step::Step;
use crate::error::CisternError;
use std::fs;
use std::path::PathBuf;
use tracing::{event, Level};

/// Writes a text file. Preparation creates the parent directory; execution
/// writes (or overwrites) the file.
#[derive(Debug, Clone)]
pub struct WriteTextFile {
  name: String,
  path: PathBuf,
  contents: String,
}

impl WriteTextFile {
  pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
    let path = path.into();
    Self {
      name: format!("write {}", path.display()),
      path,
      contents: contents.into(),
    }
  }

  pub fn named(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  pub fn path(&self) -> &std::path::Path {
    &self.path
  }
}

impl<Err> Step<Err> for WriteTextFile
where
  Err: From<CisternError>,
{
  fn name(&self) -> &str {
    &self.name
  }

  fn prepare(&self) -> Result<(), Err> {
    match self.path.parent() {
      Some(parent) if !parent.as_os_str().is_empty() => {
        fs::create_dir_all(parent).map_err(|source| CisternError::Io {
          path: parent.to_path_buf(),
          source,
        })?;
        Ok(())
      }
      _ => Ok(()),
    }
  }

  fn execute(&self) -> Result<(), Err> {
    event!(Level::DEBUG, path = %self.path.display(), bytes = self.contents.len(), "Writing file.");
    fs::write(&self.path, &self.contents).map_err(|source| CisternError::Io {
      path: self.path.clone(),
      source,
    })?;
    Ok(())
  }
}
