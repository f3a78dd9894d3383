// cistern/src/core/lifecycle.rs

//! The fixed names of the CI lifecycle stages.

use crate::error::CisternError;
use std::fmt;
use std::str::FromStr;

/// One phase of the CI lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
  BeforeInstall,
  Install,
  AfterInstall,
  BeforeScript,
  Script,
  AfterSuccess,
  AfterFailure,
  BeforeDeploy,
  Deploy,
  AfterDeploy,
  AfterScript,
}

impl LifecycleStage {
  /// Stages executed by a full lifecycle run, in order.
  /// `AfterFailure` is absent: it only runs when invoked explicitly.
  pub const CANONICAL: [LifecycleStage; 10] = [
    LifecycleStage::BeforeInstall,
    LifecycleStage::Install,
    LifecycleStage::AfterInstall,
    LifecycleStage::BeforeScript,
    LifecycleStage::Script,
    LifecycleStage::AfterSuccess,
    LifecycleStage::BeforeDeploy,
    LifecycleStage::Deploy,
    LifecycleStage::AfterDeploy,
    LifecycleStage::AfterScript,
  ];

  /// Every lifecycle stage: the canonical ten followed by `AfterFailure`.
  pub const ALL: [LifecycleStage; 11] = [
    LifecycleStage::BeforeInstall,
    LifecycleStage::Install,
    LifecycleStage::AfterInstall,
    LifecycleStage::BeforeScript,
    LifecycleStage::Script,
    LifecycleStage::AfterSuccess,
    LifecycleStage::BeforeDeploy,
    LifecycleStage::Deploy,
    LifecycleStage::AfterDeploy,
    LifecycleStage::AfterScript,
    LifecycleStage::AfterFailure,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      LifecycleStage::BeforeInstall => "before_install",
      LifecycleStage::Install => "install",
      LifecycleStage::AfterInstall => "after_install",
      LifecycleStage::BeforeScript => "before_script",
      LifecycleStage::Script => "script",
      LifecycleStage::AfterSuccess => "after_success",
      LifecycleStage::AfterFailure => "after_failure",
      LifecycleStage::BeforeDeploy => "before_deploy",
      LifecycleStage::Deploy => "deploy",
      LifecycleStage::AfterDeploy => "after_deploy",
      LifecycleStage::AfterScript => "after_script",
    }
  }
}

impl fmt::Display for LifecycleStage {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for LifecycleStage {
  type Err = CisternError;

  /// Accepts `before_install` as well as `before-install`.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().replace('-', "_");
    LifecycleStage::ALL
      .iter()
      .copied()
      .find(|stage| stage.as_str() == normalized)
      .ok_or_else(|| CisternError::UnknownStage { name: s.to_string() })
  }
}
