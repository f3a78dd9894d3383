// cistern/src/ci/provider.rs

//! Defines the `CiProvider` trait for querying the hosting CI service and
//! `EnvCi`, which answers those queries from the provider's environment variables.

use crate::ci::env::Environment;
use std::fmt;
use std::process::Command;
use std::sync::Arc;
use tracing::{event, Level};

/// Which CI service the pipeline runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CiKind {
  GitHubActions,
  GitLabCi,
  Travis,
  CircleCi,
  /// Not on a recognised CI service, e.g. a developer machine.
  Local,
}

impl fmt::Display for CiKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      CiKind::GitHubActions => "GitHub Actions",
      CiKind::GitLabCi => "GitLab CI",
      CiKind::Travis => "Travis CI",
      CiKind::CircleCi => "CircleCI",
      CiKind::Local => "local",
    };
    f.write_str(name)
  }
}

/// Metadata about the build the pipeline is running for.
pub trait CiProvider: Send + Sync {
  fn kind(&self) -> CiKind;

  /// Branch being built. For pull requests, the source branch.
  fn branch(&self) -> Option<String>;

  /// Tag being built, if the build was triggered by one.
  fn tag(&self) -> Option<String>;

  fn commit(&self) -> Option<String>;

  /// `owner/repository`.
  fn repo_slug(&self) -> Option<String>;

  fn is_pull_request(&self) -> bool;

  fn is_tag(&self) -> bool {
    self.tag().is_some()
  }

  /// Whether a person is at the keyboard. Only true outside CI.
  fn is_interactive(&self) -> bool;

  fn env(&self, key: &str) -> Option<String>;
}

impl<P> CiProvider for Arc<P>
where
  P: CiProvider + ?Sized,
{
  fn kind(&self) -> CiKind {
    (**self).kind()
  }

  fn branch(&self) -> Option<String> {
    (**self).branch()
  }

  fn tag(&self) -> Option<String> {
    (**self).tag()
  }

  fn commit(&self) -> Option<String> {
    (**self).commit()
  }

  fn repo_slug(&self) -> Option<String> {
    (**self).repo_slug()
  }

  fn is_pull_request(&self) -> bool {
    (**self).is_pull_request()
  }

  fn is_tag(&self) -> bool {
    (**self).is_tag()
  }

  fn is_interactive(&self) -> bool {
    (**self).is_interactive()
  }

  fn env(&self, key: &str) -> Option<String> {
    (**self).env(key)
  }
}

/// Picks the CI service from its marker variables.
pub fn detect(env: Arc<dyn Environment>) -> EnvCi {
  let kind = if env.var("GITHUB_ACTIONS").as_deref() == Some("true") {
    CiKind::GitHubActions
  } else if env.var("GITLAB_CI").is_some() {
    CiKind::GitLabCi
  } else if env.var("TRAVIS").as_deref() == Some("true") {
    CiKind::Travis
  } else if env.var("CIRCLECI").as_deref() == Some("true") {
    CiKind::CircleCi
  } else {
    CiKind::Local
  };
  event!(Level::DEBUG, ci = %kind, "Detected CI provider.");
  EnvCi::new(kind, env)
}

/// A [`CiProvider`] backed by environment variables (and `git`, for `Local`).
#[derive(Clone)]
pub struct EnvCi {
  kind: CiKind,
  env: Arc<dyn Environment>,
}

impl EnvCi {
  pub fn new(kind: CiKind, env: Arc<dyn Environment>) -> Self {
    Self { kind, env }
  }

  fn var(&self, key: &str) -> Option<String> {
    self.env.var(key)
  }
}

impl fmt::Debug for EnvCi {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("EnvCi").field("kind", &self.kind).finish()
  }
}

impl CiProvider for EnvCi {
  fn kind(&self) -> CiKind {
    self.kind
  }

  fn branch(&self) -> Option<String> {
    match self.kind {
      CiKind::GitHubActions => self
        .var("GITHUB_HEAD_REF")
        .or_else(|| self.var("GITHUB_REF").and_then(|r| r.strip_prefix("refs/heads/").map(str::to_string))),
      CiKind::GitLabCi => self
        .var("CI_MERGE_REQUEST_SOURCE_BRANCH_NAME")
        .or_else(|| self.var("CI_COMMIT_BRANCH")),
      CiKind::Travis => self
        .var("TRAVIS_PULL_REQUEST_BRANCH")
        .or_else(|| self.var("TRAVIS_BRANCH")),
      CiKind::CircleCi => self.var("CIRCLE_BRANCH"),
      CiKind::Local => git(&["rev-parse", "--abbrev-ref", "HEAD"]).filter(|b| b != "HEAD"),
    }
  }

  fn tag(&self) -> Option<String> {
    match self.kind {
      CiKind::GitHubActions => self
        .var("GITHUB_REF")
        .and_then(|r| r.strip_prefix("refs/tags/").map(str::to_string)),
      CiKind::GitLabCi => self.var("CI_COMMIT_TAG"),
      CiKind::Travis => self.var("TRAVIS_TAG"),
      CiKind::CircleCi => self.var("CIRCLE_TAG"),
      CiKind::Local => git(&["describe", "--tags", "--exact-match"]),
    }
  }

  fn commit(&self) -> Option<String> {
    match self.kind {
      CiKind::GitHubActions => self.var("GITHUB_SHA"),
      CiKind::GitLabCi => self.var("CI_COMMIT_SHA"),
      CiKind::Travis => self.var("TRAVIS_COMMIT"),
      CiKind::CircleCi => self.var("CIRCLE_SHA1"),
      CiKind::Local => git(&["rev-parse", "HEAD"]),
    }
  }

  fn repo_slug(&self) -> Option<String> {
    match self.kind {
      CiKind::GitHubActions => self.var("GITHUB_REPOSITORY"),
      CiKind::GitLabCi => self.var("CI_PROJECT_PATH"),
      CiKind::Travis => self.var("TRAVIS_REPO_SLUG"),
      CiKind::CircleCi => match (self.var("CIRCLE_PROJECT_USERNAME"), self.var("CIRCLE_PROJECT_REPONAME")) {
        (Some(user), Some(repo)) => Some(format!("{}/{}", user, repo)),
        _ => None,
      },
      CiKind::Local => None,
    }
  }

  fn is_pull_request(&self) -> bool {
    match self.kind {
      CiKind::GitHubActions => matches!(
        self.var("GITHUB_EVENT_NAME").as_deref(),
        Some("pull_request") | Some("pull_request_target")
      ),
      CiKind::GitLabCi => self.var("CI_MERGE_REQUEST_IID").is_some(),
      // Travis sets "false" outside pull requests, the PR number otherwise.
      CiKind::Travis => self.var("TRAVIS_PULL_REQUEST").map_or(false, |pr| pr != "false"),
      CiKind::CircleCi => self.var("CIRCLE_PULL_REQUEST").is_some(),
      CiKind::Local => false,
    }
  }

  fn is_interactive(&self) -> bool {
    self.kind == CiKind::Local
  }

  fn env(&self, key: &str) -> Option<String> {
    self.var(key)
  }
}

// Trimmed stdout of a successful git invocation; None if git is missing or fails.
fn git(args: &[&str]) -> Option<String> {
  let output = Command::new("git").args(args).output().ok()?;
  if !output.status.success() {
    return None;
  }
  let text = String::from_utf8(output.stdout).ok()?;
  let text = text.trim();
  if text.is_empty() {
    None
  } else {
    Some(text.to_string())
  }
}
