// cistern/src/ci/env.rs

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// A source of environment variables.
///
/// Empty values read as absent, matching how CI services leave unused variables blank.
pub trait Environment: Send + Sync {
  fn var(&self, key: &str) -> Option<String>;
}

impl<E> Environment for Arc<E>
where
  E: Environment + ?Sized,
{
  fn var(&self, key: &str) -> Option<String> {
    (**self).var(key)
  }
}

/// The process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
  fn var(&self, key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
  }
}

/// An in-memory environment with interior mutability.
///
/// Cloning shares the underlying map, so a step holding one clone can set a
/// variable that a later step's check (holding another clone) observes.
/// Lock guards are never handed out; every access copies.
#[derive(Debug, Clone, Default)]
pub struct MapEnv(Arc<RwLock<HashMap<String, String>>>);

impl MapEnv {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
  where
    K: Into<String>,
    V: Into<String>,
  {
    let map = pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
    MapEnv(Arc::new(RwLock::new(map)))
  }

  /// Sets `key`, returning the previous value.
  pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
    self.0.write().insert(key.into(), value.into())
  }

  pub fn remove(&self, key: &str) -> Option<String> {
    self.0.write().remove(key)
  }

  /// A copy of every variable currently set.
  pub fn snapshot(&self) -> HashMap<String, String> {
    self.0.read().clone()
  }
}

impl Environment for MapEnv {
  fn var(&self, key: &str) -> Option<String> {
    self.0.read().get(key).filter(|value| !value.is_empty()).cloned()
  }
}
