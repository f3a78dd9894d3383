// cistern/src/ci/mod.rs

//! Read-only access to the environment a pipeline runs in: environment
//! variables and the metadata of the hosting CI service.
//!
//! Nothing in the stage/step core depends on this module. Workflows capture
//! an `Environment` or `CiProvider` in their checks when they are built.

pub mod env;
pub mod provider;

pub use env::{Environment, MapEnv, ProcessEnv};
pub use provider::{detect, CiKind, CiProvider, EnvCi};
