// src/lib.rs

//! Cistern: a synchronous stage/step engine for continuous-integration lifecycles.
//!
//! A workflow is a registry of named stages ("install", "script", "deploy", ...),
//! each an ordered list of steps with:
//!  - An optional applicability check, re-evaluated on every pass.
//!  - An optional preparation action, run in a separate pass before any step executes.
//!  - A mandatory run action.
//!  - Fail-fast semantics: the first error stops the stage and the lifecycle, unchanged.
//!  - A fixed canonical lifecycle order, with `after_failure` only ever run explicitly.
//!  - Checks that capture CI metadata (branch, tag, pull request) at construction time.

pub mod checks;
pub mod ci;
pub mod core;
pub mod error;
pub mod runner;
pub mod stage;
pub mod steps;
pub mod workflow;

// --- Re-exports for the Public API ---

// Steps and the builder used to define closure-backed tasks
pub use crate::core::step::{Step, StepExt, Task, TaskDef};
pub use crate::core::lifecycle::LifecycleStage;
pub use crate::core::control::{Phase, RunState};

pub use crate::stage::Stage;
pub use crate::workflow::{StageRegistry, Workflow};

pub use crate::runner::{prepare_all_lifecycle, run_all_lifecycle, run_all_stages, run_stage, PipelineRun};

pub use crate::ci::{CiKind, CiProvider, Environment};

pub use crate::error::{CisternError, CisternResult};

/*
    Core Workflow:
    1. Pick an error type `E: std::error::Error + From<CisternError>` (or use CisternError).
    2. Create a registry, e.g. `Workflow::<E>::lifecycle()`.
    3. Add steps to its stages:
       - `workflow.stage_mut("script").add_run("test", || ...)`
       - `.add_task(TaskDef::new().name("deploy").check(...).run(...))?`
       - `.add_step(RunCommand::new("cargo").arg("build").only_if(...))`
    4. Checks read only what they captured: an `Environment`, a `CiProvider`.
    5. Call `run_all_stages(&workflow)` (prepare everything, then run the lifecycle),
       or `run_stage("after_failure", &workflow)` from a failure handler.
*/
