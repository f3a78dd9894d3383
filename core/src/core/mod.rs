pub mod control;
pub mod lifecycle;
pub mod step;

// Re-export key types for easier access from other cistern modules (and lib.rs)
pub use control::{Phase, RunState};
pub use lifecycle::LifecycleStage;
pub use step::{Action, Check, Gated, Step, StepExt, Task, TaskDef};
