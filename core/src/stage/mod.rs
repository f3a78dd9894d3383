// cistern/src/stage/mod.rs

//! Defines the `Stage<Err>` struct: its construction, step registration and batch execution.

pub mod definition;
pub mod execution;

// Re-export the main Stage struct
pub use definition::Stage;
