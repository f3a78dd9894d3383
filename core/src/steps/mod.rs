// cistern/src/steps/mod.rs

//! Built-in steps for common CI chores. Each works with any stage error type
//! that is `From<CisternError>`.

pub mod command;
pub mod file;

pub use command::RunCommand;
pub use file::WriteTextFile;
