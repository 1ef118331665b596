//! Scheduler runner -- assignment and per-container execution.
//!
//! Split into focused submodules:
//! - `core`: Scheduler struct, constructor, accessors and shutdown
//! - `assignment`: least-loaded selection and batch assignment
//! - `execution`: worker startup and the run handle

mod assignment;
mod core;
mod execution;

pub use self::core::Scheduler;
pub use self::execution::RunHandle;
