#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Chartflow Task
//!
//! # Modules
//!
//! - [`state`]: The four task states, render callbacks, run outcomes
//! - [`task`]: The task handle and its runs

pub mod state;
pub mod task;

// Re-exports for convenience
pub use state::{RunOutcome, TaskRender, TaskSnapshot, TaskState};
pub use task::{AsyncTask, ReadyCheck, TaskFn, TaskRun};
