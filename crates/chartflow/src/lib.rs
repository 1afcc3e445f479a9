//! Chartflow umbrella crate.
//!
//! This crate re-exports all Chartflow components for convenience.
//! Use feature flags to enable specific functionality.

#![doc = include_str!("../README.md")]

pub use chartflow_aggregate as aggregate;
pub use chartflow_core as core;

#[cfg(feature = "task")]
pub use chartflow_task as task;

#[cfg(feature = "chart")]
pub use chartflow_chart as chart;
