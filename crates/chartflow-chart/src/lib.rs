#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Chartflow Chart
//!
//! # Modules
//!
//! - [`sink`]: The `ChartSink` contract and `ChartOptions`
//! - [`datatable`]: Google Charts DataTable encoding
//! - [`json`]: A sink writing JSON documents
//! - [`panel`]: Task-driven chart panel

pub mod datatable;
pub mod json;
pub mod panel;
pub mod sink;

// Re-exports for convenience
pub use json::JsonSink;
pub use panel::{ChartPanel, PanelView};
pub use sink::{ChartOptions, ChartSink};
