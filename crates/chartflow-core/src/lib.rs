#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Chartflow Core
//!
//! Shared types for fetching, merging, and charting multi-series time data.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`time`]: Row keys and derived-series bucket keys
//! - [`types`]: Series model and merged table
//! - [`config`]: TOML configuration
//! - [`logging`]: `tracing` subscriber bootstrap

pub mod config;
pub mod error;
pub mod logging;
pub mod time;
pub mod types;

// Re-exports for convenience
pub use config::ChartflowConfig;
pub use error::{BoxError, Error, Result};
pub use time::{Time, TimeKey, bucket_key};
pub use types::{
    Accessors, Cell, CellValue, Column, ColumnKind, DOMAIN_LABEL, MergedTable, MetricSeries, Row,
};
