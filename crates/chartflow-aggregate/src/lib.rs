#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Chartflow Aggregate
//!
//! # Modules
//!
//! - [`fetch`]: Source configuration and the page-stream contract
//! - [`pages`]: Ready-made page sources, including token pagination
//! - [`derived`]: Calculators and per-run caches
//! - [`merge`]: Time-indexed join of series into a table
//! - [`engine`]: The end-to-end aggregation run

pub mod derived;
pub mod engine;
pub mod fetch;
pub mod merge;
pub mod pages;

// Re-exports for convenience
pub use derived::{Calculator, DerivedConfig, RunningMax, SeriesCache, compute_derived};
pub use engine::{AggregateOptions, Aggregator, aggregate, fetch_all};
pub use fetch::{FetchConfig, PageStream, SourceFactory};
pub use merge::merge;
pub use pages::Page;
