//! Common test utilities for aggregation integration tests.

#![allow(dead_code)]

use std::time::Duration;

use chartflow_aggregate::{FetchConfig, PageStream, pages};
use chartflow_core::{Accessors, BoxError, Time};
use chrono::{TimeZone, Utc};
use futures::StreamExt;
use futures::stream;

/// A usage sample as a stats endpoint would return it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Epoch milliseconds.
    pub t: i64,
    /// Measured value; `None` when the endpoint reported nothing.
    pub v: Option<f64>,
}

/// Shorthand for a sample.
pub fn s(t: i64, v: f64) -> Sample {
    Sample { t, v: Some(v) }
}

/// Epoch milliseconds as a timestamp.
pub fn at(ms: i64) -> Time {
    Utc.timestamp_millis_opt(ms).unwrap()
}

/// Accessors reading `t` and `v`.
pub fn accessors() -> Accessors<Sample> {
    Accessors::new(|p: &Sample| at(p.t), |p: &Sample| p.v)
}

/// A source serving `pages` from memory.
pub fn fetch(label: &str, pages: Vec<Vec<Sample>>) -> FetchConfig<Sample> {
    FetchConfig::new(label, move || pages::from_pages(pages), accessors())
}

/// A source that sleeps `delay` before every page.
pub fn delayed(label: &str, delay: Duration, pages: Vec<Vec<Sample>>) -> FetchConfig<Sample> {
    FetchConfig::new(
        label,
        move || -> PageStream<Sample> {
            stream::iter(pages)
                .then(move |page| async move {
                    tokio::time::sleep(delay).await;
                    Ok::<_, BoxError>(page)
                })
                .boxed()
        },
        accessors(),
    )
}

/// Error raised by [`failing_after_first_page`].
#[derive(Debug, thiserror::Error)]
#[error("stats endpoint returned 503")]
pub struct Unavailable;

/// A source that yields one page and then fails.
pub fn failing_after_first_page(label: &str, first: Vec<Sample>) -> FetchConfig<Sample> {
    FetchConfig::from_stream(
        label,
        stream::iter(vec![Ok(first), Err(BoxError::from(Unavailable))]),
        accessors(),
    )
}
