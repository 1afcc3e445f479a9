//! Common test utilities for lifecycle integration tests.

#![allow(dead_code)]

use std::time::Duration;

use chartflow_aggregate::{DerivedConfig, FetchConfig, PageStream, aggregate, pages};
use chartflow_core::{Accessors, BoxError, MergedTable, Result, Time};
use chrono::{TimeZone, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};

/// A daily usage sample.
#[derive(Debug, Clone, PartialEq)]
pub struct Usage {
    /// Epoch milliseconds.
    pub t: i64,
    /// Requests served.
    pub requests: f64,
}

/// Inclusive day range, in days since the epoch.
pub type DateRange = (i64, i64);

/// Milliseconds per day.
pub const DAY: i64 = 86_400_000;

/// Epoch milliseconds as a timestamp.
pub fn at(ms: i64) -> Time {
    Utc.timestamp_millis_opt(ms).unwrap()
}

/// Accessors for [`Usage`].
pub fn accessors() -> Accessors<Usage> {
    Accessors::new(|u: &Usage| at(u.t), |u: &Usage| Some(u.requests))
}

/// One sample per day in `range`, with `requests` equal to the day number
/// times `scale`.
pub fn daily(range: DateRange, scale: f64) -> Vec<Usage> {
    (range.0..=range.1)
        .map(|day| Usage {
            t: day * DAY,
            requests: day as f64 * scale,
        })
        .collect()
}

/// A source serving `points` one per page, waiting `delay` before each.
pub fn slow_source(label: &str, delay: Duration, points: Vec<Usage>) -> FetchConfig<Usage> {
    FetchConfig::new(
        label,
        move || -> PageStream<Usage> {
            stream::iter(points)
                .then(move |point| async move {
                    tokio::time::sleep(delay).await;
                    Ok::<_, BoxError>(vec![point])
                })
                .boxed()
        },
        accessors(),
    )
}

/// Builds the usage chart aggregation for a date range.
///
/// Longer ranges take longer to fetch, so a wide range started first
/// finishes after a narrow range started second.
pub fn usage_chart(range: DateRange) -> BoxFuture<'static, Result<MergedTable>> {
    let delay = Duration::from_millis(10 * (range.1 - range.0 + 1) as u64);
    async move {
        aggregate(
            vec![
                slow_source("web", delay, daily(range, 1.0)),
                slow_source("api", delay, daily(range, 2.0)),
            ],
            vec![DerivedConfig::running_max("Peak", accessors())],
        )
        .await
    }
    .boxed()
}

/// Error raised by [`flaky_chart`].
#[derive(Debug, thiserror::Error)]
#[error("quota exceeded")]
pub struct QuotaExceeded;

/// An aggregation whose second source fails after its first page.
pub fn flaky_chart(range: DateRange) -> BoxFuture<'static, Result<MergedTable>> {
    let first_day = daily((range.0, range.0), 1.0);
    async move {
        aggregate(
            vec![
                FetchConfig::new(
                    "web",
                    move || pages::from_pages(vec![daily(range, 1.0)]),
                    accessors(),
                ),
                FetchConfig::from_stream(
                    "api",
                    stream::iter(vec![Ok(first_day), Err(BoxError::from(QuotaExceeded))]),
                    accessors(),
                ),
            ],
            vec![],
        )
        .await
    }
    .boxed()
}
