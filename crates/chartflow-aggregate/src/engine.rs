//! The aggregation engine: concurrent fetch, derived series, merge.

use std::collections::HashSet;
use std::time::Instant;

use chartflow_core::config::AggregationConfig;
use chartflow_core::{Error, MergedTable, MetricSeries, Result};
use futures::StreamExt;
use futures::future::try_join_all;

use crate::derived::{DerivedConfig, compute_derived};
use crate::fetch::FetchConfig;
use crate::merge::merge;

/// Engine options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Permit two series in one run to share a label.
    pub allow_label_aliases: bool,
}

impl AggregateOptions {
    /// Builds options from the `[aggregation]` configuration table.
    pub fn from_config(config: &AggregationConfig) -> Self {
        Self {
            allow_label_aliases: config.allow_label_aliases,
        }
    }

    /// Sets whether duplicate labels are allowed.
    pub fn with_label_aliases(mut self, allow: bool) -> Self {
        self.allow_label_aliases = allow;
        self
    }
}

/// Runs aggregations with a fixed set of options.
///
/// The engine holds no state between runs: every call starts new sources and
/// new derived-series caches.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    options: AggregateOptions,
}

impl Aggregator {
    /// Creates an engine with `options`.
    pub fn new(options: AggregateOptions) -> Self {
        Self { options }
    }

    /// Engine options.
    pub fn options(&self) -> &AggregateOptions {
        &self.options
    }

    /// Fetches every source, computes derived series, and merges the result.
    ///
    /// Raw series keep the order of `fetch`; derived series are appended in
    /// the order of `derived`. The first source, accessor, or calculator
    /// failure ends the run; no partial table is returned.
    pub async fn aggregate<P>(
        &self,
        fetch: Vec<FetchConfig<P>>,
        derived: Vec<DerivedConfig<P>>,
    ) -> Result<MergedTable>
    where
        P: Send + 'static,
    {
        let started = Instant::now();
        self.check_labels(
            fetch
                .iter()
                .map(FetchConfig::label)
                .chain(derived.iter().map(DerivedConfig::label)),
        )?;

        tracing::info!(
            sources = fetch.len(),
            derived = derived.len(),
            "Aggregating chart data"
        );

        let mut series = fetch_all(fetch).await?;
        if !derived.is_empty() {
            let extra = compute_derived(&series, &derived)?;
            series.extend(extra);
        }
        let table = merge(&series)?;

        tracing::info!(
            rows = table.len(),
            columns = table.columns().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Aggregation complete"
        );

        Ok(table)
    }

    fn check_labels<'a>(&self, labels: impl Iterator<Item = &'a str>) -> Result<()> {
        if self.options.allow_label_aliases {
            return Ok(());
        }
        let mut seen = HashSet::new();
        for label in labels {
            if !seen.insert(label) {
                return Err(Error::DuplicateLabel {
                    label: label.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Aggregates with default options.
///
/// See [`Aggregator::aggregate`].
pub async fn aggregate<P>(
    fetch: Vec<FetchConfig<P>>,
    derived: Vec<DerivedConfig<P>>,
) -> Result<MergedTable>
where
    P: Send + 'static,
{
    Aggregator::default().aggregate(fetch, derived).await
}

/// Drains every source concurrently and returns one series per
/// configuration, in configuration order.
///
/// Sources are started in declaration order and polled together on the
/// current task; pages of one source are appended in the order they
/// arrive. The call returns once every source is exhausted, or as soon as
/// one of them fails.
pub async fn fetch_all<P>(fetch: Vec<FetchConfig<P>>) -> Result<Vec<MetricSeries<P>>>
where
    P: Send + 'static,
{
    let drains = fetch.into_iter().map(|config| {
        let (label, source, accessors) = config.into_parts();
        let mut pages = source();
        async move {
            let mut series = MetricSeries::empty(label, accessors);
            let mut page_count = 0usize;
            while let Some(page) = pages.next().await {
                let page = page.map_err(|e| Error::source_failure(series.label(), e))?;
                page_count += 1;
                series.extend_page(page);
            }
            tracing::debug!(
                label = series.label(),
                pages = page_count,
                points = series.len(),
                "Source exhausted"
            );
            Ok::<_, Error>(series)
        }
    });

    try_join_all(drains).await
}
