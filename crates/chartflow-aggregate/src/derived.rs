//! Derived-series calculators.
//!
//! A calculator folds over every raw point of a run and records what it
//! wants to keep in a [`SeriesCache`]: one entry per time bucket. After the
//! fold the cache is flattened into a new series appended after the raw
//! ones.
//!
//! Caches are created by the engine at the start of each run, one per
//! derived configuration, and dropped when the run ends. A configuration
//! never owns a cache, so a run can never observe another run's entries.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chartflow_core::{Accessors, Error, MetricSeries, Result, bucket_key};

/// Per-run, per-calculator store of one point per time bucket.
pub struct SeriesCache<P> {
    label: String,
    accessors: Accessors<P>,
    entries: BTreeMap<String, P>,
}

impl<P> SeriesCache<P> {
    /// Creates an empty cache for the derived series `label`.
    pub fn new(label: impl Into<String>, accessors: Accessors<P>) -> Self {
        Self {
            label: label.into(),
            accessors,
            entries: BTreeMap::new(),
        }
    }

    /// Label of the derived series this cache builds.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Cached point for `key`.
    pub fn get(&self, key: &str) -> Option<&P> {
        self.entries.get(key)
    }

    /// Stores `point` under `key`, returning the point it replaced.
    pub fn insert(&mut self, key: impl Into<String>, point: P) -> Option<P> {
        self.entries.insert(key.into(), point)
    }

    /// Removes the entry for `key`.
    pub fn remove(&mut self, key: &str) -> Option<P> {
        self.entries.remove(key)
    }

    /// Value of a cached point, read with the derived series' accessors.
    pub fn value_of(&self, point: &P) -> Result<Option<f64>> {
        self.accessors
            .value(point)
            .map_err(|e| Error::accessor(&self.label, e))
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no bucket has been filled.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bucket keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Flattens the cache into a series, buckets in ascending key order.
    pub fn into_series(self) -> MetricSeries<P> {
        MetricSeries::new(
            self.label,
            self.entries.into_values().collect(),
            self.accessors,
        )
    }
}

impl<P> fmt::Debug for SeriesCache<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeriesCache")
            .field("label", &self.label)
            .field("buckets", &self.entries.len())
            .finish()
    }
}

/// A pluggable fold producing one derived series.
///
/// `calculate` is called once per raw point, in series-declaration order
/// and, within a series, in arrival order. It may overwrite, accumulate, or
/// ignore the cached entry for the point's bucket.
pub trait Calculator<P>: Send + Sync {
    /// Folds `point` (from `series`) into `cache`.
    fn calculate(&self, point: &P, series: &MetricSeries<P>, cache: &mut SeriesCache<P>)
    -> Result<()>;
}

impl<P, F> Calculator<P> for F
where
    F: Fn(&P, &MetricSeries<P>, &mut SeriesCache<P>) -> Result<()> + Send + Sync,
{
    fn calculate(
        &self,
        point: &P,
        series: &MetricSeries<P>,
        cache: &mut SeriesCache<P>,
    ) -> Result<()> {
        self(point, series, cache)
    }
}

/// Keeps, for every timestamp, the point with the largest value seen across
/// all raw series.
///
/// A missing value counts as `0`. Ties keep the earlier point.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunningMax;

impl<P: Clone> Calculator<P> for RunningMax {
    fn calculate(
        &self,
        point: &P,
        series: &MetricSeries<P>,
        cache: &mut SeriesCache<P>,
    ) -> Result<()> {
        let value = series.value_of(point)?.unwrap_or(0.0);
        let key = bucket_key(&series.timestamp_of(point)?);

        let replace = match cache.get(&key) {
            Some(cached) => cache.value_of(cached)?.unwrap_or(0.0) < value,
            None => true,
        };
        if replace {
            cache.insert(key, point.clone());
        }
        Ok(())
    }
}

/// How to compute and read one derived series.
pub struct DerivedConfig<P> {
    label: String,
    calculator: Arc<dyn Calculator<P>>,
    accessors: Accessors<P>,
}

impl<P> DerivedConfig<P> {
    /// Creates a derived configuration.
    ///
    /// `accessors` read the points the calculator leaves in its cache.
    pub fn new<C>(label: impl Into<String>, calculator: C, accessors: Accessors<P>) -> Self
    where
        C: Calculator<P> + 'static,
    {
        Self {
            label: label.into(),
            calculator: Arc::new(calculator),
            accessors,
        }
    }

    /// Derived series label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Starts a fresh, empty cache for one run.
    pub fn new_cache(&self) -> SeriesCache<P> {
        SeriesCache::new(self.label.clone(), self.accessors.clone())
    }

    /// Applies the calculator to one point.
    pub fn calculate(
        &self,
        point: &P,
        series: &MetricSeries<P>,
        cache: &mut SeriesCache<P>,
    ) -> Result<()> {
        self.calculator.calculate(point, series, cache)
    }
}

impl<P: Clone + 'static> DerivedConfig<P> {
    /// A [`RunningMax`] series labelled `label`.
    ///
    /// The series reads a missing value as `0`, so a bucket whose points are
    /// all missing or negative charts as `0` rather than a gap.
    pub fn running_max(label: impl Into<String>, accessors: Accessors<P>) -> Self {
        Self::new(label, RunningMax, accessors.fill_missing(0.0))
    }
}

impl<P> Clone for DerivedConfig<P> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            calculator: Arc::clone(&self.calculator),
            accessors: self.accessors.clone(),
        }
    }
}

impl<P> fmt::Debug for DerivedConfig<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedConfig")
            .field("label", &self.label)
            .field("accessors", &self.accessors)
            .finish_non_exhaustive()
    }
}

/// Runs every derived configuration over `raw` and returns the derived
/// series, in configuration order.
///
/// Each call allocates new caches, so repeated calls over the same input
/// return the same series.
pub fn compute_derived<P>(
    raw: &[MetricSeries<P>],
    derived: &[DerivedConfig<P>],
) -> Result<Vec<MetricSeries<P>>> {
    let mut caches: Vec<SeriesCache<P>> = derived.iter().map(DerivedConfig::new_cache).collect();

    for series in raw {
        for point in series.points() {
            for (config, cache) in derived.iter().zip(caches.iter_mut()) {
                config.calculate(point, series, cache)?;
            }
        }
    }

    for cache in &caches {
        tracing::debug!(label = cache.label(), buckets = cache.len(), "Derived series computed");
    }

    Ok(caches.into_iter().map(SeriesCache::into_series).collect())
}
