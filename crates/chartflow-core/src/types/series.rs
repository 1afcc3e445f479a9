//! Named, typed time series and their point accessors.

use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, Error, Result};
use crate::time::Time;

/// Extracts the timestamp of a point.
pub type TimestampFn<P> = Arc<dyn Fn(&P) -> std::result::Result<Time, BoxError> + Send + Sync>;

/// Extracts the numeric value of a point; `None` means "no value here".
pub type ValueFn<P> =
    Arc<dyn Fn(&P) -> std::result::Result<Option<f64>, BoxError> + Send + Sync>;

/// Extracts the tooltip text of a point.
pub type TooltipFn<P> = Arc<dyn Fn(&P) -> std::result::Result<String, BoxError> + Send + Sync>;

/// The accessor functions that interpret a caller-defined point type.
///
/// Accessors must be deterministic and side-effect free: the engine may call
/// them more than once for the same point.
///
/// # Examples
///
/// ```
/// use chartflow_core::Accessors;
/// use chrono::{DateTime, Utc};
///
/// struct Sample {
///     at: DateTime<Utc>,
///     count: Option<i64>,
/// }
///
/// let accessors = Accessors::new(|s: &Sample| s.at, |s: &Sample| s.count.map(|c| c as f64))
///     .with_tooltip(|s: &Sample| format!("{:?} features", s.count));
/// assert!(accessors.has_tooltip());
/// ```
pub struct Accessors<P> {
    timestamp: TimestampFn<P>,
    value: ValueFn<P>,
    tooltip: Option<TooltipFn<P>>,
}

impl<P> Accessors<P> {
    /// Creates accessors from infallible functions.
    pub fn new<T, V>(timestamp: T, value: V) -> Self
    where
        T: Fn(&P) -> Time + Send + Sync + 'static,
        V: Fn(&P) -> Option<f64> + Send + Sync + 'static,
    {
        Self {
            timestamp: Arc::new(move |p: &P| Ok::<_, BoxError>(timestamp(p))),
            value: Arc::new(move |p: &P| Ok::<_, BoxError>(value(p))),
            tooltip: None,
        }
    }

    /// Creates accessors from functions that may fail on malformed points.
    pub fn try_new<T, V>(timestamp: T, value: V) -> Self
    where
        T: Fn(&P) -> std::result::Result<Time, BoxError> + Send + Sync + 'static,
        V: Fn(&P) -> std::result::Result<Option<f64>, BoxError> + Send + Sync + 'static,
    {
        Self {
            timestamp: Arc::new(timestamp),
            value: Arc::new(value),
            tooltip: None,
        }
    }

    /// Adds an infallible tooltip accessor.
    pub fn with_tooltip<F>(mut self, tooltip: F) -> Self
    where
        F: Fn(&P) -> String + Send + Sync + 'static,
    {
        self.tooltip = Some(Arc::new(move |p: &P| Ok::<_, BoxError>(tooltip(p))));
        self
    }

    /// Adds a tooltip accessor that may fail.
    pub fn try_with_tooltip<F>(mut self, tooltip: F) -> Self
    where
        F: Fn(&P) -> std::result::Result<String, BoxError> + Send + Sync + 'static,
    {
        self.tooltip = Some(Arc::new(tooltip));
        self
    }

    /// Reads a missing (or `NaN`) value as `fill` instead of `None`.
    pub fn fill_missing(mut self, fill: f64) -> Self
    where
        P: 'static,
    {
        let value = self.value;
        self.value = Arc::new(move |p: &P| {
            Ok(Some(value(p)?.filter(|v| !v.is_nan()).unwrap_or(fill)))
        });
        self
    }

    /// Removes the tooltip accessor, if any.
    pub fn without_tooltip(mut self) -> Self {
        self.tooltip = None;
        self
    }

    /// Returns `true` if these accessors produce a tooltip column.
    pub fn has_tooltip(&self) -> bool {
        self.tooltip.is_some()
    }

    /// Reads the timestamp of `point`.
    pub fn timestamp(&self, point: &P) -> std::result::Result<Time, BoxError> {
        (self.timestamp)(point)
    }

    /// Reads the value of `point`.
    ///
    /// `NaN` is reported as `None`; zero is a legitimate value and is kept.
    pub fn value(&self, point: &P) -> std::result::Result<Option<f64>, BoxError> {
        Ok((self.value)(point)?.filter(|v| !v.is_nan()))
    }

    /// Reads the tooltip of `point`, or `None` without a tooltip accessor.
    pub fn tooltip(&self, point: &P) -> std::result::Result<Option<String>, BoxError> {
        self.tooltip.as_ref().map(|tooltip| tooltip(point)).transpose()
    }
}

impl<P> Clone for Accessors<P> {
    fn clone(&self) -> Self {
        Self {
            timestamp: Arc::clone(&self.timestamp),
            value: Arc::clone(&self.value),
            tooltip: self.tooltip.clone(),
        }
    }
}

impl<P> fmt::Debug for Accessors<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessors")
            .field("has_tooltip", &self.has_tooltip())
            .finish_non_exhaustive()
    }
}

/// A labeled, ordered collection of points contributing one column to a
/// merged table (plus an optional tooltip column).
///
/// The label is the column identity: two series in the same run must not
/// share a label unless aliasing is explicitly allowed.
pub struct MetricSeries<P> {
    label: String,
    points: Vec<P>,
    accessors: Accessors<P>,
}

impl<P> MetricSeries<P> {
    /// Creates a series from already materialised points.
    pub fn new(label: impl Into<String>, points: Vec<P>, accessors: Accessors<P>) -> Self {
        Self {
            label: label.into(),
            points,
            accessors,
        }
    }

    /// Creates an empty series that points can be appended to.
    pub fn empty(label: impl Into<String>, accessors: Accessors<P>) -> Self {
        Self::new(label, Vec::new(), accessors)
    }

    /// Returns the series label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the points in arrival order.
    pub fn points(&self) -> &[P] {
        &self.points
    }

    /// Returns the accessor functions.
    pub fn accessors(&self) -> &Accessors<P> {
        &self.accessors
    }

    /// Appends one page of points.
    pub fn extend_page(&mut self, page: impl IntoIterator<Item = P>) {
        self.points.extend(page);
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the series has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns `true` if this series contributes a tooltip column.
    pub fn has_tooltip(&self) -> bool {
        self.accessors.has_tooltip()
    }

    /// Timestamp of `point`, attributing accessor failures to this series.
    pub fn timestamp_of(&self, point: &P) -> Result<Time> {
        self.accessors
            .timestamp(point)
            .map_err(|e| Error::accessor(&self.label, e))
    }

    /// Value of `point`; see [`Accessors::value`].
    pub fn value_of(&self, point: &P) -> Result<Option<f64>> {
        self.accessors
            .value(point)
            .map_err(|e| Error::accessor(&self.label, e))
    }

    /// Tooltip of `point`, or `None` when the series has no tooltip accessor.
    pub fn tooltip_of(&self, point: &P) -> Result<Option<String>> {
        self.accessors
            .tooltip(point)
            .map_err(|e| Error::accessor(&self.label, e))
    }

    /// Consumes the series, returning its points.
    pub fn into_points(self) -> Vec<P> {
        self.points
    }
}

impl<P: Clone> Clone for MetricSeries<P> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            points: self.points.clone(),
            accessors: self.accessors.clone(),
        }
    }
}

impl<P> fmt::Debug for MetricSeries<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricSeries")
            .field("label", &self.label)
            .field("points", &self.points.len())
            .field("accessors", &self.accessors)
            .finish()
    }
}
