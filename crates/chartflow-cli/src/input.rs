//! JSON series fixtures.
//!
//! ```json
//! [
//!   { "label": "web", "pages": [[ { "t": "2024-01-01T00:00:00Z", "v": 12 } ]] },
//!   { "label": "api", "pages": [[ { "t": "2024-01-01T00:00:00Z", "v": null, "tooltip": "outage" } ]] }
//! ]
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use chartflow_aggregate::{FetchConfig, pages};
use chartflow_core::{Accessors, Time};
use serde::Deserialize;

/// One point of a fixture series.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputPoint {
    /// Timestamp (RFC 3339).
    pub t: Time,
    /// Value; `null` or absent for a gap.
    #[serde(default)]
    pub v: Option<f64>,
    /// Tooltip text.
    #[serde(default)]
    pub tooltip: Option<String>,
}

/// One fixture series, already split into pages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InputSeries {
    /// Series label.
    pub label: String,
    /// Pages of points, in fetch order.
    #[serde(default)]
    pub pages: Vec<Vec<InputPoint>>,
}

impl InputSeries {
    fn has_tooltips(&self) -> bool {
        self.pages.iter().flatten().any(|p| p.tooltip.is_some())
    }
}

/// Reads a fixture file.
pub fn load(path: &Path) -> Result<Vec<InputSeries>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading input {}", path.display()))?;
    let series: Vec<InputSeries> = serde_json::from_str(&content)
        .with_context(|| format!("parsing input {}", path.display()))?;
    tracing::debug!(path = %path.display(), series = series.len(), "Input loaded");
    Ok(series)
}

/// Accessors for fixture points, without a tooltip.
pub fn accessors() -> Accessors<InputPoint> {
    Accessors::new(|p: &InputPoint| p.t, |p: &InputPoint| p.v)
}

/// One in-memory source per fixture series.
///
/// A series gets a tooltip column when any of its points carries a tooltip;
/// points without one get an empty tooltip.
pub fn fetch_configs(series: Vec<InputSeries>) -> Vec<FetchConfig<InputPoint>> {
    series
        .into_iter()
        .map(|s| {
            let accessors = if s.has_tooltips() {
                accessors().with_tooltip(|p: &InputPoint| p.tooltip.clone().unwrap_or_default())
            } else {
                accessors()
            };
            let InputSeries { label, pages } = s;
            FetchConfig::new(label, move || pages::from_pages(pages), accessors)
        })
        .collect()
}
