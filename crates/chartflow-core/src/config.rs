//! Chartflow configuration.
//!
//! Configuration is read from a TOML file; every table and every key is
//! optional and falls back to its default.
//!
//! ```toml
//! [logging]
//! level = "info,chartflow=debug"
//! format = "pretty"
//!
//! [aggregation]
//! allow_label_aliases = false
//!
//! [chart]
//! title = "Feature support"
//! height = 400
//! curve_type = "function"
//! legend_position = "top"
//! colors = ["#34a853", "#ea4335"]
//! point_size = 2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_LEVEL: &str = "info,chartflow=debug";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartflowConfig {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Aggregation engine settings.
    pub aggregation: AggregationConfig,
    /// Default chart display settings.
    pub chart: ChartConfig,
}

impl ChartflowConfig {
    /// Parses configuration from a TOML string and validates it.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "Loaded configuration file");
        Self::from_toml_str(&content)
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Loads configuration from `path` if given, otherwise returns defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Serializes the configuration as pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Checks values that deserialize fine but make no sense.
    pub fn validate(&self) -> Result<()> {
        if self.logging.level.trim().is_empty() {
            return Err(Error::config("logging.level must not be empty"));
        }
        if self.chart.height == 0 {
            return Err(Error::config("chart.height must be greater than zero"));
        }
        if let Some(color) = self.chart.colors.iter().find(|c| !c.starts_with('#')) {
            return Err(Error::config(format!(
                "chart.colors entry '{color}' must be a hex color like #1a73e8"
            )));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// `[logging]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// `[aggregation]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Permit two series in one run to share a label.
    pub allow_label_aliases: bool,
}

/// Line interpolation between points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    /// Smoothed curve.
    #[default]
    Function,
    /// Straight segments.
    None,
}

/// Where the chart legend is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendPosition {
    /// Above the plot area.
    #[default]
    Top,
    /// Below the plot area.
    Bottom,
    /// Right of the plot area.
    Right,
    /// No legend.
    None,
}

/// `[chart]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Chart title.
    pub title: Option<String>,
    /// Height in pixels.
    pub height: u32,
    /// Line interpolation.
    pub curve_type: CurveType,
    /// Legend placement.
    pub legend_position: LegendPosition,
    /// Series colors, in series order; empty means the sink's palette.
    pub colors: Vec<String>,
    /// Point marker size in pixels; zero hides markers.
    pub point_size: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: None,
            height: 400,
            curve_type: CurveType::Function,
            legend_position: LegendPosition::Top,
            colors: Vec::new(),
            point_size: 2,
        }
    }
}
