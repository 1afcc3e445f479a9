//! The chart sink contract and chart options.

use chartflow_core::config::{ChartConfig, CurveType, LegendPosition};
use chartflow_core::{MergedTable, Result, Time};
use serde_json::{Map, Value, json};

use crate::datatable::date_literal;

/// Anything that can draw a merged table.
///
/// Implementations may rely on the table invariants: column 0 is the time
/// domain, every other column is a data column optionally followed by its
/// tooltip column, rows are in ascending time order, and every row has one
/// cell per non-domain column.
pub trait ChartSink {
    /// Draws `table` with `options`, replacing whatever was drawn before.
    fn draw(&mut self, table: &MergedTable, options: &ChartOptions) -> Result<()>;
}

impl<S: ChartSink + ?Sized> ChartSink for &mut S {
    fn draw(&mut self, table: &MergedTable, options: &ChartOptions) -> Result<()> {
        (**self).draw(table, options)
    }
}

impl<S: ChartSink + ?Sized> ChartSink for Box<S> {
    fn draw(&mut self, table: &MergedTable, options: &ChartOptions) -> Result<()> {
        (**self).draw(table, options)
    }
}

/// Line chart presentation options.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    /// Chart title.
    pub title: Option<String>,
    /// Height in pixels.
    pub height: u32,
    /// Line interpolation.
    pub curve_type: CurveType,
    /// Legend placement.
    pub legend_position: LegendPosition,
    /// Series colors in series order.
    pub colors: Vec<String>,
    /// Point marker size in pixels.
    pub point_size: u32,
    /// Visible range of the time axis; the data range when unset.
    pub time_window: Option<(Time, Time)>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self::from_config(&ChartConfig::default())
    }
}

impl ChartOptions {
    /// Builds options from the `[chart]` configuration table.
    pub fn from_config(config: &ChartConfig) -> Self {
        Self {
            title: config.title.clone(),
            height: config.height,
            curve_type: config.curve_type,
            legend_position: config.legend_position,
            colors: config.colors.clone(),
            point_size: config.point_size,
            time_window: None,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the height in pixels.
    pub fn with_height(mut self, height: u32) -> Self {
        self.height = height;
        self
    }

    /// Sets the line interpolation.
    pub fn with_curve_type(mut self, curve_type: CurveType) -> Self {
        self.curve_type = curve_type;
        self
    }

    /// Sets the legend placement.
    pub fn with_legend_position(mut self, position: LegendPosition) -> Self {
        self.legend_position = position;
        self
    }

    /// Sets the series colors.
    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the point marker size.
    pub fn with_point_size(mut self, size: u32) -> Self {
        self.point_size = size;
        self
    }

    /// Restricts the time axis to `start..=end`, typically the requested
    /// date range rather than the range that happened to have data.
    pub fn with_time_window(mut self, start: Time, end: Time) -> Self {
        self.time_window = Some((start, end));
        self
    }

    /// Encodes the options as a Google Charts options object.
    pub fn to_json(&self) -> Value {
        let mut options = Map::new();
        if let Some(title) = &self.title {
            options.insert("title".into(), json!(title));
        }
        options.insert("height".into(), json!(self.height));
        options.insert(
            "curveType".into(),
            json!(match self.curve_type {
                CurveType::Function => "function",
                CurveType::None => "none",
            }),
        );
        options.insert(
            "legend".into(),
            json!({
                "position": match self.legend_position {
                    LegendPosition::Top => "top",
                    LegendPosition::Bottom => "bottom",
                    LegendPosition::Right => "right",
                    LegendPosition::None => "none",
                }
            }),
        );
        if !self.colors.is_empty() {
            options.insert("colors".into(), json!(self.colors));
        }
        options.insert("pointSize".into(), json!(self.point_size));
        if let Some((start, end)) = &self.time_window {
            options.insert(
                "hAxis".into(),
                json!({
                    "viewWindow": {
                        "min": date_literal(start),
                        "max": date_literal(end),
                    }
                }),
            );
        }
        Value::Object(options)
    }
}
