//! The merged, time-indexed table handed to chart sinks.
//!
//! Layout:
//!
//! ```text
//! | Time (domain) | A (data) | A (tooltip)? | B (data) | ... |
//! ```
//!
//! - Exactly one domain column, always at position 0.
//! - A data column may be followed by a tooltip column for the same series.
//! - Rows are strictly ascending by time and carry a cell for every
//!   non-domain column; a missing value is an explicit `None`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::time::{Time, TimeKey};

/// Role of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// The time axis.
    Domain,
    /// Numeric values of one series.
    Data,
    /// Tooltip text for the preceding data column.
    Tooltip,
}

/// A column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Role of the column.
    pub kind: ColumnKind,
    /// Series label (or the domain label).
    pub label: String,
}

impl Column {
    /// Creates the time domain column.
    pub fn domain(label: impl Into<String>) -> Self {
        Self {
            kind: ColumnKind::Domain,
            label: label.into(),
        }
    }

    /// Creates a data column.
    pub fn data(label: impl Into<String>) -> Self {
        Self {
            kind: ColumnKind::Data,
            label: label.into(),
        }
    }

    /// Creates a tooltip column.
    pub fn tooltip(label: impl Into<String>) -> Self {
        Self {
            kind: ColumnKind::Tooltip,
            label: label.into(),
        }
    }
}

/// A non-null cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// A numeric data value.
    Number(f64),
    /// Tooltip text.
    Text(String),
}

impl CellValue {
    /// Returns the number, if this is a data cell.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(_) => None,
        }
    }

    /// Returns the text, if this is a tooltip cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            CellValue::Number(_) => None,
        }
    }
}

/// A cell: `None` is an explicit null.
pub type Cell = Option<CellValue>;

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    /// Domain value.
    pub time: Time,
    /// One cell per non-domain column, in column order.
    pub cells: Vec<Cell>,
}

impl Row {
    /// Row key of this row.
    pub fn key(&self) -> TimeKey {
        TimeKey::from(&self.time)
    }

    fn number(&self, cell: usize) -> Option<f64> {
        self.cells.get(cell)?.as_ref().and_then(CellValue::as_number)
    }
}

/// Label of the domain column.
pub const DOMAIN_LABEL: &str = "Time";

/// A time-indexed table joining several series.
///
/// Deserializing checks the same invariants as [`MergedTable::from_parts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMergedTable")]
pub struct MergedTable {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

#[derive(Deserialize)]
struct RawMergedTable {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl TryFrom<RawMergedTable> for MergedTable {
    type Error = Error;

    fn try_from(raw: RawMergedTable) -> Result<Self> {
        Self::from_parts(raw.columns, raw.rows)
    }
}

impl MergedTable {
    /// Creates a table from parts, checking every structural invariant.
    pub fn from_parts(columns: Vec<Column>, rows: Vec<Row>) -> Result<Self> {
        let table = Self { columns, rows };
        table.validate()?;
        Ok(table)
    }

    /// Creates an empty table with only the domain column.
    pub fn empty() -> Self {
        Self {
            columns: vec![Column::domain(DOMAIN_LABEL)],
            rows: Vec::new(),
        }
    }

    /// Column declarations, domain first.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Rows in ascending time order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Labels of the data columns, in declaration order.
    pub fn series_labels(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Data)
            .map(|c| c.label.as_str())
            .collect()
    }

    /// Index of the first column of `kind` labelled `label`.
    pub fn column_index(&self, kind: ColumnKind, label: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.kind == kind && c.label == label)
    }

    /// Values of the data column `label`, one per row.
    pub fn series_values(&self, label: &str) -> Option<Vec<Option<f64>>> {
        let cell = self.cell_index(ColumnKind::Data, label)?;
        Some(self.rows.iter().map(|row| row.number(cell)).collect())
    }

    /// Value of series `label` at `time`.
    ///
    /// Returns `None` when the series or the row is absent, `Some(None)` for
    /// an explicit null.
    pub fn value_at(&self, label: &str, time: &Time) -> Option<Option<f64>> {
        let cell = self.cell_index(ColumnKind::Data, label)?;
        Some(self.row_at(time)?.number(cell))
    }

    /// Tooltip of series `label` at `time`, if the series has a tooltip column.
    pub fn tooltip_at(&self, label: &str, time: &Time) -> Option<&str> {
        let data = self.column_index(ColumnKind::Data, label)?;
        let tooltip = data + 1;
        if self.columns.get(tooltip).map(|c| c.kind) != Some(ColumnKind::Tooltip) {
            return None;
        }
        self.row_at(time)?
            .cells
            .get(data)?
            .as_ref()
            .and_then(CellValue::as_text)
    }

    // Row cells skip the domain column.
    fn cell_index(&self, kind: ColumnKind, label: &str) -> Option<usize> {
        self.column_index(kind, label)?.checked_sub(1)
    }

    fn row_at(&self, time: &Time) -> Option<&Row> {
        let key = TimeKey::from(time);
        let i = self.rows.binary_search_by_key(&key, Row::key).ok()?;
        self.rows.get(i)
    }

    /// Checks the table invariants.
    pub fn validate(&self) -> Result<()> {
        match self.columns.first() {
            Some(c) if c.kind == ColumnKind::Domain => {}
            _ => return Err(Error::invalid_table("column 0 must be the domain column")),
        }

        for (i, column) in self.columns.iter().enumerate().skip(1) {
            match column.kind {
                ColumnKind::Domain => {
                    return Err(Error::invalid_table(format!(
                        "column {i} is a second domain column"
                    )));
                }
                ColumnKind::Tooltip => {
                    let previous = &self.columns[i - 1];
                    if previous.kind != ColumnKind::Data || previous.label != column.label {
                        return Err(Error::invalid_table(format!(
                            "tooltip column '{}' does not follow its data column",
                            column.label
                        )));
                    }
                }
                ColumnKind::Data => {}
            }
        }

        let width = self.columns.len() - 1;
        let mut previous: Option<TimeKey> = None;
        for row in &self.rows {
            if row.cells.len() != width {
                return Err(Error::invalid_table(format!(
                    "row at {} has {} cells, expected {width}",
                    row.time,
                    row.cells.len()
                )));
            }
            let key = row.key();
            if previous.is_some_and(|p| p >= key) {
                return Err(Error::invalid_table(format!(
                    "row at {} is not in strictly ascending order",
                    row.time
                )));
            }
            previous = Some(key);
        }

        Ok(())
    }
}

impl Default for MergedTable {
    fn default() -> Self {
        Self::empty()
    }
}
