//! Core data types: series and the merged table.

mod proptests;
mod series;
mod table;

pub use series::{Accessors, MetricSeries, TimestampFn, TooltipFn, ValueFn};
pub use table::{Cell, CellValue, Column, ColumnKind, DOMAIN_LABEL, MergedTable, Row};
