//! Joins series into one time-indexed table.

use std::collections::BTreeMap;

use chartflow_core::{
    Cell, CellValue, Column, DOMAIN_LABEL, MergedTable, MetricSeries, Result, Row, TimeKey,
};

/// Column layout of one series inside a row's cells.
struct Slot {
    data: usize,
    tooltip: Option<usize>,
}

/// Merges `series` into a table keyed by epoch millisecond.
///
/// Columns follow series order: one data column per series, followed by a
/// tooltip column when the series has a tooltip accessor. Within a series,
/// a later point with the same timestamp overwrites an earlier one, even if
/// its value is missing. A series with no point at a row's time gets a null
/// cell, so every row is as wide as the column list.
///
/// The result only depends on each series' points, never on the order in
/// which sources finished.
pub fn merge<P>(series: &[MetricSeries<P>]) -> Result<MergedTable> {
    let mut columns = vec![Column::domain(DOMAIN_LABEL)];
    let mut slots = Vec::with_capacity(series.len());
    for s in series {
        let data = columns.len() - 1;
        columns.push(Column::data(s.label()));
        let tooltip = if s.has_tooltip() {
            columns.push(Column::tooltip(s.label()));
            Some(data + 1)
        } else {
            None
        };
        slots.push(Slot { data, tooltip });
    }

    let width = columns.len() - 1;
    let mut rows: BTreeMap<TimeKey, Vec<Cell>> = BTreeMap::new();

    for (s, slot) in series.iter().zip(&slots) {
        for point in s.points() {
            let key = TimeKey::from(s.timestamp_of(point)?);
            let value = s.value_of(point)?;
            let cells = rows.entry(key).or_insert_with(|| vec![None; width]);
            cells[slot.data] = value.map(CellValue::Number);
            if let Some(tooltip) = slot.tooltip {
                cells[tooltip] = s.tooltip_of(point)?.map(CellValue::Text);
            }
        }
    }

    let rows: Vec<Row> = rows
        .into_iter()
        .map(|(key, cells)| Row {
            time: key.to_time(),
            cells,
        })
        .collect();

    tracing::debug!(
        series = series.len(),
        columns = columns.len(),
        rows = rows.len(),
        "Merged series"
    );

    MergedTable::from_parts(columns, rows)
}
