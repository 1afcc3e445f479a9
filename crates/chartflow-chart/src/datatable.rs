//! Google Charts DataTable encoding.
//!
//! ```json
//! {
//!   "cols": [
//!     { "id": "Time", "label": "Time", "type": "date" },
//!     { "id": "A", "label": "A", "type": "number" },
//!     { "id": "A:tooltip", "label": "A", "type": "string", "role": "tooltip" }
//!   ],
//!   "rows": [
//!     { "c": [ { "v": "Date(2024, 0, 31, 0, 0, 0, 0)" }, { "v": 1.5 }, null ] }
//!   ]
//! }
//! ```
//!
//! Months in date literals are zero-based.

use chartflow_core::{Cell, CellValue, Column, ColumnKind, MergedTable, Time};
use chrono::{Datelike, Timelike};
use serde_json::{Value, json};

/// Encodes `table` as a DataTable literal.
pub fn to_json(table: &MergedTable) -> Value {
    let cols: Vec<Value> = table.columns().iter().map(column).collect();
    let rows: Vec<Value> = table
        .rows()
        .iter()
        .map(|row| {
            let mut c = Vec::with_capacity(row.cells.len() + 1);
            c.push(json!({ "v": date_literal(&row.time) }));
            c.extend(row.cells.iter().map(cell));
            json!({ "c": c })
        })
        .collect();

    json!({ "cols": cols, "rows": rows })
}

/// `Date(year, month0, day, hours, minutes, seconds, milliseconds)` in UTC.
pub fn date_literal(time: &Time) -> String {
    format!(
        "Date({}, {}, {}, {}, {}, {}, {})",
        time.year(),
        time.month0(),
        time.day(),
        time.hour(),
        time.minute(),
        time.second(),
        time.timestamp_subsec_millis()
    )
}

fn column(column: &Column) -> Value {
    match column.kind {
        ColumnKind::Domain => json!({
            "id": column.label,
            "label": column.label,
            "type": "date",
        }),
        ColumnKind::Data => json!({
            "id": column.label,
            "label": column.label,
            "type": "number",
        }),
        ColumnKind::Tooltip => json!({
            "id": format!("{}:tooltip", column.label),
            "label": column.label,
            "type": "string",
            "role": "tooltip",
        }),
    }
}

fn cell(cell: &Cell) -> Value {
    match cell {
        Some(CellValue::Number(n)) => json!({ "v": n }),
        Some(CellValue::Text(s)) => json!({ "v": s }),
        None => Value::Null,
    }
}
