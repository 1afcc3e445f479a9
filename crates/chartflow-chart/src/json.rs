//! A sink that writes charts as JSON documents.

use std::io::Write;

use chartflow_core::{MergedTable, Result};
use serde_json::json;

use crate::datatable;
use crate::sink::{ChartOptions, ChartSink};

/// Writes every drawn chart as one JSON document:
/// `{ "data": <DataTable>, "options": <options> }`, followed by a newline.
#[derive(Debug)]
pub struct JsonSink<W> {
    writer: W,
    pretty: bool,
    draws: usize,
}

impl<W: Write> JsonSink<W> {
    /// Creates a sink writing compact JSON to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
            draws: 0,
        }
    }

    /// Switches to indented output.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Number of charts written so far.
    pub fn draws(&self) -> usize {
        self.draws
    }

    /// Returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChartSink for JsonSink<W> {
    fn draw(&mut self, table: &MergedTable, options: &ChartOptions) -> Result<()> {
        let document = json!({
            "data": datatable::to_json(table),
            "options": options.to_json(),
        });

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &document)?;
        } else {
            serde_json::to_writer(&mut self.writer, &document)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        self.draws += 1;
        tracing::debug!(rows = table.len(), draws = self.draws, "Chart written");
        Ok(())
    }
}
