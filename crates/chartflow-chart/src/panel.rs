//! A chart panel driven by an aggregation task.

use std::sync::Arc;

use chartflow_core::{Error, MergedTable, Result};
use chartflow_task::{TaskRender, TaskSnapshot};
use serde::Serialize;
use tokio::sync::watch;

use crate::sink::{ChartOptions, ChartSink};

/// What a panel shows for a task state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum PanelView {
    /// No run has started.
    Placeholder,
    /// A run is in flight.
    Loading,
    /// The chart was drawn with `rows` rows.
    Chart {
        /// Rows in the drawn table.
        rows: usize,
    },
    /// The latest run failed.
    Failed {
        /// Error text for the user.
        message: String,
    },
}

/// Renders task snapshots into a [`ChartSink`].
///
/// A table is drawn once per generation: rendering the same completed
/// snapshot again does not redraw it.
#[derive(Debug)]
pub struct ChartPanel<S> {
    sink: S,
    options: ChartOptions,
    drawn: Option<u64>,
}

impl<S: ChartSink> ChartPanel<S> {
    /// Creates a panel drawing into `sink`.
    pub fn new(sink: S, options: ChartOptions) -> Self {
        Self {
            sink,
            options,
            drawn: None,
        }
    }

    /// Chart options.
    pub fn options(&self) -> &ChartOptions {
        &self.options
    }

    /// Replaces the chart options; the next completed snapshot is redrawn.
    pub fn set_options(&mut self, options: ChartOptions) {
        self.options = options;
        self.drawn = None;
    }

    /// The sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Renders one snapshot, drawing its table if it is complete and not
    /// drawn yet.
    pub fn render(&mut self, snapshot: &TaskSnapshot<MergedTable>) -> Result<PanelView> {
        let mut renderer = PanelRenderer {
            panel: self,
            generation: snapshot.generation,
        };
        snapshot.state.render(&mut renderer)
    }

    /// Renders every state published on `rx` until the task and all its
    /// runs are gone.
    ///
    /// Returns the last view. Sink errors end the loop.
    pub async fn follow(
        &mut self,
        mut rx: watch::Receiver<TaskSnapshot<MergedTable>>,
    ) -> Result<PanelView> {
        let mut view = self.render(&rx.borrow_and_update())?;
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            view = self.render(&snapshot)?;
        }
        Ok(view)
    }
}

struct PanelRenderer<'a, S> {
    panel: &'a mut ChartPanel<S>,
    generation: u64,
}

impl<S: ChartSink> TaskRender<MergedTable> for PanelRenderer<'_, S> {
    type Output = Result<PanelView>;

    fn initial(&mut self) -> Result<PanelView> {
        Ok(PanelView::Placeholder)
    }

    fn pending(&mut self) -> Result<PanelView> {
        Ok(PanelView::Loading)
    }

    fn complete(&mut self, table: &Arc<MergedTable>) -> Result<PanelView> {
        let panel = &mut *self.panel;
        if panel.drawn != Some(self.generation) {
            panel.sink.draw(table, &panel.options)?;
            panel.drawn = Some(self.generation);
            tracing::debug!(generation = self.generation, rows = table.len(), "Chart drawn");
        }
        Ok(PanelView::Chart { rows: table.len() })
    }

    fn error(&mut self, error: &Error) -> Result<PanelView> {
        Ok(PanelView::Failed {
            message: error.to_string(),
        })
    }
}
