//! Declarative description of how to obtain one raw series.

use std::fmt;

use chartflow_core::{Accessors, BoxError};
use futures::stream::{BoxStream, Stream, StreamExt};

/// A finite, asynchronously produced sequence of pages of points.
pub type PageStream<P> = BoxStream<'static, std::result::Result<Vec<P>, BoxError>>;

/// Zero-argument factory that starts a paginated source.
pub type SourceFactory<P> = Box<dyn FnOnce() -> PageStream<P> + Send>;

/// How to fetch and interpret one raw series.
///
/// A configuration is consumed by the run it is passed to: build a fresh one
/// for every aggregation so captured parameters (date range, entity id)
/// always belong to that run.
pub struct FetchConfig<P> {
    label: String,
    source: SourceFactory<P>,
    accessors: Accessors<P>,
}

impl<P: Send + 'static> FetchConfig<P> {
    /// Creates a configuration from a source factory.
    pub fn new<F>(label: impl Into<String>, source: F, accessors: Accessors<P>) -> Self
    where
        F: FnOnce() -> PageStream<P> + Send + 'static,
    {
        Self {
            label: label.into(),
            source: Box::new(source),
            accessors,
        }
    }

    /// Creates a configuration from a stream that has not been polled yet.
    pub fn from_stream<S>(label: impl Into<String>, pages: S, accessors: Accessors<P>) -> Self
    where
        S: Stream<Item = std::result::Result<Vec<P>, BoxError>> + Send + 'static,
    {
        Self::new(label, move || pages.boxed(), accessors)
    }
}

impl<P> FetchConfig<P> {
    /// Series label (column identity).
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Accessors used to read the fetched points.
    pub fn accessors(&self) -> &Accessors<P> {
        &self.accessors
    }

    pub(crate) fn into_parts(self) -> (String, SourceFactory<P>, Accessors<P>) {
        (self.label, self.source, self.accessors)
    }
}

impl<P> fmt::Debug for FetchConfig<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchConfig")
            .field("label", &self.label)
            .field("accessors", &self.accessors)
            .finish_non_exhaustive()
    }
}
