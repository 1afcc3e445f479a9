//! Error types for Chartflow.

/// Boxed error produced by caller-supplied collaborators (page sources,
/// accessors, calculators).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while fetching, aggregating, or rendering chart data.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A paginated source failed while it was being iterated.
    #[error("Source '{label}' failed: {source}")]
    Source {
        /// Label of the series whose source failed
        label: String,
        /// The error raised by the source
        #[source]
        source: BoxError,
    },

    /// A caller-supplied accessor could not produce a timestamp, value, or tooltip.
    #[error("Accessor error in series '{label}': {source}")]
    Accessor {
        /// Label of the series the accessor belongs to
        label: String,
        /// The error raised by the accessor
        #[source]
        source: BoxError,
    },

    /// A derived-series calculator failed.
    #[error("Calculator error in series '{label}': {source}")]
    Calculator {
        /// Label of the derived series
        label: String,
        /// The error raised by the calculator
        #[source]
        source: BoxError,
    },

    /// Two series in the same run share a label.
    #[error("Duplicate series label: {label}")]
    DuplicateLabel {
        /// The repeated label
        label: String,
    },

    /// A merged table violates one of its structural invariants.
    #[error("Invalid table: {message}")]
    InvalidTable {
        /// Which invariant was broken
        message: String,
    },

    /// The chart sink rejected a table.
    #[error("Sink error: {message}")]
    Sink {
        /// What went wrong
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// I/O error (file operations, sink output, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Convenience `Result` type alias for Chartflow operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wraps an error raised by the page source of series `label`.
    pub fn source_failure<S, E>(label: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<BoxError>,
    {
        Error::Source {
            label: label.into(),
            source: source.into(),
        }
    }

    /// Wraps an error raised by an accessor of series `label`.
    pub fn accessor<L, E>(label: L, source: E) -> Self
    where
        L: Into<String>,
        E: Into<BoxError>,
    {
        Error::Accessor {
            label: label.into(),
            source: source.into(),
        }
    }

    /// Wraps an error raised by the calculator of derived series `label`.
    pub fn calculator<L, E>(label: L, source: E) -> Self
    where
        L: Into<String>,
        E: Into<BoxError>,
    {
        Error::Calculator {
            label: label.into(),
            source: source.into(),
        }
    }

    /// Creates a new invalid-table error.
    pub fn invalid_table<S: Into<String>>(message: S) -> Self {
        Error::InvalidTable {
            message: message.into(),
        }
    }

    /// Creates a new sink error.
    pub fn sink<S: Into<String>>(message: S) -> Self {
        Error::Sink {
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Returns the series label this error is attributable to, if any.
    pub fn label(&self) -> Option<&str> {
        match self {
            Error::Source { label, .. }
            | Error::Accessor { label, .. }
            | Error::Calculator { label, .. }
            | Error::DuplicateLabel { label } => Some(label),
            _ => None,
        }
    }

    /// Returns the original error raised by a page source, accessor, or
    /// calculator.
    ///
    /// Use this to recover the exact value a collaborator failed with, e.g.
    /// by downcasting it to the client's own error type.
    pub fn source_cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Error::Source { source, .. }
            | Error::Accessor { source, .. }
            | Error::Calculator { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
