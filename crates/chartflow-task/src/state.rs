//! Task states and rendering.

use std::fmt;
use std::sync::Arc;

use chartflow_core::Error;

// ============================================================================
// TaskState
// ============================================================================

/// State of an asynchronous task.
#[derive(Debug)]
pub enum TaskState<T> {
    /// No run has started yet.
    Initial,
    /// A run is in flight.
    Pending,
    /// The latest run finished; holds its value.
    Complete(Arc<T>),
    /// The latest run failed; holds its error.
    Error(Arc<Error>),
}

impl<T> TaskState<T> {
    /// Returns `true` once the latest run has finished, successfully or not.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Error(_))
    }

    /// Returns `true` while a run is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Value of a completed run.
    pub fn value(&self) -> Option<&Arc<T>> {
        match self {
            Self::Complete(value) => Some(value),
            _ => None,
        }
    }

    /// Error of a failed run.
    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }

    /// Dispatches to the callback of `renderer` matching this state.
    pub fn render<R: TaskRender<T>>(&self, renderer: &mut R) -> R::Output {
        match self {
            Self::Initial => renderer.initial(),
            Self::Pending => renderer.pending(),
            Self::Complete(value) => renderer.complete(value),
            Self::Error(error) => renderer.error(error),
        }
    }
}

impl<T> Clone for TaskState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Initial => Self::Initial,
            Self::Pending => Self::Pending,
            Self::Complete(value) => Self::Complete(Arc::clone(value)),
            Self::Error(error) => Self::Error(Arc::clone(error)),
        }
    }
}

impl<T> fmt::Display for TaskState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initial => write!(f, "initial"),
            Self::Pending => write!(f, "pending"),
            Self::Complete(_) => write!(f, "complete"),
            Self::Error(error) => write!(f, "error: {error}"),
        }
    }
}

/// A state together with the run that produced it.
///
/// `generation` is `0` before the first run and increases by one with every
/// started run.
#[derive(Debug)]
pub struct TaskSnapshot<T> {
    /// Run that last changed the state.
    pub generation: u64,
    /// The state.
    pub state: TaskState<T>,
}

impl<T> Clone for TaskSnapshot<T> {
    fn clone(&self) -> Self {
        Self {
            generation: self.generation,
            state: self.state.clone(),
        }
    }
}

// ============================================================================
// TaskRender
// ============================================================================

/// One callback per task state, for UI layers.
pub trait TaskRender<T> {
    /// What every callback produces.
    type Output;

    /// Nothing has run yet.
    fn initial(&mut self) -> Self::Output;

    /// A run is in flight.
    fn pending(&mut self) -> Self::Output;

    /// The latest run produced `value`.
    fn complete(&mut self, value: &Arc<T>) -> Self::Output;

    /// The latest run failed with `error`.
    fn error(&mut self, error: &Error) -> Self::Output;
}

// ============================================================================
// RunOutcome
// ============================================================================

/// What happened to the result of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run was still the latest; its result was published.
    Applied,
    /// A newer run had started; the result was discarded.
    Superseded,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Superseded => write!(f, "superseded"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
