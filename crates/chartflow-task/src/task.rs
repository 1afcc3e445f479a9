//! Asynchronous task handle with supersede-on-change.
//!
//! Every started run takes the next generation number and publishes
//! [`TaskState::Pending`] before returning. When a run finishes, its outcome
//! is published only if its generation is still the latest one; otherwise
//! it is dropped. There is no cancellation: a superseded run's work keeps
//! going until it finishes on its own.
//!
//! # Usage
//!
//! ```rust
//! use chartflow_task::{AsyncTask, RunOutcome};
//! use futures::FutureExt;
//!
//! # futures::executor::block_on(async {
//! let task = AsyncTask::new("double", |n: u32| async move { Ok(n * 2) }.boxed());
//! assert!(!task.state().is_settled());
//!
//! let run = task.update(21).unwrap();
//! assert!(task.state().is_pending());
//! assert_eq!(run.await, RunOutcome::Applied);
//! assert_eq!(**task.state().value().unwrap(), 42);
//!
//! // Same dependencies: nothing to do.
//! assert!(task.update(21).is_none());
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use chartflow_core::Result;
use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;

use crate::state::{RunOutcome, TaskSnapshot, TaskState};

/// Starts the work for one run from its dependencies.
pub type TaskFn<D, T> = Arc<dyn Fn(D) -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Decides whether dependencies are complete enough to start a run.
pub type ReadyCheck<D> = Arc<dyn Fn(&D) -> bool + Send + Sync>;

// ============================================================================
// AsyncTask
// ============================================================================

/// Handle for starting runs and observing their state.
///
/// Cheap to clone (Arc internals). State changes are broadcast to all
/// subscribers via a watch channel.
pub struct AsyncTask<D, T> {
    inner: Arc<TaskInner<D, T>>,
}

struct TaskInner<D, T> {
    name: String,
    task_fn: TaskFn<D, T>,
    ready: Option<ReadyCheck<D>>,
    last_deps: Mutex<Option<D>>,
    tx: watch::Sender<TaskSnapshot<T>>,
}

impl<D, T> AsyncTask<D, T>
where
    D: Clone + PartialEq + Send + 'static,
    T: Send + Sync + 'static,
{
    /// Create a task named `name` whose runs call `task_fn`.
    ///
    /// Initial state is [`TaskState::Initial`] at generation `0`.
    pub fn new<F>(name: impl Into<String>, task_fn: F) -> Self
    where
        F: Fn(D) -> BoxFuture<'static, Result<T>> + Send + Sync + 'static,
    {
        let (tx, _rx) = watch::channel(TaskSnapshot {
            generation: 0,
            state: TaskState::Initial,
        });
        Self {
            inner: Arc::new(TaskInner {
                name: name.into(),
                task_fn: Arc::new(task_fn),
                ready: None,
                last_deps: Mutex::new(None),
                tx,
            }),
        }
    }

    /// Only start runs for dependencies accepted by `ready`.
    ///
    /// Must be called before the handle is cloned.
    pub fn with_ready_check<F>(mut self, ready: F) -> Self
    where
        F: Fn(&D) -> bool + Send + Sync + 'static,
    {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.ready = Some(Arc::new(ready));
        } else {
            tracing::warn!(
                task = %self.inner.name,
                "Ready check ignored: task handle is already shared"
            );
        }
        self
    }

    /// Start a run if `deps` differ from the last started dependencies.
    ///
    /// Returns `None` without touching the state when the dependencies are
    /// unchanged or fail the ready check.
    pub fn update(&self, deps: D) -> Option<TaskRun> {
        if let Some(ready) = &self.inner.ready
            && !ready(&deps)
        {
            tracing::debug!(task = %self.inner.name, "Dependencies incomplete, not running");
            return None;
        }

        let generation = self.begin(&deps, false)?;
        Some(self.launch(generation, deps))
    }

    /// Start a run unconditionally.
    ///
    /// The state is [`TaskState::Pending`] when this returns. The returned
    /// [`TaskRun`] must be awaited (or spawned) for the outcome to be
    /// published.
    pub fn run(&self, deps: D) -> TaskRun {
        let generation = self.begin(&deps, true).unwrap_or_default();
        self.launch(generation, deps)
    }

    // Records `deps` and takes the next generation under the watch lock, so
    // the latest generation always belongs to the last recorded deps.
    fn begin(&self, deps: &D, force: bool) -> Option<u64> {
        let mut generation = None;
        self.inner.tx.send_if_modified(|snapshot| {
            let mut last = self.last_deps();
            if !force && last.as_ref() == Some(deps) {
                return false;
            }
            *last = Some(deps.clone());
            snapshot.generation += 1;
            snapshot.state = TaskState::Pending;
            generation = Some(snapshot.generation);
            true
        });
        generation
    }

    fn launch(&self, generation: u64, deps: D) -> TaskRun {
        tracing::debug!(task = %self.inner.name, generation, "Run started");

        let work = (self.inner.task_fn)(deps);
        let inner = Arc::clone(&self.inner);
        let future = async move {
            let result = work.await;
            inner.settle(generation, result)
        }
        .boxed();

        TaskRun { generation, future }
    }

    fn last_deps(&self) -> std::sync::MutexGuard<'_, Option<D>> {
        self.inner
            .last_deps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<D, T> AsyncTask<D, T> {
    /// Get the task name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Get the current state.
    pub fn state(&self) -> TaskState<T> {
        self.inner.tx.borrow().state.clone()
    }

    /// Get the current state with the generation that produced it.
    pub fn snapshot(&self) -> TaskSnapshot<T> {
        self.inner.tx.borrow().clone()
    }

    /// Generation of the most recently started run (`0` if none).
    pub fn generation(&self) -> u64 {
        self.inner.tx.borrow().generation
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<TaskSnapshot<T>> {
        self.inner.tx.subscribe()
    }

    /// Wait until the latest run has settled and return its state.
    ///
    /// Returns immediately if it already has. Never returns while the task
    /// is still [`TaskState::Initial`].
    pub async fn wait_settled(&self) -> TaskState<T> {
        let mut rx = self.subscribe();
        match rx.wait_for(|snapshot| snapshot.state.is_settled()).await {
            Ok(snapshot) => snapshot.state.clone(),
            Err(_) => self.state(),
        }
    }
}

impl<D, T> TaskInner<D, T> {
    fn settle(&self, generation: u64, result: Result<T>) -> RunOutcome {
        let failed = result.is_err();
        let state = match result {
            Ok(value) => TaskState::Complete(Arc::new(value)),
            Err(error) => TaskState::Error(Arc::new(error)),
        };

        let applied = self.tx.send_if_modified(|snapshot| {
            if snapshot.generation != generation {
                return false;
            }
            snapshot.state = state;
            true
        });

        if !applied {
            tracing::debug!(task = %self.name, generation, "Run superseded, outcome discarded");
            RunOutcome::Superseded
        } else if failed {
            tracing::warn!(task = %self.name, generation, "Run failed");
            RunOutcome::Applied
        } else {
            tracing::debug!(task = %self.name, generation, "Run complete");
            RunOutcome::Applied
        }
    }
}

impl<D, T> Clone for AsyncTask<D, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D, T> fmt::Debug for AsyncTask<D, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.inner.tx.borrow();
        f.debug_struct("AsyncTask")
            .field("name", &self.inner.name)
            .field("generation", &snapshot.generation)
            .field("state", &snapshot.state.to_string())
            .finish()
    }
}

// ============================================================================
// TaskRun
// ============================================================================

/// One started run; resolves once its outcome has been applied or dropped.
#[must_use = "a run publishes nothing unless it is awaited or spawned"]
pub struct TaskRun {
    generation: u64,
    future: BoxFuture<'static, RunOutcome>,
}

impl TaskRun {
    /// Generation of this run.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Drive the run on the tokio runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<RunOutcome> {
        tokio::spawn(self.future)
    }
}

impl Future for TaskRun {
    type Output = RunOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<RunOutcome> {
        self.future.as_mut().poll(cx)
    }
}

impl fmt::Debug for TaskRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRun")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
