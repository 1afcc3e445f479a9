//! Lifecycle of a chart aggregation under changing dependencies.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chartflow_core::MergedTable;
use chartflow_task::{AsyncTask, RunOutcome, TaskState};
use futures::FutureExt;

use crate::common::{DAY, DateRange, QuotaExceeded, at, flaky_chart, usage_chart};

fn chart_task() -> AsyncTask<DateRange, MergedTable> {
    AsyncTask::new("usage", usage_chart)
}

#[tokio::test(start_paused = true)]
async fn test_first_update_completes_with_table() {
    let task = chart_task();
    assert!(matches!(task.state(), TaskState::Initial));

    let run = task.update((0, 2)).unwrap();
    assert!(task.state().is_pending());
    assert_eq!(run.await, RunOutcome::Applied);

    let state = task.state();
    let table = state.value().unwrap();
    assert_eq!(table.len(), 3);
    assert_eq!(table.series_labels(), vec!["web", "api", "Peak"]);
    assert_eq!(table.value_at("Peak", &at(2 * DAY)), Some(Some(4.0)));
}

#[tokio::test]
async fn test_failing_source_reaches_error_never_complete() {
    let task = AsyncTask::new("flaky", flaky_chart);
    let mut rx = task.subscribe();

    let handle = task.update((0, 3)).unwrap().spawn();
    let mut seen = Vec::new();
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().state.clone();
        let settled = state.is_settled();
        seen.push(state);
        if settled {
            break;
        }
    }
    assert_eq!(handle.await.unwrap(), RunOutcome::Applied);

    assert!(seen.iter().all(|s| s.value().is_none()));
    let state = task.state();
    let error = state.error().expect("run must fail");
    assert_eq!(error.label(), Some("api"));
    assert!(
        error
            .source_cause()
            .unwrap()
            .downcast_ref::<QuotaExceeded>()
            .is_some()
    );
}

#[tokio::test(start_paused = true)]
async fn test_sequential_ranges_publish_only_latest() {
    let task = chart_task();

    task.update((0, 1)).unwrap().await;
    task.update((10, 12)).unwrap().await;

    let state = task.state();
    let table = state.value().unwrap();
    let days: Vec<i64> = table.rows().iter().map(|r| r.key().millis() / DAY).collect();
    assert_eq!(days, vec![10, 11, 12]);
    assert_eq!(table.value_at("web", &at(0)), None);
}

#[tokio::test(start_paused = true)]
async fn test_slow_stale_run_cannot_overwrite_newer_one() {
    let task = chart_task();

    // The wide range takes much longer than the narrow one started after it.
    let stale = task.update((0, 30)).unwrap().spawn();
    let fresh = task.update((40, 41)).unwrap().spawn();

    assert_eq!(fresh.await.unwrap(), RunOutcome::Applied);
    assert_eq!(stale.await.unwrap(), RunOutcome::Superseded);

    let state = task.state();
    let table = state.value().unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.rows()[0].key().millis(), 40 * DAY);
    assert_eq!(task.generation(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_wait_settled_returns_latest_outcome() {
    let task = chart_task();
    let _stale = task.update((0, 20)).unwrap().spawn();
    let _fresh = task.update((5, 5)).unwrap().spawn();

    let state = task.wait_settled().await;
    assert_eq!(state.value().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_equal_dependencies_do_not_rerun() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let task = AsyncTask::new("counted", move |range: DateRange| {
        counter.fetch_add(1, Ordering::SeqCst);
        usage_chart(range)
    });

    task.update((1, 2)).unwrap().await;
    assert!(task.update((1, 2)).is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    task.update((1, 3)).unwrap().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_incomplete_dependencies_are_a_no_op() {
    let task = AsyncTask::new("needs-client", |deps: (Option<String>, DateRange)| {
        async move {
            let client = deps.0.unwrap_or_default();
            Ok(client.len())
        }
        .boxed()
    })
    .with_ready_check(|deps: &(Option<String>, DateRange)| deps.0.is_some());

    assert!(task.update((None, (0, 1))).is_none());
    assert!(matches!(task.state(), TaskState::Initial));

    task.update((Some("stats-client".into()), (0, 1)))
        .unwrap()
        .await;
    assert_eq!(**task.state().value().unwrap(), 12);
}

#[tokio::test]
async fn test_retry_after_error_is_caller_driven() {
    let task = AsyncTask::new("flaky", flaky_chart);
    task.update((0, 1)).unwrap().await;
    assert!(task.state().error().is_some());

    // No automatic retry: the state stays failed until the caller re-runs.
    assert!(task.update((0, 1)).is_none());
    assert!(task.state().error().is_some());

    task.run((0, 1)).await;
    assert_eq!(task.generation(), 2);
    assert!(task.state().error().is_some());
}
