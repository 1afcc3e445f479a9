//! End-to-end aggregation runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chartflow_aggregate::{
    AggregateOptions, Aggregator, DerivedConfig, FetchConfig, Page, aggregate, pages,
};
use chartflow_core::{BoxError, ColumnKind, Error, bucket_key};

use crate::common::{
    Sample, Unavailable, accessors, at, delayed, failing_after_first_page, fetch, s,
};

#[tokio::test]
async fn test_two_sources_with_running_max() {
    let table = aggregate(
        vec![
            fetch("A", vec![vec![s(0, 1.0)], vec![s(1, 5.0)]]),
            fetch("B", vec![vec![s(0, 3.0), s(2, 2.0)]]),
        ],
        vec![DerivedConfig::running_max("Max", accessors())],
    )
    .await
    .unwrap();

    assert_eq!(table.series_labels(), vec!["A", "B", "Max"]);
    let times: Vec<i64> = table.rows().iter().map(|r| r.key().millis()).collect();
    assert_eq!(times, vec![0, 1, 2]);
    assert_eq!(table.series_values("A").unwrap(), vec![Some(1.0), Some(5.0), None]);
    assert_eq!(table.series_values("B").unwrap(), vec![Some(3.0), None, Some(2.0)]);
    assert_eq!(
        table.series_values("Max").unwrap(),
        vec![Some(3.0), Some(5.0), Some(2.0)]
    );
}

#[tokio::test]
async fn test_source_failure_rejects_run_with_original_cause() {
    let err = aggregate(
        vec![
            fetch("ok", vec![vec![s(0, 1.0)]]),
            failing_after_first_page("flaky", vec![s(0, 2.0)]),
        ],
        vec![DerivedConfig::running_max("Max", accessors())],
    )
    .await
    .unwrap_err();

    assert_eq!(err.label(), Some("flaky"));
    let cause = err.source_cause().expect("source error keeps its cause");
    assert!(cause.downcast_ref::<Unavailable>().is_some());
    assert!(err.to_string().contains("stats endpoint returned 503"));
}

#[tokio::test]
async fn test_empty_source_still_declares_column() {
    let table = aggregate(
        vec![
            fetch("A", vec![vec![s(0, 1.0)]]),
            FetchConfig::new("quiet", pages::empty::<Sample>, accessors()),
        ],
        vec![],
    )
    .await
    .unwrap();

    assert_eq!(table.series_labels(), vec!["A", "quiet"]);
    assert_eq!(table.series_values("quiet").unwrap(), vec![None]);
}

#[tokio::test]
async fn test_no_sources_yields_empty_table() {
    let table = aggregate::<Sample>(vec![], vec![]).await.unwrap();
    assert!(table.is_empty());
    assert_eq!(table.columns().len(), 1);
    assert_eq!(table.columns()[0].kind, ColumnKind::Domain);
}

#[tokio::test]
async fn test_derived_caches_do_not_leak_between_runs() {
    let max = DerivedConfig::running_max("Max", accessors());

    let first = aggregate(vec![fetch("A", vec![vec![s(0, 50.0)]])], vec![max.clone()])
        .await
        .unwrap();
    let second = aggregate(vec![fetch("A", vec![vec![s(0, 4.0)]])], vec![max])
        .await
        .unwrap();

    assert_eq!(first.value_at("Max", &at(0)), Some(Some(50.0)));
    assert_eq!(second.value_at("Max", &at(0)), Some(Some(4.0)));
}

#[tokio::test]
async fn test_custom_calculator_sees_every_raw_point() {
    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);
    let latest = DerivedConfig::new(
        "Latest",
        move |point: &Sample,
              series: &chartflow_core::MetricSeries<Sample>,
              cache: &mut chartflow_aggregate::SeriesCache<Sample>|
              -> chartflow_core::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            cache.insert(bucket_key(&series.timestamp_of(point)?), point.clone());
            Ok(())
        },
        accessors(),
    );

    let table = aggregate(
        vec![
            fetch("A", vec![vec![s(0, 1.0), s(1, 1.0)]]),
            fetch("B", vec![vec![s(0, 9.0)]]),
        ],
        vec![latest],
    )
    .await
    .unwrap();

    assert_eq!(seen.load(Ordering::SeqCst), 3);
    // B is folded after A, so it owns the shared bucket.
    assert_eq!(table.value_at("Latest", &at(0)), Some(Some(9.0)));
    assert_eq!(table.value_at("Latest", &at(1)), Some(Some(1.0)));
}

#[tokio::test(start_paused = true)]
async fn test_sources_are_fetched_concurrently() {
    let delay = Duration::from_millis(100);
    let started = tokio::time::Instant::now();

    let table = aggregate(
        vec![
            delayed("A", delay, vec![vec![s(0, 1.0)], vec![s(1, 1.0)], vec![s(2, 1.0)]]),
            delayed("B", delay, vec![vec![s(0, 2.0)], vec![s(1, 2.0)], vec![s(2, 2.0)]]),
        ],
        vec![],
    )
    .await
    .unwrap();

    assert_eq!(table.len(), 3);
    assert!(started.elapsed() < Duration::from_millis(600));
}

#[tokio::test]
async fn test_running_max_charts_zero_for_missing_and_negative() {
    let table = aggregate(
        vec![
            fetch("A", vec![vec![Sample { t: 0, v: None }, s(1, -4.0)]]),
            fetch("B", vec![vec![s(0, -1.0), Sample { t: 1, v: None }]]),
        ],
        vec![DerivedConfig::running_max("Max", accessors())],
    )
    .await
    .unwrap();

    assert_eq!(table.value_at("A", &at(0)), Some(None));
    assert_eq!(table.value_at("Max", &at(0)), Some(Some(0.0)));
    assert_eq!(table.value_at("Max", &at(1)), Some(Some(0.0)));
}

#[tokio::test(start_paused = true)]
async fn test_arrival_order_does_not_change_table() {
    let slow_first = aggregate(
        vec![
            delayed("A", Duration::from_millis(300), vec![vec![s(0, 1.0), s(1, 2.0)]]),
            delayed("B", Duration::from_millis(10), vec![vec![s(1, 3.0)]]),
        ],
        vec![DerivedConfig::running_max("Max", accessors())],
    )
    .await
    .unwrap();

    let fast_first = aggregate(
        vec![
            delayed("A", Duration::from_millis(10), vec![vec![s(0, 1.0), s(1, 2.0)]]),
            delayed("B", Duration::from_millis(300), vec![vec![s(1, 3.0)]]),
        ],
        vec![DerivedConfig::running_max("Max", accessors())],
    )
    .await
    .unwrap();

    assert_eq!(slow_first, fast_first);
}

#[tokio::test]
async fn test_token_paginated_source() {
    let source = FetchConfig::new(
        "paged",
        || {
            pages::paginate(|token: Option<String>| async move {
                Ok::<_, BoxError>(match token.as_deref() {
                    None => Page::with_next(vec![s(0, 1.0)], "2"),
                    Some("2") => Page::with_next(vec![s(1, 2.0)], "3"),
                    _ => Page::last(vec![s(2, 3.0)]),
                })
            })
        },
        accessors(),
    );

    let table = aggregate(vec![source], vec![]).await.unwrap();
    assert_eq!(
        table.series_values("paged").unwrap(),
        vec![Some(1.0), Some(2.0), Some(3.0)]
    );
}

#[derive(Debug, PartialEq, thiserror::Error)]
#[error("value missing at {0}")]
struct MissingValue(i64);

#[tokio::test]
async fn test_failing_accessor_is_attributed_to_series() {
    let strict = chartflow_core::Accessors::try_new(
        |p: &Sample| Ok::<_, BoxError>(at(p.t)),
        |p: &Sample| match p.v {
            Some(v) => Ok(Some(v)),
            None => Err(BoxError::from(MissingValue(p.t))),
        },
    );
    let err = aggregate(
        vec![FetchConfig::new(
            "strict",
            || pages::from_pages(vec![vec![Sample { t: 0, v: None }]]),
            strict,
        )],
        vec![],
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Accessor { ref label, .. } if label == "strict"));
    let cause = err.source_cause().expect("accessor error keeps its cause");
    assert_eq!(cause.downcast_ref::<MissingValue>(), Some(&MissingValue(0)));
}

#[tokio::test]
async fn test_aliases_option_allows_shared_labels() {
    let engine = Aggregator::new(AggregateOptions {
        allow_label_aliases: true,
    });
    let table = engine
        .aggregate(
            vec![fetch("A", vec![vec![s(0, 1.0)]]), fetch("A", vec![vec![s(0, 2.0)]])],
            vec![],
        )
        .await
        .unwrap();
    assert_eq!(table.rows()[0].cells.len(), 2);
}
