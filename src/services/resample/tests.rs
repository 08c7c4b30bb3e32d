use super::*;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

fn event(source_order: i64, position: i64, balance: i64) -> BalanceEvent {
    BalanceEvent {
        account_id: 42,
        asset_code: 21,
        source_order,
        position,
        balance,
    }
}

fn by_block(events: &[BalanceEvent], start: i64, end: i64, target: i64) -> ResampledSeries<i64> {
    resample_by_block(events, start, end, target, &CancellationToken::new()).unwrap()
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2016, 3, 24)
        .unwrap()
        .and_hms_opt(16, 0, 0)
        .unwrap()
}

#[test]
fn two_events_fill_forward_and_backward() {
    let events = [event(1, 500, 10), event(2, 3500, 40)];
    let series = by_block(&events, 0, 4000, 4);

    assert_eq!(series.increment, 1000);
    assert_eq!(series.steps, vec![0, 1000, 2000, 3000, 4000, 5000]);
    assert_eq!(series.balances, vec![10, 10, 10, 10, 40, 40]);
}

#[test]
fn no_events_yield_all_zero_series() {
    let series = by_block(&[], 0, 4000, 4);
    assert_eq!(series.steps, vec![0, 1000, 2000, 3000, 4000, 5000]);
    assert_eq!(series.balances, vec![0, 0, 0, 0, 0, 0]);
}

#[test]
fn series_length_depends_only_on_range() {
    let sparse = by_block(&[event(1, 10, 1)], 0, 1_000_000, DEFAULT_TARGET_POINTS);
    let dense_events: Vec<BalanceEvent> = (0..20_000)
        .map(|i| event(i, i * 50, i % 97))
        .collect();
    let dense = by_block(&dense_events, 0, 1_000_000, DEFAULT_TARGET_POINTS);

    assert_eq!(sparse.len(), dense.len());
    assert_eq!(sparse.steps.len(), sparse.balances.len());
    assert_eq!(dense.len(), 1002);
}

#[test]
fn steps_are_evenly_spaced() {
    let series = by_block(&[event(1, 12_345, 3)], 10_000, 73_001, 250);
    assert!(series
        .steps
        .windows(2)
        .all(|pair| pair[1] - pair[0] == series.increment));
    assert_eq!(series.steps[0], 10_000);
}

#[test]
fn repeated_queries_are_identical() {
    let events = [event(1, 120, 7), event(2, 640, 3), event(3, 980, 11)];
    let first = by_block(&events, 100, 1000, 9);
    let second = by_block(&events, 100, 1000, 9);
    assert_eq!(first, second);
}

#[test]
fn empty_buckets_repeat_the_previous_bucket() {
    let events = [event(1, 150, 5), event(2, 950, 9)];
    let series = by_block(&events, 100, 1000, 9);
    let points: Vec<_> = series.points().collect();

    let first_value = points
        .iter()
        .position(|point| point.step >= 150)
        .unwrap();
    let last_value = points
        .iter()
        .position(|point| point.step >= 950)
        .unwrap();
    for point in &points[first_value..last_value] {
        assert_eq!(point.balance, 5);
    }
    assert_eq!(points[last_value].balance, 9);
}

#[test]
fn representative_is_high_water_mark() {
    let events = [
        event(1, 100, 80),
        event(2, 1200, 20),
        event(3, 2300, 90),
        event(4, 2400, 15),
    ];
    let series = by_block(&events, 0, 4000, 4);
    assert_eq!(series.balances, vec![80, 80, 80, 90, 90, 90]);
}

#[test]
fn narrow_range_oversamples_with_unit_increment() {
    let series = by_block(&[event(1, 12, 4)], 10, 14, DEFAULT_TARGET_POINTS);
    assert_eq!(series.increment, 1);
    assert_eq!(series.steps, vec![10, 11, 12, 13, 14, 15]);
    assert_eq!(series.balances, vec![4, 4, 4, 4, 4, 4]);
}

#[test]
fn events_on_range_edges_are_kept() {
    let series = by_block(&[event(1, 0, 3), event(2, 4000, 8)], 0, 4000, 4);
    assert_eq!(series.balances, vec![3, 3, 3, 3, 8, 8]);
}

#[test]
fn unsorted_input_matches_sorted_input() {
    let sorted = [event(1, 500, 10), event(2, 1500, 5), event(3, 3500, 40)];
    let shuffled = [sorted[2], sorted[0], sorted[1]];
    assert_eq!(by_block(&sorted, 0, 4000, 4), by_block(&shuffled, 0, 4000, 4));
}

#[test]
fn invalid_range_is_rejected() {
    let cancel = CancellationToken::new();
    let err = resample_by_block(&[], 4000, 4000, 4, &cancel).unwrap_err();
    assert!(matches!(err, ResampleError::InvalidRange { .. }));
    let err = resample_by_block(&[], 4000, 0, 4, &cancel).unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid range: end (0) must be after start (4000)"
    );
}

#[test]
fn cancelled_token_stops_the_pipeline() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = resample_by_block(&[event(1, 500, 10)], 0, 4000, 4, &cancel).unwrap_err();
    assert_eq!(err, ResampleError::Cancelled);
}

#[test]
fn time_query_uses_block_timestamps() {
    let start = base_time();
    let end = start + Duration::seconds(4000);
    let index = BTreeMap::from([
        (1_000, start + Duration::seconds(500)),
        (2_166, start + Duration::seconds(3500)),
    ]);
    let events = [event(1, 1_000, 10), event(2, 2_166, 40)];

    let series =
        resample_by_time(&events, &index, start, end, 4, &CancellationToken::new()).unwrap();

    assert_eq!(series.increment, 1_000_000_000);
    let expected_steps: Vec<NaiveDateTime> = (0..6)
        .map(|i| start + Duration::seconds(i * 1000))
        .collect();
    assert_eq!(series.steps, expected_steps);
    assert_eq!(series.balances, vec![10, 10, 10, 10, 40, 40]);
}

#[test]
fn time_query_without_events_is_all_zero() {
    let start = base_time();
    let end = start + Duration::days(1);
    let index: BTreeMap<i64, NaiveDateTime> = BTreeMap::new();
    let series =
        resample_by_time(&[], &index, start, end, 1000, &CancellationToken::new()).unwrap();
    assert_eq!(series.increment, 86_400_000);
    assert_eq!(series.len(), 1002);
    assert!(series.balances.iter().all(|balance| *balance == 0));
}

#[test]
fn short_time_ranges_keep_sub_second_increments() {
    let start = base_time();
    let index: BTreeMap<i64, NaiveDateTime> = BTreeMap::new();
    for span in [1500, 3600, 86_400] {
        let end = start + Duration::seconds(span);
        let series = resample_by_time(
            &[],
            &index,
            start,
            end,
            DEFAULT_TARGET_POINTS,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(series.len(), 1002, "span {span}s");
        assert_eq!(series.increment, span * 1000);
        assert!(series
            .steps
            .windows(2)
            .all(|pair| pair[1] - pair[0] == Duration::microseconds(series.increment)));
    }

    let end = start + Duration::seconds(3600);
    let series =
        resample_by_time(&[], &index, start, end, 1000, &CancellationToken::new()).unwrap();
    assert_eq!(series.steps[1], start + Duration::milliseconds(3600));
    let value = serde_json::to_value(series.steps[1]).unwrap();
    assert_eq!(value, "2016-03-24T16:00:03.600");
}

#[test]
fn time_query_reports_missing_block() {
    let start = base_time();
    let end = start + Duration::hours(1);
    let index = BTreeMap::from([(10, start + Duration::seconds(30))]);
    let events = [event(1, 10, 1), event(2, 11, 2)];
    let err =
        resample_by_time(&events, &index, start, end, 10, &CancellationToken::new()).unwrap_err();
    assert_eq!(err, ResampleError::MissingTimeMapping { block: 11 });
}

#[test]
fn time_query_rejects_inverted_range() {
    let start = base_time();
    let index: BTreeMap<i64, NaiveDateTime> = BTreeMap::new();
    let err = resample_by_time(
        &[],
        &index,
        start,
        start - Duration::seconds(1),
        10,
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert!(matches!(err, ResampleError::InvalidRange { .. }));
}
