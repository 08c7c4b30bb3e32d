use super::{BalanceEvent, Grid};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// One event reduced to what bucketing needs: where it sits on the grid axis and the balance
/// it left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Sample {
    pub(super) position: i64,
    pub(super) balance: i64,
}

pub(super) fn in_source_order(events: &[BalanceEvent]) -> Cow<'_, [BalanceEvent]> {
    if events
        .windows(2)
        .all(|pair| pair[0].source_order <= pair[1].source_order)
    {
        return Cow::Borrowed(events);
    }
    let mut sorted = events.to_vec();
    sorted.sort_by_key(|event| event.source_order);
    Cow::Owned(sorted)
}

/// Right edge of the bucket holding `position`: `(floor((p - 1 - start) / inc) + 1) * inc + start`.
///
/// Buckets are `(step - inc, step]`, so an event exactly on a step belongs to that step.
pub(super) fn bucket_step(grid: &Grid, position: i64) -> i64 {
    let increment = grid.increment();
    let offset = position - 1 - grid.start();
    (offset.div_euclid(increment) + 1) * increment + grid.start()
}

/// Running maximum of balances, recorded per bucket as of the bucket's last event.
///
/// Samples must arrive in source order. Samples outside `[start, end]` are skipped without
/// touching the running maximum.
pub(super) fn high_water_marks(
    grid: &Grid,
    samples: impl Iterator<Item = Sample>,
) -> BTreeMap<i64, i64> {
    let mut values = BTreeMap::new();
    let mut running_max: Option<i64> = None;
    let mut skipped = 0usize;

    for sample in samples {
        if sample.position < grid.start() || sample.position > grid.end() {
            skipped += 1;
            continue;
        }
        let high = running_max.map_or(sample.balance, |max| max.max(sample.balance));
        running_max = Some(high);
        values.insert(bucket_step(grid, sample.position), high);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "ignored events outside the resample range");
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(position: i64, balance: i64) -> Sample {
        Sample { position, balance }
    }

    #[test]
    fn step_is_right_edge_of_bucket() {
        let grid = Grid::new(0, 4000, 4).unwrap();
        assert_eq!(bucket_step(&grid, 500), 1000);
        assert_eq!(bucket_step(&grid, 999), 1000);
        assert_eq!(bucket_step(&grid, 1000), 1000);
        assert_eq!(bucket_step(&grid, 1001), 2000);
        assert_eq!(bucket_step(&grid, 3500), 4000);
        assert_eq!(bucket_step(&grid, 4000), 4000);
    }

    #[test]
    fn event_on_start_belongs_to_first_step() {
        let grid = Grid::new(200, 4200, 4).unwrap();
        assert_eq!(bucket_step(&grid, 200), 200);
        assert_eq!(bucket_step(&grid, 201), 1200);
    }

    #[test]
    fn step_never_precedes_position() {
        let grid = Grid::new(17, 9_999, 7).unwrap();
        for position in 17..=9_999 {
            let step = bucket_step(&grid, position);
            assert!(step >= position);
            assert!(step - position < grid.increment());
            assert_eq!((step - grid.start()) % grid.increment(), 0);
        }
    }

    #[test]
    fn bucket_keeps_running_maximum_not_last_value() {
        let grid = Grid::new(0, 4000, 4).unwrap();
        let values = high_water_marks(
            &grid,
            vec![sample(100, 50), sample(900, 20), sample(1500, 30)].into_iter(),
        );
        assert_eq!(values.get(&1000), Some(&50));
        assert_eq!(values.get(&2000), Some(&50));
    }

    #[test]
    fn bucket_reports_maximum_as_of_its_last_event() {
        let grid = Grid::new(0, 4000, 4).unwrap();
        let values = high_water_marks(
            &grid,
            vec![sample(100, 5), sample(200, 9), sample(2100, 40), sample(2200, 10)].into_iter(),
        );
        assert_eq!(values.len(), 2);
        assert_eq!(values.get(&1000), Some(&9));
        assert_eq!(values.get(&3000), Some(&40));
    }

    #[test]
    fn samples_outside_range_are_ignored() {
        let grid = Grid::new(1000, 2000, 10).unwrap();
        let values = high_water_marks(
            &grid,
            vec![sample(10, 999), sample(1500, 1), sample(2050, 999), sample(9000, 999)].into_iter(),
        );
        assert_eq!(values.len(), 1);
        assert_eq!(values.get(&1500), Some(&1));
    }

    #[test]
    fn unsorted_events_are_put_in_source_order() {
        let event = |source_order, position| BalanceEvent {
            account_id: 1,
            asset_code: 21,
            source_order,
            position,
            balance: 0,
        };
        let events = vec![event(3, 30), event(1, 10), event(2, 20)];
        let ordered = in_source_order(&events);
        assert!(matches!(ordered, Cow::Owned(_)));
        let orders: Vec<i64> = ordered.iter().map(|e| e.source_order).collect();
        assert_eq!(orders, vec![1, 2, 3]);

        let sorted = vec![event(1, 10), event(2, 20)];
        assert!(matches!(in_source_order(&sorted), Cow::Borrowed(_)));
    }
}
