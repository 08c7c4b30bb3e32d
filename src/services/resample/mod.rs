//! Fixed-cardinality resampling of balance history.
//!
//! A query range is turned into a uniform [`Grid`] whose length depends only on the range and
//! the target point count. Events are attributed to the grid step that closes their bucket,
//! reduced to a high-water-mark value per bucket, and the remaining gaps are filled:
//!
//! 1. align bucket values onto the grid (`NoData` where a bucket is empty)
//! 2. forward fill from the nearest earlier value
//! 3. backward fill the leading run from the first value
//! 4. default whatever is left (only possible with zero events) to `0`
//!
//! Everything here is synchronous and side-effect free. Callers that may abandon a query pass a
//! [`CancellationToken`]; it is checked between passes.

mod buckets;
mod fill;
mod grid;
mod time_index;

#[cfg(test)]
mod tests;

use chrono::{DateTime, NaiveDateTime};
use tokio_util::sync::CancellationToken;

pub use grid::Grid;
pub use time_index::BlockTimeIndex;

/// Target number of buckets per series.
pub const DEFAULT_TARGET_POINTS: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceEvent {
    pub account_id: i32,
    pub asset_code: i32,
    /// Total order of the event for its account and asset (the source operation id).
    pub source_order: i64,
    /// Block number the event was produced in.
    pub position: i64,
    /// Balance immediately after the event.
    pub balance: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResampledPoint<S> {
    pub step: S,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResampledSeries<S> {
    /// Grid spacing in domain units (blocks, or microseconds for time queries).
    pub increment: i64,
    pub steps: Vec<S>,
    pub balances: Vec<i64>,
}

impl<S: Copy> ResampledSeries<S> {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = ResampledPoint<S>> + '_ {
        self.steps
            .iter()
            .zip(self.balances.iter())
            .map(|(step, balance)| ResampledPoint {
                step: *step,
                balance: *balance,
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResampleError {
    #[error("invalid range: end ({end}) must be after start ({start})")]
    InvalidRange { start: String, end: String },
    #[error("block {block} has no timestamp in the block time index")]
    MissingTimeMapping { block: i64 },
    #[error("resample cancelled")]
    Cancelled,
}

/// Resample the events of one account and asset over `[start_block, end_block]`.
///
/// `events` is expected in `source_order`; it is re-sorted if it is not.
pub fn resample_by_block(
    events: &[BalanceEvent],
    start_block: i64,
    end_block: i64,
    target_points: i64,
    cancel: &CancellationToken,
) -> Result<ResampledSeries<i64>, ResampleError> {
    let grid = Grid::new(start_block, end_block, target_points)?;
    let ordered = buckets::in_source_order(events);
    let samples = ordered.iter().map(|event| buckets::Sample {
        position: event.position,
        balance: event.balance,
    });

    let balances = run_pipeline(&grid, samples, cancel)?;
    Ok(ResampledSeries {
        increment: grid.increment(),
        steps: grid.steps().collect(),
        balances,
    })
}

/// Resample the events of one account and asset over `[start_time, end_time]`.
///
/// Each event's block is resolved through `index` first; positions and the grid are
/// microseconds since the Unix epoch.
pub fn resample_by_time<I>(
    events: &[BalanceEvent],
    index: &I,
    start_time: NaiveDateTime,
    end_time: NaiveDateTime,
    target_points: i64,
    cancel: &CancellationToken,
) -> Result<ResampledSeries<NaiveDateTime>, ResampleError>
where
    I: BlockTimeIndex + ?Sized,
{
    let invalid = || ResampleError::InvalidRange {
        start: start_time.to_string(),
        end: end_time.to_string(),
    };
    if end_time <= start_time {
        return Err(invalid());
    }

    let start_micros = start_time.and_utc().timestamp_micros();
    let end_micros = end_time.and_utc().timestamp_micros();
    let grid = Grid::new(start_micros, end_micros, target_points).map_err(|_| invalid())?;

    let ordered = buckets::in_source_order(events);
    let samples = time_index::map_to_micros(&ordered, index)?;
    if cancel.is_cancelled() {
        return Err(ResampleError::Cancelled);
    }

    let balances = run_pipeline(&grid, samples.into_iter(), cancel)?;
    let steps = grid
        .steps()
        .map(|micros| DateTime::from_timestamp_micros(micros).map(|dt| dt.naive_utc()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;

    Ok(ResampledSeries {
        increment: grid.increment(),
        steps,
        balances,
    })
}

fn run_pipeline(
    grid: &Grid,
    samples: impl Iterator<Item = buckets::Sample>,
    cancel: &CancellationToken,
) -> Result<Vec<i64>, ResampleError> {
    let check = || {
        if cancel.is_cancelled() {
            Err(ResampleError::Cancelled)
        } else {
            Ok(())
        }
    };

    let bucket_values = buckets::high_water_marks(grid, samples);
    check()?;
    let mut aligned = fill::align(grid, &bucket_values);
    check()?;
    fill::forward_fill(&mut aligned);
    check()?;
    fill::backward_fill_leading(&mut aligned);
    check()?;
    Ok(fill::resolve_defaults(aligned))
}
