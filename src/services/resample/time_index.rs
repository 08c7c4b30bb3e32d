use super::buckets::Sample;
use super::{BalanceEvent, ResampleError};
use chrono::NaiveDateTime;
use std::collections::{BTreeMap, HashMap};

/// Block number to block timestamp lookup, non-decreasing in block number.
pub trait BlockTimeIndex {
    fn get_timestamp(&self, block: i64) -> Option<NaiveDateTime>;
}

impl BlockTimeIndex for BTreeMap<i64, NaiveDateTime> {
    fn get_timestamp(&self, block: i64) -> Option<NaiveDateTime> {
        self.get(&block).copied()
    }
}

impl BlockTimeIndex for HashMap<i64, NaiveDateTime> {
    fn get_timestamp(&self, block: i64) -> Option<NaiveDateTime> {
        self.get(&block).copied()
    }
}

/// Replace each event's block with its timestamp in microseconds since the epoch.
pub(super) fn map_to_micros<I>(
    events: &[BalanceEvent],
    index: &I,
) -> Result<Vec<Sample>, ResampleError>
where
    I: BlockTimeIndex + ?Sized,
{
    events
        .iter()
        .map(|event| {
            let ts = index
                .get_timestamp(event.position)
                .ok_or(ResampleError::MissingTimeMapping {
                    block: event.position,
                })?;
            Ok(Sample {
                position: ts.and_utc().timestamp_micros(),
                balance: event.balance,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, min: u32, sec: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2016, 3, 24)
            .unwrap()
            .and_hms_opt(hour, min, sec)
            .unwrap()
    }

    fn event(block: i64, balance: i64) -> BalanceEvent {
        BalanceEvent {
            account_id: 7,
            asset_code: 21,
            source_order: block,
            position: block,
            balance,
        }
    }

    #[test]
    fn maps_blocks_to_epoch_micros() {
        let index = BTreeMap::from([(1, at(16, 5, 0)), (2, at(16, 5, 3))]);
        let samples = map_to_micros(&[event(1, 10), event(2, 20)], &index).unwrap();
        assert_eq!(samples[0].position, at(16, 5, 0).and_utc().timestamp_micros());
        assert_eq!(samples[1].position - samples[0].position, 3_000_000);
        assert_eq!(samples[1].balance, 20);
    }

    #[test]
    fn missing_block_is_reported() {
        let index: HashMap<i64, NaiveDateTime> = HashMap::from([(1, at(0, 0, 0))]);
        let err = map_to_micros(&[event(1, 10), event(5, 20)], &index).unwrap_err();
        assert_eq!(err, ResampleError::MissingTimeMapping { block: 5 });
    }
}
