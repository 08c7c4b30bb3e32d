use super::Grid;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StepValue {
    NoData,
    Resolved(i64),
}

impl StepValue {
    fn resolved(self) -> Option<i64> {
        match self {
            Self::Resolved(value) => Some(value),
            Self::NoData => None,
        }
    }
}

/// Merge the sorted bucket map against the grid; steps without a bucket value are `NoData`.
pub(super) fn align(grid: &Grid, bucket_values: &BTreeMap<i64, i64>) -> Vec<StepValue> {
    let mut buckets = bucket_values.iter().peekable();
    let mut aligned = Vec::with_capacity(grid.len());

    for step in grid.steps() {
        while buckets.next_if(|(bucket, _)| **bucket < step).is_some() {}
        let value = match buckets.next_if(|(bucket, _)| **bucket == step) {
            Some((_, value)) => StepValue::Resolved(*value),
            None => StepValue::NoData,
        };
        aligned.push(value);
    }
    aligned
}

/// Carry the last resolved value forward over `NoData` steps.
pub(super) fn forward_fill(values: &mut [StepValue]) {
    let mut carried: Option<i64> = None;
    for value in values.iter_mut() {
        match (*value, carried) {
            (StepValue::Resolved(current), _) => carried = Some(current),
            (StepValue::NoData, Some(previous)) => *value = StepValue::Resolved(previous),
            (StepValue::NoData, None) => {}
        }
    }
}

/// Fill the leading `NoData` run with the first resolved value.
pub(super) fn backward_fill_leading(values: &mut [StepValue]) {
    let Some((first, earliest)) = values
        .iter()
        .enumerate()
        .find_map(|(index, value)| value.resolved().map(|resolved| (index, resolved)))
    else {
        return;
    };
    for value in values[..first].iter_mut() {
        *value = StepValue::Resolved(earliest);
    }
}

/// Whatever is still unresolved becomes zero.
pub(super) fn resolve_defaults(values: Vec<StepValue>) -> Vec<i64> {
    values
        .into_iter()
        .map(|value| value.resolved().unwrap_or(0))
        .collect()
}
