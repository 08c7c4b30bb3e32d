use super::ResampleError;

/// Uniform step sequence `start, start + increment, ..` up to the last step `<= end + increment`.
///
/// The trailing step past `end` closes the bucket holding events at the very end of the range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    start: i64,
    end: i64,
    increment: i64,
    len: usize,
}

impl Grid {
    pub fn new(start: i64, end: i64, target_points: i64) -> Result<Self, ResampleError> {
        let invalid = || ResampleError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
        };
        if end <= start {
            return Err(invalid());
        }
        let span = end.checked_sub(start).ok_or_else(invalid)?;
        let target_points = target_points.max(1);

        let mut increment = span / target_points;
        if increment == 0 {
            tracing::debug!(
                span,
                target_points,
                "range narrower than target points; clamping increment to 1"
            );
            increment = 1;
        }
        // The last step (end + increment) must stay representable.
        end.checked_add(increment).ok_or_else(invalid)?;

        let len = usize::try_from(span / increment + 2).map_err(|_| invalid())?;
        Ok(Self {
            start,
            end,
            increment,
            len,
        })
    }

    pub(crate) fn start(&self) -> i64 {
        self.start
    }

    pub(crate) fn end(&self) -> i64 {
        self.end
    }

    pub(crate) fn increment(&self) -> i64 {
        self.increment
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    fn step(&self, index: usize) -> i64 {
        self.start + index as i64 * self.increment
    }

    pub(crate) fn steps(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len).map(|index| self.step(index))
    }
}
