use time::OffsetDateTime;

use crate::domain::Reading;

/// Immutable, ascending-time-sorted collection of readings.
///
/// Built once at startup and never mutated afterwards, so any number of
/// concurrent readers can query it without synchronization.
#[derive(Debug, Default)]
pub struct ReadingStore {
    readings: Vec<Reading>,
}

impl ReadingStore {
    /// Builds a store from readings in any order. The sort is stable, so
    /// readings sharing a timestamp keep their original relative order.
    pub fn new(mut readings: Vec<Reading>) -> Self {
        readings.sort_by_key(|r| r.ts);
        Self { readings }
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Returns readings in `[start, end)` in ascending time order.
    ///
    /// Absent `start` means "from the beginning", absent `end` means "to the
    /// end". The result is an owned copy; an empty store or empty range
    /// yields an empty vec.
    pub fn list(
        &self,
        start_inclusive: Option<OffsetDateTime>,
        end_exclusive: Option<OffsetDateTime>,
    ) -> Vec<Reading> {
        let all = self.readings.as_slice();
        let lo = match start_inclusive {
            Some(start) => all.partition_point(|r| r.ts < start),
            None => 0,
        };
        let hi = match end_exclusive {
            Some(end) => all.partition_point(|r| r.ts < end),
            None => all.len(),
        };
        if lo >= hi {
            return Vec::new();
        }
        all[lo..hi].to_vec()
    }
}
