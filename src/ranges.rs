//! Dataset range index: maps an EFTA serial to the DOJ dataset that holds it.

use crate::types::DatasetInterval;

/// Serial ranges for the twelve DOJ datasets, sorted by `start`, disjoint.
/// Serials between one interval's `end` and the next `start` belong to no dataset.
pub const DOJ_DATASETS: [DatasetInterval; 12] = [
    interval(1, 1, 3_158),
    interval(2, 3_159, 3_857),
    interval(3, 3_858, 5_586),
    interval(4, 5_705, 8_320),
    interval(5, 8_409, 8_528),
    interval(6, 8_529, 8_998),
    interval(7, 9_016, 9_664),
    interval(8, 9_676, 39_023),
    interval(9, 39_025, 1_262_781),
    interval(10, 1_262_782, 2_205_654),
    interval(11, 2_205_655, 2_730_264),
    interval(12, 2_730_265, 2_731_783),
];

/// Immutable view over a sorted interval table.
#[derive(Debug, Clone, Copy)]
pub struct DatasetIndex<'a> {
    /// Intervals in ascending `start` order.
    intervals: &'a [DatasetInterval],
}

impl<'a> DatasetIndex<'a> {
    /// Index over the production DOJ ranges.
    pub const fn doj() -> DatasetIndex<'static> {
        return DatasetIndex { intervals: &DOJ_DATASETS };
    }

    /// The intervals this index resolves against, in table order.
    pub const fn intervals(&self) -> &'a [DatasetInterval] {
        return self.intervals;
    }

    /// Wrap an arbitrary interval table. Callers guarantee it is sorted and disjoint.
    #[cfg(test)]
    pub const fn new(intervals: &'a [DatasetInterval]) -> Self {
        return Self { intervals };
    }

    /// Dataset number whose inclusive range contains `serial`, or `None` for gaps.
    /// First match in table order wins.
    pub fn resolve(&self, serial: u32) -> Option<u8> {
        return self
            .intervals
            .iter()
            .find(|i| return i.contains(serial))
            .map(|i| return i.dataset_id);
    }
}

/// Const constructor so the table reads as one row per dataset.
const fn interval(dataset_id: u8, start: u32, end: u32) -> DatasetInterval {
    return DatasetInterval { dataset_id, end, start };
}
