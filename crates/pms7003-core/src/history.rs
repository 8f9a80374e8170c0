//! Running history of accepted PM2.5 values and the outlier filter built on it

use crate::protocol::SensorError;

/// Default number of values kept
pub const DEFAULT_HISTORY_SIZE: usize = 10;

/// Default maximum deviation from the running average, in μg/m³
pub const DEFAULT_MAX_DELTA_PM25: f64 = 150.0;

/// Fixed-capacity ring of the most recent values.
///
/// Storage is allocated once; a new value overwrites the oldest slot when full.
#[derive(Debug, Clone)]
pub struct History {
    slots: Box<[u16]>,
    /// Index of the oldest entry
    head: usize,
    len: usize,
    sum: u64,
}

impl History {
    /// Create an empty history holding at most `capacity` values
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be non-zero");
        Self {
            slots: vec![0; capacity].into_boxed_slice(),
            head: 0,
            len: 0,
            sum: 0,
        }
    }

    /// Maximum number of values held
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append a value, evicting the oldest when full
    pub fn add(&mut self, value: u16) {
        let cap = self.capacity();
        if self.len == cap {
            self.sum -= self.slots[self.head] as u64;
            self.slots[self.head] = value;
            self.head = (self.head + 1) % cap;
        } else {
            self.slots[(self.head + self.len) % cap] = value;
            self.len += 1;
        }
        self.sum += value as u64;
    }

    /// Arithmetic mean of the values held
    pub fn avg(&self) -> Result<f64, SensorError> {
        if self.is_empty() {
            return Err(SensorError::EmptyHistory);
        }
        Ok(self.sum as f64 / self.len as f64)
    }

    /// Values from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        let cap = self.capacity();
        (0..self.len).map(move |i| self.slots[(self.head + i) % cap])
    }

    /// Forget every value
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.sum = 0;
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

/// Rejects PM2.5 values that jump too far from the recent average
#[derive(Debug, Clone)]
pub struct OutlierFilter {
    history: History,
    max_delta: f64,
}

impl OutlierFilter {
    pub fn new(capacity: usize, max_delta: f64) -> Self {
        Self {
            history: History::new(capacity),
            max_delta,
        }
    }

    /// Decide whether `pm25` is plausible, recording it only if accepted.
    ///
    /// The first value ever seen is accepted unconditionally and seeds the history.
    pub fn check(&mut self, pm25: u16) -> bool {
        self.evaluate(pm25).is_ok()
    }

    /// Same as [`check`](Self::check) but reports the rejection reason
    pub fn evaluate(&mut self, pm25: u16) -> Result<(), SensorError> {
        let average = match self.history.avg() {
            Ok(avg) => avg,
            Err(SensorError::EmptyHistory) => {
                self.history.add(pm25);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if (average - pm25 as f64).abs() < self.max_delta {
            self.history.add(pm25);
            Ok(())
        } else {
            Err(SensorError::OutlierRejected { pm25, average })
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn max_delta(&self) -> f64 {
        self.max_delta
    }
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE, DEFAULT_MAX_DELTA_PM25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_avg_fails() {
        let h = History::default();
        assert!(matches!(h.avg(), Err(SensorError::EmptyHistory)));
    }

    #[test]
    fn test_avg_of_partial_history() {
        let mut h = History::default();
        for v in [10, 20, 30, 45] {
            h.add(v);
        }
        assert_eq!(h.len(), 4);
        assert!((h.avg().unwrap() - 26.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_eviction_keeps_newest() {
        let mut h = History::new(3);
        for v in [1, 2, 3, 4, 5] {
            h.add(v);
        }
        assert_eq!(h.len(), 3);
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert!((h.avg().unwrap() - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_clear() {
        let mut h = History::new(2);
        h.add(7);
        h.add(9);
        h.clear();
        assert!(h.is_empty());
        assert!(h.avg().is_err());
        h.add(4);
        assert_eq!(h.iter().collect::<Vec<_>>(), vec![4]);
    }

    #[test]
    fn test_first_value_seeds_filter() {
        let mut f = OutlierFilter::default();
        assert!(f.check(900));
        assert_eq!(f.history().len(), 1);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut f = OutlierFilter::default();
        assert!(f.check(100));
        // |100 - 250| == 150 is not below the threshold
        assert!(!f.check(250));
        assert!(f.check(249));
    }

    #[test]
    fn test_rejection_reports_average() {
        let mut f = OutlierFilter::default();
        f.check(50);
        match f.evaluate(300) {
            Err(SensorError::OutlierRejected { pm25, average }) => {
                assert_eq!(pm25, 300);
                assert!((average - 50.0).abs() < f64::EPSILON);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(f.history().len(), 1);
    }
}
