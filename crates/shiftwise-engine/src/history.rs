//! Bounded run history.
//!
//! Keeps the most recent completed runs for the historical-accuracy
//! confidence factor and for adaptive soft-constraint weighting. Shared
//! across concurrent pipeline runs behind a read-write lock.

use std::collections::VecDeque;

use parking_lot::RwLock;

use shiftwise_core::RunRecord;

/// Ring of the most recent run records, newest first on read.
pub struct ExecutionHistory {
    records: RwLock<VecDeque<RunRecord>>,
    capacity: usize,
}

impl ExecutionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Appends a record, evicting the oldest once at capacity.
    pub fn record(&self, record: RunRecord) {
        let mut records = self.records.write();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Records from problems of similar size, newest first.
    pub fn similar(&self, staff_count: usize, date_count: usize) -> Vec<RunRecord> {
        self.records
            .read()
            .iter()
            .rev()
            .filter(|r| r.is_similar(staff_count, date_count))
            .cloned()
            .collect()
    }

    /// Soft-weight multiplier from recent realized accuracy: below-target
    /// accuracy tightens soft constraints, a strong track record relaxes
    /// them slightly. 1.0 with no history.
    pub fn performance_multiplier(&self) -> f64 {
        let records = self.records.read();
        if records.is_empty() {
            return 1.0;
        }
        let recent: Vec<f64> = records
            .iter()
            .rev()
            .take(10)
            .filter(|r| r.success)
            .map(|r| r.accuracy)
            .collect();
        if recent.is_empty() {
            return 1.0;
        }
        let mean = recent.iter().sum::<f64>() / recent.len() as f64;
        (1.0 + (0.8 - mean)).clamp(0.8, 1.5)
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl Default for ExecutionHistory {
    fn default() -> Self {
        Self::new(100)
    }
}
