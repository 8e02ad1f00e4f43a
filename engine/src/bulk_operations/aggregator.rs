use super::types::{BulkResult, FailedRecord, ItemOutcome, SucceededRecord};
use std::time::Duration;

/// Success/failure accounting for one run.
///
/// Owned exclusively by the run that created it; records are only ever
/// appended, and each index is recorded at most once.
#[derive(Debug)]
pub struct ResultAggregator<T, R, E> {
    total: usize,
    succeeded: Vec<SucceededRecord<T, R>>,
    failed: Vec<FailedRecord<T, E>>,
}

impl<T, R, E> ResultAggregator<T, R, E> {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: ItemOutcome<T, R, E>) {
        debug_assert!(outcome.index() < self.total, "index out of range");
        match outcome {
            ItemOutcome::Succeeded(record) => self.succeeded.push(record),
            ItemOutcome::Failed(record) => self.failed.push(record),
        }
    }

    pub fn record_all(&mut self, outcomes: impl IntoIterator<Item = ItemOutcome<T, R, E>>) {
        for outcome in outcomes {
            self.record(outcome);
        }
    }

    /// Number of items with a terminal outcome so far.
    pub fn recorded(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn finish(self, duration: Duration) -> BulkResult<T, R, E> {
        let success_rate = success_rate(self.succeeded.len(), self.total);
        BulkResult {
            succeeded: self.succeeded,
            failed: self.failed,
            total: self.total,
            duration,
            success_rate,
        }
    }
}

/// Percentage of successful items. An empty run counts as fully successful.
pub fn success_rate(succeeded: usize, total: usize) -> f64 {
    if total == 0 {
        100.0
    } else {
        succeeded as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(index: usize) -> ItemOutcome<usize, usize, String> {
        ItemOutcome::Succeeded(SucceededRecord {
            item: index,
            result: index * 2,
            index,
        })
    }

    fn err(index: usize) -> ItemOutcome<usize, usize, String> {
        ItemOutcome::Failed(FailedRecord {
            item: index,
            error: format!("item {index} failed"),
            index,
        })
    }

    #[test]
    fn test_finish_computes_statistics() {
        let mut aggregator = ResultAggregator::new(4);
        aggregator.record_all(vec![ok(1), err(0), ok(3), ok(2)]);

        assert_eq!(aggregator.recorded(), 4);
        assert_eq!(aggregator.succeeded_count(), 3);
        assert_eq!(aggregator.failed_count(), 1);

        let result = aggregator.finish(Duration::from_millis(1500));
        assert_eq!(result.total, 4);
        assert_eq!(result.success_rate, 75.0);
        assert_eq!(result.duration, Duration::from_millis(1500));
        assert_eq!(result.failed[0].error, "item 0 failed");
    }

    #[test]
    fn test_empty_run_is_fully_successful() {
        let aggregator: ResultAggregator<usize, usize, String> = ResultAggregator::new(0);
        let result = aggregator.finish(Duration::ZERO);

        assert_eq!(result.total, 0);
        assert!(result.succeeded.is_empty());
        assert!(result.failed.is_empty());
        assert_eq!(result.success_rate, 100.0);
        assert!(!result.success_rate.is_nan());
    }

    #[test]
    fn test_success_rate_values() {
        assert_eq!(success_rate(0, 5), 0.0);
        assert_eq!(success_rate(5, 5), 100.0);
        assert!((success_rate(1, 3) - 33.333).abs() < 0.001);
    }
}
