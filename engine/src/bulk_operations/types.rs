//! Types and data structures for bulk operations.
//!
//! This module defines the descriptor a caller hands to the processor, the
//! per-item records produced by a run, the aggregated result, and the
//! configuration that supplies defaults for unset tuning knobs.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Asynchronous operation applied to every item of a run.
pub type OperationFn<T, R, E> = Arc<dyn Fn(T) -> BoxFuture<'static, Result<R, E>> + Send + Sync>;

/// Receives `(completed, total)` after each finished window.
pub type ProgressCallback = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Receives `(item, result, index)` once an item succeeds.
pub type ItemCompleteCallback<T, R> = Arc<dyn Fn(&T, &R, usize) + Send + Sync>;

/// Receives `(item, last_error, index)` once an item has exhausted its retries.
pub type ItemErrorCallback<T, E> = Arc<dyn Fn(&T, &E, usize) + Send + Sync>;

/// Descriptor of one logical bulk run.
///
/// The descriptor is consumed by [`BulkOperationProcessor::process`], so it
/// cannot change while the run is in flight. Tuning knobs left unset fall back
/// to the processor's [`BulkConfig`].
///
/// # Examples
///
/// ```no_run
/// use engine::bulk_operations::BulkOperation;
/// use std::time::Duration;
///
/// let operation = BulkOperation::new("resize-images", vec![1u32, 2, 3], |n| async move {
///     Ok::<_, String>(n * 2)
/// })
/// .with_concurrency(2)
/// .with_retry_attempts(1)
/// .with_retry_delay(Duration::from_millis(250));
/// ```
///
/// [`BulkOperationProcessor::process`]: super::BulkOperationProcessor::process
pub struct BulkOperation<T, R, E> {
    pub(crate) id: String,
    pub(crate) items: Vec<T>,
    pub(crate) operation: OperationFn<T, R, E>,
    pub(crate) concurrency: Option<usize>,
    pub(crate) retry_attempts: Option<u32>,
    pub(crate) retry_delay: Option<Duration>,
    pub(crate) on_progress: Option<ProgressCallback>,
    pub(crate) on_item_complete: Option<ItemCompleteCallback<T, R>>,
    pub(crate) on_item_error: Option<ItemErrorCallback<T, E>>,
}

impl<T, R, E> BulkOperation<T, R, E> {
    /// Creates a descriptor for `items` processed by `operation`.
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier used for admission; only one run per id may be active
    /// * `items` - Items in input order; record indices refer to this order
    /// * `operation` - Called once per item per attempt
    pub fn new<F, Fut>(id: impl Into<String>, items: Vec<T>, operation: F) -> Self
    where
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        T: 'static,
        R: 'static,
        E: 'static,
    {
        let operation: OperationFn<T, R, E> = Arc::new(move |item| operation(item).boxed());
        Self::from_operation_fn(id, items, operation)
    }

    /// Creates a descriptor from an already shared operation.
    pub fn from_operation_fn(
        id: impl Into<String>,
        items: Vec<T>,
        operation: OperationFn<T, R, E>,
    ) -> Self {
        Self {
            id: id.into(),
            items,
            operation,
            concurrency: None,
            retry_attempts: None,
            retry_delay: None,
            on_progress: None,
            on_item_complete: None,
            on_item_error: None,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = Some(concurrency);
        self
    }

    pub fn with_retry_attempts(mut self, retry_attempts: u32) -> Self {
        self.retry_attempts = Some(retry_attempts);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = Some(retry_delay);
        self
    }

    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    pub fn on_item_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T, &R, usize) + Send + Sync + 'static,
    {
        self.on_item_complete = Some(Arc::new(callback));
        self
    }

    pub fn on_item_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(&T, &E, usize) + Send + Sync + 'static,
    {
        self.on_item_error = Some(Arc::new(callback));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn concurrency(&self) -> Option<usize> {
        self.concurrency
    }

    pub fn retry_attempts(&self) -> Option<u32> {
        self.retry_attempts
    }

    pub fn retry_delay(&self) -> Option<Duration> {
        self.retry_delay
    }
}

impl<T, R, E> fmt::Debug for BulkOperation<T, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkOperation")
            .field("id", &self.id)
            .field("items", &self.items.len())
            .field("concurrency", &self.concurrency)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("on_progress", &self.on_progress.is_some())
            .field("on_item_complete", &self.on_item_complete.is_some())
            .field("on_item_error", &self.on_item_error.is_some())
            .finish()
    }
}

/// An item whose operation eventually succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct SucceededRecord<T, R> {
    pub item: T,
    pub result: R,
    /// Position of the item in the descriptor's input sequence
    pub index: usize,
}

/// An item whose operation failed on every allowed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FailedRecord<T, E> {
    pub item: T,
    /// Error from the final attempt; earlier errors are discarded
    pub error: E,
    /// Position of the item in the descriptor's input sequence
    pub index: usize,
}

/// Terminal outcome of a single item.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome<T, R, E> {
    Succeeded(SucceededRecord<T, R>),
    Failed(FailedRecord<T, E>),
}

impl<T, R, E> ItemOutcome<T, R, E> {
    pub fn index(&self) -> usize {
        match self {
            ItemOutcome::Succeeded(record) => record.index,
            ItemOutcome::Failed(record) => record.index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Succeeded(_))
    }
}

/// Aggregated result of a bulk run.
///
/// `succeeded` and `failed` are in completion order; every record keeps its
/// input `index`, so [`BulkResult::into_sorted`] recovers input order.
///
/// # Examples
///
/// ```no_run
/// # async fn run(result: engine::bulk_operations::BulkResult<String, (), String>) {
/// if result.is_complete_success() {
///     println!("All {} items processed", result.total);
/// } else {
///     println!("{}", result.summary());
///     let retry_batch = result.failed_items();
/// }
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BulkResult<T, R, E> {
    pub succeeded: Vec<SucceededRecord<T, R>>,
    pub failed: Vec<FailedRecord<T, E>>,
    /// Number of items in the descriptor
    pub total: usize,
    /// Wall-clock time from admission to the end of the last window
    pub duration: Duration,
    /// `succeeded / total * 100`; a run with no items is 100% successful
    pub success_rate: f64,
}

impl<T, R, E> BulkResult<T, R, E> {
    pub fn succeeded_count(&self) -> usize {
        self.succeeded.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.succeeded.len() == self.total
    }

    /// Items that failed, in input order, ready to be submitted as a new run.
    pub fn failed_items(&self) -> Vec<T>
    where
        T: Clone,
    {
        let mut failed: Vec<&FailedRecord<T, E>> = self.failed.iter().collect();
        failed.sort_by_key(|record| record.index);
        failed.into_iter().map(|record| record.item.clone()).collect()
    }

    /// Returns the result with both record lists ordered by input index.
    pub fn into_sorted(mut self) -> Self {
        self.succeeded.sort_by_key(|record| record.index);
        self.failed.sort_by_key(|record| record.index);
        self
    }

    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed ({:.1}%) in {:.2}s",
            self.succeeded.len(),
            self.failed.len(),
            self.success_rate,
            self.duration.as_secs_f64()
        )
    }
}

/// Configuration for bulk operation defaults.
///
/// Every value is optional so the struct can be deserialized from a partial
/// configuration section; accessors fall back to the built-in defaults.
///
/// # Examples
///
/// ```no_run
/// use engine::bulk_operations::BulkConfig;
///
/// let config = BulkConfig::default();
/// assert_eq!(config.default_concurrency(), 3);
///
/// let config = BulkConfig::new(8, 0, 500);
/// println!("Retry delay: {:?}", config.default_retry_delay());
/// ```
#[derive(Debug, Deserialize, Default, Clone)]
pub struct BulkConfig {
    /// Items in flight per window when the descriptor does not say (default: 3)
    default_concurrency: Option<usize>,
    /// Retries after the first attempt when the descriptor does not say (default: 2)
    default_retry_attempts: Option<u32>,
    /// Base backoff delay in milliseconds (default: 1000)
    default_retry_delay_ms: Option<u64>,
    /// Window size for bulk validation (default: 10)
    validation_concurrency: Option<usize>,
    /// Minimum spacing between non-final progress updates (default: 100)
    progress_throttle_ms: Option<u64>,
}

impl BulkConfig {
    /// Creates a config with explicit run defaults; the remaining values use
    /// their built-in defaults when accessed.
    pub fn new(concurrency: usize, retry_attempts: u32, retry_delay_ms: u64) -> Self {
        Self {
            default_concurrency: Some(concurrency),
            default_retry_attempts: Some(retry_attempts),
            default_retry_delay_ms: Some(retry_delay_ms),
            validation_concurrency: None,
            progress_throttle_ms: None,
        }
    }

    pub fn with_validation_concurrency(mut self, concurrency: usize) -> Self {
        self.validation_concurrency = Some(concurrency);
        self
    }

    pub fn with_progress_throttle_ms(mut self, throttle_ms: u64) -> Self {
        self.progress_throttle_ms = Some(throttle_ms);
        self
    }

    pub fn default_concurrency(&self) -> usize {
        self.default_concurrency.unwrap_or(3)
    }

    pub fn default_retry_attempts(&self) -> u32 {
        self.default_retry_attempts.unwrap_or(2)
    }

    pub fn default_retry_delay(&self) -> Duration {
        Duration::from_millis(self.default_retry_delay_ms.unwrap_or(1000))
    }

    pub fn validation_concurrency(&self) -> usize {
        self.validation_concurrency.unwrap_or(10)
    }

    pub fn progress_throttle(&self) -> Duration {
        Duration::from_millis(self.progress_throttle_ms.unwrap_or(100))
    }
}
