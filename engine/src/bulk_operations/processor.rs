use super::aggregator::ResultAggregator;
use super::registry::OperationRegistry;
use super::retry::{ItemContext, RetryPolicy, execute_with_retry};
use super::types::{BulkConfig, BulkOperation, BulkResult};
use crate::common::BulkError;
use futures::future::join_all;
use std::fmt::Display;
use tokio::time::Instant;

/// Main coordinator for bulk operations.
///
/// Admits a descriptor through the [`OperationRegistry`], splits its items into
/// consecutive windows of `concurrency` items, runs each window concurrently
/// and waits for all of it before starting the next. An item that exhausts its
/// retries is recorded as failed; it never stops the rest of the run.
///
/// # Examples
///
/// ```no_run
/// use engine::bulk_operations::{BulkConfig, BulkOperation, BulkOperationProcessor, OperationRegistry};
///
/// # async fn run() -> Result<(), engine::common::BulkError> {
/// let processor = BulkOperationProcessor::new(OperationRegistry::new(), BulkConfig::default());
///
/// let operation = BulkOperation::new("double", (0..100).collect(), |n: u64| async move {
///     Ok::<_, String>(n * 2)
/// });
///
/// let result = processor.process(operation).await?;
/// println!("{}", result.summary());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct BulkOperationProcessor {
    registry: OperationRegistry,
    config: BulkConfig,
}

impl BulkOperationProcessor {
    pub fn new(registry: OperationRegistry, config: BulkConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    pub fn config(&self) -> &BulkConfig {
        &self.config
    }

    /// Runs a bulk operation to completion.
    ///
    /// # Errors
    ///
    /// - [`BulkError::InvalidConfiguration`] if the effective concurrency is zero
    /// - [`BulkError::AlreadyInProgress`] if a run with the same id is active;
    ///   no item is touched in that case
    ///
    /// Per-item failures are not errors; they are reported in
    /// [`BulkResult::failed`].
    pub async fn process<T, R, E>(
        &self,
        operation: BulkOperation<T, R, E>,
    ) -> Result<BulkResult<T, R, E>, BulkError>
    where
        T: Clone,
        E: Display,
    {
        let concurrency = operation
            .concurrency
            .unwrap_or_else(|| self.config.default_concurrency());
        if concurrency == 0 {
            return Err(BulkError::InvalidConfiguration(format!(
                "concurrency for '{}' must be at least 1",
                operation.id
            )));
        }
        let policy = RetryPolicy::new(
            operation
                .retry_attempts
                .unwrap_or_else(|| self.config.default_retry_attempts()),
            operation
                .retry_delay
                .unwrap_or_else(|| self.config.default_retry_delay()),
        );

        let Some(_admission) = self.registry.try_acquire(&operation.id) else {
            log::warn!(
                "Rejected bulk operation '{}': already in progress",
                operation.id
            );
            return Err(BulkError::AlreadyInProgress { id: operation.id });
        };

        let started = Instant::now();
        let BulkOperation {
            id,
            items,
            operation,
            on_progress,
            on_item_complete,
            on_item_error,
            ..
        } = operation;
        let total = items.len();

        log::info!(
            "Starting bulk operation '{}': {} items, concurrency {}, up to {} attempt(s) per item",
            id,
            total,
            concurrency,
            policy.max_attempts()
        );

        let context = ItemContext {
            operation_id: &id,
            operation: &operation,
            policy,
            on_item_complete: on_item_complete.as_ref(),
            on_item_error: on_item_error.as_ref(),
        };
        let mut aggregator = ResultAggregator::new(total);
        let mut pending = items.into_iter().enumerate();
        let mut completed = 0;

        loop {
            let window: Vec<(usize, T)> = pending.by_ref().take(concurrency).collect();
            if window.is_empty() {
                break;
            }
            let window_len = window.len();

            let outcomes = join_all(
                window
                    .into_iter()
                    .map(|(index, item)| execute_with_retry(&context, item, index)),
            )
            .await;
            aggregator.record_all(outcomes);

            completed += window_len;
            log::debug!(
                "[{}] window finished: {}/{} items ({} succeeded, {} failed so far)",
                id,
                completed,
                total,
                aggregator.succeeded_count(),
                aggregator.failed_count()
            );

            if let Some(on_progress) = &on_progress {
                on_progress(completed, total);
            }
        }

        let result = aggregator.finish(started.elapsed());
        log::info!("Bulk operation '{}' completed: {}", id, result.summary());

        Ok(result)
    }

    pub fn is_operation_active(&self, id: &str) -> bool {
        self.registry.is_active(id)
    }

    pub fn active_operations(&self) -> Vec<String> {
        self.registry.list_active()
    }

    /// Frees `id` for a new run. In-flight windows of the current run are not
    /// interrupted.
    pub fn cancel_operation(&self, id: &str) -> bool {
        self.registry.cancel(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn processor() -> BulkOperationProcessor {
        BulkOperationProcessor::new(OperationRegistry::new(), BulkConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_items_succeed() {
        let operation = BulkOperation::new("all-ok", (0..10).collect(), |n: usize| async move {
            Ok::<_, String>(n * n)
        })
        .with_concurrency(3);

        let result = assert_ok!(processor().process(operation).await);

        assert_eq!(result.succeeded.len(), 10);
        assert_eq!(result.failed.len(), 0);
        assert_eq!(result.total, 10);
        assert_eq!(result.success_rate, 100.0);
        assert!(result.is_complete_success());
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_concurrency_is_rejected_before_admission() {
        let processor = processor();
        let operation =
            BulkOperation::new("bad", vec![1], |n: i32| async move { Ok::<_, String>(n) })
                .with_concurrency(0);

        let error = assert_err!(processor.process(operation).await);

        assert_matches!(error, BulkError::InvalidConfiguration(_));
        assert!(!processor.is_operation_active("bad"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_reports_window_boundaries() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = reports.clone();
        let operation = BulkOperation::new("progress", (0..7).collect(), |n: usize| async move {
            if n % 2 == 0 { Ok(n) } else { Err(format!("odd {n}")) }
        })
        .with_concurrency(3)
        .with_retry_attempts(0)
        .on_progress(Arc::new(move |completed, total| {
            sink.lock().unwrap().push((completed, total))
        }));

        let result = assert_ok!(processor().process(operation).await);

        assert_eq!(*reports.lock().unwrap(), vec![(3, 7), (6, 7), (7, 7)]);
        assert_eq!(result.succeeded_count(), 4);
        assert_eq!(result.failed_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_descriptor_defaults_come_from_config() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let processor =
            BulkOperationProcessor::new(OperationRegistry::new(), BulkConfig::new(2, 1, 10));
        let operation = BulkOperation::new("from-config", vec![(); 3], move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Err::<(), _>("nope".to_string()) }
        });

        let result = assert_ok!(processor.process(operation).await);

        assert_eq!(result.failed_count(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 6);
        // Two windows, each waiting one 10ms backoff
        assert_ge!(result.duration, Duration::from_millis(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_released_after_run() {
        let processor = processor();
        let operation =
            BulkOperation::new("release-me", vec![1, 2], |n: i32| async move { Ok::<_, String>(n) });

        assert_ok!(processor.process(operation).await);

        assert!(!processor.is_operation_active("release-me"));
        assert!(processor.active_operations().is_empty());
        assert!(!processor.cancel_operation("release-me"));
    }
}
