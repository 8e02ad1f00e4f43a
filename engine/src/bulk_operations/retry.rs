use super::types::{
    FailedRecord, ItemCompleteCallback, ItemErrorCallback, ItemOutcome, OperationFn,
    SucceededRecord,
};
use std::fmt::Display;
use std::time::Duration;

/// Retry budget and backoff for a single item.
///
/// The delay before retry `n` (zero-based) is `base_delay * (n + 1)`, so the
/// waits grow linearly: 1x, 2x, 3x the base delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt
    pub retry_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retry_attempts: u32, base_delay: Duration) -> Self {
        Self {
            retry_attempts,
            base_delay,
        }
    }

    /// A single attempt, no retries.
    pub fn no_retries() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.retry_attempts.saturating_add(1)
    }

    /// Delay to wait after failed attempt `attempt` before the next one.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }
}

/// Suspends the current task for `duration`.
pub async fn backoff(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}

/// Everything the executor needs besides the item itself.
pub struct ItemContext<'a, T, R, E> {
    pub operation_id: &'a str,
    pub operation: &'a OperationFn<T, R, E>,
    pub policy: RetryPolicy,
    pub on_item_complete: Option<&'a ItemCompleteCallback<T, R>>,
    pub on_item_error: Option<&'a ItemErrorCallback<T, E>>,
}

/// Runs the operation for one item until it succeeds or the retry budget is
/// spent, then fires exactly one of the item callbacks.
///
/// A failed item carries the error of its last attempt.
pub async fn execute_with_retry<T, R, E>(
    context: &ItemContext<'_, T, R, E>,
    item: T,
    index: usize,
) -> ItemOutcome<T, R, E>
where
    T: Clone,
    E: Display,
{
    let policy = context.policy;
    let mut attempt: u32 = 0;

    loop {
        match (context.operation)(item.clone()).await {
            Ok(result) => {
                if let Some(callback) = context.on_item_complete {
                    callback(&item, &result, index);
                }
                return ItemOutcome::Succeeded(SucceededRecord {
                    item,
                    result,
                    index,
                });
            }
            Err(error) if attempt < policy.retry_attempts => {
                let delay = policy.delay_after(attempt);
                log::debug!(
                    "[{}] item {} attempt {}/{} failed: {}; retrying in {:?}",
                    context.operation_id,
                    index,
                    attempt + 1,
                    policy.max_attempts(),
                    error,
                    delay
                );
                backoff(delay).await;
                attempt += 1;
            }
            Err(error) => {
                log::warn!(
                    "[{}] item {} failed after {} attempt(s): {}",
                    context.operation_id,
                    index,
                    attempt + 1,
                    error
                );
                if let Some(callback) = context.on_item_error {
                    callback(&item, &error, index);
                }
                return ItemOutcome::Failed(FailedRecord { item, error, index });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    fn counting_operation(
        calls: Arc<AtomicUsize>,
        succeed_on_call: Option<usize>,
    ) -> OperationFn<u32, u32, String> {
        Arc::new(move |item| {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                match succeed_on_call {
                    Some(n) if call >= n => Ok(item + 1),
                    _ => Err(format!("call {call} failed")),
                }
            }
            .boxed()
        })
    }

    fn context<'a>(
        operation: &'a OperationFn<u32, u32, String>,
        policy: RetryPolicy,
    ) -> ItemContext<'a, u32, u32, String> {
        ItemContext {
            operation_id: "test",
            operation,
            policy,
            on_item_complete: None,
            on_item_error: None,
        }
    }

    #[test]
    fn test_delay_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        assert_eq!(policy.delay_after(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_after(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(2), Duration::from_millis(3000));
        assert_eq!(policy.max_attempts(), 4);
        assert_eq!(RetryPolicy::no_retries().max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success_calls_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let operation = counting_operation(calls.clone(), Some(1));
        let ctx = context(&operation, RetryPolicy::new(2, Duration::from_millis(1000)));

        let outcome = execute_with_retry(&ctx, 41, 0).await;

        assert_matches!(outcome, ItemOutcome::Succeeded(SucceededRecord { result: 42, index: 0, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_failing_is_capped_and_keeps_last_error() {
        let calls = Arc::new(AtomicUsize::new(0));
        let operation = counting_operation(calls.clone(), None);
        let ctx = context(&operation, RetryPolicy::new(2, Duration::from_millis(1000)));

        let start = Instant::now();
        let outcome = execute_with_retry(&ctx, 7, 3).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let ItemOutcome::Failed(record) = outcome else {
            panic!("expected failure");
        };
        assert_eq!(record.error, "call 3 failed");
        assert_eq!(record.index, 3);
        assert_eq!(record.item, 7);
        // 1000ms + 2000ms of backoff
        assert_ge!(start.elapsed(), Duration::from_millis(3000));
        assert_lt!(start.elapsed(), Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_retries_attempts_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let operation = counting_operation(calls.clone(), None);
        let ctx = context(&operation, RetryPolicy::new(0, Duration::from_millis(1000)));

        let outcome = execute_with_retry(&ctx, 1, 0).await;

        assert!(!outcome.is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callbacks_fire_once_per_terminal_outcome() {
        let completed = Arc::new(Mutex::new(Vec::new()));
        let errored = Arc::new(Mutex::new(Vec::new()));

        let on_complete: ItemCompleteCallback<u32, u32> = {
            let completed = completed.clone();
            Arc::new(move |item, result, index| {
                completed.lock().unwrap().push((*item, *result, index))
            })
        };
        let on_error: ItemErrorCallback<u32, String> = {
            let errored = errored.clone();
            Arc::new(move |item, error, index| {
                errored.lock().unwrap().push((*item, error.clone(), index))
            })
        };

        let flaky = counting_operation(Arc::new(AtomicUsize::new(0)), Some(2));
        let ctx = ItemContext {
            operation_id: "callbacks",
            operation: &flaky,
            policy: RetryPolicy::new(2, Duration::from_millis(10)),
            on_item_complete: Some(&on_complete),
            on_item_error: Some(&on_error),
        };
        execute_with_retry(&ctx, 10, 5).await;

        let broken = counting_operation(Arc::new(AtomicUsize::new(0)), None);
        let ctx = ItemContext {
            operation: &broken,
            ..ctx
        };
        execute_with_retry(&ctx, 20, 6).await;

        assert_eq!(*completed.lock().unwrap(), vec![(10, 11, 5)]);
        assert_eq!(
            *errored.lock().unwrap(),
            vec![(20, "call 3 failed".to_string(), 6)]
        );
    }
}
