//! Throttled progress tracking for bulk runs.
//!
//! The processor reports raw `(completed, total)` counters after every window.
//! [`ProgressTracker`] turns them into [`ProgressUpdate`]s with a percentage and
//! an estimate of the remaining time, and drops updates that arrive faster
//! than the throttle interval. The final update (`completed == total`) is
//! always delivered.

use super::types::ProgressCallback;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_THROTTLE: Duration = Duration::from_millis(100);

/// A single progress notification.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub completed: usize,
    pub total: usize,
    /// `completed / total * 100`, or 100 for an empty run
    pub percentage: f64,
    /// Only present while some, but not all, items are done
    pub estimated_time_remaining: Option<Duration>,
}

impl ProgressUpdate {
    pub fn is_final(&self) -> bool {
        self.completed == self.total
    }
}

impl fmt::Display for ProgressUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({:.1}%)",
            self.completed, self.total, self.percentage
        )?;
        if let Some(remaining) = self.estimated_time_remaining {
            write!(f, ", ~{:.1}s remaining", remaining.as_secs_f64())?;
        }
        Ok(())
    }
}

type UpdateSink = Arc<dyn Fn(ProgressUpdate) + Send + Sync>;

/// Rate-limited adapter from raw counters to [`ProgressUpdate`]s.
pub struct ProgressTracker {
    started: Instant,
    last_update: Mutex<Instant>,
    throttle: Duration,
    on_update: UpdateSink,
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("started", &self.started)
            .field("throttle", &self.throttle)
            .finish()
    }
}

impl ProgressTracker {
    pub fn new<F>(on_update: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        Self::with_throttle(on_update, DEFAULT_THROTTLE)
    }

    /// Creates a tracker whose clock starts now. Non-final updates are
    /// delivered only when more than `throttle` has passed since the previous
    /// delivery (or since creation, for the first one).
    pub fn with_throttle<F>(on_update: F, throttle: Duration) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        let now = Instant::now();
        Self {
            started: now,
            last_update: Mutex::new(now),
            throttle,
            on_update: Arc::new(on_update),
        }
    }

    /// Feeds one `(completed, total)` observation through the throttle.
    pub fn observe(&self, completed: usize, total: usize) {
        let now = Instant::now();
        let update = build_update(completed, total, now.duration_since(self.started));

        let should_emit = {
            let mut last_update = self
                .last_update
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let due = now.duration_since(*last_update) > self.throttle;
            if due || update.is_final() {
                *last_update = now;
                true
            } else {
                false
            }
        };

        if should_emit {
            (self.on_update)(update);
        }
    }

    /// Converts the tracker into a callback usable as a descriptor's
    /// progress handler.
    pub fn into_callback(self) -> ProgressCallback {
        let tracker = Arc::new(self);
        Arc::new(move |completed, total| tracker.observe(completed, total))
    }
}

fn build_update(completed: usize, total: usize, elapsed: Duration) -> ProgressUpdate {
    let percentage = if total == 0 {
        100.0
    } else {
        completed as f64 / total as f64 * 100.0
    };

    let estimated_time_remaining = (completed > 0 && completed < total).then(|| {
        let per_item = elapsed.as_secs_f64() / completed as f64;
        Duration::from_secs_f64(per_item * (total - completed) as f64)
    });

    ProgressUpdate {
        completed,
        total,
        percentage,
        estimated_time_remaining,
    }
}

/// Returns a throttled `(completed, total)` callback that forwards
/// [`ProgressUpdate`]s to `on_update` at most once every 100ms, plus the
/// final update.
///
/// # Examples
///
/// ```no_run
/// use engine::bulk_operations::{BulkOperation, create_progress_tracker};
///
/// let on_progress = create_progress_tracker(|update| println!("Progress: {update}"));
/// let operation = BulkOperation::new("sync", vec![1, 2, 3], |n| async move {
///     Ok::<_, String>(n)
/// })
/// .on_progress(on_progress);
/// ```
pub fn create_progress_tracker<F>(on_update: F) -> ProgressCallback
where
    F: Fn(ProgressUpdate) + Send + Sync + 'static,
{
    ProgressTracker::new(on_update).into_callback()
}
