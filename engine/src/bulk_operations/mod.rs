//! Bulk operations module for applying one async operation to many items
//!
//! The processor is split into several specialized components:
//!
//! - `types`: Descriptor, records, result and configuration types
//! - `registry`: Process-wide table of running operation ids
//! - `retry`: Per-item executor with linear backoff
//! - `aggregator`: Success/failure accounting for a single run
//! - `progress`: Throttled progress tracker with time-remaining estimates
//! - `processor`: Main coordinator that admits a run and drives its windows
//! - `validation`: Bulk validation built on top of the processor

pub mod aggregator;
pub mod processor;
pub mod progress;
pub mod registry;
pub mod retry;
pub mod types;
pub mod validation;

// Re-export the main types and components
pub use aggregator::ResultAggregator;
pub use processor::BulkOperationProcessor;
pub use progress::{ProgressTracker, ProgressUpdate, create_progress_tracker};
pub use registry::{OperationRegistry, RegistryGuard};
pub use retry::{ItemContext, RetryPolicy, backoff, execute_with_retry};
pub use types::{
    BulkConfig, BulkOperation, BulkResult, FailedRecord, ItemCompleteCallback, ItemErrorCallback,
    ItemOutcome, OperationFn, ProgressCallback, SucceededRecord,
};
pub use validation::{InvalidItem, ValidationOutcome, ValidationReport};
