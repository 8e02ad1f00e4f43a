use thiserror::Error;

/// Errors raised by the bulk processor itself, before any item runs.
///
/// Per-item failures are never reported through this type; they end up in
/// [`BulkResult::failed`](crate::bulk_operations::BulkResult::failed).
///
/// # Examples
///
/// ```no_run
/// use engine::common::BulkError;
///
/// fn report(error: &BulkError) {
///     match error {
///         BulkError::AlreadyInProgress { id } => {
///             log::warn!("'{id}' is still running, try again later");
///         }
///         BulkError::InvalidConfiguration(reason) => {
///             log::error!("Refusing to start bulk operation: {reason}");
///         }
///     }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkError {
    /// Another run with the same id has been admitted and not yet released.
    #[error("Bulk operation '{id}' is already in progress")]
    AlreadyInProgress { id: String },

    /// The descriptor cannot be run as given (for example zero concurrency).
    #[error("Invalid bulk operation configuration: {0}")]
    InvalidConfiguration(String),
}

/// HTTP-related errors from the enhancement API client.
///
/// Every variant carries owned strings so the error is `Clone` and can be
/// stored in failed bulk records.
///
/// # Error Categories
///
/// - [`ClientCreation`] - HTTP client initialization failures
/// - [`RequestFailed`] - Transport failures with URL and reason
/// - [`Timeout`] - Request exceeded the configured timeout
/// - [`Status`] - Non-success status with the server's error message
/// - [`InvalidResponse`] - Success status with an unreadable body
///
/// [`ClientCreation`]: HttpError::ClientCreation
/// [`RequestFailed`]: HttpError::RequestFailed
/// [`Timeout`]: HttpError::Timeout
/// [`Status`]: HttpError::Status
/// [`InvalidResponse`]: HttpError::InvalidResponse
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("HTTP client creation failed: {reason}")]
    ClientCreation { reason: String },

    #[error("Request failed: {url} - {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Request timeout after {seconds}s: {url}")]
    Timeout { url: String, seconds: u64 },

    /// The server answered with a non-success status. `message` is the
    /// body's `error` field when present, otherwise `HTTP <status>`.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Invalid response: expected {expected}, got {actual}")]
    InvalidResponse { expected: String, actual: String },
}

impl HttpError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            HttpError::RequestFailed { .. } | HttpError::Timeout { .. } => true,
            HttpError::Status { status, .. } => *status == 429 || *status >= 500,
            HttpError::ClientCreation { .. } | HttpError::InvalidResponse { .. } => false,
        }
    }
}
