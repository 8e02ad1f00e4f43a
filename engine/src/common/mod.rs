pub mod errors;
pub mod rate_limiter;

pub use errors::{BulkError, HttpError};
pub use rate_limiter::{RateLimitConfig, RequestRateLimiter};
