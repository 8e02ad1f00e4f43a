use governor::{
    Quota, RateLimiter as GovernorRateLimiter,
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

type DirectLimiter = GovernorRateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Paces outgoing API requests across every in-flight item of a bulk run.
///
/// Concurrency caps how many requests are outstanding; this caps how many
/// start per second. Clones share one quota.
#[derive(Clone)]
pub struct RequestRateLimiter {
    inner: Arc<DirectLimiter>,
    requests_per_second: NonZeroU32,
}

impl std::fmt::Debug for RequestRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRateLimiter")
            .field("requests_per_second", &self.requests_per_second)
            .finish()
    }
}

impl RequestRateLimiter {
    pub fn new(requests_per_second: NonZeroU32, burst_size: NonZeroU32) -> Self {
        let quota = Quota::per_second(requests_per_second).allow_burst(burst_size);
        Self {
            inner: Arc::new(GovernorRateLimiter::direct(quota)),
            requests_per_second,
        }
    }

    /// Waits until the quota allows one more request.
    pub async fn acquire(&self) {
        self.inner.until_ready().await;
    }

    /// Takes a slot without waiting; `false` if the quota is exhausted.
    pub fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second.get()
    }
}

/// Rate limit section of the API configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests started per second; unset or zero disables limiting
    pub requests_per_second: Option<u32>,
    /// Maximum burst size (defaults to requests_per_second)
    pub burst_size: Option<u32>,
}

impl RateLimitConfig {
    pub fn per_second(requests_per_second: u32) -> Self {
        Self {
            requests_per_second: Some(requests_per_second),
            burst_size: None,
        }
    }

    /// Builds the limiter, or `None` when limiting is disabled.
    pub fn build(&self) -> Option<RequestRateLimiter> {
        let requests_per_second = NonZeroU32::new(self.requests_per_second?)?;
        let burst_size = self
            .burst_size
            .and_then(NonZeroU32::new)
            .unwrap_or(requests_per_second);
        Some(RequestRateLimiter::new(requests_per_second, burst_size))
    }
}
