//! Rate limiting for login attempts.
//!
//! Uses the governor crate with a single process-wide quota.

use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter state
pub type RateLimiterState = Arc<
    RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
>;

const DEFAULT_REQUESTS_PER_MINUTE: NonZeroU32 = NonZeroU32::new(30).unwrap();

/// Create a rate limiter allowing `requests_per_minute`; zero falls back
/// to the default of 30.
pub fn create_rate_limiter_with_quota(requests_per_minute: u32) -> RateLimiterState {
    let quota =
        Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(DEFAULT_REQUESTS_PER_MINUTE));
    Arc::new(RateLimiter::direct(quota))
}

/// Consume one unit of quota. Returns false when the caller must back off.
pub fn try_acquire(limiter: &RateLimiterState) -> bool {
    limiter.check().is_ok()
}
