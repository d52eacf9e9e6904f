//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Default join attempts allowed per connection per second
pub const JOIN_RATE_LIMIT: u32 = 5;

/// Per-connection rate limiter state
#[derive(Clone)]
pub struct ConnectionRateLimiter {
    join_limiter: Arc<Limiter>,
}

impl ConnectionRateLimiter {
    pub fn new(joins_per_second: u32) -> Self {
        Self {
            join_limiter: create_limiter(joins_per_second),
        }
    }

    /// Check if a join attempt is allowed (returns true if allowed)
    pub fn check_join(&self) -> bool {
        self.join_limiter.check().is_ok()
    }
}

impl Default for ConnectionRateLimiter {
    fn default() -> Self {
        Self::new(JOIN_RATE_LIMIT)
    }
}
