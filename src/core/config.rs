//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`]: shutdown grace, event bus sizing and the default
//! restart backoff.
//!
//! ## Sentinel values
//! - `grace = 0s` → `stop_all` does not wait; any producer still running is reported stuck
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Runtime settings of the [`Supervisor`](crate::Supervisor).
///
/// ## Field semantics
/// - `grace`: how long `stop_all` waits for producers to acknowledge cancellation
/// - `bus_capacity`: lifecycle event ring buffer size (min 1)
/// - `backoff`: restart delay for producers registered without their own policy
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Maximum wait for producers to stop after cancellation.
    ///
    /// Exceeding it makes `stop_all` return `RuntimeError::GraceExceeded`.
    pub grace: Duration,

    /// Capacity of the lifecycle event bus.
    ///
    /// Subscribers lagging further behind skip the oldest events.
    pub bus_capacity: usize,

    /// Default restart backoff. Can be overridden per producer via `ProducerSpec`.
    pub backoff: BackoffPolicy,
}

impl SupervisorConfig {
    /// Returns the bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a copy using `backoff` as the default restart policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    /// Returns a copy using `grace` as the shutdown grace period.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }
}

impl Default for SupervisorConfig {
    /// - `grace = 10s`
    /// - `bus_capacity = 1024`
    /// - `backoff = BackoffPolicy::default()` (fixed 2s)
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(10),
            bus_capacity: 1024,
            backoff: BackoffPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = SupervisorConfig::default();
        assert_eq!(cfg.grace, Duration::from_secs(10));
        assert_eq!(cfg.bus_capacity_clamped(), 1024);
        assert_eq!(cfg.backoff.next(0), Duration::from_secs(2));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let cfg = SupervisorConfig {
            bus_capacity: 0,
            ..SupervisorConfig::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
