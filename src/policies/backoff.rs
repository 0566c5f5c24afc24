//! # Restart backoff.
//!
//! [`BackoffPolicy`] decides how long a faulted producer waits before it is relaunched.
//! The wait after the `n`-th consecutive fault (0-indexed) is `first × factor^n`,
//! clamped to `max`, with jitter applied last. Jitter never feeds back into the next
//! computation, so jittered delays cannot drift downwards over a long fault streak.
//!
//! The default is the fixed two-second delay the supervisor has always used.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use agentvisor::BackoffPolicy;
//!
//! let fixed = BackoffPolicy::default();
//! assert_eq!(fixed.next(0), Duration::from_secs(2));
//! assert_eq!(fixed.next(7), Duration::from_secs(2));
//!
//! let exp = BackoffPolicy::exponential(Duration::from_millis(250), Duration::from_secs(4));
//! assert_eq!(exp.next(0), Duration::from_millis(250));
//! assert_eq!(exp.next(2), Duration::from_secs(1));
//! assert_eq!(exp.next(9), Duration::from_secs(4));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Delay policy between a producer fault and its relaunch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first fault of a streak.
    pub first: Duration,
    /// Upper bound for any computed delay.
    pub max: Duration,
    /// Growth factor per consecutive fault (`1.0` keeps the delay fixed).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Fixed 2s delay: `first = 2s`, `factor = 1.0`, `max = 60s`, no jitter.
    fn default() -> Self {
        Self::fixed(Duration::from_secs(2))
    }
}

impl BackoffPolicy {
    /// Constant `delay` after every fault.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay.max(Duration::from_secs(60)),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Doubling delay starting at `first`, capped at `max`.
    pub fn exponential(first: Duration, max: Duration) -> Self {
        Self {
            first,
            max,
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Returns a copy using `jitter`.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Computes the delay after the `streak`-th consecutive fault (0-indexed).
    ///
    /// Overflowing, negative or non-finite intermediate values clamp to [`BackoffPolicy::max`].
    pub fn next(&self, streak: u32) -> Duration {
        let exp = i32::try_from(streak).unwrap_or(i32::MAX);
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };

        match self.jitter {
            JitterPolicy::Decorrelated => {
                self.jitter
                    .apply_decorrelated(self.first.min(self.max), base, self.max)
            }
            other => other.apply(base),
        }
    }
}
