//! Restart delay policies.
//!
//! Producers are always restarted after a fault; these knobs decide **how long**
//! the supervisor waits before relaunching one.
//!
//! ## Contents
//! - [`BackoffPolicy`] how the delay evolves over consecutive faults (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization that keeps producers faulting together from relaunching together
//!
//! ## Quick wiring
//! ```text
//! ProducerSpec { producer, backoff: Option<BackoffPolicy> }
//!      └─► core::actor::ProducerActor uses:
//!           - spec backoff, else SupervisorConfig::backoff
//!           - backoff.next(consecutive_faults - 1) as the wait before relaunch
//! ```
//!
//! ## Defaults
//! - `BackoffPolicy::default()` → fixed 2s (first=2s, factor=1.0, max=60s, jitter=None).
//! - `BackoffPolicy::exponential(first, max)` opts into doubling delays.

mod backoff;
mod jitter;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
