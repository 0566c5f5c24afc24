//! # Producer registration bundle.
//!
//! [`ProducerSpec`] pairs a producer with an optional backoff override. Producers
//! registered without one inherit [`SupervisorConfig::backoff`](crate::SupervisorConfig).

use crate::policies::BackoffPolicy;
use crate::producers::ProducerRef;

/// A producer plus its supervision settings.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use agentvisor::{BackoffPolicy, Blackboard, ProducerError, ProducerFn, ProducerSpec};
///
/// let spec = ProducerSpec::new(ProducerFn::arc(
///     "A19",
///     "Bearing Health",
///     |_b: Arc<Blackboard>, ctx: CancellationToken| async move {
///         ctx.cancelled().await;
///         Err::<(), _>(ProducerError::Canceled)
///     },
/// ))
/// .with_backoff(BackoffPolicy::exponential(Duration::from_millis(200), Duration::from_secs(5)));
///
/// assert_eq!(spec.id(), "A19");
/// assert!(spec.backoff().is_some());
/// ```
#[derive(Clone)]
pub struct ProducerSpec {
    producer: ProducerRef,
    backoff: Option<BackoffPolicy>,
}

impl ProducerSpec {
    /// Wraps `producer` with the supervisor's default backoff.
    pub fn new(producer: ProducerRef) -> Self {
        Self {
            producer,
            backoff: None,
        }
    }

    /// Returns a new spec with a dedicated backoff policy.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Returns the producer.
    pub fn producer(&self) -> &ProducerRef {
        &self.producer
    }

    /// Convenience: returns the producer id.
    pub fn id(&self) -> &str {
        self.producer.id()
    }

    /// Returns the backoff override, if any.
    pub fn backoff(&self) -> Option<BackoffPolicy> {
        self.backoff
    }
}

impl From<ProducerRef> for ProducerSpec {
    fn from(producer: ProducerRef) -> Self {
        Self::new(producer)
    }
}
