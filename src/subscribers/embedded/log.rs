//! # LogWriter: lifecycle events as `tracing` events.
//!
//! Renders every [`Event`] through the `tracing` macros so lifecycle activity lands in
//! whatever subscriber the application installed.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO  agentvisor: producer starting producer="A19" attempt=1
//! WARN  agentvisor: producer failed producer="A19" fault="producer_panicked" reason="..." attempt=1
//! INFO  agentvisor: restart scheduled producer="A19" delay_ms=2000 attempt=1
//! INFO  agentvisor: shutdown requested
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that logs lifecycle events with `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Constructs a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let producer = e.producer.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        match e.kind {
            EventKind::ProducerStarting => {
                info!(seq = e.seq, producer, attempt = e.attempt, "producer starting");
            }
            EventKind::ProducerFailed => {
                warn!(
                    seq = e.seq,
                    producer,
                    fault = e.fault,
                    reason,
                    attempt = e.attempt,
                    "producer failed"
                );
            }
            EventKind::BackoffScheduled => {
                info!(
                    seq = e.seq,
                    producer,
                    delay_ms = e.delay_ms,
                    attempt = e.attempt,
                    "restart scheduled"
                );
            }
            EventKind::ProducerStopped => info!(seq = e.seq, producer, "producer stopped"),
            EventKind::ShutdownRequested => info!(seq = e.seq, "shutdown requested"),
            EventKind::AllStoppedWithin => info!(seq = e.seq, "all producers stopped within grace"),
            EventKind::GraceExceeded => warn!(seq = e.seq, stuck = reason, "grace exceeded"),
            EventKind::SubscriberOverflow => {
                debug!(seq = e.seq, subscriber = producer, reason, "subscriber overflow");
            }
            EventKind::SubscriberPanicked => {
                warn!(seq = e.seq, subscriber = producer, reason, "subscriber panicked");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
