//! # Lifecycle events emitted by the supervisor and producer actors.
//!
//! The [`EventKind`] enum classifies events across three groups:
//! - **Producer lifecycle**: launches, faults, scheduled restarts, stops
//! - **Shutdown**: stop requested, finished within grace, grace exceeded
//! - **Subscriber health**: a lifecycle subscriber dropped an event or panicked
//!
//! The [`Event`] struct carries the metadata each kind sets (producer id, fault text,
//! launch number, restart delay).
//!
//! ## Ordering guarantees
//! Every event gets a process-wide, monotonically increasing `seq`.
//! Use it to restore order when subscribers receive events out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use agentvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::BackoffScheduled)
//!     .with_producer("A19")
//!     .with_reason("execution failed: bearing sensor offline")
//!     .with_attempt(3)
//!     .with_delay(Duration::from_secs(2));
//!
//! assert_eq!(ev.kind, EventKind::BackoffScheduled);
//! assert_eq!(ev.producer.as_deref(), Some("A19"));
//! assert_eq!(ev.delay_ms, Some(2000));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use chrono::{DateTime, Utc};

static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A producer is being launched.
    ///
    /// Sets `producer`, `attempt` (launch number, 1-based).
    ProducerStarting,

    /// A producer's unit of work ended with a fault.
    ///
    /// Sets `producer`, `attempt`, `reason` (fault text), `fault` (fault label).
    ProducerFailed,

    /// A faulted producer will be relaunched after a delay.
    ///
    /// Sets `producer`, `attempt`, `delay_ms`, `reason` (last fault text).
    BackoffScheduled,

    /// A producer's actor exited after cancellation.
    ///
    /// Sets `producer`.
    ProducerStopped,

    /// `stop_all` was called.
    ShutdownRequested,

    /// Every producer stopped within the grace period.
    AllStoppedWithin,

    /// Some producers did not stop within the grace period.
    ///
    /// Sets `reason` (comma-separated stuck producer ids).
    GraceExceeded,

    /// A lifecycle subscriber dropped an event (queue full or worker gone).
    ///
    /// Sets `producer` (subscriber name), `reason`.
    SubscriberOverflow,

    /// A lifecycle subscriber panicked while handling an event.
    ///
    /// Sets `producer` (subscriber name), `reason` (panic text).
    SubscriberPanicked,
}

/// Lifecycle event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: DateTime<Utc>,
    /// Event classification.
    pub kind: EventKind,
    /// Producer id (or subscriber name for subscriber events).
    pub producer: Option<Arc<str>>,
    /// Human-readable reason (fault text, overflow details, stuck ids).
    pub reason: Option<Arc<str>>,
    /// Stable fault label, see [`ProducerError::as_label`](crate::ProducerError::as_label).
    pub fault: Option<&'static str>,
    /// Launch number of the producer (1-based).
    pub attempt: Option<u32>,
    /// Restart delay in milliseconds.
    pub delay_ms: Option<u32>,
}

impl Event {
    /// Creates an event of `kind` stamped with the current time and the next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: Utc::now(),
            kind,
            producer: None,
            reason: None,
            fault: None,
            attempt: None,
            delay_ms: None,
        }
    }

    /// Attaches a producer id.
    #[inline]
    pub fn with_producer(mut self, producer: impl Into<Arc<str>>) -> Self {
        self.producer = Some(producer.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a fault label.
    #[inline]
    pub fn with_fault(mut self, label: &'static str) -> Self {
        self.fault = Some(label);
        self
    }

    /// Attaches a launch number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a restart delay (stored as milliseconds, saturating).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(u32::try_from(d.as_millis()).unwrap_or(u32::MAX));
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_producer(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_producer(subscriber)
            .with_reason(info)
    }

    /// True for events describing a lifecycle subscriber's own faults.
    ///
    /// These are never fed back to subscribers, so a broken subscriber cannot loop.
    #[inline]
    pub fn is_subscriber_fault(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_numbers_increase() {
        let a = Event::new(EventKind::ProducerStarting);
        let b = Event::new(EventKind::ProducerStarting);
        assert!(b.seq > a.seq);
        assert!(b.at >= a.at);
    }

    #[test]
    fn delay_saturates() {
        let ev = Event::new(EventKind::BackoffScheduled).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn subscriber_faults_are_flagged() {
        assert!(Event::subscriber_overflow("log", "full").is_subscriber_fault());
        assert!(Event::subscriber_panicked("log", "boom".into()).is_subscriber_fault());
        assert!(!Event::new(EventKind::ProducerFailed).is_subscriber_fault());
    }
}
