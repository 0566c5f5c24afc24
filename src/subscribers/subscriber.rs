//! # Lifecycle event subscriber trait.
//!
//! [`Subscribe`] is the hook for reacting to producer lifecycle events
//! (launches, faults, restarts, shutdown), for example to feed a dashboard or alerting.
//!
//! Each subscriber gets a dedicated worker task, its own bounded queue
//! ([`Subscribe::queue_capacity`]) and panic isolation.
//!
//! ```text
//! SubscriberSet ──► [bounded queue] ──► worker task ──► subscriber.on_event()
//!                                    └─► panic caught → EventKind::SubscriberPanicked
//! ```
//!
//! ## Rules
//! - Events are handled sequentially (FIFO) per subscriber.
//! - A full queue drops the event for that subscriber only and publishes
//!   `EventKind::SubscriberOverflow`.
//! - Subscribers never block producers, the supervisor, or each other.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use agentvisor::{Event, EventKind, Subscribe};
//!
//! struct FaultCounter;
//!
//! #[async_trait]
//! impl Subscribe for FaultCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::ProducerFailed {
//!             // bump a counter, page someone, ...
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "fault-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of supervisor lifecycle events.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; a panic is caught but still reported.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event, called from this subscriber's worker task.
    async fn on_event(&self, event: &Event);

    /// Name used in logs and in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Queue capacity for this subscriber (clamped to at least 1).
    fn queue_capacity(&self) -> usize {
        1024
    }
}
