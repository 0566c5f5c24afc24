//! # Broadcast bus for lifecycle events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so actors and the supervisor can publish
//! without ever blocking a producer's supervision loop.
//!
//! ```text
//! ProducerActor 1 ──┐
//! ProducerActor N ──┼──► Bus ──► event listener (Supervisor) ──► SubscriberSet
//! Supervisor      ──┘
//! ```
//!
//! ## Rules
//! - `publish()` never blocks; with no receiver the event is dropped.
//! - The ring buffer is shared; a slow receiver observes `Lagged(n)` and skips `n` events.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable broadcast channel of [`Event`]s.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus holding at most `capacity` (at least 1) undelivered events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes `ev` to every current receiver.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn receivers_only_see_later_events() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ShutdownRequested));

        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::AllStoppedWithin));
        let ev = rx.recv().await.expect("event");
        assert_eq!(ev.kind, EventKind::AllStoppedWithin);
    }

    #[tokio::test]
    async fn slow_receivers_lag() {
        let bus = Bus::new(2);
        let mut rx = bus.subscribe();
        for _ in 0..5 {
            bus.publish(Event::new(EventKind::ProducerStarting));
        }
        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(3))
        ));
    }
}
