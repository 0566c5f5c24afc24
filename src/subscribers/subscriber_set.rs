//! # Non-blocking fan-out of lifecycle events.
//!
//! [`SubscriberSet`] hands every event to every [`Subscribe`] implementation through
//! per-subscriber bounded queues.
//!
//! ```text
//! emit(event)
//!     ├──► [queue 1] ──► worker 1 ──► sub1.on_event()   (panic → SubscriberPanicked)
//!     ├──► [queue 2] ──► worker 2 ──► sub2.on_event()
//!     └──► [queue N] ──► worker N ──► subN.on_event()
//! ```
//!
//! ## Rules
//! - `emit()` uses `try_send` and returns immediately.
//! - Overflow drops the event for that subscriber only and publishes `SubscriberOverflow`.
//! - Subscriber fault events are never re-published when they overflow themselves.
//! - No ordering across subscribers; FIFO within one.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::error::panic_message;
use crate::events::{Bus, Event};
use crate::subscribers::Subscribe;

struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Fan-out coordinator owning one queue and one worker per subscriber.
pub(crate) struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber on `rt`.
    ///
    /// Faults of a subscriber are published on `bus`.
    #[must_use]
    pub(crate) fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus, rt: &Handle) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let worker_bus = bus.clone();

            workers.push(rt.spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic) = AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(&*panic);
                        warn!(subscriber = sub.name(), panic = %info, "subscriber panicked");
                        worker_bus.publish(Event::subscriber_panicked(sub.name(), info));
                    }
                }
            }));
            channels.push(SubscriberChannel { name, sender: tx });
        }
        Self {
            channels,
            workers,
            bus,
        }
    }

    /// Delivers `event` to every subscriber queue without waiting.
    pub(crate) fn emit(&self, event: Arc<Event>) {
        let fault = event.is_subscriber_fault();
        for channel in &self.channels {
            let reason = match channel.sender.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if !fault {
                self.bus
                    .publish(Event::subscriber_overflow(channel.name, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to drain them.
    pub(crate) async fn shutdown(self) {
        drop(self.channels);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Recorder {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.seen.lock().push(event.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    struct Exploder;

    #[async_trait]
    impl Subscribe for Exploder {
        async fn on_event(&self, event: &Event) {
            if event.kind == EventKind::ProducerFailed {
                panic!("exploder hit a fault event");
            }
        }
        fn name(&self) -> &'static str {
            "exploder"
        }
    }

    #[tokio::test]
    async fn delivers_in_order_despite_panicking_neighbour() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(
            vec![
                Arc::new(Exploder),
                Arc::new(Recorder {
                    seen: Arc::clone(&seen),
                }),
            ],
            bus.clone(),
            &Handle::current(),
        );

        for kind in [
            EventKind::ProducerStarting,
            EventKind::ProducerFailed,
            EventKind::BackoffScheduled,
        ] {
            set.emit(Arc::new(Event::new(kind)));
        }
        set.shutdown().await;

        assert_eq!(
            *seen.lock(),
            vec![
                EventKind::ProducerStarting,
                EventKind::ProducerFailed,
                EventKind::BackoffScheduled
            ]
        );
        let ev = rx.recv().await.expect("panic reported");
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.producer.as_deref(), Some("exploder"));
    }

    struct Stalled;

    #[async_trait]
    impl Subscribe for Stalled {
        async fn on_event(&self, _event: &Event) {
            std::future::pending::<()>().await;
        }
        fn name(&self) -> &'static str {
            "stalled"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn full_queue_reports_overflow() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Stalled)], bus.clone(), &Handle::current());

        // worker has not run yet on a current-thread runtime: first fills the queue
        set.emit(Arc::new(Event::new(EventKind::ProducerStarting)));
        set.emit(Arc::new(Event::new(EventKind::ProducerStarting)));

        let ev = rx.recv().await.expect("overflow reported");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.producer.as_deref(), Some("stalled"));
    }
}
