//! # ProducerActor: keeps one producer alive.
//!
//! Supervises one [`Producer`](crate::Producer): launches it, and after every fault
//! records the fault, waits the backoff delay and launches it again. There is no restart
//! limit; only cancellation ends the loop.
//!
//! ## Architecture
//! ```text
//! loop {
//!   ├─► roster: Running, publish ProducerStarting{attempt}
//!   ├─► run_once(producer, board, token)
//!   │       ├─ Stopped      ─► break
//!   │       └─ Fault(err)   ─► roster: Restarting + last_fault
//!   │                          warn!("producer crashed; restarting")
//!   │                          publish ProducerFailed, BackoffScheduled{delay}
//!   │                          sleep(delay) (cancellable ─► break)
//! }
//! roster: Stopped, publish ProducerStopped
//! ```
//!
//! ## Rules
//! - Launches run sequentially within one actor.
//! - `attempt` counts launches and never resets.
//! - The backoff streak resets once a launch survives longer than `backoff.max`.

use std::sync::Arc;

use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::board::Blackboard;
use crate::core::roster::Roster;
use crate::core::runner::{Outcome, run_once};
use crate::events::{Bus, Event, EventKind};
use crate::policies::BackoffPolicy;
use crate::producers::ProducerRef;

/// Supervision loop of a single producer.
pub(crate) struct ProducerActor {
    producer: ProducerRef,
    board: Arc<Blackboard>,
    backoff: BackoffPolicy,
    roster: Arc<Roster>,
    bus: Bus,
}

impl ProducerActor {
    pub(crate) fn new(
        producer: ProducerRef,
        board: Arc<Blackboard>,
        backoff: BackoffPolicy,
        roster: Arc<Roster>,
        bus: Bus,
    ) -> Self {
        Self {
            producer,
            board,
            backoff,
            roster,
            bus,
        }
    }

    /// Runs until `token` is cancelled.
    pub(crate) async fn run(self, token: CancellationToken) {
        let id = self.producer.id().to_owned();
        let mut attempt: u32 = 0;
        let mut streak: u32 = 0;

        while !token.is_cancelled() {
            attempt = attempt.saturating_add(1);
            self.roster.mark_running(&id);
            self.bus.publish(
                Event::new(EventKind::ProducerStarting)
                    .with_producer(id.as_str())
                    .with_attempt(attempt),
            );

            let launched = Instant::now();
            let outcome = run_once(self.producer.as_ref(), Arc::clone(&self.board), &token).await;
            let err = match outcome {
                Outcome::Stopped => break,
                Outcome::Fault(err) => err,
            };

            self.roster.record_fault(&id, &err);
            warn!(
                producer = %id,
                fault = err.as_label(),
                error = %err,
                attempt,
                "producer crashed; restarting"
            );
            self.bus.publish(
                Event::new(EventKind::ProducerFailed)
                    .with_producer(id.as_str())
                    .with_attempt(attempt)
                    .with_fault(err.as_label())
                    .with_reason(err.to_string()),
            );

            if launched.elapsed() > self.backoff.max {
                streak = 0;
            }
            let delay = self.backoff.next(streak);
            streak = streak.saturating_add(1);

            debug!(producer = %id, ?delay, attempt, "restart scheduled");
            self.bus.publish(
                Event::new(EventKind::BackoffScheduled)
                    .with_producer(id.as_str())
                    .with_attempt(attempt)
                    .with_delay(delay)
                    .with_reason(err.to_string()),
            );

            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = token.cancelled() => break,
            }
        }

        self.roster.mark_stopped(&id);
        self.bus
            .publish(Event::new(EventKind::ProducerStopped).with_producer(id.as_str()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::roster::ProducerStatus;
    use crate::error::ProducerError;
    use crate::producers::{ProducerFn, ProducerSpec};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn setup(producer: ProducerRef) -> (Arc<Roster>, Bus) {
        let roster = Roster::new();
        roster
            .insert(ProducerSpec::new(producer))
            .expect("unique producer");
        (roster, Bus::new(64))
    }

    #[tokio::test(start_paused = true)]
    async fn faults_cycle_through_restarting_back_to_running() {
        let launches = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&launches);
        let producer: ProducerRef = ProducerFn::arc(
            "A19",
            "Bearing Health",
            move |_b: Arc<Blackboard>, _c: CancellationToken| {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    time::sleep(Duration::from_millis(500)).await;
                    Err::<(), _>(ProducerError::fail("bearing sensor offline"))
                }
            },
        );
        let (roster, bus) = setup(Arc::clone(&producer));
        let mut events = bus.subscribe();

        let token = CancellationToken::new();
        let actor = ProducerActor::new(
            producer,
            Arc::new(Blackboard::default()),
            BackoffPolicy::default(),
            Arc::clone(&roster),
            bus,
        );
        let handle = tokio::spawn(actor.run(token.clone()));

        // running 0.0..0.5, restarting 0.5..2.5, running 2.5..3.0,
        // restarting 3.0..5.0, running 5.0..5.5
        let start = Instant::now();
        let mut observed = Vec::new();
        for offset in [250_u64, 1_000, 2_750, 4_000, 5_250] {
            time::sleep_until(start + Duration::from_millis(offset)).await;
            observed.push(roster.get("A19").expect("registered").status);
        }
        assert_eq!(
            observed,
            vec![
                ProducerStatus::Running,
                ProducerStatus::Restarting,
                ProducerStatus::Running,
                ProducerStatus::Restarting,
                ProducerStatus::Running,
            ]
        );

        let info = roster.get("A19").expect("registered");
        assert_eq!(info.restarts, 2);
        assert_eq!(info.last_fault.as_deref(), Some("execution failed: bearing sensor offline"));

        token.cancel();
        handle.await.expect("actor exits");
        assert_eq!(roster.get("A19").map(|p| p.status), Some(ProducerStatus::Stopped));
        assert_eq!(launches.load(Ordering::SeqCst), 3);

        let mut kinds = Vec::new();
        while let Ok(ev) = events.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(kinds.first(), Some(&EventKind::ProducerStarting));
        assert_eq!(kinds.last(), Some(&EventKind::ProducerStopped));
        assert_eq!(
            kinds.iter().filter(|k| **k == EventKind::BackoffScheduled).count(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let producer: ProducerRef = ProducerFn::arc(
            "A1",
            "Sensor",
            |_b: Arc<Blackboard>, _c: CancellationToken| async { Ok::<(), ProducerError>(()) },
        );
        let (roster, bus) = setup(Arc::clone(&producer));
        let token = CancellationToken::new();
        let actor = ProducerActor::new(
            producer,
            Arc::new(Blackboard::default()),
            BackoffPolicy::fixed(Duration::from_secs(3600)),
            Arc::clone(&roster),
            bus,
        );
        let handle = tokio::spawn(actor.run(token.clone()));

        time::sleep(Duration::from_secs(1)).await;
        let info = roster.get("A1").expect("registered");
        assert_eq!(info.status, ProducerStatus::Restarting);
        assert_eq!(info.last_fault.as_deref(), Some("returned before cancellation"));

        let cancelled_at = Instant::now();
        token.cancel();
        handle.await.expect("actor exits");
        assert!(cancelled_at.elapsed() < Duration::from_secs(1));
        assert_eq!(roster.get("A1").map(|p| p.status), Some(ProducerStatus::Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn exponential_streak_resets_after_a_long_healthy_run() {
        let launches = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&launches);
        // launches 1 and 2 fail at once, launch 3 runs 10s before failing
        let producer: ProducerRef = ProducerFn::arc(
            "A7",
            "Flaky",
            move |_b: Arc<Blackboard>, _c: CancellationToken| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 3 {
                        time::sleep(Duration::from_secs(10)).await;
                    }
                    Err::<(), _>(ProducerError::fail(format!("launch {n}")))
                }
            },
        );
        let (roster, bus) = setup(Arc::clone(&producer));
        let mut events = bus.subscribe();
        let token = CancellationToken::new();
        let actor = ProducerActor::new(
            producer,
            Arc::new(Blackboard::default()),
            BackoffPolicy::exponential(Duration::from_millis(100), Duration::from_secs(1)),
            roster,
            bus,
        );
        let handle = tokio::spawn(actor.run(token.clone()));

        let mut delays = Vec::new();
        while delays.len() < 4 {
            let ev = events.recv().await.expect("event");
            if ev.kind == EventKind::BackoffScheduled {
                delays.push(ev.delay_ms.unwrap_or_default());
            }
        }
        token.cancel();
        handle.await.expect("actor exits");

        assert_eq!(delays, vec![100, 200, 100, 200]);
    }
}
