//! # Supervisor: keeps every registered producer alive.
//!
//! The [`Supervisor`] owns the producer roster, the lifecycle event bus and the
//! per-producer actors. It is bound to one shared [`Blackboard`] that every producer
//! writes into.
//!
//! ## Key responsibilities
//! - register producers in order, rejecting duplicates and late registrations
//! - spawn one `ProducerActor` per producer; the actor restarts it after every fault
//! - fan out lifecycle [`Event`]s to subscribers via `SubscriberSet`
//! - stop everything cooperatively within [`SupervisorConfig::grace`]
//! - expose roster, health and system snapshots to monitoring
//!
//! ## High-level architecture
//! ```text
//! register(producer) ──► Roster (Idle, registration order)
//!
//! start_all():
//!   Roster.seal() ─► [spec 1] [spec 2] ... [spec N]
//!                       └──► ProducerActor::new(producer, board, backoff, roster, bus)
//!                              └──► JoinSet.spawn(actor.run(runtime_token.child_token()))
//!   event listener: Bus.subscribe() ─► SubscriberSet::emit(event)
//!
//! stop_all():
//!   Bus.publish(ShutdownRequested)
//!   runtime_token.cancel()   → propagates to every actor and running producer
//!   wait up to grace:
//!     ├─ all joined   → Bus.publish(AllStoppedWithin)            → Ok(())
//!     └─ timeout      → abort stuck actors, Bus.publish(GraceExceeded)
//!                                                                → Err(GraceExceeded{stuck})
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//! use agentvisor::{Blackboard, ProducerError, ProducerFn, Supervisor, SupervisorConfig, layers};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let board = Arc::new(Blackboard::default());
//!     let sup = Supervisor::new(Arc::clone(&board), SupervisorConfig::default());
//!
//!     sup.register(ProducerFn::arc(
//!         "A1",
//!         "Thermometer",
//!         |board: Arc<Blackboard>, ctx: CancellationToken| async move {
//!             loop {
//!                 board
//!                     .write(layers::RAW_SENSOR, "A1", &json!({ "celsius": 21.5 }))
//!                     .map_err(|e| ProducerError::fail(e.to_string()))?;
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => return Err::<(), _>(ProducerError::Canceled),
//!                     _ = tokio::time::sleep(Duration::from_millis(10)) => {}
//!                 }
//!             }
//!         },
//!     ))?;
//!
//!     assert_eq!(sup.start_all()?, 1);
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!     assert_eq!(sup.health().healthy_count, 1);
//!
//!     sup.stop_all().await?;
//!     assert!(board.read(layers::RAW_SENSOR, "A1")?.is_some());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio::task::JoinSet;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::board::{Blackboard, LayerId};
use crate::core::actor::ProducerActor;
use crate::core::builder::SupervisorBuilder;
use crate::core::config::SupervisorConfig;
use crate::core::roster::{ProducerInfo, Roster, SupervisorHealth};
use crate::core::snapshot::SystemSnapshot;
use crate::error::{BoardError, RuntimeError, SupervisorError};
use crate::events::{Bus, Event, EventKind};
use crate::producers::{ProducerRef, ProducerSpec};
use crate::subscribers::{Subscribe, SubscriberSet};

/// Lifecycle supervisor of all producers writing into one blackboard.
pub struct Supervisor {
    cfg: SupervisorConfig,
    board: Arc<Blackboard>,
    bus: Bus,
    roster: Arc<Roster>,
    subscribers: Mutex<Vec<Arc<dyn Subscribe>>>,
    actors: Mutex<Option<JoinSet<()>>>,
    runtime_token: CancellationToken,
    listener_token: CancellationToken,
    stopped: CancellationToken,
}

impl Supervisor {
    /// Creates a supervisor without lifecycle subscribers.
    pub fn new(board: Arc<Blackboard>, cfg: SupervisorConfig) -> Arc<Self> {
        Self::builder(board, cfg).build()
    }

    /// Returns a builder for configuring subscribers.
    pub fn builder(board: Arc<Blackboard>, cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(board, cfg)
    }

    pub(crate) fn new_internal(
        board: Arc<Blackboard>,
        cfg: SupervisorConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Self {
        Self {
            bus: Bus::new(cfg.bus_capacity_clamped()),
            cfg,
            board,
            roster: Roster::new(),
            subscribers: Mutex::new(subscribers),
            actors: Mutex::new(None),
            runtime_token: CancellationToken::new(),
            listener_token: CancellationToken::new(),
            stopped: CancellationToken::new(),
        }
    }

    /// Registers `producer` with the default backoff.
    pub fn register(&self, producer: ProducerRef) -> Result<(), SupervisorError> {
        self.register_spec(ProducerSpec::new(producer))
    }

    /// Registers a producer with its supervision settings.
    ///
    /// Fails with [`SupervisorError::DuplicateProducer`] for a reused id and with
    /// [`SupervisorError::AlreadyStarted`] once [`start_all`](Self::start_all) ran.
    pub fn register_spec(&self, spec: ProducerSpec) -> Result<(), SupervisorError> {
        let id = spec.id().to_owned();
        self.roster.insert(spec)?;
        info!(producer = %id, "producer registered");
        Ok(())
    }

    /// Launches every registered producer and returns how many were scheduled.
    ///
    /// Returns as soon as all actors are spawned. Must be called from within a Tokio runtime.
    pub fn start_all(&self) -> Result<usize, SupervisorError> {
        let rt = Handle::try_current().map_err(|_| SupervisorError::NoRuntime)?;
        let specs = self.roster.seal()?;

        self.spawn_event_listener(&rt);

        let mut set = JoinSet::new();
        for spec in specs {
            self.roster.mark_running(spec.id());
            let actor = ProducerActor::new(
                Arc::clone(spec.producer()),
                Arc::clone(&self.board),
                spec.backoff().unwrap_or(self.cfg.backoff),
                Arc::clone(&self.roster),
                self.bus.clone(),
            );
            set.spawn_on(actor.run(self.runtime_token.child_token()), &rt);
        }

        let started = set.len();
        *self.actors.lock() = Some(set);
        info!(producers = started, "supervisor started");
        Ok(started)
    }

    /// Cancels every producer and waits up to the grace period for them to stop.
    ///
    /// Producers still running after the grace period are aborted, marked `Stopped`
    /// and reported in [`RuntimeError::GraceExceeded`]. A call overlapping a shutdown
    /// in progress waits for it to finish and returns `Ok`; so does any later call.
    pub async fn stop_all(&self) -> Result<(), RuntimeError> {
        let Some(mut set) = self.actors.lock().take() else {
            if self.roster.is_sealed() {
                self.stopped.cancelled().await;
            }
            return Ok(());
        };

        info!(producers = set.len(), "stopping all producers");
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.runtime_token.cancel();

        let grace = self.cfg.grace;
        let drained = time::timeout(grace, async {
            while set.join_next().await.is_some() {}
        })
        .await;

        let res = match drained {
            Ok(()) => {
                self.bus.publish(Event::new(EventKind::AllStoppedWithin));
                info!("all producers stopped within grace");
                Ok(())
            }
            Err(_elapsed) => {
                set.abort_all();
                let stuck = self.roster.unstopped();
                for id in &stuck {
                    self.roster.mark_stopped(id);
                }
                warn!(?grace, ?stuck, "grace exceeded; aborted stuck producers");
                self.bus
                    .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(",")));
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };

        self.listener_token.cancel();
        self.stopped.cancel();
        res
    }

    /// Healthy (`Running`) and total producer counts plus the roster.
    pub fn health(&self) -> SupervisorHealth {
        self.roster.health()
    }

    /// Roster snapshot in registration order.
    pub fn producers(&self) -> Vec<ProducerInfo> {
        self.roster.snapshot()
    }

    /// Roster entry of `id`, if registered.
    pub fn status(&self, id: &str) -> Option<ProducerInfo> {
        self.roster.get(id)
    }

    /// The blackboard producers write into.
    pub fn board(&self) -> &Arc<Blackboard> {
        &self.board
    }

    /// The configuration this supervisor runs with.
    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }

    /// Receiver of lifecycle events published from now on.
    pub fn events(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Bundles blackboard status, roster and the `health_layer` payloads.
    pub fn snapshot(&self, health_layer: LayerId) -> Result<SystemSnapshot, BoardError> {
        let health = self.board.get_all_health(health_layer)?;
        let roster = self.roster.health();
        Ok(SystemSnapshot {
            taken_at: chrono::Utc::now(),
            blackboard: self.board.get_status(),
            integrity: roster.integrity(),
            producers: roster.producers,
            health,
        })
    }

    /// Forwards bus events to subscribers until `stop_all` finishes, then drains.
    fn spawn_event_listener(&self, rt: &Handle) {
        let subs = std::mem::take(&mut *self.subscribers.lock());
        if subs.is_empty() {
            return;
        }
        let set = SubscriberSet::new(subs, self.bus.clone(), rt);
        let mut rx = self.bus.subscribe();
        let stop = self.listener_token.clone();

        rt.spawn(async move {
            loop {
                tokio::select! {
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(Arc::new(ev)),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "event listener lagged; events dropped");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => {
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(Arc::new(ev)),
                                Err(TryRecvError::Lagged(_)) => continue,
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
            set.shutdown().await;
        });
    }
}

impl Drop for Supervisor {
    /// Releases the event listener (and its subscriber workers) when the
    /// supervisor goes away without `stop_all`. Dropping the actor set aborts
    /// any producers still running.
    fn drop(&mut self) {
        self.runtime_token.cancel();
        self.listener_token.cancel();
    }
}
