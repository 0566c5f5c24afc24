//! # agentvisor
//!
//! **Agentvisor** is the coordination substrate for fleets of long-running async producers
//! ("agents") that publish observations into a shared, layered store.
//!
//! It provides two pieces that are useful on their own and designed to work together:
//! a **blackboard** (concurrent, versioned, layer-partitioned store with write
//! notifications) and a **supervisor** that keeps every producer alive by restarting it
//! after any fault.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  Producer A1 │   │ Producer A19 │   │ Producer A39 │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - Roster (registration order, status, restarts, last fault)      │
//! │  - Bus (broadcast lifecycle events) ──► SubscriberSet ──► LogWriter│
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │ProducerActor │   │ProducerActor │   │ProducerActor │
//!     │(restart loop)│   │(restart loop)│   │(restart loop)│
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            │ write(layer, id, &payload)          │
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Blackboard                                                       │
//! │   sanitize ─► LayerStore #1 │ #2 │ #3 │ #4 │ #5 │ #6  (own lock)  │
//! │               versioned, last K observations per producer        │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!              observers (spawned, isolated)   monitoring reads (snapshots)
//! ```
//!
//! ### Lifecycle
//! ```text
//! register ──► Idle ──start_all──► Running
//!
//! loop {
//!   ├─► run_once(producer, board, token)
//!   │       ├─ returned after cancellation ─► Stopped, exit
//!   │       └─ Err / panic / early return   ─► Restarting
//!   │                                           ├─ warn!("producer crashed; restarting")
//!   │                                           ├─ sleep(backoff) (cancellable)
//!   │                                           └─ Running, relaunch
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                         |
//! |-------------------|---------------------------------------------------------------|--------------------------------------------|
//! | **Blackboard**    | Layered store, versioned history, snapshots, health view.     | [`Blackboard`], [`Observation`]            |
//! | **Sanitizer**     | Any `Serialize` value becomes JSON-safe, never fails.         | [`sanitize`], [`sanitize_report`]          |
//! | **Observers**     | Fire-and-forget write notifications per layer.                | [`Observe`], [`ObserverFn`]                |
//! | **Supervision**   | Register, start, restart forever, stop within grace.          | [`Supervisor`], [`ProducerStatus`]         |
//! | **Producers**     | Define producers as trait impls or closures.                  | [`Producer`], [`ProducerFn`], [`ProducerSpec`] |
//! | **Policies**      | Restart delay with optional jitter.                           | [`BackoffPolicy`], [`JitterPolicy`]        |
//! | **Events**        | Lifecycle event stream with isolated subscribers.             | [`Subscribe`], [`Event`], [`LogWriter`]    |
//! | **Errors**        | Typed errors with stable labels.                              | [`BoardError`], [`ProducerError`], [`SupervisorError`], [`RuntimeError`] |
//! | **Configuration** | Layer layout, history size, grace, backoff.                   | [`BoardConfig`], [`SupervisorConfig`]      |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use serde_json::json;
//! use tokio_util::sync::CancellationToken;
//! use agentvisor::{
//!     Blackboard, BoardConfig, LogWriter, ProducerError, ProducerFn, Subscribe, Supervisor,
//!     SupervisorConfig, layers,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let board = Arc::new(Blackboard::new(BoardConfig::default()));
//!
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let sup = Supervisor::builder(Arc::clone(&board), SupervisorConfig::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     sup.register(ProducerFn::arc(
//!         "A19",
//!         "Bearing Health",
//!         |board: Arc<Blackboard>, ctx: CancellationToken| async move {
//!             loop {
//!                 board
//!                     .write(layers::COMPONENT_HEALTH, "A19", &json!({ "health": 97.4 }))
//!                     .map_err(|e| ProducerError::fail(e.to_string()))?;
//!                 tokio::select! {
//!                     _ = ctx.cancelled() => return Err::<(), _>(ProducerError::Canceled),
//!                     _ = tokio::time::sleep(Duration::from_millis(10)) => {}
//!                 }
//!             }
//!         },
//!     ))?;
//!
//!     sup.start_all()?;
//!     tokio::time::sleep(Duration::from_millis(50)).await;
//!
//!     let snapshot = sup.snapshot(layers::COMPONENT_HEALTH)?;
//!     assert_eq!(snapshot.health["A19"], json!({ "health": 97.4 }));
//!
//!     sup.stop_all().await?;
//!     Ok(())
//! }
//! ```

mod board;
mod core;
mod error;
mod events;
mod policies;
mod producers;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    ProducerInfo, ProducerStatus, Supervisor, SupervisorBuilder, SupervisorConfig,
    SupervisorHealth, SystemSnapshot,
};
pub use board::{
    Blackboard, BoardConfig, DEFAULT_LAYER_NAMES, DEPTH_MARKER, LayerId, LayerStatus, MAX_DEPTH,
    Observation, ObserverError, ObserverFn, ObserverRef, Observe, Sanitized, layers, sanitize,
    sanitize_report,
};
pub use error::{BoardError, ProducerError, RuntimeError, SupervisorError};
pub use events::{Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy};
pub use producers::{Producer, ProducerFn, ProducerRef, ProducerSpec};
pub use subscribers::{LogWriter, Subscribe};
