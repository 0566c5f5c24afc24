//! # Producer roster: registration order, status and fault bookkeeping.
//!
//! The roster is the supervisor's single source of truth about producers. It is
//! written by the supervisor (registration, start, shutdown) and by each producer's
//! actor (status transitions), and read by monitoring through snapshots.
//!
//! ## Status machine
//! ```text
//!   register ──► Idle ──start_all──► Running ◄──────relaunch──────┐
//!                                      │                          │
//!                                      ├── fault ──► Restarting ──┘
//!                                      │                 │
//!                                      └── cancel ──► Stopped ◄──┘ (cancel during backoff)
//! ```
//!
//! ## Rules
//! - Iteration order is registration order.
//! - The roster lock is disjoint from every blackboard layer lock and is never held
//!   across `.await`.
//! - Once sealed by `start_all`, no producer can be added.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{ProducerError, SupervisorError};
use crate::producers::ProducerSpec;

/// Lifecycle status of a supervised producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerStatus {
    /// Registered, not started yet.
    Idle,
    /// Its unit of work is executing.
    Running,
    /// Faulted; waiting for the backoff delay before relaunch.
    Restarting,
    /// Stopped by shutdown.
    Stopped,
}

impl ProducerStatus {
    /// Upper-case label, as shown on dashboards.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProducerStatus::Idle => "IDLE",
            ProducerStatus::Running => "RUNNING",
            ProducerStatus::Restarting => "RESTARTING",
            ProducerStatus::Stopped => "STOPPED",
        }
    }
}

/// Point-in-time view of one roster entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerInfo {
    /// Producer id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current status.
    pub status: ProducerStatus,
    /// Number of relaunches after a fault.
    pub restarts: u32,
    /// Text of the most recent fault, if any.
    pub last_fault: Option<String>,
    /// When `status` last changed.
    pub since: DateTime<Utc>,
}

/// Aggregate health of the supervised producers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorHealth {
    /// Producers currently `Running`.
    pub healthy_count: usize,
    /// All registered producers.
    pub total_count: usize,
    /// Roster snapshot in registration order.
    pub producers: Vec<ProducerInfo>,
}

impl SupervisorHealth {
    /// Percentage of healthy producers, rounded to two decimals (`100.0` when empty).
    ///
    /// ```
    /// use agentvisor::SupervisorHealth;
    ///
    /// let h = SupervisorHealth { healthy_count: 2, total_count: 3, producers: vec![] };
    /// assert_eq!(h.integrity(), 66.67);
    /// ```
    pub fn integrity(&self) -> f64 {
        if self.total_count == 0 {
            return 100.0;
        }
        let pct = self.healthy_count as f64 / self.total_count as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    }
}

struct Entry {
    spec: ProducerSpec,
    info: ProducerInfo,
}

#[derive(Default)]
struct Inner {
    sealed: bool,
    entries: IndexMap<String, Entry>,
}

/// Ordered, lock-guarded producer registry.
#[derive(Default)]
pub(crate) struct Roster {
    inner: RwLock<Inner>,
}

impl Roster {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Appends `spec` as `Idle`.
    pub(crate) fn insert(&self, spec: ProducerSpec) -> Result<(), SupervisorError> {
        let mut inner = self.inner.write();
        if inner.sealed {
            return Err(SupervisorError::AlreadyStarted);
        }
        let id = spec.id().to_owned();
        if inner.entries.contains_key(&id) {
            return Err(SupervisorError::DuplicateProducer { id });
        }
        let info = ProducerInfo {
            id: id.clone(),
            name: spec.producer().display_name().to_owned(),
            status: ProducerStatus::Idle,
            restarts: 0,
            last_fault: None,
            since: Utc::now(),
        };
        inner.entries.insert(id, Entry { spec, info });
        Ok(())
    }

    /// Closes registration and returns every spec in registration order.
    pub(crate) fn seal(&self) -> Result<Vec<ProducerSpec>, SupervisorError> {
        let mut inner = self.inner.write();
        if inner.sealed {
            return Err(SupervisorError::AlreadyStarted);
        }
        inner.sealed = true;
        Ok(inner.entries.values().map(|e| e.spec.clone()).collect())
    }

    /// True once `seal` succeeded.
    pub(crate) fn is_sealed(&self) -> bool {
        self.inner.read().sealed
    }

    /// Marks `id` as `Running`; a move out of `Restarting` counts as a restart.
    pub(crate) fn mark_running(&self, id: &str) {
        self.update(id, |info| match info.status {
            ProducerStatus::Running => false,
            ProducerStatus::Restarting => {
                info.restarts = info.restarts.saturating_add(1);
                info.status = ProducerStatus::Running;
                true
            }
            ProducerStatus::Idle | ProducerStatus::Stopped => {
                info.status = ProducerStatus::Running;
                true
            }
        });
    }

    /// Records a fault and marks `id` as `Restarting`.
    pub(crate) fn record_fault(&self, id: &str, err: &ProducerError) {
        self.update(id, |info| {
            info.last_fault = Some(err.to_string());
            info.status = ProducerStatus::Restarting;
            true
        });
    }

    /// Marks `id` as `Stopped`.
    pub(crate) fn mark_stopped(&self, id: &str) {
        self.update(id, |info| {
            let changed = info.status != ProducerStatus::Stopped;
            info.status = ProducerStatus::Stopped;
            changed
        });
    }

    /// Ids of producers that are not `Stopped` (and not `Idle`).
    pub(crate) fn unstopped(&self) -> Vec<String> {
        self.inner
            .read()
            .entries
            .values()
            .filter(|e| {
                matches!(
                    e.info.status,
                    ProducerStatus::Running | ProducerStatus::Restarting
                )
            })
            .map(|e| e.info.id.clone())
            .collect()
    }

    pub(crate) fn get(&self, id: &str) -> Option<ProducerInfo> {
        self.inner.read().entries.get(id).map(|e| e.info.clone())
    }

    pub(crate) fn snapshot(&self) -> Vec<ProducerInfo> {
        self.inner
            .read()
            .entries
            .values()
            .map(|e| e.info.clone())
            .collect()
    }

    pub(crate) fn health(&self) -> SupervisorHealth {
        let producers = self.snapshot();
        SupervisorHealth {
            healthy_count: producers
                .iter()
                .filter(|p| p.status == ProducerStatus::Running)
                .count(),
            total_count: producers.len(),
            producers,
        }
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut ProducerInfo) -> bool) {
        let mut inner = self.inner.write();
        if let Some(entry) = inner.entries.get_mut(id) {
            if f(&mut entry.info) {
                entry.info.since = Utc::now();
            }
        }
    }
}
