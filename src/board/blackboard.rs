//! # Blackboard: the layered shared store producers write into.
//!
//! [`Blackboard`] routes layer-scoped operations to one [`LayerStore`] per layer and
//! provides system-wide aggregation for monitoring collaborators.
//!
//! ## Architecture
//! ```text
//! Producer A ──┐                      ┌──► LayerStore #1 (own lock) ──► observers #1
//! Producer B ──┼──► Blackboard ───────┼──► LayerStore #2 (own lock) ──► observers #2
//! Producer N ──┘  (layer routing)     └──► LayerStore #N (own lock) ──► observers #N
//!                       ▲
//!                       └── get_status() / read_all() / get_all_health()  (monitoring)
//! ```
//!
//! ## Rules
//! - Layer ids are `1..=layer_count()`; anything else is [`BoardError::InvalidLayer`]
//!   and leaves every layer untouched.
//! - Writes to different layers never contend with each other.
//! - All reads return owned snapshots.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::board::layer::{LayerStatus, LayerStore};
use crate::board::observer::ObserverRef;
use crate::board::{BoardConfig, LayerId, Observation};
use crate::error::BoardError;

/// Layered, versioned, in-memory store shared by all producers.
///
/// Construct one per process and share it as `Arc<Blackboard>`.
///
/// ## Example
/// ```rust
/// use agentvisor::{Blackboard, BoardConfig, BoardError, layers};
/// use serde_json::json;
///
/// let board = Blackboard::new(BoardConfig::default());
/// board.write(layers::COMPONENT_HEALTH, "A19", &json!({ "health": 98.2 }))?;
/// board.write(layers::COMPONENT_HEALTH, "A19", &json!({ "health": 98.1 }))?;
///
/// let latest = board.read(layers::COMPONENT_HEALTH, "A19")?.expect("written");
/// assert_eq!(latest.version, 2);
/// assert!(board.read(layers::COMPONENT_HEALTH, "A20")?.is_none());
/// assert!(board.write(9, "A19", &json!({})).is_err());
/// # Ok::<(), BoardError>(())
/// ```
pub struct Blackboard {
    cfg: BoardConfig,
    layers: Vec<LayerStore>,
}

impl Blackboard {
    /// Creates a blackboard with one empty store per configured layer.
    pub fn new(cfg: BoardConfig) -> Self {
        let cap = cfg.history_cap_clamped();
        let layers = cfg
            .layer_names
            .iter()
            .zip(1..)
            .map(|(name, id)| LayerStore::new(id, name.as_ref(), cap))
            .collect();
        Self { cfg, layers }
    }

    /// Returns the configuration this blackboard was built with.
    pub fn config(&self) -> &BoardConfig {
        &self.cfg
    }

    /// Number of configured layers (valid ids are `1..=layer_count()`).
    pub fn layer_count(&self) -> LayerId {
        LayerId::try_from(self.layers.len()).unwrap_or(LayerId::MAX)
    }

    /// Returns the human-readable name of `layer`.
    pub fn layer_name(&self, layer: LayerId) -> Result<&str, BoardError> {
        self.layer(layer).map(LayerStore::name)
    }

    /// Writes `payload` with the configured default priority.
    ///
    /// Returns the stored observation (sanitized payload, assigned version).
    pub fn write<T: Serialize + ?Sized>(
        &self,
        layer: LayerId,
        producer_id: &str,
        payload: &T,
    ) -> Result<Observation, BoardError> {
        self.write_with_priority(layer, producer_id, payload, self.cfg.default_priority)
    }

    /// Writes `payload` with an explicit priority.
    pub fn write_with_priority<T: Serialize + ?Sized>(
        &self,
        layer: LayerId,
        producer_id: &str,
        payload: &T,
        priority: i32,
    ) -> Result<Observation, BoardError> {
        Ok(self.layer(layer)?.write(producer_id, payload, priority))
    }

    /// Returns the latest observation of `producer_id`, or `None` if it never wrote to `layer`.
    pub fn read(
        &self,
        layer: LayerId,
        producer_id: &str,
    ) -> Result<Option<Observation>, BoardError> {
        Ok(self.layer(layer)?.read(producer_id))
    }

    /// Returns a deep-copied snapshot of the latest observation of every producer in `layer`.
    pub fn read_all(&self, layer: LayerId) -> Result<HashMap<String, Observation>, BoardError> {
        Ok(self.layer(layer)?.read_all())
    }

    /// Returns the retained history of `producer_id` in `layer`, oldest first.
    pub fn history(
        &self,
        layer: LayerId,
        producer_id: &str,
    ) -> Result<Vec<Observation>, BoardError> {
        Ok(self.layer(layer)?.history(producer_id))
    }

    /// Registers an observer notified after every successful write to `layer`.
    ///
    /// Observers are invoked on spawned tasks and never awaited by the writer. Each
    /// runs on the Tokio runtime `subscribe` was called from, so writes from plain
    /// threads still notify it.
    pub fn subscribe(&self, layer: LayerId, observer: ObserverRef) -> Result<(), BoardError> {
        self.layer(layer)?.subscribe(observer);
        Ok(())
    }

    /// Returns `{name, producer_count}` for every layer.
    pub fn get_status(&self) -> BTreeMap<LayerId, LayerStatus> {
        self.layers
            .iter()
            .zip(1..)
            .map(|(store, id)| (id, store.status()))
            .collect()
    }

    /// Returns the latest payload of every producer in `health_layer`.
    ///
    /// An empty layer yields an empty map.
    pub fn get_all_health(
        &self,
        health_layer: LayerId,
    ) -> Result<HashMap<String, Value>, BoardError> {
        Ok(self.layer(health_layer)?.latest_payloads())
    }

    fn layer(&self, layer: LayerId) -> Result<&LayerStore, BoardError> {
        layer
            .checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| self.layers.get(idx))
            .ok_or(BoardError::InvalidLayer {
                layer,
                layers: self.layer_count(),
            })
    }
}

impl Default for Blackboard {
    fn default() -> Self {
        Self::new(BoardConfig::default())
    }
}
