//! # System snapshot for monitoring collaborators.
//!
//! [`SystemSnapshot`] bundles everything a live dashboard renders each tick: per-layer
//! blackboard status, the producer roster and the latest component health payloads.
//! It is plain data and always serializes to JSON.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::{LayerId, LayerStatus};
use crate::core::roster::ProducerInfo;

/// Point-in-time view of the whole system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSnapshot {
    /// When the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// Status of every blackboard layer.
    pub blackboard: BTreeMap<LayerId, LayerStatus>,
    /// Roster in registration order.
    pub producers: Vec<ProducerInfo>,
    /// Latest payload of every producer in the health layer.
    pub health: HashMap<String, Value>,
    /// Percentage of producers currently running.
    pub integrity: f64,
}
