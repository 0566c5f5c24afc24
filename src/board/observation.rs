//! # Observation: one versioned, timestamped payload in one layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single sanitized write by one producer into one layer.
///
/// `version` starts at 1 and increases by one on every write of the same
/// `(layer, producer_id)` pair. `payload` is always the output of
/// [`sanitize`](crate::sanitize), so an observation always serializes to JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Id of the producer that wrote this observation.
    pub producer_id: String,
    /// Wall-clock time of the write.
    pub timestamp: DateTime<Utc>,
    /// Sanitized payload.
    pub payload: Value,
    /// Caller-supplied priority (higher is more urgent).
    pub priority: i32,
    /// Per-producer, per-layer write counter (1-based).
    pub version: u64,
}
