//! # Layer store: one lock-guarded producer → history map.
//!
//! Each [`LayerStore`] owns the bounded histories of every producer that wrote to
//! its layer, plus the observers subscribed to it.
//!
//! ## Write path
//! ```text
//! write(id, payload, priority)
//!   ├─► sanitize(payload)                       (outside the lock)
//!   ├─► entries.write()                         (critical section)
//!   │     ├─ version = last.version + 1 (or 1)
//!   │     ├─ push_back(Arc<Observation>)        (no payload copy under the lock)
//!   │     └─ pop_front() while len > cap
//!   ├─► observers.read().clone()                (lock released before dispatch)
//!   └─► dispatch(observers, observation)        (fire-and-forget)
//! ```
//!
//! ## Rules
//! - Locks are synchronous and never held across `.await` or while notifying.
//! - Writers of the same layer are serialized; other layers are untouched.
//! - Readers see either the whole observation or none of it.
//! - Reads return owned copies, made after the guard is released; callers can never
//!   mutate the store.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::board::observer::{ObserverRef, Subscription, dispatch};
use crate::board::value::{Sanitized, sanitize_report};
use crate::board::{LayerId, Observation};

/// Read-only summary of one layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerStatus {
    /// Layer name.
    pub name: String,
    /// Number of distinct producers that have written to the layer.
    pub producer_count: usize,
}

pub(crate) struct LayerStore {
    id: LayerId,
    name: String,
    cap: usize,
    entries: RwLock<HashMap<String, VecDeque<Arc<Observation>>>>,
    observers: RwLock<Vec<Arc<Subscription>>>,
}

impl LayerStore {
    pub(crate) fn new(id: LayerId, name: impl Into<String>, cap: usize) -> Self {
        Self {
            id,
            name: name.into(),
            cap: cap.max(1),
            entries: RwLock::new(HashMap::new()),
            observers: RwLock::new(Vec::new()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Sanitizes, versions and appends one observation, then notifies observers.
    pub(crate) fn write<T: serde::Serialize + ?Sized>(
        &self,
        producer_id: &str,
        payload: &T,
        priority: i32,
    ) -> Observation {
        let Sanitized { value, fallbacks } = sanitize_report(payload);
        if fallbacks > 0 {
            warn!(
                layer = self.id,
                producer = producer_id,
                fallbacks,
                "payload values degraded to strings during sanitization"
            );
        }
        let mut pending = Observation {
            producer_id: producer_id.to_owned(),
            timestamp: Utc::now(),
            payload: value,
            priority,
            version: 0,
        };

        let observation = {
            let mut entries = self.entries.write();
            let history = entries.entry(pending.producer_id.clone()).or_default();
            pending.version = history.back().map_or(1, |last| last.version + 1);
            let observation = Arc::new(pending);
            history.push_back(Arc::clone(&observation));
            while history.len() > self.cap {
                history.pop_front();
            }
            observation
        };
        debug!(
            layer = self.id,
            producer = producer_id,
            version = observation.version,
            "observation written"
        );

        let observers = self.observers.read().clone();
        if !observers.is_empty() {
            dispatch(&observers, self.id, Arc::clone(&observation));
        }
        Arc::unwrap_or_clone(observation)
    }

    pub(crate) fn read(&self, producer_id: &str) -> Option<Observation> {
        let latest = self
            .entries
            .read()
            .get(producer_id)
            .and_then(|history| history.back().cloned());
        latest.map(Arc::unwrap_or_clone)
    }

    pub(crate) fn read_all(&self) -> HashMap<String, Observation> {
        self.latest()
            .into_iter()
            .map(|(id, obs)| (id, Arc::unwrap_or_clone(obs)))
            .collect()
    }

    pub(crate) fn history(&self, producer_id: &str) -> Vec<Observation> {
        let history: Vec<Arc<Observation>> = self
            .entries
            .read()
            .get(producer_id)
            .map(|history| history.iter().cloned().collect())
            .unwrap_or_default();
        history.into_iter().map(Arc::unwrap_or_clone).collect()
    }

    pub(crate) fn latest_payloads(&self) -> HashMap<String, Value> {
        self.latest()
            .into_iter()
            .map(|(id, obs)| (id, obs.payload.clone()))
            .collect()
    }

    pub(crate) fn status(&self) -> LayerStatus {
        LayerStatus {
            name: self.name.clone(),
            producer_count: self.entries.read().len(),
        }
    }

    pub(crate) fn subscribe(&self, observer: ObserverRef) {
        let sub = Arc::new(Subscription::new(observer));
        self.observers.write().push(sub);
    }

    /// Latest observation per producer; payloads are copied after the guard drops.
    fn latest(&self) -> Vec<(String, Arc<Observation>)> {
        self.entries
            .read()
            .iter()
            .filter_map(|(id, history)| history.back().map(|obs| (id.clone(), Arc::clone(obs))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn versions_start_at_one_and_increase() {
        let layer = LayerStore::new(1, "RAW_SENSOR", 10);
        for i in 1..=10 {
            let obs = layer.write("A1", &json!({ "value": i }), 0);
            assert_eq!(obs.version, i);
        }
        let latest = layer.read("A1").expect("written");
        assert_eq!(latest.version, 10);
        assert_eq!(latest.payload, json!({ "value": 10 }));
    }

    #[test]
    fn history_keeps_last_cap_entries() {
        let layer = LayerStore::new(1, "RAW_SENSOR", 10);
        for tag in 1..=15 {
            layer.write("A1", &json!({ "tag": tag }), 0);
        }
        let tags: Vec<i64> = layer
            .history("A1")
            .iter()
            .map(|o| o.payload["tag"].as_i64().unwrap_or_default())
            .collect();
        assert_eq!(tags, (6..=15).collect::<Vec<_>>());

        let versions: Vec<u64> = layer.history("A1").iter().map(|o| o.version).collect();
        assert_eq!(versions, (6..=15).collect::<Vec<_>>());
    }

    #[test]
    fn zero_cap_is_clamped_to_one() {
        let layer = LayerStore::new(1, "X", 0);
        layer.write("A1", &1, 0);
        layer.write("A1", &2, 0);
        assert_eq!(layer.history("A1").len(), 1);
        assert_eq!(layer.read("A1").map(|o| o.version), Some(2));
    }

    #[test]
    fn never_written_is_absent() {
        let layer = LayerStore::new(1, "X", 10);
        assert!(layer.read("nobody").is_none());
        assert!(layer.history("nobody").is_empty());
        assert!(layer.read_all().is_empty());
    }

    #[test]
    fn producers_are_versioned_independently() {
        let layer = LayerStore::new(3, "COMPONENT_HEALTH", 10);
        layer.write("A19", &json!({}), 0);
        layer.write("A19", &json!({}), 0);
        layer.write("A20", &json!({}), 7);

        let all = layer.read_all();
        assert_eq!(all["A19"].version, 2);
        assert_eq!(all["A20"].version, 1);
        assert_eq!(all["A20"].priority, 7);
        assert_eq!(layer.status().producer_count, 2);
    }

    #[test]
    fn read_all_is_a_deep_copy() {
        let layer = LayerStore::new(1, "X", 10);
        layer.write("A1", &json!({ "readings": [1, 2, 3] }), 0);

        let mut snapshot = layer.read_all();
        if let Some(obs) = snapshot.get_mut("A1") {
            obs.payload["readings"][0] = json!(999);
            obs.version = 42;
        }
        snapshot.clear();

        let again = layer.read_all();
        assert_eq!(again["A1"].payload, json!({ "readings": [1, 2, 3] }));
        assert_eq!(again["A1"].version, 1);
    }

    #[test]
    fn snapshots_share_stored_observations() {
        let layer = LayerStore::new(1, "RAW_SENSOR", 10);
        let frame: Vec<u32> = (0..10_000).collect();
        layer.write("A1", &json!({ "frame": frame }), 0);

        let first = layer.latest();
        let second = layer.latest();
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first[0].1, &second[0].1));

        let stored = layer.entries.read()["A1"].back().map(Arc::clone);
        assert!(stored.is_some_and(|s| Arc::ptr_eq(&s, &first[0].1)));
    }

    #[test]
    fn latest_payloads_only_returns_payloads() {
        let layer = LayerStore::new(3, "COMPONENT_HEALTH", 10);
        layer.write("A19", &json!({ "health": 97.5 }), 0);
        layer.write("A19", &json!({ "health": 97.1 }), 0);
        let health = layer.latest_payloads();
        assert_eq!(health.len(), 1);
        assert_eq!(health["A19"], json!({ "health": 97.1 }));
    }
}
