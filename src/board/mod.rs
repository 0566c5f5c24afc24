//! # Layered blackboard store.
//!
//! This module provides the shared store producers write into:
//! - [`Blackboard`] - fixed set of independently locked layers
//! - [`Observation`] - one versioned, timestamped, sanitized payload
//! - [`Observe`] / [`ObserverFn`] - fire-and-forget write notifications
//! - [`sanitize`] - conversion of arbitrary payloads into JSON-safe values
//! - [`BoardConfig`] - layer layout and history retention
//!
//! ## Quick wiring
//! ```text
//! producer ── write(layer, id, &payload) ──► Blackboard ──► LayerStore[layer]
//!                                                              ├─ sanitize
//!                                                              ├─ version + bounded history
//!                                                              └─ notify observers (spawned)
//! ```

mod blackboard;
mod config;
mod layer;
mod observation;
mod observer;
mod value;

/// Identifier of a layer; valid ids are `1..=layer_count`.
pub type LayerId = u32;

pub use blackboard::Blackboard;
pub use config::{BoardConfig, DEFAULT_LAYER_NAMES, layers};
pub use layer::LayerStatus;
pub use observation::Observation;
pub use observer::{ObserverError, ObserverFn, ObserverRef, Observe};
pub use value::{DEPTH_MARKER, MAX_DEPTH, Sanitized, sanitize, sanitize_report};
