//! # Blackboard configuration.
//!
//! Provides [`BoardConfig`]: layer layout, history retention and write defaults.
//!
//! ## Sentinel values
//! - `history_cap = 0` → clamped to 1 (the latest observation is always kept)

use std::borrow::Cow;

/// Well-known layer ids of the default six-layer layout.
pub mod layers {
    use crate::board::LayerId;

    /// Raw sensing output.
    pub const RAW_SENSOR: LayerId = 1;
    /// Enhanced / preprocessed data.
    pub const ENHANCED_DATA: LayerId = 2;
    /// Component health estimates.
    pub const COMPONENT_HEALTH: LayerId = 3;
    /// Predictive models.
    pub const PREDICTIONS: LayerId = 4;
    /// Decisions and alerts.
    pub const DECISIONS: LayerId = 5;
    /// Communication and resilience state.
    pub const NETWORK_STATE: LayerId = 6;
}

/// Names of the default layers, index `i` naming layer `i + 1`.
pub const DEFAULT_LAYER_NAMES: [&str; 6] = [
    "RAW_SENSOR",
    "ENHANCED_DATA",
    "COMPONENT_HEALTH",
    "PREDICTIONS",
    "DECISIONS",
    "NETWORK_STATE",
];

/// Configuration of a [`Blackboard`](crate::Blackboard).
///
/// ## Field semantics
/// - `layer_names`: one entry per layer; layer ids are `1..=layer_names.len()`
/// - `history_cap`: observations kept per producer per layer (min 1)
/// - `default_priority`: priority used by [`Blackboard::write`](crate::Blackboard::write)
#[derive(Clone, Debug)]
pub struct BoardConfig {
    /// Human-readable layer names; position defines the layer id.
    pub layer_names: Vec<Cow<'static, str>>,
    /// Maximum history length per producer per layer.
    pub history_cap: usize,
    /// Priority attached to writes that do not specify one.
    pub default_priority: i32,
}

impl BoardConfig {
    /// Returns the history cap clamped to a minimum of 1.
    #[inline]
    pub fn history_cap_clamped(&self) -> usize {
        self.history_cap.max(1)
    }

    /// Replaces the layer layout.
    pub fn with_layers<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        self.layer_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Replaces the history cap.
    pub fn with_history_cap(mut self, cap: usize) -> Self {
        self.history_cap = cap;
        self
    }
}

impl Default for BoardConfig {
    /// Default configuration:
    ///
    /// - six layers named by [`DEFAULT_LAYER_NAMES`]
    /// - `history_cap = 10`
    /// - `default_priority = 0`
    fn default() -> Self {
        Self {
            layer_names: DEFAULT_LAYER_NAMES.iter().map(|n| Cow::Borrowed(*n)).collect(),
            history_cap: 10,
            default_priority: 0,
        }
    }
}
