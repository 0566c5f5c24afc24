use std::sync::Arc;

use crate::board::Blackboard;
use crate::core::{SupervisorConfig, supervisor::Supervisor};
use crate::subscribers::Subscribe;

/// Builder for a [`Supervisor`] bound to a blackboard.
pub struct SupervisorBuilder {
    board: Arc<Blackboard>,
    cfg: SupervisorConfig,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a builder for a supervisor whose producers write into `board`.
    pub fn new(board: Arc<Blackboard>, cfg: SupervisorConfig) -> Self {
        Self {
            board,
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets lifecycle event subscribers.
    ///
    /// Each gets a dedicated worker and bounded queue once `start_all` runs.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the supervisor. Needs no runtime; nothing is spawned until `start_all`.
    pub fn build(self) -> Arc<Supervisor> {
        Arc::new(Supervisor::new_internal(
            self.board,
            self.cfg,
            self.subscribers,
        ))
    }
}
