//! Runtime core: producer supervision and lifecycle.
//!
//! The public API of this module is [`Supervisor`] (with [`SupervisorBuilder`] and
//! [`SupervisorConfig`]) plus the read-only roster types it hands to monitoring.
//!
//! Internal modules:
//! - [`runner`]: executes one launch of a producer, catching panics and classifying the outcome;
//! - [`actor`]: keeps one producer alive with backoff between faults;
//! - [`roster`]: ordered registry of producers and their status;
//! - [`supervisor`]: registration, start, shutdown and health aggregation.

mod actor;
mod builder;
mod config;
mod roster;
mod runner;
mod snapshot;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::SupervisorConfig;
pub use roster::{ProducerInfo, ProducerStatus, SupervisorHealth};
pub use snapshot::SystemSnapshot;
pub use supervisor::Supervisor;
