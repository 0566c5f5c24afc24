//! Error types used by the agentvisor store, supervisor and producers.
//!
//! This module defines four error enums:
//!
//! - [`BoardError`] - caller errors against the [`Blackboard`](crate::Blackboard).
//! - [`ProducerError`] - faults raised by a producer's unit of work.
//! - [`SupervisorError`] - registration and start-up misuse of the [`Supervisor`](crate::Supervisor).
//! - [`RuntimeError`] - failures of the supervision runtime itself (shutdown).
//!
//! Every type provides `as_label` (stable snake_case string) for logs/metrics.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

use crate::board::LayerId;

/// # Errors produced by the supervision runtime.
///
/// These represent failures in the orchestration system itself,
/// such as a shutdown sequence exceeding its grace period.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some producers remained stuck and were force-terminated.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}; forcing termination")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Ids of producers that did not acknowledge cancellation in time.
        stuck: Vec<String>,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use agentvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
        }
    }
}

/// # Faults produced by a producer's unit of work.
///
/// Everything except [`ProducerError::Canceled`] observed while the supervisor is live
/// is a fault: it is caught at the supervision boundary, logged, and the producer is
/// restarted after its backoff delay.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProducerError {
    /// The unit of work failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The unit of work panicked; the panic was caught by the supervisor.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },

    /// The unit of work returned although nobody asked it to stop.
    #[error("returned before cancellation")]
    Exited,

    /// The producer observed cancellation and exited cooperatively.
    #[error("context cancelled")]
    Canceled,
}

impl ProducerError {
    /// Shorthand for [`ProducerError::Fail`].
    ///
    /// ```
    /// use agentvisor::ProducerError;
    ///
    /// let err = ProducerError::fail("sensor offline");
    /// assert_eq!(err.to_string(), "execution failed: sensor offline");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        ProducerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ProducerError::Fail { .. } => "producer_failed",
            ProducerError::Panicked { .. } => "producer_panicked",
            ProducerError::Exited => "producer_exited",
            ProducerError::Canceled => "producer_canceled",
        }
    }
}

/// # Caller errors against the blackboard.
///
/// Returned instead of panicking; the store state is never changed by a failed call.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    /// The addressed layer is outside `1..=layers`.
    #[error("invalid layer {layer}; configured layers are 1..={layers}")]
    InvalidLayer {
        /// The layer the caller addressed.
        layer: LayerId,
        /// Number of configured layers.
        layers: LayerId,
    },
}

impl BoardError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// ```
    /// use agentvisor::BoardError;
    ///
    /// let err = BoardError::InvalidLayer { layer: 9, layers: 6 };
    /// assert_eq!(err.as_label(), "board_invalid_layer");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BoardError::InvalidLayer { .. } => "board_invalid_layer",
        }
    }
}

/// # Misuse of the supervisor's registration/start API.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SupervisorError {
    /// `register` or `start_all` was called after the supervisor already started.
    #[error("supervisor already started")]
    AlreadyStarted,

    /// A producer with the same id is already registered.
    #[error("producer '{id}' is already registered")]
    DuplicateProducer {
        /// The conflicting producer id.
        id: String,
    },

    /// `start_all` was called outside of a Tokio runtime.
    #[error("start_all requires a running tokio runtime")]
    NoRuntime,
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::AlreadyStarted => "supervisor_already_started",
            SupervisorError::DuplicateProducer { .. } => "supervisor_duplicate_producer",
            SupervisorError::NoRuntime => "supervisor_no_runtime",
        }
    }
}

/// Renders a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
