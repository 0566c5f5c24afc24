//! # Producer abstraction.
//!
//! A [`Producer`] is an independently running unit that periodically computes results
//! and writes them into one or more blackboard layers. It receives the shared
//! [`Blackboard`] and a [`CancellationToken`], and should check the token between
//! iterations so `stop_all` can end it cooperatively.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::board::Blackboard;
use crate::error::ProducerError;

/// Shared handle to a producer.
pub type ProducerRef = Arc<dyn Producer>;

/// # Supervised, cancelable writer into the blackboard.
///
/// `run` is the producer's repeating unit of work. Returning `Err` or panicking is a
/// fault: the supervisor logs it and relaunches `run` after a backoff delay. So is
/// returning at all before the token fires. Once the token is cancelled, any return
/// (ideally [`ProducerError::Canceled`]) is treated as a graceful stop.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use async_trait::async_trait;
/// use serde_json::json;
/// use tokio_util::sync::CancellationToken;
/// use agentvisor::{Blackboard, Producer, ProducerError, layers};
///
/// struct Thermometer;
///
/// #[async_trait]
/// impl Producer for Thermometer {
///     fn id(&self) -> &str { "A1" }
///
///     async fn run(
///         &self,
///         board: Arc<Blackboard>,
///         ctx: CancellationToken,
///     ) -> Result<(), ProducerError> {
///         loop {
///             board
///                 .write(layers::RAW_SENSOR, self.id(), &json!({ "celsius": 21.5 }))
///                 .map_err(|e| ProducerError::fail(e.to_string()))?;
///             tokio::select! {
///                 _ = ctx.cancelled() => return Err(ProducerError::Canceled),
///                 _ = tokio::time::sleep(Duration::from_millis(500)) => {}
///             }
///         }
///     }
/// }
/// ```
#[async_trait]
pub trait Producer: Send + Sync + 'static {
    /// Stable unique id (e.g. `"A19"`), used as the observation key.
    fn id(&self) -> &str;

    /// Human-readable name for dashboards; defaults to [`id`](Producer::id).
    fn display_name(&self) -> &str {
        self.id()
    }

    /// Runs the repeating unit of work until cancelled.
    async fn run(
        &self,
        board: Arc<Blackboard>,
        ctx: CancellationToken,
    ) -> Result<(), ProducerError>;
}
