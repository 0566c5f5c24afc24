//! # Closure-backed producer (`ProducerFn`).
//!
//! [`ProducerFn`] wraps `F: Fn(Arc<Blackboard>, CancellationToken) -> Fut` and creates a
//! fresh future per launch, so nothing leaks between restarts unless the closure
//! captures it explicitly (e.g. an `Arc<AtomicU64>` iteration counter).
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use agentvisor::{Blackboard, ProducerError, ProducerFn, ProducerRef};
//!
//! let p: ProducerRef = ProducerFn::arc(
//!     "A39",
//!     "Emergency Protocol",
//!     |_board: Arc<Blackboard>, ctx: CancellationToken| async move {
//!         ctx.cancelled().await;
//!         Err::<(), _>(ProducerError::Canceled)
//!     },
//! );
//! assert_eq!(p.id(), "A39");
//! assert_eq!(p.display_name(), "Emergency Protocol");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::board::Blackboard;
use crate::error::ProducerError;
use crate::producers::producer::Producer;

/// Closure-backed producer.
#[derive(Debug)]
pub struct ProducerFn<F> {
    id: Cow<'static, str>,
    name: Cow<'static, str>,
    f: F,
}

impl<F> ProducerFn<F> {
    /// Creates a closure-backed producer.
    pub fn new(id: impl Into<Cow<'static, str>>, name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            f,
        }
    }

    /// Creates the producer and returns it as a shared handle.
    pub fn arc(
        id: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        f: F,
    ) -> Arc<Self> {
        Arc::new(Self::new(id, name, f))
    }
}

#[async_trait]
impl<F, Fut> Producer for ProducerFn<F>
where
    F: Fn(Arc<Blackboard>, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ProducerError>> + Send + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    async fn run(
        &self,
        board: Arc<Blackboard>,
        ctx: CancellationToken,
    ) -> Result<(), ProducerError> {
        (self.f)(board, ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::layers;
    use serde_json::json;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[tokio::test]
    async fn each_launch_gets_a_fresh_future() {
        let launches = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&launches);
        let producer = ProducerFn::new(
            "A1",
            "Sensor",
            move |board: Arc<Blackboard>, _ctx: CancellationToken| {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    board
                        .write(layers::RAW_SENSOR, "A1", &json!({ "launch": n }))
                        .map_err(|e| ProducerError::fail(e.to_string()))?;
                    Ok(())
                }
            },
        );

        let board = Arc::new(Blackboard::default());
        for _ in 0..3 {
            producer
                .run(Arc::clone(&board), CancellationToken::new())
                .await
                .expect("run");
        }
        assert_eq!(launches.load(Ordering::SeqCst), 3);
        let latest = board.read(layers::RAW_SENSOR, "A1").expect("valid").expect("written");
        assert_eq!(latest.payload, json!({ "launch": 3 }));
        assert_eq!(latest.version, 3);
    }
}
