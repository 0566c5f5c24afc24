//! # Layer observers: fire-and-forget notification of new observations.
//!
//! Provides [`Observe`], the extension point for reacting to writes on a layer,
//! and [`ObserverFn`], a closure-backed implementation.
//!
//! ## Architecture
//! ```text
//! LayerStore::write() ──► (lock released) ──► dispatch(observers, obs)
//!                                                  │
//!                              ┌───────────────────┼───────────────────┐
//!                              ▼                   ▼                   ▼
//!                        rt1.spawn            rt2.spawn           rtN.spawn
//!                     obs1.on_observation  obs2.on_observation  obsN.on_observation
//!                        └─ Err / panic → warn!, isolated
//! ```
//!
//! ## Rules
//! - One task per (write, observer): the writer never awaits an observer.
//! - No ordering across observers, nor across writes for one observer.
//! - An observer returning `Err` or panicking affects neither the write nor other observers.
//! - Each observer runs on the runtime it subscribed from, whichever thread writes.
//! - Delivery is at-least-once per successful write while that runtime is alive.

use std::borrow::Cow;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::warn;

use crate::board::{LayerId, Observation};
use crate::error::panic_message;

/// Error type returned by observers.
pub type ObserverError = Box<dyn std::error::Error + Send + Sync>;

/// Shared handle to an observer.
pub type ObserverRef = Arc<dyn Observe>;

/// Receives every observation written to the layers it subscribed to.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Never write back into the same layer in a way that feeds on itself.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handles one new observation written to `layer`.
    async fn on_observation(
        &self,
        layer: LayerId,
        observation: Arc<Observation>,
    ) -> Result<(), ObserverError>;

    /// Returns the observer name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

/// Function-backed observer.
///
/// ```rust
/// use std::sync::Arc;
/// use agentvisor::{LayerId, Observation, ObserverError, ObserverFn, ObserverRef, Observe, layers};
///
/// let alerts: ObserverRef =
///     ObserverFn::arc("alerts", |layer: LayerId, obs: Arc<Observation>| async move {
///         if layer == layers::DECISIONS && obs.priority > 5 {
///             // page someone...
///         }
///         Ok::<_, ObserverError>(())
///     });
/// assert_eq!(alerts.name(), "alerts");
/// ```
pub struct ObserverFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> ObserverFn<F> {
    /// Creates a new function-backed observer.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the observer and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Observe for ObserverFn<F>
where
    F: Fn(LayerId, Arc<Observation>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ObserverError>> + Send + 'static,
{
    async fn on_observation(
        &self,
        layer: LayerId,
        observation: Arc<Observation>,
    ) -> Result<(), ObserverError> {
        (self.f)(layer, observation).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// An observer plus the runtime it subscribed from.
pub(crate) struct Subscription {
    observer: ObserverRef,
    rt: Option<Handle>,
}

impl Subscription {
    /// Binds `observer` to the runtime of the calling context, if any.
    pub(crate) fn new(observer: ObserverRef) -> Self {
        Self {
            observer,
            rt: Handle::try_current().ok(),
        }
    }

    /// Runtime to notify on: the subscribing one, else the writer's.
    fn runtime(&self) -> Option<Handle> {
        self.rt.clone().or_else(|| Handle::try_current().ok())
    }
}

/// Spawns one isolated notification task per subscription.
///
/// Each observer runs on the runtime it subscribed from, so writers on plain
/// threads still notify. A subscription made outside any runtime falls back to
/// the writer's runtime; with neither, that notification is dropped with a
/// warning and the write stands.
pub(crate) fn dispatch(
    subs: &[Arc<Subscription>],
    layer: LayerId,
    observation: Arc<Observation>,
) {
    for sub in subs {
        let Some(rt) = sub.runtime() else {
            warn!(
                observer = sub.observer.name(),
                layer,
                producer = %observation.producer_id,
                "no tokio runtime; observer not notified"
            );
            continue;
        };

        let observer = Arc::clone(&sub.observer);
        let observation = Arc::clone(&observation);
        rt.spawn(async move {
            let fut = observer.on_observation(layer, observation);
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    warn!(observer = observer.name(), layer, error = %e, "observer failed");
                }
                Err(panic) => {
                    warn!(
                        observer = observer.name(),
                        layer,
                        panic = %panic_message(&*panic),
                        "observer panicked"
                    );
                }
            }
        });
    }
}
