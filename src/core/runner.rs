//! # Run a single launch of a producer.
//!
//! Executes one call of [`Producer::run`] and classifies how it ended.
//!
//! ```text
//! producer.run(board, child) ──► returned / panicked
//!                                    │
//!                   token cancelled? ├─ yes ──► Outcome::Stopped       (graceful)
//!                                    └─ no  ──► Outcome::Fault(err):
//!                                                 Err(e)   → e
//!                                                 panic    → Panicked { info }
//!                                                 Ok(())   → Exited
//! ```
//!
//! ## Rules
//! - Panics never escape: they are caught here and become `ProducerError::Panicked`.
//! - Each launch gets a **child token**; cancelling it never affects the parent.
//! - Any return after the parent token fired is a stop, not a fault.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio_util::sync::CancellationToken;

use crate::board::Blackboard;
use crate::error::{ProducerError, panic_message};
use crate::producers::Producer;

/// How a single launch ended.
#[derive(Debug, PartialEq)]
pub(crate) enum Outcome {
    /// Ended because shutdown was requested.
    Stopped,
    /// Ended on its own: error, panic, or premature return.
    Fault(ProducerError),
}

/// Runs `producer` once against `board`, isolating panics.
pub(crate) async fn run_once<P: Producer + ?Sized>(
    producer: &P,
    board: Arc<Blackboard>,
    parent: &CancellationToken,
) -> Outcome {
    let child = parent.child_token();

    let res = match AssertUnwindSafe(producer.run(board, child)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => Err(ProducerError::Panicked {
            info: panic_message(&*panic),
        }),
    };

    if parent.is_cancelled() {
        return Outcome::Stopped;
    }
    match res {
        Ok(()) => Outcome::Fault(ProducerError::Exited),
        Err(e) => Outcome::Fault(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::producers::ProducerFn;

    fn board() -> Arc<Blackboard> {
        Arc::new(Blackboard::default())
    }

    #[tokio::test]
    async fn error_is_a_fault() {
        let p = ProducerFn::new("A1", "A1", |_b: Arc<Blackboard>, _c: CancellationToken| async {
            Err::<(), _>(ProducerError::fail("bad frame"))
        });
        let out = run_once(&p, board(), &CancellationToken::new()).await;
        assert_eq!(out, Outcome::Fault(ProducerError::fail("bad frame")));
    }

    #[tokio::test]
    async fn panic_is_caught() {
        let p = ProducerFn::new("A1", "A1", |_b: Arc<Blackboard>, c: CancellationToken| async move {
            if !c.is_cancelled() {
                panic!("index out of range");
            }
            Ok::<(), ProducerError>(())
        });
        let out = run_once(&p, board(), &CancellationToken::new()).await;
        assert_eq!(
            out,
            Outcome::Fault(ProducerError::Panicked {
                info: "index out of range".into()
            })
        );
    }

    #[tokio::test]
    async fn returning_early_is_a_fault() {
        let p = ProducerFn::new("A1", "A1", |_b: Arc<Blackboard>, _c: CancellationToken| async {
            Ok::<(), ProducerError>(())
        });
        let out = run_once(&p, board(), &CancellationToken::new()).await;
        assert_eq!(out, Outcome::Fault(ProducerError::Exited));
    }

    #[tokio::test]
    async fn any_return_after_cancellation_is_a_stop() {
        let parent = CancellationToken::new();
        parent.cancel();

        let canceled = ProducerFn::new(
            "A1",
            "A1",
            |_b: Arc<Blackboard>, c: CancellationToken| async move {
                c.cancelled().await;
                Err::<(), _>(ProducerError::Canceled)
            },
        );
        assert_eq!(run_once(&canceled, board(), &parent).await, Outcome::Stopped);

        let failing = ProducerFn::new(
            "A2",
            "A2",
            |_b: Arc<Blackboard>, _c: CancellationToken| async {
                Err::<(), _>(ProducerError::fail("late"))
            },
        );
        assert_eq!(run_once(&failing, board(), &parent).await, Outcome::Stopped);
    }

    #[tokio::test]
    async fn canceled_without_shutdown_is_still_a_fault() {
        let p = ProducerFn::new("A1", "A1", |_b: Arc<Blackboard>, _c: CancellationToken| async {
            Err::<(), _>(ProducerError::Canceled)
        });
        let out = run_once(&p, board(), &CancellationToken::new()).await;
        assert_eq!(out, Outcome::Fault(ProducerError::Canceled));
    }
}
