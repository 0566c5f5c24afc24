//! # Lifecycle event subscribers.
//!
//! This module provides the [`Subscribe`] trait, the `SubscriberSet` fan-out and the
//! built-in [`LogWriter`].
//!
//! ```text
//! ProducerActor ── publish(Event) ──► Bus ──► event listener ──► SubscriberSet
//!                                                                  ├──► LogWriter
//!                                                                  ├──► dashboard feed
//!                                                                  └──► ...
//! ```

mod embedded;
mod subscriber;
mod subscriber_set;

pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub(crate) use subscriber_set::SubscriberSet;
