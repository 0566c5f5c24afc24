//! # Producer abstractions and registration specs.
//!
//! - [`Producer`] - trait for supervised, cancelable blackboard writers
//! - [`ProducerFn`] - closure-backed producer
//! - [`ProducerRef`] - shared handle (`Arc<dyn Producer>`)
//! - [`ProducerSpec`] - producer plus optional backoff override

mod producer;
mod producer_fn;
mod spec;

pub use producer::{Producer, ProducerRef};
pub use producer_fn::ProducerFn;
pub use spec::ProducerSpec;
