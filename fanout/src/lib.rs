//! # Fanout
//!
//! A parallel fan-out transform engine for multi-provider service clients.
//!
//! Fanout applies an asynchronous operation to every element of a collection
//! concurrently, with support for:
//!
//! - **Per-key retry loops**: Each key owns its own sequential retry budget
//! - **Failure classification**: Pluggable fatal vs. retryable policy
//! - **Fail-fast propagation**: Non-retryable errors abort the whole call
//! - **Failure aggregation**: Exhausted keys fold into one composite error
//! - **Event-driven observability**: Structured events and tracing spans
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fanout::prelude::*;
//!
//! let transformer = ParallelTransformer::new(
//!     RetryConfig::new().with_max_attempts(5),
//!     RetryAll,
//! );
//!
//! let nodes = transformer
//!     .transform(node_ids, |id| client.describe_node(id), "describe nodes")
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod classify;
pub mod errors;
pub mod events;
pub mod observability;
pub mod retry;
pub mod transform;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::classify::{ClassifyFn, ErrorClass, ErrorClassifier, RetryAll};
    pub use crate::errors::{AggregateFailure, KeyFailure, TransformError};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, TransformEvent,
    };
    pub use crate::retry::{BackoffStrategy, JitterStrategy, RetryConfig};
    pub use crate::transform::{Outcome, ParallelTransformer};
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
}
