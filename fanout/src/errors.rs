//! Error types for the fanout transform engine.
//!
//! The caller observes exactly one of three results from a transform call:
//! the full successful result map, the first fatal error (unwrapped), or one
//! [`AggregateFailure`] listing every key whose retry budget was exhausted.

use crate::utils::{generate_uuid, Timestamp};
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Terminal record for a key whose retry budget was exhausted.
#[derive(Debug, Clone)]
pub struct KeyFailure<E> {
    /// The last error observed for the key.
    pub error: E,
    /// Total attempts consumed; equals the configured ceiling.
    pub attempts: u32,
}

impl<E> KeyFailure<E> {
    /// Creates a new key failure record.
    #[must_use]
    pub fn new(error: E, attempts: u32) -> Self {
        Self { error, attempts }
    }
}

/// Composite error reporting every key that ultimately failed.
///
/// Keys that succeeded are not reported; the call is all-or-nothing from the
/// caller's perspective once any key is exhausted. The report preserves the
/// insertion order of the input set for deterministic rendering.
#[derive(Debug, Clone)]
pub struct AggregateFailure<K, E> {
    /// Human-readable operation label supplied by the caller.
    pub label: String,
    /// Total number of keys attempted in the call.
    pub total_keys: usize,
    /// Each failed key paired with its terminal failure, in input order.
    pub failures: Vec<(K, KeyFailure<E>)>,
    /// Run identifier of the transform call that produced this error.
    pub run_id: Uuid,
    /// When the failure report was assembled.
    pub occurred_at: Timestamp,
}

impl<K, E> AggregateFailure<K, E> {
    /// Creates a new aggregate failure.
    #[must_use]
    pub fn new(
        label: impl Into<String>,
        total_keys: usize,
        failures: Vec<(K, KeyFailure<E>)>,
    ) -> Self {
        Self {
            label: label.into(),
            total_keys,
            failures,
            run_id: generate_uuid(),
            occurred_at: Utc::now(),
        }
    }

    /// Sets the run identifier of the originating call.
    #[must_use]
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    /// Returns the number of failed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if no keys failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Iterates over the failed keys in input order.
    pub fn failed_keys(&self) -> impl Iterator<Item = &K> {
        self.failures.iter().map(|(key, _)| key)
    }
}

impl<K, E> AggregateFailure<K, E>
where
    K: fmt::Display,
    E: fmt::Display,
{
    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("label".to_string(), serde_json::json!(self.label));
        map.insert("total_keys".to_string(), serde_json::json!(self.total_keys));
        map.insert("run_id".to_string(), serde_json::json!(self.run_id.to_string()));
        map.insert(
            "occurred_at".to_string(),
            serde_json::json!(self.occurred_at.to_rfc3339()),
        );
        map.insert(
            "failures".to_string(),
            serde_json::json!(self
                .failures
                .iter()
                .map(|(key, failure)| {
                    serde_json::json!({
                        "key": key.to_string(),
                        "error": failure.error.to_string(),
                        "attempts": failure.attempts,
                    })
                })
                .collect::<Vec<_>>()),
        );
        map
    }
}

impl<K, E> fmt::Display for AggregateFailure<K, E>
where
    K: fmt::Display,
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failed for {} of {} keys",
            self.label,
            self.failures.len(),
            self.total_keys
        )?;
        for (index, (key, failure)) in self.failures.iter().enumerate() {
            let sep = if index == 0 { ": " } else { "; " };
            write!(f, "{sep}{key}: {} (attempts: {})", failure.error, failure.attempts)?;
        }
        Ok(())
    }
}

impl<K, E> std::error::Error for AggregateFailure<K, E>
where
    K: fmt::Debug + fmt::Display,
    E: fmt::Debug + fmt::Display,
{
}

/// The error type returned by a transform call.
#[derive(Debug, Error)]
pub enum TransformError<K, E>
where
    K: fmt::Debug + fmt::Display + 'static,
    E: std::error::Error + 'static,
{
    /// A non-retryable error observed on some attempt, returned verbatim.
    #[error(transparent)]
    Fatal(E),

    /// At least one key exhausted its retry budget.
    #[error(transparent)]
    Aggregate(#[from] AggregateFailure<K, E>),
}

impl<K, E> TransformError<K, E>
where
    K: fmt::Debug + fmt::Display + 'static,
    E: std::error::Error + 'static,
{
    /// Returns true for the fail-fast variant.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Unwraps the fatal error, if that is what this is.
    #[must_use]
    pub fn into_fatal(self) -> Option<E> {
        match self {
            Self::Fatal(error) => Some(error),
            Self::Aggregate(_) => None,
        }
    }

    /// Borrows the aggregate report, if that is what this is.
    #[must_use]
    pub fn as_aggregate(&self) -> Option<&AggregateFailure<K, E>> {
        match self {
            Self::Fatal(_) => None,
            Self::Aggregate(aggregate) => Some(aggregate),
        }
    }
}
