//! Parallel transform-and-aggregate engine.
//!
//! [`ParallelTransformer`] applies an asynchronous operation to every element
//! of a collection concurrently. Each key owns an independent, strictly
//! sequential retry loop; terminal outcomes feed a shared collector. The call
//! resolves to the full result map, to one composite failure covering every
//! exhausted key, or to the first non-retryable error verbatim.

mod collector;
mod outcome;

pub use outcome::Outcome;

use crate::classify::{ErrorClass, ErrorClassifier, RetryAll};
use crate::errors::{AggregateFailure, TransformError};
use crate::events::{EventSink, LoggingEventSink, NoOpEventSink, TransformEvent};
use crate::observability::transform_span;
use crate::retry::RetryConfig;
use crate::utils::generate_uuid;
use collector::OutcomeCollector;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, error, warn, Instrument};

/// Orchestrates concurrent per-key operations with retries and fail-fast.
///
/// The transformer holds no per-call state; it is a reusable orchestration
/// handle parameterized by the retry policy and the error classifier.
pub struct ParallelTransformer<C> {
    retry: RetryConfig,
    classifier: Arc<C>,
    sink: Arc<dyn EventSink>,
}

impl ParallelTransformer<RetryAll> {
    /// Creates a transformer with the default retry policy (ceiling 5,
    /// immediate resubmission) that retries every error.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default(), RetryAll)
    }
}

impl Default for ParallelTransformer<RetryAll> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<C> ParallelTransformer<C> {
    /// Creates a transformer with the given retry policy and classifier.
    #[must_use]
    pub fn new(retry: RetryConfig, classifier: C) -> Self {
        Self {
            retry,
            classifier: Arc::new(classifier),
            sink: Arc::new(LoggingEventSink::default()),
        }
    }

    /// Replaces the event sink. Defaults to [`LoggingEventSink`].
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Silences event emission.
    #[must_use]
    pub fn without_events(self) -> Self {
        self.with_sink(Arc::new(NoOpEventSink))
    }

    /// Returns the retry policy in effect.
    #[must_use]
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Applies `factory` to every key concurrently and aggregates outcomes.
    ///
    /// Duplicate keys are collapsed to their first occurrence. The first
    /// attempt of every key is always dispatched; after a fatal
    /// classification no further retries are scheduled for any key,
    /// in-flight attempts drain, and their outcomes are discarded.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::Fatal`] with the first non-retryable error
    /// verbatim, or [`TransformError::Aggregate`] when at least one key
    /// exhausted its retry budget.
    pub async fn transform<K, V, E, F, Fut>(
        &self,
        keys: impl IntoIterator<Item = K>,
        factory: F,
        label: &str,
    ) -> Result<HashMap<K, V>, TransformError<K, E>>
    where
        K: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static,
        V: Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
        C: ErrorClassifier<E> + 'static,
        F: Fn(K) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        let mut seen = HashSet::new();
        let keys: Vec<K> = keys
            .into_iter()
            .filter(|key| seen.insert(key.clone()))
            .collect();
        let total = keys.len();

        if total == 0 {
            return Ok(HashMap::new());
        }

        let run_id = generate_uuid();
        let span = transform_span(label, run_id, total);
        let collector = Arc::new(OutcomeCollector::new());
        let factory = Arc::new(factory);

        let mut handles = Vec::with_capacity(total);
        for key in keys.iter().cloned() {
            let worker = run_key(
                key,
                Arc::clone(&factory),
                Arc::clone(&self.classifier),
                self.retry.clone(),
                Arc::clone(&collector),
                Arc::clone(&self.sink),
                label.to_string(),
            );
            handles.push(tokio::spawn(worker.instrument(span.clone())));
        }

        for joined in futures::future::join_all(handles).await {
            if let Err(join_error) = joined {
                if join_error.is_panic() {
                    std::panic::resume_unwind(join_error.into_panic());
                }
            }
        }

        let _entered = span.enter();

        if let Some(fatal) = collector.take_fatal() {
            error!(error = %fatal, "transform aborted by non-retryable error");
            return Err(TransformError::Fatal(fatal));
        }

        let (map, failures) = collector.drain_report(&keys);
        if failures.is_empty() {
            debug!(keys = total, "transform completed");
            self.sink.try_emit(
                TransformEvent::call("transform.completed", label)
                    .with_data(serde_json::json!({ "keys": total })),
            );
            Ok(map)
        } else {
            error!(failed = failures.len(), total, "transform exhausted retries");
            let aggregate = AggregateFailure::new(label, total, failures).with_run_id(run_id);
            Err(TransformError::Aggregate(aggregate))
        }
    }
}

impl<C> fmt::Debug for ParallelTransformer<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelTransformer")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// One key's retry loop. Attempts are strictly sequential within the key;
/// the first attempt is dispatched unconditionally.
async fn run_key<K, V, E, C, F, Fut>(
    key: K,
    factory: Arc<F>,
    classifier: Arc<C>,
    retry: RetryConfig,
    collector: Arc<OutcomeCollector<K, V, E>>,
    sink: Arc<dyn EventSink>,
    label: String,
) where
    K: Clone + Eq + Hash + fmt::Display + Send + Sync + 'static,
    C: ErrorClassifier<E> + ?Sized,
    F: Fn(K) -> Fut + Send + Sync,
    Fut: Future<Output = Result<V, E>> + Send,
    E: fmt::Display,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let error = match (*factory)(key.clone()).await {
            Ok(value) => {
                collector.record_success(key, value);
                return;
            }
            Err(error) => error,
        };

        match classifier.classify(&error) {
            ErrorClass::Fatal => {
                error!(key = %key, attempt, error = %error, "non-retryable error");
                sink.try_emit(TransformEvent::keyed(
                    "transform.fatal",
                    label.as_str(),
                    key.to_string(),
                    attempt,
                ));
                collector.record_fatal(error);
                return;
            }
            ErrorClass::Retryable => {
                if retry.is_exhausted(attempt) {
                    error!(key = %key, attempts = attempt, error = %error, "retries exhausted");
                    sink.try_emit(TransformEvent::keyed(
                        "transform.key_failed",
                        label.as_str(),
                        key.to_string(),
                        attempt,
                    ));
                    collector.record_failure(key, error, attempt);
                    return;
                }

                if collector.is_aborted() {
                    debug!(key = %key, "abort requested, dropping retry");
                    return;
                }

                warn!(key = %key, attempt, error = %error, "retrying");
                let delay = retry.delay_for(attempt);
                sink.try_emit(
                    TransformEvent::keyed(
                        "transform.retry_scheduled",
                        label.as_str(),
                        key.to_string(),
                        attempt,
                    )
                    .with_data(serde_json::json!({ "delay_ms": delay.as_millis() as u64 })),
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                    // Re-check after sleeping; an abort may have landed.
                    if collector.is_aborted() {
                        return;
                    }
                }
            }
        }
    }
}
