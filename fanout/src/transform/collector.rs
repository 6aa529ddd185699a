//! Concurrent collection of per-key outcomes.
//!
//! One logical attempt writes a given key at a time, so per-key access needs
//! no lock; the map itself must support safe insertion from many keys
//! concurrently, which `DashMap` provides. The fatal slot keeps only the
//! first non-retryable error observed and doubles as the abort broadcast.

use super::Outcome;
use crate::errors::KeyFailure;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};

pub(crate) struct OutcomeCollector<K, V, E> {
    outcomes: DashMap<K, Outcome<V, E>>,
    fatal: Mutex<Option<E>>,
    aborted: AtomicBool,
}

impl<K, V, E> OutcomeCollector<K, V, E>
where
    K: Eq + Hash + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            outcomes: DashMap::new(),
            fatal: Mutex::new(None),
            aborted: AtomicBool::new(false),
        }
    }

    pub(crate) fn record_success(&self, key: K, value: V) {
        self.outcomes.insert(key, Outcome::Success(value));
    }

    pub(crate) fn record_failure(&self, key: K, error: E, attempts: u32) {
        self.outcomes.insert(key, Outcome::Failure { error, attempts });
    }

    /// Records a fatal error and requests abort. The first error wins.
    pub(crate) fn record_fatal(&self, error: E) {
        {
            let mut slot = self.fatal.lock();
            if slot.is_none() {
                *slot = Some(error);
            }
        }
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Whether further retries should be suppressed.
    pub(crate) fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }

    pub(crate) fn take_fatal(&self) -> Option<E> {
        self.fatal.lock().take()
    }

    /// Splits recorded outcomes into the success map and the failure report,
    /// the latter in the order of `keys`.
    pub(crate) fn drain_report(&self, keys: &[K]) -> (HashMap<K, V>, Vec<(K, KeyFailure<E>)>) {
        let mut map = HashMap::with_capacity(keys.len());
        let mut failures = Vec::new();

        for key in keys {
            match self.outcomes.remove(key) {
                Some((key, Outcome::Success(value))) => {
                    map.insert(key, value);
                }
                Some((key, Outcome::Failure { error, attempts })) => {
                    failures.push((key, KeyFailure::new(error, attempts)));
                }
                // Only reachable when the key's attempt drained after an
                // abort; the fatal error supersedes its outcome.
                None => {}
            }
        }

        (map, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_splits_successes_and_failures_in_input_order() {
        let collector: OutcomeCollector<&str, u32, String> = OutcomeCollector::new();
        collector.record_failure("c", "boom".to_string(), 5);
        collector.record_success("a", 1);
        collector.record_failure("b", "bang".to_string(), 5);

        let (map, failures) = collector.drain_report(&["a", "b", "c"]);

        assert_eq!(map.get("a"), Some(&1));
        let keys: Vec<_> = failures.iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["b", "c"]);
    }

    #[test]
    fn test_first_fatal_wins_and_sets_abort() {
        let collector: OutcomeCollector<&str, u32, String> = OutcomeCollector::new();
        assert!(!collector.is_aborted());

        collector.record_fatal("first".to_string());
        collector.record_fatal("second".to_string());

        assert!(collector.is_aborted());
        assert_eq!(collector.take_fatal(), Some("first".to_string()));
        assert_eq!(collector.take_fatal(), None);
    }

    #[test]
    fn test_missing_outcome_is_skipped() {
        let collector: OutcomeCollector<&str, u32, String> = OutcomeCollector::new();
        collector.record_success("a", 1);

        let (map, failures) = collector.drain_report(&["a", "b"]);

        assert_eq!(map.len(), 1);
        assert!(failures.is_empty());
    }
}
