//! Pluggable fatal-vs-retryable error classification.
//!
//! The transform engine stays agnostic of the collaborator's error taxonomy:
//! classification is a predicate supplied by the caller. An authorization
//! denial in a provider client is simply one classifier instance; the engine
//! only sees [`ErrorClass`].

/// How an attempt error should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The operation was rejected by policy, not by transient fault.
    /// Propagated immediately and verbatim; no key is retried further.
    Fatal,
    /// A transient fault. Consumes one unit of the key's retry budget.
    Retryable,
}

impl ErrorClass {
    /// Returns true for the fatal classification.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        matches!(self, Self::Fatal)
    }
}

/// Classifies attempt errors as fatal or retryable.
pub trait ErrorClassifier<E>: Send + Sync {
    /// Classifies a single attempt error.
    fn classify(&self, error: &E) -> ErrorClass;
}

/// Classifier that treats every error as retryable.
///
/// Used as the default when the caller has no fatal error kinds.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryAll;

impl<E> ErrorClassifier<E> for RetryAll {
    fn classify(&self, _error: &E) -> ErrorClass {
        ErrorClass::Retryable
    }
}

/// Wraps a closure as an [`ErrorClassifier`].
#[derive(Debug, Clone)]
pub struct ClassifyFn<F>(F);

impl<F> ClassifyFn<F> {
    /// Creates a classifier from a closure.
    #[must_use]
    pub fn new(predicate: F) -> Self {
        Self(predicate)
    }
}

impl<E, F> ErrorClassifier<E> for ClassifyFn<F>
where
    F: Fn(&E) -> ErrorClass + Send + Sync,
{
    fn classify(&self, error: &E) -> ErrorClass {
        (self.0)(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum FakeError {
        Denied,
        Glitch,
    }

    #[test]
    fn test_retry_all_never_fatal() {
        let classifier = RetryAll;
        assert_eq!(classifier.classify(&FakeError::Denied), ErrorClass::Retryable);
        assert_eq!(classifier.classify(&FakeError::Glitch), ErrorClass::Retryable);
    }

    #[test]
    fn test_classify_fn_splits_taxonomy() {
        let classifier = ClassifyFn::new(|e: &FakeError| match e {
            FakeError::Denied => ErrorClass::Fatal,
            FakeError::Glitch => ErrorClass::Retryable,
        });

        assert!(classifier.classify(&FakeError::Denied).is_fatal());
        assert!(!classifier.classify(&FakeError::Glitch).is_fatal());
    }

    #[test]
    fn test_error_class_is_fatal() {
        assert!(ErrorClass::Fatal.is_fatal());
        assert!(!ErrorClass::Retryable.is_fatal());
    }
}
