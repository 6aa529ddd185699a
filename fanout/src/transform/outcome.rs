//! Terminal per-key outcomes.

/// The terminal result for one key of a transform call.
///
/// Every key reaches exactly one outcome unless the call aborts on a fatal
/// error, in which case outcomes of draining attempts are discarded.
#[derive(Debug, Clone)]
pub enum Outcome<V, E> {
    /// The key's operation produced a value.
    Success(V),
    /// The key exhausted its retry budget.
    Failure {
        /// The last error observed.
        error: E,
        /// Attempts consumed; equals the configured ceiling.
        attempts: u32,
    },
}

impl<V, E> Outcome<V, E> {
    /// Returns true for a successful outcome.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Unwraps the success value, if present.
    #[must_use]
    pub fn into_success(self) -> Option<V> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure { .. } => None,
        }
    }
}
