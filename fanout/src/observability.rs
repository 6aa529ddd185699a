//! Tracing integration for transform calls.
//!
//! Every transform call runs inside a span carrying the operation label, a
//! fresh run id, and the key count, so per-key retry logs can be correlated
//! across concurrent calls.

use tracing::Span;
use uuid::Uuid;

/// Creates the span wrapping one transform call.
#[must_use]
pub fn transform_span(label: &str, run_id: Uuid, total_keys: usize) -> Span {
    tracing::info_span!(
        "transform_parallel",
        label = %label,
        run_id = %run_id,
        keys = total_keys,
    )
}

/// Installs a fmt subscriber honoring `RUST_LOG`.
///
/// Intended for binaries and integration tests; returns quietly if a global
/// subscriber is already installed.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}
