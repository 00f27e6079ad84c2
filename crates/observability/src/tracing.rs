//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Directives applied when `RUST_LOG` is unset: dependencies at `info`, the
/// fieldops crates at `debug` so guard denials and ownership fallbacks show
/// up in dev logs.
const DEFAULT_DIRECTIVES: &str =
    "info,fieldops_api=debug,fieldops_auth=debug,fieldops_crm=debug,fieldops_audit=debug";

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    // JSON lines with timestamps; override per-module via RUST_LOG.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
