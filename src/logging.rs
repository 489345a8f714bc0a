//! Subscriber setup for the best-effort, off-hot-path logger collaborator
//! (spec §6). Mirrors the `tracing_subscriber::fmt` + `EnvFilter` wiring
//! used across the example pack's trading binaries.

use tracing_subscriber::EnvFilter;

/// Installs a global `fmt` subscriber reading its level from `RUST_LOG`,
/// defaulting to `info` when unset. Call once at process startup.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}
