//! Process-wide log setup shared by the binaries.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Directive used when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Build the filter from a `RUST_LOG`-style value. Accepts a bare level
/// (`debug`) as well as per-target directives (`fuel_dashboard=debug,tower_http=warn`).
pub fn env_filter(value: Option<&str>) -> EnvFilter {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global fmt subscriber, filtered by `RUST_LOG`.
pub fn init() {
    let filter = env_filter(std::env::var("RUST_LOG").ok().as_deref());
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}
