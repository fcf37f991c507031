//! Logging configuration for QueryCraft.
//!
//! The gateway is a library embedded in some serving surface, so logging goes
//! to stderr and respects `RUST_LOG` via an env filter.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
///
/// Honors `RUST_LOG`; defaults to `info` when unset. Safe to call once per
/// process, typically from the host application's startup path.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}
