//! Tracing initialisation for the binary.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber. Controlled by `RUST_LOG`
/// (default: `warn`); logs go to stderr so they never mix with warnings.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
