//! Logging bootstrap for the CLI.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter used when `RUST_LOG` is unset or invalid.
pub(crate) const DEFAULT_FILTER: &str = "info";

/// Install a stderr subscriber filtered by `RUST_LOG`.
///
/// `log` records from the library crates are bridged into the subscriber.
/// Returns `false` when a global subscriber was already installed.
pub(crate) fn init_logging() -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .is_ok()
}
