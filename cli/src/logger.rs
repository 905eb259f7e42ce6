//! Installation of the tracing subscriber.

use anyhow::anyhow;
use tracing_subscriber::EnvFilter;

/// Installs a subscriber writing to stderr.
///
/// `level` is a level like `"info"` or a filter directive. If it is `None`, `RUST_LOG` is used,
/// and `default` if that is unset too.
pub fn init(level: Option<&str>, default: &str) -> anyhow::Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level)
            .map_err(|e| anyhow!("Invalid log level '{level}': {e}"))?,
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(default))
            .map_err(|e| anyhow!("Invalid log level '{default}': {e}"))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("Failed to install the log subscriber: {e}"))
}
