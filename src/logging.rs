//! Tracing subscriber setup for the binaries.
//!
//! The library only emits events; binaries call [`init`] once at startup.

use tracing_subscriber::EnvFilter;

/// Maps `-v` occurrences to a filter directive.
pub fn verbosity_to_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Installs a stderr fmt subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn init(verbosity: u8) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(verbosity_to_filter(verbosity))?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))
}
