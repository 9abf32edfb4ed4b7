use tracing_subscriber::EnvFilter;

use crate::error::{Result, ToolError};

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows the number of `-v`
/// flags (`info`, `debug`, `trace`).
pub fn init_tracing(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}
