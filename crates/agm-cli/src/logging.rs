//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Log line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Filter directive for a verbosity count, falling back to `configured`
#[must_use]
pub fn filter_directive(verbosity: u8, configured: &str) -> String {
    match verbosity {
        0 => configured.to_string(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

/// Install the global subscriber on stderr
///
/// `RUST_LOG` wins over `-v` and the configured filter. Installing twice
/// is a no-op.
pub fn init(verbosity: u8, configured: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity, configured)));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
