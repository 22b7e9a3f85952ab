use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// Install a stderr `fmt` subscriber filtered at the configured level
///
/// `RUST_LOG` takes precedence over `LogConfig::level`. Calling this more than once
/// is harmless: later calls leave the first subscriber in place.
pub fn init(config: &LogConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}
