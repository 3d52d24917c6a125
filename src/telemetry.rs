//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

/// `RUST_LOG` wins over the configured filter when set.
pub fn init(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    if config.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
