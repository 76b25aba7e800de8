//! Tracing setup for hosts embedding the client.

use crate::config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install a global `tracing` subscriber filtered by `config.log_filter`.
///
/// `RUST_LOG` takes precedence when set. Returns `false` if a subscriber was
/// already installed.
pub fn init_tracing(config: &Config) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("psorcast_client=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installs_once() {
        let config = Config {
            log_filter: "psorcast_client=debug".into(),
            ..Config::default()
        };
        init_tracing(&config);
        assert!(!init_tracing(&config));
    }
}
