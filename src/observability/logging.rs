//! Diagnostic logging.
//!
//! `tracing` events go to stderr through a `fmt` layer filtered by `RUST_LOG`,
//! falling back to the configured level. Stdout is left to the startup line and
//! the access log so log tooling can read it unfiltered.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter used when `RUST_LOG` is unset.
pub fn default_filter(config: &ObservabilityConfig) -> String {
    format!(
        "query_relay={},tower_http=warn",
        config.log_level.to_lowercase()
    )
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
