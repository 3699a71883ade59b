//! TCP listener setup.
//!
//! # Responsibilities
//! - Bind to the configured `host:port`
//! - Report the bound address (port 0 resolves to an ephemeral port)
//!
//! A bind failure is fatal at startup; the caller logs it and exits.

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
}

/// Bind a listener for the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<(TcpListener, SocketAddr), ListenerError> {
    let address = config.bind_address();
    let to_error = |source| ListenerError::Bind {
        address: address.clone(),
        source,
    };

    let listener = TcpListener::bind(&address).await.map_err(to_error)?;
    let local_addr = listener.local_addr().map_err(to_error)?;

    tracing::info!(address = %local_addr, "Listener bound");
    Ok((listener, local_addr))
}
