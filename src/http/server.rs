//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the single catch-all relay route
//! - Wire up middleware (tracing, access log)
//! - Own the process-wide outbound client through the `Forwarder`
//! - Serve on a bound listener until shutdown is signalled

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::config::RelayConfig;
use crate::forward::{build_client, Forwarder};
use crate::http::middleware::AccessLogLayer;
use crate::observability::access_log::AccessLogSink;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub forwarder: Forwarder,
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
}

impl RelayServer {
    /// Create a new server. Access log lines go to `access_log`.
    pub fn new(config: &RelayConfig, access_log: AccessLogSink) -> Self {
        let forwarder = Forwarder::new(build_client(), &config.forward);
        let router = Self::build_router(AppState { forwarder }, access_log);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The access log layer is added last so it sees the final status and
    /// every byte of the body.
    fn build_router(state: AppState, access_log: AccessLogSink) -> Router {
        Router::new()
            .route("/{*path}", any(relay_handler))
            .route("/", any(relay_handler))
            .with_state(state)
            .layer(TraceLayer::new_for_http())
            .layer(AccessLogLayer::new(access_log))
    }

    /// Router with all layers applied, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires (or its sender is dropped).
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every path and method lands here.
async fn relay_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    state.forwarder.handle(request, remote).await
}
