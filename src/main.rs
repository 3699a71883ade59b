//! query-relay
//!
//! Forwards `/?p=<absolute url>` to `<absolute url>`, streams the answer back
//! behind a one-line HTML banner, and writes one access log line per request.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request       ┌──────────┐   ┌──────────────┐   ┌───────────┐
//!     ────────────────────▶│   net    │──▶│  access_log  │──▶│ Forwarder │──▶ Target
//!                          │ listener │   │  middleware  │   │  (shared  │
//!     Client Response      └──────────┘   └──────┬───────┘   │  client)  │
//!     ◀──────────── banner + streamed body ──────┼───────────┴───────────┘◀── Target
//!                                                 ▼
//!                                     stdout: IP - - [time] "GET / HTTP/1.1" 200 N secs
//! ```

use std::path::PathBuf;

use clap::Parser;

use query_relay::config::{load_config, validation::validate_config, ConfigError, RelayConfig};
use query_relay::http::RelayServer;
use query_relay::lifecycle::Shutdown;
use query_relay::net;
use query_relay::observability::{logging, AccessLogSink};

#[derive(Parser, Debug)]
#[command(name = "query-relay")]
#[command(about = "HTTP relay that forwards ?p=<url> and writes an access log", long_about = None)]
struct Cli {
    /// Server port (overrides the config file; default 8888)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind (overrides the config file; default 0.0.0.0)
    #[arg(long)]
    bind: Option<String>,

    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_host = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init(&config.observability);
    tracing::info!("query-relay v{} starting", env!("CARGO_PKG_VERSION"));

    let (listener, local_addr) = match net::bind(&config.listener).await {
        Ok(bound) => bound,
        Err(e) => {
            tracing::error!(error = %e, "Cannot start listener");
            return Err(e.into());
        }
    };
    println!("\n--> Server listening at: {local_addr}");

    let access_log = AccessLogSink::from_config(&config.access_log);
    let server = RelayServer::new(&config, access_log);

    let shutdown = Shutdown::new();
    let serving = server.run(listener, shutdown.subscribe());
    tokio::pin!(serving);

    tokio::select! {
        res = &mut serving => res?,
        _ = shutdown.trigger_on_ctrl_c() => serving.await?,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
