//! HTTP forwarding relay library.
//!
//! A request carrying an absolute URL in query parameter `p` is re-issued to
//! that URL and the answer is streamed back; every request produces one
//! access log line.

pub mod config;
pub mod error;
pub mod forward;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::RelayConfig;
pub use error::RelayError;
pub use forward::Forwarder;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use observability::AccessLogSink;
