//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Forwarder, server, lifecycle
//!     → logging.rs (tracing events → stderr)
//!
//! Access log middleware
//!     → access_log.rs (one fixed-format line per request → stdout/stderr)
//! ```

pub mod access_log;
pub mod logging;

pub use access_log::{client_ip, AccessLogRecord, AccessLogSink};
