//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, single catch-all route)
//!     → middleware/access_log.rs (status, byte count, latency → one log line)
//!     → forward::Forwarder (relay to `p`, or greeting.rs when absent)
//!     → Send to client
//! ```

pub mod greeting;
pub mod middleware;
pub mod server;

pub use middleware::AccessLogLayer;
pub use server::RelayServer;
