//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request (via http::server)
//!     → target.rs    (extract `p`, validate as absolute URI)
//!     → headers.rs   (copy headers, replace Host, multi-value policy)
//!     → forwarder.rs (dispatch on the shared client, stream the reply back)
//! ```

pub mod forwarder;
pub mod headers;
pub mod target;

pub use forwarder::{build_client, Forwarder, HttpClient};
pub use target::{Target, TargetError};
