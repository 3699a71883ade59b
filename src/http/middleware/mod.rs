//! Tower middleware applied around the relay handler.

pub mod access_log;

pub use access_log::{AccessLogLayer, AccessLogService, CountingBody};
