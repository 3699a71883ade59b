//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind host, port).
    pub listener: ListenerConfig,

    /// Forwarding behaviour.
    pub forward: ForwardConfig,

    /// Access log output.
    pub access_log: AccessLogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind (e.g., "0.0.0.0", "127.0.0.1").
    pub bind_host: String,

    /// TCP port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` string suitable for `TcpListener::bind`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 8888,
        }
    }
}

/// How inbound headers carrying more than one value are forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MultiValueHeaders {
    /// Forward every value as its own header line, in order.
    #[default]
    Preserve,
    /// Collapse into a single comma-joined value.
    Join,
}

/// Forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ForwardConfig {
    /// Copy the target's status code onto the relayed response.
    ///
    /// Off by default: the relayed response is an implicit 200 and the access
    /// log records that.
    pub propagate_status: bool,

    /// Policy for headers with more than one value.
    pub multi_value_headers: MultiValueHeaders,
}

/// Where access log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccessLogOutput {
    #[default]
    Stdout,
    Stderr,
}

/// Access log configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AccessLogConfig {
    /// Emit one line per request.
    pub enabled: bool,

    /// Output stream.
    pub output: AccessLogOutput,
}

impl Default for AccessLogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output: AccessLogOutput::Stdout,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
