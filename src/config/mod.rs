//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → CLI overrides (port, bind host)
//!     → RelayConfig (immutable for the process lifetime)
//! ```
//!
//! All fields have defaults, so running without a file is the common case.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AccessLogConfig, AccessLogOutput, ForwardConfig, ListenerConfig, MultiValueHeaders,
    ObservabilityConfig, RelayConfig,
};
pub use validation::ValidationError;
