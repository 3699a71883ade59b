//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Parse CLI → Load config → Init logging → Bind listener → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl+C → Shutdown::trigger → server stops accepting → in-flight drain → Exit
//! ```
//!
//! Any startup error is fatal.

pub mod shutdown;

pub use shutdown::Shutdown;
