//! Structured logging for the resource guard crates
//!
//! Library crates only emit `tracing` events; binaries call
//! [`init_tracing`] once at startup to install a subscriber.
//!
//! # Example
//!
//! ```rust,no_run
//! use telemetry::{init_tracing, TelemetryConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_tracing(&TelemetryConfig::default().with_json(true))?;
//!     tracing::info!(resource = "notes", "Registered resource");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;

pub use error::*;
pub use logging::*;
