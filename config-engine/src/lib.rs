//! Configuration management for the resource guard crates
//!
//! Policy configuration is declarative and loaded once at process start:
//! - **Files**: YAML, TOML or JSON, chosen by extension
//! - **Inline sources**: strings, for tests and embedded defaults
//! - **Environment**: `GUARD__` prefixed variables with `__` separators,
//!   e.g. `GUARD__TELEMETRY__LEVEL=debug`
//!
//! Later sources override earlier ones. Compiling the result turns every
//! resource's policy declaration into a [`auth_policy::ResourcePolicy`]; any error there is
//! a startup-time configuration error.
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::ConfigEngine;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigEngine::new().with_file("guard.yaml").load()?;
//!     let policies = config.compile()?;
//!     for name in policies.keys() {
//!         println!("{name}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod engine;
pub mod error;

pub use engine::*;
pub use error::*;
