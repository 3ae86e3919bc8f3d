//! Common error handling utilities for the resource guard crates
//!
//! Every library error in the workspace maps onto one abstract [`ErrorKind`].
//! The kinds are transport-neutral: the host layer decides how to encode them
//! (status codes, gRPC codes, CLI exit codes).
//!
//! # Error Kinds
//!
//! - **Unauthorized**: request-level policy denial
//! - **Forbidden**: object-level policy denial
//! - **NotFound**: no route for the request, or no instance for the id
//! - **ValidationError**: payload rejected by the store
//! - **ConfigurationError**: unusable policy configuration, raised at startup
//! - **Internal**: anything the store or host could not classify
//!
//! # Example
//!
//! ```rust
//! use error_common::{Classified, ErrorKind};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("no such note")]
//! struct MissingNote;
//!
//! impl Classified for MissingNote {
//!     fn kind(&self) -> ErrorKind {
//!         ErrorKind::NotFound
//!     }
//! }
//!
//! assert_eq!(MissingNote.code(), "NOT_FOUND_4001");
//! ```

pub mod codes;
pub mod context;
pub mod types;

pub use context::*;
pub use types::*;
