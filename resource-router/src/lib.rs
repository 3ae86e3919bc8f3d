//! Generic resource dispatch guarded by access policies
//!
//! A resource is registered once at startup with a store, a policy
//! configuration and optional custom actions. The router then maps
//! `(verb, path)` pairs onto the resource's actions and runs them through the
//! generic CRUD handler, which enforces a fixed ordering:
//!
//! 1. Route match (NotFound before any policy runs)
//! 2. Request-level policy check (before any store access)
//! 3. Fetch, where the action needs an instance (NotFound)
//! 4. Object-level policy check (before any mutation)
//! 5. Store mutation (ValidationError comes from the store unchanged)
//!
//! | Verb | Path shape | Action |
//! |---|---|---|
//! | GET | `/{resource}` | list |
//! | POST | `/{resource}` | create |
//! | GET | `/{resource}/{id}` | retrieve |
//! | PUT/PATCH | `/{resource}/{id}` | update |
//! | DELETE | `/{resource}/{id}` | destroy |
//!
//! # Example
//!
//! ```rust
//! use auth_policy::{AuthenticatedOrSafe, OwnerOrSafe, PolicySet, Principal, ResourcePolicy};
//! use resource_router::{InMemoryStore, Outcome, ResourceRegistration, ResourceRequest, ResourceRouter};
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), resource_router::DispatchError> {
//! let mut router = ResourceRouter::new();
//! router.register(ResourceRegistration::new(
//!     "notes",
//!     Arc::new(InMemoryStore::new()),
//!     ResourcePolicy::fixed(PolicySet::single(AuthenticatedOrSafe).and(OwnerOrSafe)),
//! ))?;
//!
//! let outcome = router
//!     .handle(ResourceRequest::new(http::Method::GET, "/notes/", Principal::anonymous()))
//!     .await?;
//! assert!(matches!(outcome, Outcome::Listing(_)));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handler;
pub mod memory;
pub mod registration;
pub mod route;
pub mod router;
pub mod store;

pub use error::*;
pub use handler::*;
pub use memory::*;
pub use registration::*;
pub use route::*;
pub use router::*;
pub use store::*;
