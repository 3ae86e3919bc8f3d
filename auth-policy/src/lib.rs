//! Access policy engine for generic resource dispatch
//!
//! This crate decides whether a request may proceed, at two granularities:
//! - **Request level**: before any store access, from the principal and the
//!   safe/unsafe classification of the verb
//! - **Object level**: after an instance has been fetched and before it is
//!   mutated or deleted
//!
//! # Core Concepts
//!
//! - **Principal**: the caller, as populated by the host authentication layer
//! - **RequestContext**: principal, raw verb and resolved action for one request
//! - **Policy**: a pure predicate with a request-level and an object-level check
//! - **PolicySet**: an ordered, non-empty, short-circuiting AND of policies
//! - **ResourcePolicy**: static or per-action configuration that resolves an
//!   action to its effective PolicySet
//!
//! # Example
//!
//! ```rust
//! use auth_policy::{
//!     Action, ActionPolicyMap, Authenticated, Open, PolicySet, Principal,
//!     Privileged, RequestContext, ResourcePolicy,
//! };
//! use http::Method;
//!
//! let policy = ResourcePolicy::per_action(
//!     ActionPolicyMap::new()
//!         .with_action(Action::List, PolicySet::single(Open))
//!         .with_action(Action::Create, PolicySet::single(Privileged))
//!         .with_default(PolicySet::single(Authenticated)),
//! );
//!
//! let ctx = RequestContext::new(Method::GET, Principal::anonymous(), Action::List);
//! let set = policy.resolve(&ctx.action).unwrap();
//! assert!(set.evaluate_request(&ctx));
//! ```

pub mod error;
pub mod models;
pub mod policy;
pub mod policy_set;
pub mod resolver;
pub mod schema;

pub use error::*;
pub use models::*;
pub use policy::*;
pub use policy_set::*;
pub use resolver::*;
pub use schema::*;
