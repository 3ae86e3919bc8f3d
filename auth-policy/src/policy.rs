use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{PolicyError, Result};
use crate::models::{RequestContext, ResourceInstance};

/// A single access-control predicate with two evaluation points.
///
/// Both checks must be pure: no I/O, no mutation, same answer for the same
/// inputs. An implementation that does not override a check allows it.
pub trait Policy: Send + Sync + fmt::Debug {
    /// Stable name used in denials and logs
    fn name(&self) -> &str;

    fn evaluate_request(&self, _ctx: &RequestContext) -> bool {
        true
    }

    fn evaluate_object(&self, _ctx: &RequestContext, _instance: &dyn ResourceInstance) -> bool {
        true
    }

    /// Whether this policy restricts anything at the object level.
    ///
    /// Object-level evaluation only consults policies returning `true` here,
    /// so an implementation that overrides [`Policy::evaluate_object`] must
    /// override this as well or its object check never runs.
    fn restricts_objects(&self) -> bool {
        false
    }
}

/// Shared, immutable handle to a policy
pub type PolicyRef = Arc<dyn Policy>;

/// Allows everything at both levels
#[derive(Debug, Clone, Copy, Default)]
pub struct Open;

impl Policy for Open {
    fn name(&self) -> &str {
        "open"
    }
}

/// Request level: principal must be authenticated
#[derive(Debug, Clone, Copy, Default)]
pub struct Authenticated;

impl Policy for Authenticated {
    fn name(&self) -> &str {
        "authenticated"
    }

    fn evaluate_request(&self, ctx: &RequestContext) -> bool {
        ctx.principal.is_authenticated
    }
}

/// Request level: principal must be privileged
#[derive(Debug, Clone, Copy, Default)]
pub struct Privileged;

impl Policy for Privileged {
    fn name(&self) -> &str {
        "privileged"
    }

    fn evaluate_request(&self, ctx: &RequestContext) -> bool {
        ctx.principal.is_privileged
    }
}

/// Request level: authenticated, or the verb is read-safe
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedOrSafe;

impl Policy for AuthenticatedOrSafe {
    fn name(&self) -> &str {
        "authenticated_or_safe"
    }

    fn evaluate_request(&self, ctx: &RequestContext) -> bool {
        ctx.principal.is_authenticated || ctx.is_safe()
    }
}

/// Object level: read-safe verbs pass, writes require ownership.
/// Request level is deferred to the object check.
#[derive(Debug, Clone, Copy, Default)]
pub struct OwnerOrSafe;

impl Policy for OwnerOrSafe {
    fn name(&self) -> &str {
        "owner_or_safe"
    }

    fn evaluate_object(&self, ctx: &RequestContext, instance: &dyn ResourceInstance) -> bool {
        if ctx.is_safe() {
            return true;
        }
        match (instance.owner_id(), ctx.principal.id) {
            (Some(owner), Some(caller)) => owner == caller,
            _ => false,
        }
    }

    fn restricts_objects(&self) -> bool {
        true
    }
}

/// Request level: anonymous callers may only use read-safe verbs
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeOnlyIfAnonymous;

impl Policy for SafeOnlyIfAnonymous {
    fn name(&self) -> &str {
        "safe_only_if_anonymous"
    }

    fn evaluate_request(&self, ctx: &RequestContext) -> bool {
        ctx.principal.is_authenticated || ctx.is_safe()
    }
}

/// Request level: principal must belong to at least one required group
#[derive(Debug, Clone)]
pub struct GroupMembership {
    required: BTreeSet<String>,
}

impl GroupMembership {
    /// An empty group set could never pass, so it is rejected as configuration.
    pub fn new<I, S>(required: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let required: BTreeSet<String> = required.into_iter().map(Into::into).collect();
        if required.is_empty() {
            return Err(PolicyError::EmptyGroupSet("group_membership".to_string()));
        }
        Ok(Self { required })
    }

    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }
}

impl Policy for GroupMembership {
    fn name(&self) -> &str {
        "group_membership"
    }

    fn evaluate_request(&self, ctx: &RequestContext) -> bool {
        ctx.principal.is_member_of_any(&self.required)
    }
}
