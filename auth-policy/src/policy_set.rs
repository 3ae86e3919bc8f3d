use error_common::{Classified, ErrorKind};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::error::{PolicyError, Result};
use crate::models::{RequestContext, ResourceInstance};
use crate::policy::{Policy, PolicyRef};

/// Which evaluation point produced a denial
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialLevel {
    Request,
    Object,
}

impl fmt::Display for DenialLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialLevel::Request => f.write_str("request-level"),
            DenialLevel::Object => f.write_str("object-level"),
        }
    }
}

/// A policy check that returned false
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{level} check denied by policy `{policy}`")]
pub struct Denial {
    pub level: DenialLevel,
    /// Name of the first policy, in declared order, that denied
    pub policy: String,
}

impl Classified for Denial {
    fn kind(&self) -> ErrorKind {
        match self.level {
            DenialLevel::Request => ErrorKind::Unauthorized,
            DenialLevel::Object => ErrorKind::Forbidden,
        }
    }
}

/// Ordered, non-empty AND-composition of policies.
///
/// Evaluation stops at the first member returning false. Order affects
/// cost only, never the outcome.
#[derive(Debug, Clone)]
pub struct PolicySet {
    policies: Vec<PolicyRef>,
}

impl PolicySet {
    /// An empty set is a configuration error, never allow-all.
    pub fn new(policies: Vec<PolicyRef>) -> Result<Self> {
        if policies.is_empty() {
            return Err(PolicyError::EmptyPolicySet("policy set has no members".to_string()));
        }
        Ok(Self { policies })
    }

    pub fn single<P: Policy + 'static>(policy: P) -> Self {
        Self {
            policies: vec![Arc::new(policy)],
        }
    }

    /// Append a member, keeping declared order
    pub fn and<P: Policy + 'static>(mut self, policy: P) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    pub fn check_request(&self, ctx: &RequestContext) -> std::result::Result<(), Denial> {
        match self.policies.iter().find(|p| !p.evaluate_request(ctx)) {
            Some(policy) => {
                debug!(
                    request_id = %ctx.request_id,
                    action = %ctx.action,
                    policy = policy.name(),
                    "Request-level check denied"
                );
                Err(Denial {
                    level: DenialLevel::Request,
                    policy: policy.name().to_string(),
                })
            }
            None => Ok(()),
        }
    }

    /// Members without an object-level restriction pass vacuously.
    pub fn check_object(
        &self,
        ctx: &RequestContext,
        instance: &dyn ResourceInstance,
    ) -> std::result::Result<(), Denial> {
        let denied = self
            .policies
            .iter()
            .filter(|p| p.restricts_objects())
            .find(|p| !p.evaluate_object(ctx, instance));
        match denied {
            Some(policy) => {
                debug!(
                    request_id = %ctx.request_id,
                    action = %ctx.action,
                    instance = instance.instance_id(),
                    policy = policy.name(),
                    "Object-level check denied"
                );
                Err(Denial {
                    level: DenialLevel::Object,
                    policy: policy.name().to_string(),
                })
            }
            None => Ok(()),
        }
    }

    pub fn evaluate_request(&self, ctx: &RequestContext) -> bool {
        self.check_request(ctx).is_ok()
    }

    pub fn evaluate_object(&self, ctx: &RequestContext, instance: &dyn ResourceInstance) -> bool {
        self.check_object(ctx, instance).is_ok()
    }

    pub fn has_object_restrictions(&self) -> bool {
        self.policies.iter().any(|p| p.restricts_objects())
    }

    pub fn names(&self) -> Vec<&str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolicyRef> {
        self.policies.iter()
    }
}
