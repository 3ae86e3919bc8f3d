use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PolicyError, Result};
use crate::models::{Action, RequestContext};
use crate::policy_set::PolicySet;

/// Per-action policy table with an optional explicit default
#[derive(Debug, Clone, Default)]
pub struct ActionPolicyMap {
    entries: HashMap<Action, Arc<PolicySet>>,
    default: Option<Arc<PolicySet>>,
}

impl ActionPolicyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `action` to `set`, replacing any previous binding
    pub fn with_action(mut self, action: Action, set: PolicySet) -> Self {
        self.entries.insert(action, Arc::new(set));
        self
    }

    /// Fallback for actions without their own entry
    pub fn with_default(mut self, set: PolicySet) -> Self {
        self.default = Some(Arc::new(set));
        self
    }

    pub fn get(&self, action: &Action) -> Option<&Arc<PolicySet>> {
        self.entries.get(action)
    }

    pub fn default_set(&self) -> Option<&Arc<PolicySet>> {
        self.default.as_ref()
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.entries.keys()
    }
}

/// Resolution mode selected per resource at registration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionMode {
    Static,
    PerAction,
}

/// A resource's policy configuration. Immutable once registered.
#[derive(Debug, Clone)]
pub enum ResourcePolicy {
    /// One set governs every action
    Static(Arc<PolicySet>),
    /// Action-specific sets, falling back to the map's default
    PerAction(ActionPolicyMap),
}

impl ResourcePolicy {
    pub fn fixed(set: PolicySet) -> Self {
        ResourcePolicy::Static(Arc::new(set))
    }

    pub fn per_action(map: ActionPolicyMap) -> Self {
        ResourcePolicy::PerAction(map)
    }

    pub fn mode(&self) -> ResolutionMode {
        match self {
            ResourcePolicy::Static(_) => ResolutionMode::Static,
            ResourcePolicy::PerAction(_) => ResolutionMode::PerAction,
        }
    }

    /// Effective policy set for `action`.
    ///
    /// Pure and deterministic: the same action always yields the same `Arc`.
    /// An action with no entry and no default fails closed.
    pub fn resolve(&self, action: &Action) -> Result<&Arc<PolicySet>> {
        match self {
            ResourcePolicy::Static(set) => Ok(set),
            ResourcePolicy::PerAction(map) => map
                .get(action)
                .or_else(|| map.default_set())
                .ok_or_else(|| PolicyError::UnresolvedAction(action.to_string())),
        }
    }

    /// Resolve using the action recorded on the request context
    pub fn resolve_for(&self, ctx: &RequestContext) -> Result<&Arc<PolicySet>> {
        self.resolve(&ctx.action)
    }

    /// Check that every declared action resolves. Called at registration so
    /// a missing entry surfaces at startup rather than per request.
    pub fn validate<'a, I>(&self, actions: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a Action>,
    {
        for action in actions {
            self.resolve(action)?;
        }
        Ok(())
    }
}
