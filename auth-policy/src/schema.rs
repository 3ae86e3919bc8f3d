use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{PolicyError, Result};
use crate::models::Action;
use crate::policy::{
    Authenticated, AuthenticatedOrSafe, GroupMembership, Open, OwnerOrSafe, PolicyRef, Privileged,
    SafeOnlyIfAnonymous,
};
use crate::policy_set::PolicySet;
use crate::resolver::{ActionPolicyMap, ResourcePolicy};

/// Declarative form of a single canonical policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicySpec {
    Open,
    Authenticated,
    Privileged,
    AuthenticatedOrSafe,
    OwnerOrSafe,
    SafeOnlyIfAnonymous,
    GroupMembership { groups: Vec<String> },
}

impl PolicySpec {
    pub fn build(&self) -> Result<PolicyRef> {
        let policy: PolicyRef = match self {
            PolicySpec::Open => Arc::new(Open),
            PolicySpec::Authenticated => Arc::new(Authenticated),
            PolicySpec::Privileged => Arc::new(Privileged),
            PolicySpec::AuthenticatedOrSafe => Arc::new(AuthenticatedOrSafe),
            PolicySpec::OwnerOrSafe => Arc::new(OwnerOrSafe),
            PolicySpec::SafeOnlyIfAnonymous => Arc::new(SafeOnlyIfAnonymous),
            PolicySpec::GroupMembership { groups } => {
                Arc::new(GroupMembership::new(groups.iter().cloned())?)
            }
        };
        Ok(policy)
    }
}

/// Declarative form of a resource's policy configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResourcePolicySpec {
    Static {
        policies: Vec<PolicySpec>,
    },
    PerAction {
        #[serde(default)]
        default: Option<Vec<PolicySpec>>,
        #[serde(default)]
        actions: BTreeMap<String, Vec<PolicySpec>>,
    },
}

impl ResourcePolicySpec {
    /// Compile into a [`ResourcePolicy`]. `resource` only labels errors.
    pub fn compile(&self, resource: &str) -> Result<ResourcePolicy> {
        match self {
            ResourcePolicySpec::Static { policies } => {
                let set = compile_set(policies, &format!("{resource}: static policies"))?;
                Ok(ResourcePolicy::fixed(set))
            }
            ResourcePolicySpec::PerAction { default, actions } => {
                let mut map = ActionPolicyMap::new();
                for (name, specs) in actions {
                    let action = Action::parse_name(name)?;
                    let set = compile_set(specs, &format!("{resource}: action `{name}`"))?;
                    map = map.with_action(action, set);
                }
                if let Some(specs) = default {
                    map = map.with_default(compile_set(specs, &format!("{resource}: default"))?);
                }
                Ok(ResourcePolicy::per_action(map))
            }
        }
    }
}

/// Build an ordered policy set, rejecting an empty list
pub fn compile_set(specs: &[PolicySpec], label: &str) -> Result<PolicySet> {
    if specs.is_empty() {
        return Err(PolicyError::EmptyPolicySet(label.to_string()));
    }
    let policies = specs
        .iter()
        .map(|spec| {
            spec.build().map_err(|err| match err {
                PolicyError::EmptyGroupSet(_) => PolicyError::EmptyGroupSet(label.to_string()),
                other => other,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    PolicySet::new(policies)
}
