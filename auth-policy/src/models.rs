use http::Method;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::PolicyError;

/// Identity of the caller, populated by the host authentication layer.
///
/// Immutable for the lifetime of a request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: Option<Uuid>,
    pub is_authenticated: bool,
    /// Administrator-equivalent
    pub is_privileged: bool,
    pub groups: BTreeSet<String>,
}

impl Principal {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(id: Uuid) -> Self {
        Self {
            id: Some(id),
            is_authenticated: true,
            is_privileged: false,
            groups: BTreeSet::new(),
        }
    }

    pub fn privileged(mut self) -> Self {
        self.is_privileged = true;
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.groups.insert(group.into());
        self
    }

    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// True iff the principal belongs to at least one of `required`
    pub fn is_member_of_any(&self, required: &BTreeSet<String>) -> bool {
        required.iter().any(|group| self.groups.contains(group))
    }
}

/// Safe/unsafe classification of a verb. Policies reason about this, not the raw verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodClass {
    ReadSafe,
    Write,
}

impl MethodClass {
    pub fn of(method: &Method) -> Self {
        if *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS {
            MethodClass::ReadSafe
        } else {
            MethodClass::Write
        }
    }

    pub fn is_safe(self) -> bool {
        self == MethodClass::ReadSafe
    }
}

/// A resource action: one of the five canonical CRUD operations or a custom one
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Destroy,
    Custom(String),
}

impl Action {
    pub const CANONICAL: [Action; 5] = [
        Action::List,
        Action::Retrieve,
        Action::Create,
        Action::Update,
        Action::Destroy,
    ];

    /// Parse a configured action name, rejecting custom names that are not
    /// lowercase slugs (`[a-z0-9_-]+`).
    pub fn parse_name(name: &str) -> Result<Self, PolicyError> {
        let action = Action::from(name);
        if let Action::Custom(ref custom) = action {
            let valid = !custom.is_empty()
                && custom
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-');
            if !valid {
                return Err(PolicyError::InvalidActionName(name.to_string()));
            }
        }
        Ok(action)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Action::List => "list",
            Action::Retrieve => "retrieve",
            Action::Create => "create",
            Action::Update => "update",
            Action::Destroy => "destroy",
            Action::Custom(name) => name,
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Action::Custom(_))
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        match name {
            "list" => Action::List,
            "retrieve" => Action::Retrieve,
            "create" => Action::Create,
            "update" => Action::Update,
            "destroy" => Action::Destroy,
            other => Action::Custom(other.to_string()),
        }
    }
}

impl FromStr for Action {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::parse_name(s)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-request input to every policy decision
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id for logs
    pub request_id: Uuid,
    /// Raw verb, retained for routing
    pub method: Method,
    pub principal: Principal,
    pub action: Action,
}

impl RequestContext {
    pub fn new(method: Method, principal: Principal, action: Action) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            principal,
            action,
        }
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn method_class(&self) -> MethodClass {
        MethodClass::of(&self.method)
    }

    pub fn is_safe(&self) -> bool {
        self.method_class().is_safe()
    }
}

/// Opaque handle to a single domain object, as seen by object-level policies
pub trait ResourceInstance: Send + Sync {
    /// Principal that owns the instance, if any
    fn owner_id(&self) -> Option<Uuid>;

    /// Store identifier; `None` for instances not yet persisted
    fn instance_id(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_classification() {
        assert_eq!(MethodClass::of(&Method::GET), MethodClass::ReadSafe);
        assert_eq!(MethodClass::of(&Method::HEAD), MethodClass::ReadSafe);
        assert_eq!(MethodClass::of(&Method::OPTIONS), MethodClass::ReadSafe);
        assert_eq!(MethodClass::of(&Method::POST), MethodClass::Write);
        assert_eq!(MethodClass::of(&Method::PATCH), MethodClass::Write);
        assert_eq!(MethodClass::of(&Method::DELETE), MethodClass::Write);
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Action::from("retrieve"), Action::Retrieve);
        assert_eq!(Action::from("publish"), Action::Custom("publish".to_string()));
        assert_eq!(Action::parse_name("set-password").unwrap().as_str(), "set-password");
        assert!(Action::parse_name("").is_err());
        assert!(Action::parse_name("Publish Now").is_err());
    }

    #[test]
    fn test_group_membership() {
        let principal = Principal::authenticated(Uuid::new_v4()).with_groups(["editors", "staff"]);
        let required: BTreeSet<String> = ["admins".to_string(), "staff".to_string()].into();
        assert!(principal.is_member_of_any(&required));
        assert!(!Principal::anonymous().is_member_of_any(&required));
    }
}
