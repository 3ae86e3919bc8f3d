use auth_policy::{Action, ResourcePolicy};
use http::Method;
use std::sync::Arc;

use crate::route::{ActionScope, CustomAction, PathShape};
use crate::store::ResourceStore;

/// Per-resource behaviour switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceOptions {
    /// Stamp the caller's id as owner of created records
    pub owner_from_principal: bool,
    /// Object-check the prospective record before `create` reaches the store
    pub object_check_on_create: bool,
}

impl Default for ResourceOptions {
    fn default() -> Self {
        Self {
            owner_from_principal: true,
            object_check_on_create: false,
        }
    }
}

/// A custom action declared on a resource
#[derive(Clone)]
pub struct CustomActionBinding {
    pub action: Action,
    pub methods: Vec<Method>,
    pub scope: ActionScope,
    pub suffix: String,
    pub handler: Arc<dyn CustomAction>,
}

impl CustomActionBinding {
    /// Bind `/{resource}/{name}`
    pub fn collection<I>(name: &str, methods: I, handler: Arc<dyn CustomAction>) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        Self::with_scope(name, methods, ActionScope::Collection, handler)
    }

    /// Bind `/{resource}/{id}/{name}`
    pub fn detail<I>(name: &str, methods: I, handler: Arc<dyn CustomAction>) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        Self::with_scope(name, methods, ActionScope::Detail, handler)
    }

    fn with_scope<I>(name: &str, methods: I, scope: ActionScope, handler: Arc<dyn CustomAction>) -> Self
    where
        I: IntoIterator<Item = Method>,
    {
        Self {
            action: Action::from(name),
            methods: methods.into_iter().collect(),
            scope,
            suffix: name.to_string(),
            handler,
        }
    }

    /// Serve the action on a path suffix other than its name
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn shape(&self) -> PathShape {
        match self.scope {
            ActionScope::Collection => PathShape::CollectionAction(self.suffix.clone()),
            ActionScope::Detail => PathShape::DetailAction(self.suffix.clone()),
        }
    }
}

/// Everything the router needs to expose one resource
pub struct ResourceRegistration {
    pub name: String,
    pub store: Arc<dyn ResourceStore>,
    pub policy: ResourcePolicy,
    pub custom_actions: Vec<CustomActionBinding>,
    pub options: ResourceOptions,
}

impl ResourceRegistration {
    pub fn new(name: impl Into<String>, store: Arc<dyn ResourceStore>, policy: ResourcePolicy) -> Self {
        Self {
            name: name.into(),
            store,
            policy,
            custom_actions: Vec::new(),
            options: ResourceOptions::default(),
        }
    }

    pub fn with_custom_action(mut self, binding: CustomActionBinding) -> Self {
        self.custom_actions.push(binding);
        self
    }

    pub fn with_options(mut self, options: ResourceOptions) -> Self {
        self.options = options;
        self
    }
}
