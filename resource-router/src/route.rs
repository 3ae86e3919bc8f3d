use async_trait::async_trait;
use auth_policy::{Action, PolicySet, RequestContext};
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use http::Method;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{DispatchError, Result};
use crate::handler::CrudHandler;
use crate::store::{Record, ResourceStore};

/// Shape of the path a route answers on, relative to the resource root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathShape {
    /// `/{resource}`
    Collection,
    /// `/{resource}/{id}`
    Detail,
    /// `/{resource}/{suffix}`
    CollectionAction(String),
    /// `/{resource}/{id}/{suffix}`
    DetailAction(String),
}

impl PathShape {
    pub fn render(&self, resource: &str) -> String {
        match self {
            PathShape::Collection => format!("/{resource}/"),
            PathShape::Detail => format!("/{resource}/{{id}}/"),
            PathShape::CollectionAction(suffix) => format!("/{resource}/{suffix}/"),
            PathShape::DetailAction(suffix) => format!("/{resource}/{{id}}/{suffix}/"),
        }
    }

    pub fn needs_id(&self) -> bool {
        matches!(self, PathShape::Detail | PathShape::DetailAction(_))
    }
}

/// Whether a custom action addresses the collection or a single instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionScope {
    Collection,
    Detail,
}

/// Arguments handed to a custom action
pub struct ActionInvocation<'a> {
    pub ctx: &'a RequestContext,
    pub id: Option<&'a str>,
    pub payload: Option<Value>,
    /// Set that already passed the request-level check for this call
    pub policies: &'a PolicySet,
    /// Object-checked access to the resource's store
    pub crud: &'a CrudHandler,
}

impl ActionInvocation<'_> {
    /// Fetch `id` and run the object-level check without repeating the
    /// request-level one.
    pub async fn retrieve(&self, id: &str) -> Result<Record> {
        self.crud.retrieve_checked(self.policies, self.ctx, id).await
    }
}

/// Handler for a custom action. Runs after the request-level check has
/// passed; use [`ActionInvocation::retrieve`] to opt into the object-level check.
#[async_trait]
pub trait CustomAction: Send + Sync {
    async fn call<'a>(&self, invocation: ActionInvocation<'a>) -> Result<Outcome>;
}

#[derive(Clone)]
pub enum RouteHandler {
    Crud,
    Custom(Arc<dyn CustomAction>),
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteHandler::Crud => f.write_str("Crud"),
            RouteHandler::Custom(_) => f.write_str("Custom(<handler>)"),
        }
    }
}

/// One installed route. Created at registration, immutable thereafter.
#[derive(Debug, Clone)]
pub struct RouteDescriptor {
    pub resource: String,
    pub action: Action,
    pub methods: Vec<Method>,
    pub shape: PathShape,
    pub handler: RouteHandler,
    /// Effective policy set resolved for `action` at registration
    pub policies: Arc<PolicySet>,
}

impl RouteDescriptor {
    pub fn accepts(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    pub fn path(&self) -> String {
        self.shape.render(&self.resource)
    }
}

/// Result of a successful dispatch
#[derive(Debug)]
pub enum Outcome {
    Listing(Listing),
    Instance(Record),
    Deleted,
    Custom(Value),
}

/// Lazy, restartable listing over a store. Each `stream()` starts a new pass.
#[derive(Clone)]
pub struct Listing {
    resource: String,
    store: Arc<dyn ResourceStore>,
}

impl Listing {
    pub(crate) fn new(resource: String, store: Arc<dyn ResourceStore>) -> Self {
        Self { resource, store }
    }

    pub fn stream(&self) -> BoxStream<'static, Result<Record>> {
        let resource = self.resource.clone();
        self.store
            .list()
            .map_err(move |err| DispatchError::from_store(&resource, err))
            .boxed()
    }

    pub async fn collect(&self) -> Result<Vec<Record>> {
        self.stream().try_collect().await
    }
}

impl fmt::Debug for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listing")
            .field("resource", &self.resource)
            .field("store", &"<ResourceStore>")
            .finish()
    }
}
