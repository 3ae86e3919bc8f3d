use auth_policy::{Action, PolicyError, Principal, RequestContext};
use error_common::{log_error, ErrorContext};
use http::Method;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DispatchError, Result};
use crate::handler::CrudHandler;
use crate::registration::ResourceRegistration;
use crate::route::{ActionInvocation, Outcome, PathShape, RouteDescriptor, RouteHandler};

/// A routed request: the matched descriptor plus the id captured from the path
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub descriptor: Arc<RouteDescriptor>,
    pub id: Option<String>,
}

/// Input from the host transport layer
#[derive(Debug, Clone)]
pub struct ResourceRequest {
    pub request_id: Uuid,
    pub method: Method,
    pub path: String,
    pub principal: Principal,
    pub payload: Option<Value>,
}

impl ResourceRequest {
    pub fn new(method: Method, path: impl Into<String>, principal: Principal) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            method,
            path: path.into(),
            principal,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }
}

struct RegisteredResource {
    handler: Arc<CrudHandler>,
    routes: Vec<Arc<RouteDescriptor>>,
}

/// Route table for every registered resource.
///
/// Registration takes `&mut self` and happens once at startup; afterwards the
/// router is read-only and can be shared behind an `Arc` by any number of
/// concurrent callers.
#[derive(Default)]
pub struct ResourceRouter {
    resources: BTreeMap<String, RegisteredResource>,
}

fn canonical_methods(action: &Action) -> Vec<Method> {
    match action {
        Action::List | Action::Retrieve => vec![Method::GET, Method::HEAD],
        Action::Create => vec![Method::POST],
        Action::Update => vec![Method::PUT, Method::PATCH],
        Action::Destroy => vec![Method::DELETE],
        Action::Custom(_) => Vec::new(),
    }
}

fn canonical_shape(action: &Action) -> PathShape {
    match action {
        Action::List | Action::Create => PathShape::Collection,
        _ => PathShape::Detail,
    }
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

impl ResourceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the canonical routes plus any custom actions for a resource.
    ///
    /// Every route's policy set is resolved here, so a configuration that
    /// leaves an action without policies fails at startup.
    pub fn register(&mut self, registration: ResourceRegistration) -> Result<()> {
        let ResourceRegistration {
            name,
            store,
            policy,
            custom_actions,
            options,
        } = registration;

        if !is_slug(&name) {
            return Err(DispatchError::Registration(format!("invalid resource name {name:?}")));
        }
        if self.resources.contains_key(&name) {
            return Err(DispatchError::Registration(format!("resource `{name}` already registered")));
        }

        let mut routes = Vec::with_capacity(Action::CANONICAL.len() + custom_actions.len());
        for action in Action::CANONICAL {
            let policies = Arc::clone(policy.resolve(&action)?);
            routes.push(Arc::new(RouteDescriptor {
                resource: name.clone(),
                methods: canonical_methods(&action),
                shape: canonical_shape(&action),
                handler: RouteHandler::Crud,
                policies,
                action,
            }));
        }

        let mut seen_actions = HashSet::new();
        let mut seen_shapes = HashSet::new();
        for binding in custom_actions {
            let action = Action::parse_name(binding.action.as_str())?;
            if action.is_canonical() {
                return Err(DispatchError::Registration(format!(
                    "custom action `{action}` on `{name}` shadows a canonical action"
                )));
            }
            if !is_slug(&binding.suffix) {
                return Err(DispatchError::Registration(format!(
                    "invalid path suffix {:?} for `{name}/{action}`",
                    binding.suffix
                )));
            }
            if binding.methods.is_empty() {
                return Err(DispatchError::Registration(format!(
                    "custom action `{name}/{action}` declares no methods"
                )));
            }
            let shape = binding.shape();
            if !seen_actions.insert(action.clone()) || !seen_shapes.insert(shape.clone()) {
                return Err(PolicyError::DuplicateAction(format!("{name}/{action}")).into());
            }
            let policies = Arc::clone(policy.resolve(&action)?);
            routes.push(Arc::new(RouteDescriptor {
                resource: name.clone(),
                action,
                methods: binding.methods,
                shape,
                handler: RouteHandler::Custom(binding.handler),
                policies,
            }));
        }

        info!(
            resource = %name,
            mode = ?policy.mode(),
            routes = routes.len(),
            "Registered resource"
        );

        let handler = Arc::new(CrudHandler::new(name.clone(), store, policy, options));
        self.resources.insert(name, RegisteredResource { handler, routes });
        Ok(())
    }

    /// Match `(method, path)` against the installed table.
    ///
    /// Read-only; repeated calls with the same arguments return the same
    /// descriptor `Arc`.
    pub fn dispatch(&self, method: &Method, path: &str) -> Result<RouteMatch> {
        let found = self.lookup(method, path);
        if found.is_none() {
            debug!(%method, path, "No route");
        }
        found.ok_or_else(|| DispatchError::RouteNotFound {
            method: method.clone(),
            path: path.to_string(),
        })
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        // At most one leading and one trailing slash; anything more leaves an empty segment
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return None;
        }
        let segments: Vec<&str> = trimmed.split('/').collect();
        if segments.iter().any(|segment| segment.is_empty()) {
            return None;
        }
        let (resource_name, rest) = segments.split_first()?;
        let resource = self.resources.get(*resource_name)?;

        let find = |shape: &PathShape, id: Option<&str>| {
            resource
                .routes
                .iter()
                .find(|route| route.shape == *shape && route.accepts(method))
                .map(|route| RouteMatch {
                    descriptor: Arc::clone(route),
                    id: id.map(str::to_string),
                })
        };

        match rest {
            [] => find(&PathShape::Collection, None),
            [segment] => {
                let action_shape = PathShape::CollectionAction((*segment).to_string());
                // A declared collection suffix is never reinterpreted as an id
                if resource.routes.iter().any(|route| route.shape == action_shape) {
                    find(&action_shape, None)
                } else {
                    find(&PathShape::Detail, Some(*segment))
                }
            }
            [id, suffix] => find(&PathShape::DetailAction((*suffix).to_string()), Some(*id)),
            _ => None,
        }
    }

    pub fn handler(&self, resource: &str) -> Option<&Arc<CrudHandler>> {
        self.resources.get(resource).map(|entry| &entry.handler)
    }

    fn handler_for(&self, resource: &str) -> Result<&Arc<CrudHandler>> {
        self.handler(resource).ok_or_else(|| {
            DispatchError::Registration(format!("route refers to unregistered resource `{resource}`"))
        })
    }

    /// Every installed route, grouped by resource name
    pub fn routes(&self) -> impl Iterator<Item = &Arc<RouteDescriptor>> {
        self.resources.values().flat_map(|entry| entry.routes.iter())
    }

    pub fn resource_names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    /// Route and run the request-level check without touching the store
    pub fn preflight(
        &self,
        method: &Method,
        path: &str,
        principal: Principal,
    ) -> Result<(RequestContext, RouteMatch)> {
        let route = self.dispatch(method, path)?;
        let ctx = RequestContext::new(method.clone(), principal, route.descriptor.action.clone());
        self.handler_for(&route.descriptor.resource)?.authorize(&ctx)?;
        Ok((ctx, route))
    }

    /// Full dispatch: route, resolve, check, execute.
    pub async fn handle(&self, request: ResourceRequest) -> Result<Outcome> {
        let ResourceRequest {
            request_id,
            method,
            path,
            principal,
            payload,
        } = request;

        let route = self.dispatch(&method, &path)?;
        let ctx = RequestContext::new(method, principal, route.descriptor.action.clone())
            .with_request_id(request_id);

        let result = self.execute(&ctx, &route, payload).await;
        if let Err(ref err) = result {
            let context = ErrorContext::new()
                .with_request_id(ctx.request_id)
                .with_user_id(ctx.principal.id)
                .with_resource(route.descriptor.resource.as_str())
                .with_action(ctx.action.as_str());
            log_error(&context, err);
        }
        result
    }

    async fn execute(
        &self,
        ctx: &RequestContext,
        route: &RouteMatch,
        payload: Option<Value>,
    ) -> Result<Outcome> {
        let handler = self.handler_for(&route.descriptor.resource)?;
        let id = route.id.as_deref();

        match &route.descriptor.handler {
            RouteHandler::Crud => match (&ctx.action, id) {
                (Action::List, None) => handler.list(ctx).map(Outcome::Listing),
                (Action::Create, None) => handler
                    .create(ctx, payload.unwrap_or(Value::Null))
                    .await
                    .map(Outcome::Instance),
                (Action::Retrieve, Some(id)) => handler.retrieve(ctx, id).await.map(Outcome::Instance),
                (Action::Update, Some(id)) => handler
                    .update(ctx, id, payload.unwrap_or(Value::Null))
                    .await
                    .map(Outcome::Instance),
                (Action::Destroy, Some(id)) => handler.destroy(ctx, id).await.map(|()| Outcome::Deleted),
                (action, _) => Err(DispatchError::Registration(format!(
                    "no generic handler for `{}/{action}`",
                    route.descriptor.resource
                ))),
            },
            RouteHandler::Custom(custom) => {
                let policies = handler.authorize(ctx)?;
                custom
                    .call(ActionInvocation {
                        ctx,
                        id,
                        payload,
                        policies: policies.as_ref(),
                        crud: handler.as_ref(),
                    })
                    .await
            }
        }
    }
}
