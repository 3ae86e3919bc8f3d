use anyhow::{Context, Result};
use auth_policy::Principal;
use config_engine::{ConfigEngine, GuardConfig};
use error_common::{Classified, ErrorKind};
use http::Method;
use resource_router::{InMemoryStore, ResourceRegistration, ResourceRouter};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

pub fn load_config(path: &Path) -> Result<GuardConfig> {
    ConfigEngine::new()
        .with_file(path)
        .load()
        .with_context(|| format!("failed to load {}", path.display()))
}

/// Register every configured resource against an empty in-memory store.
pub fn build_router(config: &GuardConfig) -> Result<ResourceRouter> {
    let compiled = config.compile().context("policy configuration is invalid")?;
    let mut router = ResourceRouter::new();
    for (name, policy) in compiled {
        let registration = ResourceRegistration::new(name.clone(), Arc::new(InMemoryStore::new()), policy);
        router
            .register(registration)
            .with_context(|| format!("failed to register resource `{name}`"))?;
    }
    Ok(router)
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub resources: usize,
    pub issues: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }
}

pub fn validate(config: &GuardConfig) -> ValidationReport {
    let issues: Vec<String> = config.validate().iter().map(ToString::to_string).collect();
    info!(resources = config.resources.len(), issues = issues.len(), "Validated configuration");
    ValidationReport {
        resources: config.resources.len(),
        issues,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRow {
    pub methods: Vec<String>,
    pub path: String,
    pub action: String,
    pub policies: Vec<String>,
}

pub fn route_table(router: &ResourceRouter) -> Vec<RouteRow> {
    router
        .routes()
        .map(|route| RouteRow {
            methods: route.methods.iter().map(ToString::to_string).collect(),
            path: route.path(),
            action: route.action.to_string(),
            policies: route.policies.names().into_iter().map(str::to_string).collect(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Allow {
        resource: String,
        action: String,
        policies: Vec<String>,
    },
    Deny {
        kind: ErrorKind,
        code: String,
        message: String,
    },
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow { .. })
    }
}

/// Route and evaluate request-level policies only; no store is touched.
pub fn check(router: &ResourceRouter, method: &Method, path: &str, principal: Principal) -> Verdict {
    match router.preflight(method, path, principal) {
        Ok((ctx, route)) => Verdict::Allow {
            resource: route.descriptor.resource.clone(),
            action: ctx.action.to_string(),
            policies: route.descriptor.policies.names().into_iter().map(str::to_string).collect(),
        },
        Err(err) => {
            debug!(%method, path, error = %err, "Check denied");
            Verdict::Deny {
                kind: err.kind(),
                code: err.code().to_string(),
                message: err.to_string(),
            }
        }
    }
}
