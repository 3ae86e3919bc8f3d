use auth_policy::{Denial, PolicyError};
use error_common::{Classified, ErrorKind};
use http::Method;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::store::StoreError;

/// Dispatch failures, in precedence order: routing, policy, store lookup, store validation
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("No route for {method} {path}")]
    RouteNotFound { method: Method, path: String },

    #[error("Unauthorized: {denial} ({resource}/{action})")]
    Unauthorized {
        resource: String,
        action: String,
        denial: Denial,
    },

    #[error("Forbidden: {denial} ({resource}/{action})")]
    Forbidden {
        resource: String,
        action: String,
        denial: Denial,
    },

    #[error("Resource not found: {resource} `{id}`")]
    InstanceNotFound { resource: String, id: String },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field_errors: BTreeMap<String, Vec<String>>,
    },

    #[error("Configuration error: {0}")]
    Configuration(#[from] PolicyError),

    #[error("Invalid registration: {0}")]
    Registration(String),

    #[error("Store error: {0}")]
    Store(#[source] anyhow::Error),
}

impl DispatchError {
    /// Translate a store failure for `resource`. Validation errors pass through unchanged.
    pub fn from_store(resource: &str, error: StoreError) -> Self {
        match error {
            StoreError::NotFound { id } => DispatchError::InstanceNotFound {
                resource: resource.to_string(),
                id,
            },
            StoreError::Validation {
                message,
                field_errors,
            } => DispatchError::Validation {
                message,
                field_errors,
            },
            StoreError::Backend(source) => DispatchError::Store(source),
        }
    }
}

impl Classified for DispatchError {
    fn kind(&self) -> ErrorKind {
        match self {
            DispatchError::RouteNotFound { .. } | DispatchError::InstanceNotFound { .. } => {
                ErrorKind::NotFound
            }
            DispatchError::Unauthorized { .. } => ErrorKind::Unauthorized,
            DispatchError::Forbidden { .. } => ErrorKind::Forbidden,
            DispatchError::Validation { .. } => ErrorKind::ValidationError,
            DispatchError::Configuration(_) | DispatchError::Registration(_) => {
                ErrorKind::ConfigurationError
            }
            DispatchError::Store(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
