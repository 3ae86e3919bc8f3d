use async_trait::async_trait;
use auth_policy::ResourceInstance;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// A stored instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub owner_id: Option<Uuid>,
    pub data: Value,
}

impl ResourceInstance for Record {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }

    fn instance_id(&self) -> Option<&str> {
        Some(&self.id)
    }
}

/// A record about to be created. Object-checkable before it exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    pub owner_id: Option<Uuid>,
    pub data: Value,
}

impl ResourceInstance for NewRecord {
    fn owner_id(&self) -> Option<Uuid> {
        self.owner_id
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Record not found: {id}")]
    NotFound { id: String },

    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field_errors: BTreeMap<String, Vec<String>>,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation {
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }
}

/// Storage capability consumed by the CRUD handler.
///
/// Every call is an atomic black box to the handler; isolation and retries
/// belong to the implementation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Record, StoreError>;

    /// Lazy, finite listing. Each call starts a fresh pass.
    fn list(&self) -> BoxStream<'static, Result<Record, StoreError>>;

    async fn create(&self, record: NewRecord) -> Result<Record, StoreError>;

    async fn update(&self, id: &str, payload: Value) -> Result<Record, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
