use async_trait::async_trait;
use dashmap::DashMap;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::store::{NewRecord, Record, ResourceStore, StoreError};

/// In-memory resource store for testing and development
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<DashMap<String, Record>>,
    required_fields: Vec<String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject creates whose payload lacks any of `fields`
    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Seed a record directly, bypassing validation
    pub fn insert(&self, record: Record) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn validate_object(payload: &Value) -> Result<&serde_json::Map<String, Value>, StoreError> {
        payload
            .as_object()
            .ok_or_else(|| StoreError::validation("payload must be a JSON object"))
    }

    /// Required fields must be present and non-null, on create and after every merge
    fn validate_create(&self, payload: &Value) -> Result<(), StoreError> {
        let object = Self::validate_object(payload)?;
        let mut field_errors = BTreeMap::new();
        for field in &self.required_fields {
            if object.get(field).map_or(true, Value::is_null) {
                field_errors.insert(field.clone(), vec!["This field is required.".to_string()]);
            }
        }
        if field_errors.is_empty() {
            Ok(())
        } else {
            Err(StoreError::Validation {
                message: "missing required fields".to_string(),
                field_errors,
            })
        }
    }
}

#[async_trait]
impl ResourceStore for InMemoryStore {
    async fn fetch(&self, id: &str) -> Result<Record, StoreError> {
        self.records
            .get(id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }

    fn list(&self) -> BoxStream<'static, Result<Record, StoreError>> {
        let records = Arc::clone(&self.records);
        // Snapshot on first poll so the listing stays lazy
        stream::once(async move {
            let mut snapshot: Vec<Record> =
                records.iter().map(|entry| entry.value().clone()).collect();
            snapshot.sort_by(|a, b| a.id.cmp(&b.id));
            stream::iter(snapshot.into_iter().map(Ok))
        })
        .flatten()
        .boxed()
    }

    async fn create(&self, record: NewRecord) -> Result<Record, StoreError> {
        self.validate_create(&record.data)?;
        let stored = Record {
            id: Uuid::new_v4().to_string(),
            owner_id: record.owner_id,
            data: record.data,
        };
        self.records.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &str, payload: Value) -> Result<Record, StoreError> {
        let changes = Self::validate_object(&payload)?.clone();
        let mut entry = self
            .records
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })?;
        let record = entry.value_mut();
        let mut merged = record.data.as_object().cloned().unwrap_or_default();
        merged.extend(changes);
        let merged = Value::Object(merged);
        self.validate_create(&merged)?;
        record.data = merged;
        Ok(record.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound { id: id.to_string() })
    }
}
