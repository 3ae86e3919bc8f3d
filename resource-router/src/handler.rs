//! Generic CRUD handler
//!
//! Implements the five canonical operations against an abstract store.
//! Ordering is fixed for every operation: the request-level check precedes
//! any store access, and the object-level check runs strictly after the
//! fetch and strictly before the mutation.

use auth_policy::{PolicySet, RequestContext, ResourcePolicy};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::error::{DispatchError, Result};
use crate::registration::ResourceOptions;
use crate::route::Listing;
use crate::store::{NewRecord, Record, ResourceStore};

pub struct CrudHandler {
    resource: String,
    store: Arc<dyn ResourceStore>,
    policy: ResourcePolicy,
    options: ResourceOptions,
}

impl CrudHandler {
    pub fn new(
        resource: impl Into<String>,
        store: Arc<dyn ResourceStore>,
        policy: ResourcePolicy,
        options: ResourceOptions,
    ) -> Self {
        Self {
            resource: resource.into(),
            store,
            policy,
            options,
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn policy(&self) -> &ResourcePolicy {
        &self.policy
    }

    /// Resolve the effective set for `ctx.action` and run the request-level check
    pub fn authorize(&self, ctx: &RequestContext) -> Result<&Arc<PolicySet>> {
        let set = self.policy.resolve_for(ctx)?;
        set.check_request(ctx)
            .map_err(|denial| DispatchError::Unauthorized {
                resource: self.resource.clone(),
                action: ctx.action.to_string(),
                denial,
            })?;
        Ok(set)
    }

    fn check_object(
        &self,
        set: &PolicySet,
        ctx: &RequestContext,
        instance: &dyn auth_policy::ResourceInstance,
    ) -> Result<()> {
        set.check_object(ctx, instance)
            .map_err(|denial| DispatchError::Forbidden {
                resource: self.resource.clone(),
                action: ctx.action.to_string(),
                denial,
            })
    }

    /// Fetch then object-check, once per fetched instance
    async fn fetch_checked(&self, set: &PolicySet, ctx: &RequestContext, id: &str) -> Result<Record> {
        let record = self
            .store
            .fetch(id)
            .await
            .map_err(|err| DispatchError::from_store(&self.resource, err))?;
        self.check_object(set, ctx, &record)?;
        Ok(record)
    }

    /// Request-level check only; no instances exist yet to check.
    pub fn list(&self, ctx: &RequestContext) -> Result<Listing> {
        self.authorize(ctx)?;
        debug!(request_id = %ctx.request_id, resource = %self.resource, "Listing");
        Ok(Listing::new(self.resource.clone(), Arc::clone(&self.store)))
    }

    pub async fn retrieve(&self, ctx: &RequestContext, id: &str) -> Result<Record> {
        let set = self.authorize(ctx)?;
        self.fetch_checked(set, ctx, id).await
    }

    /// Fetch and object-check under a set that has already passed the
    /// request-level check for `ctx`.
    pub async fn retrieve_checked(&self, set: &PolicySet, ctx: &RequestContext, id: &str) -> Result<Record> {
        self.fetch_checked(set, ctx, id).await
    }

    /// Request-level check, then the store validates and persists. The new
    /// record is owned by the caller unless the resource opts out.
    pub async fn create(&self, ctx: &RequestContext, payload: Value) -> Result<Record> {
        let set = self.authorize(ctx)?;
        let owner_id = if self.options.owner_from_principal {
            ctx.principal.id
        } else {
            None
        };
        let record = NewRecord {
            owner_id,
            data: payload,
        };
        if self.options.object_check_on_create {
            self.check_object(set, ctx, &record)?;
        }
        let created = self
            .store
            .create(record)
            .await
            .map_err(|err| DispatchError::from_store(&self.resource, err))?;
        debug!(request_id = %ctx.request_id, resource = %self.resource, id = %created.id, "Created");
        Ok(created)
    }

    pub async fn update(&self, ctx: &RequestContext, id: &str, payload: Value) -> Result<Record> {
        let set = self.authorize(ctx)?;
        self.fetch_checked(set, ctx, id).await?;
        let updated = self
            .store
            .update(id, payload)
            .await
            .map_err(|err| DispatchError::from_store(&self.resource, err))?;
        debug!(request_id = %ctx.request_id, resource = %self.resource, id, "Updated");
        Ok(updated)
    }

    pub async fn destroy(&self, ctx: &RequestContext, id: &str) -> Result<()> {
        let set = self.authorize(ctx)?;
        self.fetch_checked(set, ctx, id).await?;
        self.store
            .delete(id)
            .await
            .map_err(|err| DispatchError::from_store(&self.resource, err))?;
        debug!(request_id = %ctx.request_id, resource = %self.resource, id, "Destroyed");
        Ok(())
    }
}
