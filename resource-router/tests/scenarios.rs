//! End-to-end dispatch scenarios
//!
//! A recording store captures every store call in order so the tests can
//! assert that no mutation happens before both policy checks pass.

use async_trait::async_trait;
use auth_policy::*;
use error_common::{Classified, ErrorKind};
use futures::stream::BoxStream;
use http::Method;
use parking_lot::Mutex;
use resource_router::*;
use serde_json::{json, Value};
use std::result::Result;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Fetch(String),
    List,
    Create,
    Update(String),
    Delete(String),
}

/// Store wrapper that records the call sequence
struct RecordingStore {
    inner: InMemoryStore,
    calls: Mutex<Vec<Call>>,
}

impl RecordingStore {
    fn new(inner: InMemoryStore) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ResourceStore for RecordingStore {
    async fn fetch(&self, id: &str) -> Result<Record, StoreError> {
        self.record(Call::Fetch(id.to_string()));
        self.inner.fetch(id).await
    }

    fn list(&self) -> BoxStream<'static, Result<Record, StoreError>> {
        self.record(Call::List);
        self.inner.list()
    }

    async fn create(&self, record: NewRecord) -> Result<Record, StoreError> {
        self.record(Call::Create);
        self.inner.create(record).await
    }

    async fn update(&self, id: &str, payload: Value) -> Result<Record, StoreError> {
        self.record(Call::Update(id.to_string()));
        self.inner.update(id, payload).await
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.record(Call::Delete(id.to_string()));
        self.inner.delete(id).await
    }
}

#[derive(Debug, Default)]
struct Counters {
    request_checks: AtomicUsize,
    object_checks: AtomicUsize,
}

/// Counts evaluations and defers to OwnerOrSafe
#[derive(Debug, Clone)]
struct CountingOwner(Arc<Counters>);

impl Policy for CountingOwner {
    fn name(&self) -> &str {
        "counting_owner"
    }

    fn evaluate_request(&self, ctx: &RequestContext) -> bool {
        self.0.request_checks.fetch_add(1, Ordering::SeqCst);
        OwnerOrSafe.evaluate_request(ctx)
    }

    fn evaluate_object(&self, ctx: &RequestContext, instance: &dyn ResourceInstance) -> bool {
        self.0.object_checks.fetch_add(1, Ordering::SeqCst);
        OwnerOrSafe.evaluate_object(ctx, instance)
    }

    fn restricts_objects(&self) -> bool {
        true
    }
}

fn seeded(owner: Uuid) -> InMemoryStore {
    let store = InMemoryStore::new();
    for (id, title) in [("x", "Ward rounds"), ("y", "Discharge notes")] {
        store.insert(Record {
            id: id.to_string(),
            owner_id: Some(owner),
            data: json!({ "title": title }),
        });
    }
    store
}

fn layered_policy() -> ResourcePolicy {
    ResourcePolicy::per_action(
        ActionPolicyMap::new()
            .with_action(Action::List, PolicySet::single(Open))
            .with_action(Action::Retrieve, PolicySet::single(Authenticated))
            .with_action(Action::Create, PolicySet::single(Privileged))
            .with_default(PolicySet::single(Authenticated).and(OwnerOrSafe)),
    )
}

#[tokio::test]
async fn anonymous_list_on_open_action_returns_full_listing() {
    let store = RecordingStore::new(seeded(Uuid::new_v4()));
    let mut router = ResourceRouter::new();
    router
        .register(ResourceRegistration::new("notes", store.clone(), layered_policy()))
        .unwrap();

    let outcome = router
        .handle(ResourceRequest::new(Method::GET, "/notes/", Principal::anonymous()))
        .await
        .unwrap();
    let Outcome::Listing(listing) = outcome else {
        panic!("expected a listing");
    };

    let first = listing.collect().await.unwrap();
    assert_eq!(first.len(), 2);
    // Restartable: a second pass sees the same records
    let second = listing.collect().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(store.calls(), vec![Call::List, Call::List]);
}

#[tokio::test]
async fn non_privileged_create_is_denied_before_store_create() {
    let store = RecordingStore::new(InMemoryStore::new());
    let mut router = ResourceRouter::new();
    router
        .register(ResourceRegistration::new("notes", store.clone(), layered_policy()))
        .unwrap();

    let err = router
        .handle(
            ResourceRequest::new(Method::POST, "/notes/", Principal::authenticated(Uuid::new_v4()))
                .with_payload(json!({ "title": "Intake" })),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    match err {
        DispatchError::Unauthorized { denial, .. } => assert_eq!(denial.policy, "privileged"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn owner_patch_updates_once_after_one_fetch_and_one_object_check() {
    let owner = Uuid::new_v4();
    let store = RecordingStore::new(seeded(owner));
    let counter = Arc::new(Counters::default());
    let mut router = ResourceRouter::new();
    router
        .register(ResourceRegistration::new(
            "notes",
            store.clone(),
            ResourcePolicy::fixed(PolicySet::single(AuthenticatedOrSafe).and(CountingOwner(Arc::clone(&counter)))),
        ))
        .unwrap();

    let outcome = router
        .handle(
            ResourceRequest::new(Method::PATCH, "/notes/x/", Principal::authenticated(owner))
                .with_payload(json!({ "title": "Ward rounds (am)" })),
        )
        .await
        .unwrap();

    let Outcome::Instance(record) = outcome else {
        panic!("expected an instance");
    };
    assert_eq!(record.data, json!({ "title": "Ward rounds (am)" }));
    assert_eq!(store.calls(), vec![Call::Fetch("x".into()), Call::Update("x".into())]);
    assert_eq!(counter.object_checks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_owner_delete_is_forbidden_without_store_delete() {
    let store = RecordingStore::new(seeded(Uuid::new_v4()));
    let mut router = ResourceRouter::new();
    router
        .register(ResourceRegistration::new(
            "notes",
            store.clone(),
            ResourcePolicy::fixed(PolicySet::single(AuthenticatedOrSafe).and(OwnerOrSafe)),
        ))
        .unwrap();

    let err = router
        .handle(ResourceRequest::new(
            Method::DELETE,
            "/notes/y/",
            Principal::authenticated(Uuid::new_v4()),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert_eq!(store.calls(), vec![Call::Fetch("y".into())]);
}

#[tokio::test]
async fn unregistered_path_is_not_found_without_policy_evaluation() {
    let counter = Arc::new(Counters::default());
    let mut router = ResourceRouter::new();
    router
        .register(ResourceRegistration::new(
            "notes",
            Arc::new(InMemoryStore::new()),
            ResourcePolicy::fixed(PolicySet::single(CountingOwner(Arc::clone(&counter)))),
        ))
        .unwrap();

    let err = router
        .handle(ResourceRequest::new(Method::GET, "/widgets/", Principal::anonymous()))
        .await
        .unwrap_err();

    assert!(matches!(err, DispatchError::RouteNotFound { .. }));
    assert_eq!(counter.request_checks.load(Ordering::SeqCst), 0);
    assert_eq!(counter.object_checks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_instance_is_not_found_after_request_check() {
    let store = RecordingStore::new(InMemoryStore::new());
    let mut router = ResourceRouter::new();
    router
        .register(ResourceRegistration::new("notes", store.clone(), layered_policy()))
        .unwrap();

    // Anonymous: the request-level denial wins over the missing instance
    let err = router
        .handle(ResourceRequest::new(Method::GET, "/notes/ghost/", Principal::anonymous()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(store.calls().is_empty());

    let err = router
        .handle(ResourceRequest::new(
            Method::GET,
            "/notes/ghost/",
            Principal::authenticated(Uuid::new_v4()),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(store.calls(), vec![Call::Fetch("ghost".into())]);
}

#[tokio::test]
async fn create_validation_error_is_propagated_unchanged() {
    let store = RecordingStore::new(InMemoryStore::new().with_required_fields(["title"]));
    let admin = Principal::authenticated(Uuid::new_v4()).privileged();
    let mut router = ResourceRouter::new();
    router
        .register(ResourceRegistration::new("notes", store.clone(), layered_policy()))
        .unwrap();

    let err = router
        .handle(ResourceRequest::new(Method::POST, "/notes/", admin.clone()).with_payload(json!({ "body": "x" })))
        .await
        .unwrap_err();
    match err {
        DispatchError::Validation { field_errors, .. } => assert!(field_errors.contains_key("title")),
        other => panic!("unexpected error: {other:?}"),
    }

    let outcome = router
        .handle(ResourceRequest::new(Method::POST, "/notes/", admin.clone()).with_payload(json!({ "title": "Intake" })))
        .await
        .unwrap();
    let Outcome::Instance(created) = outcome else {
        panic!("expected an instance");
    };
    assert_eq!(created.owner_id, admin.id);
    assert_eq!(store.calls(), vec![Call::Create, Call::Create]);
}

#[tokio::test]
async fn update_validation_error_is_propagated_after_both_checks() {
    let owner = Uuid::new_v4();
    let store = RecordingStore::new(seeded(owner));
    let mut router = ResourceRouter::new();
    router
        .register(ResourceRegistration::new("notes", store.clone(), layered_policy()))
        .unwrap();

    let err = router
        .handle(ResourceRequest::new(Method::PATCH, "/notes/x/", Principal::authenticated(owner)).with_payload(json!([1])))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationError);
    assert!(matches!(err, DispatchError::Validation { ref message, .. } if message == "payload must be a JSON object"));
    assert_eq!(store.calls(), vec![Call::Fetch("x".into()), Call::Update("x".into())]);
}

struct Archive;

#[async_trait]
impl CustomAction for Archive {
    async fn call<'a>(&self, invocation: ActionInvocation<'a>) -> Result<Outcome, DispatchError> {
        let id = invocation.id.unwrap_or_default();
        let record = invocation.retrieve(id).await?;
        Ok(Outcome::Custom(json!({ "archived": record.id })))
    }
}

#[tokio::test]
async fn custom_detail_action_runs_behind_both_checks() {
    let owner = Uuid::new_v4();
    let store = RecordingStore::new(seeded(owner));
    let counter = Arc::new(Counters::default());
    let policy = ResourcePolicy::per_action(
        ActionPolicyMap::new()
            .with_action(
                Action::Custom("archive".into()),
                PolicySet::single(Authenticated).and(CountingOwner(Arc::clone(&counter))),
            )
            .with_default(PolicySet::single(Open)),
    );
    let mut router = ResourceRouter::new();
    router
        .register(
            ResourceRegistration::new("notes", store.clone(), policy)
                .with_custom_action(CustomActionBinding::detail("archive", [Method::POST], Arc::new(Archive))),
        )
        .unwrap();

    let outcome = router
        .handle(ResourceRequest::new(Method::POST, "/notes/x/archive/", Principal::authenticated(owner)))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::Custom(ref value) if value == &json!({ "archived": "x" })));
    // The set resolved before the call is reused for the object check
    assert_eq!(counter.request_checks.load(Ordering::SeqCst), 1);
    assert_eq!(counter.object_checks.load(Ordering::SeqCst), 1);

    let err = router
        .handle(ResourceRequest::new(
            Method::POST,
            "/notes/x/archive/",
            Principal::authenticated(Uuid::new_v4()),
        ))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = router
        .handle(ResourceRequest::new(Method::POST, "/notes/x/archive/", Principal::anonymous()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
}

#[tokio::test]
async fn router_is_shareable_across_concurrent_requests() {
    let owner = Uuid::new_v4();
    let mut router = ResourceRouter::new();
    router
        .register(ResourceRegistration::new(
            "notes",
            Arc::new(seeded(owner)),
            ResourcePolicy::fixed(PolicySet::single(AuthenticatedOrSafe).and(OwnerOrSafe)),
        ))
        .unwrap();
    let router = Arc::new(router);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let router = Arc::clone(&router);
            tokio::spawn(async move {
                router
                    .handle(ResourceRequest::new(Method::GET, "/notes/x/", Principal::anonymous()))
                    .await
                    .map(|outcome| matches!(outcome, Outcome::Instance(_)))
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().unwrap());
    }
}
