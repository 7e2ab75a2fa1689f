use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::waitlist::actions::{AccessResult, Authorizer, GrantTable, SubmissionPermission};
use crate::waitlist::counter::CapacityCounter;
use crate::waitlist::domain::{
    ActorId, ResourceId, SubmissionId, SubmissionRecord, SubmissionRequest,
};
use crate::waitlist::evaluation::WaitlistSettings;
use crate::waitlist::repository::{
    InMemorySubmissionStore, MembershipStore, RepositoryError, SubmissionRepository,
};
use crate::waitlist::service::WaitlistService;

pub(super) const OPERATOR: &str = "operator";
pub(super) const VIEWER: &str = "viewer";

pub(super) fn gala() -> ResourceId {
    ResourceId("gala-2025".to_string())
}

pub(super) fn operator() -> ActorId {
    ActorId(OPERATOR.to_string())
}

pub(super) fn viewer() -> ActorId {
    ActorId(VIEWER.to_string())
}

pub(super) fn settings() -> WaitlistSettings {
    WaitlistSettings::new(10, 3)
}

pub(super) fn grants() -> GrantTable {
    GrantTable::operators([operator()])
        .grant(viewer(), SubmissionPermission::Update)
}

pub(super) fn gala_request() -> SubmissionRequest {
    SubmissionRequest::for_resource(gala().0)
}

pub(super) fn build_service_with(
    settings: WaitlistSettings,
) -> (
    WaitlistService<InMemorySubmissionStore, GrantTable>,
    Arc<InMemorySubmissionStore>,
) {
    let store = Arc::new(InMemorySubmissionStore::new());
    let service = WaitlistService::new(store.clone(), Arc::new(grants()), settings);
    (service, store)
}

pub(super) fn build_service() -> (
    WaitlistService<InMemorySubmissionStore, GrantTable>,
    Arc<InMemorySubmissionStore>,
) {
    build_service_with(settings())
}

/// Insert rows directly, bypassing classification, to stage pool sizes.
pub(super) fn seed(
    store: &InMemorySubmissionStore,
    resource: &ResourceId,
    waitlisted: u64,
    not_waitlisted: u64,
) {
    let request = SubmissionRequest::default();
    for _ in 0..waitlisted {
        let record = store
            .insert(Some(resource.clone()), &request)
            .expect("seed insert");
        store.set_waitlisted(record.id, true).expect("seed flag");
    }
    for _ in 0..not_waitlisted {
        store
            .insert(Some(resource.clone()), &request)
            .expect("seed insert");
    }
}

/// Counter that reports the same snapshot regardless of store contents.
pub(super) struct FixedCounter {
    pub(super) waitlisted: u64,
    pub(super) not_waitlisted: u64,
    pub(super) reads: AtomicUsize,
}

impl FixedCounter {
    pub(super) fn new(waitlisted: u64, not_waitlisted: u64) -> Self {
        Self {
            waitlisted,
            not_waitlisted,
            reads: AtomicUsize::new(0),
        }
    }

    pub(super) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl CapacityCounter for FixedCounter {
    fn count_waitlisted(&self, _resource: &ResourceId) -> Result<u64, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.waitlisted)
    }

    fn count_not_waitlisted(&self, _resource: &ResourceId) -> Result<u64, RepositoryError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.not_waitlisted)
    }
}

/// Membership store that records writes instead of applying them.
#[derive(Default)]
pub(super) struct RecordingMembership {
    pub(super) writes: std::sync::Mutex<Vec<(SubmissionId, bool)>>,
}

impl RecordingMembership {
    pub(super) fn writes(&self) -> Vec<(SubmissionId, bool)> {
        self.writes.lock().expect("writes mutex poisoned").clone()
    }
}

impl MembershipStore for RecordingMembership {
    fn set_waitlisted(&self, id: SubmissionId, waitlisted: bool) -> Result<(), RepositoryError> {
        self.writes
            .lock()
            .expect("writes mutex poisoned")
            .push((id, waitlisted));
        Ok(())
    }
}

/// Storage whose every call fails.
pub(super) struct UnavailableStore;

impl SubmissionRepository for UnavailableStore {
    fn insert(
        &self,
        _resource: Option<ResourceId>,
        _request: &SubmissionRequest,
    ) -> Result<SubmissionRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn for_resource(
        &self,
        _resource: &ResourceId,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl CapacityCounter for UnavailableStore {
    fn count_waitlisted(&self, _resource: &ResourceId) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count_not_waitlisted(&self, _resource: &ResourceId) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

impl MembershipStore for UnavailableStore {
    fn set_waitlisted(&self, _id: SubmissionId, _waitlisted: bool) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Authorizer that forbids everything with a fixed reason.
pub(super) struct LockedDown;

impl Authorizer for LockedDown {
    fn check(
        &self,
        _actor: &ActorId,
        _submission: &SubmissionRecord,
        permission: SubmissionPermission,
    ) -> AccessResult {
        match permission {
            SubmissionPermission::EditPriority => {
                AccessResult::Forbidden("submissions are locked".to_string())
            }
            SubmissionPermission::Update => AccessResult::Allowed,
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
