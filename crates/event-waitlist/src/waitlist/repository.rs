use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;

use super::counter::CapacityCounter;
use super::domain::{ResourceId, SubmissionId, SubmissionRecord, SubmissionRequest};

/// Error enumeration for storage failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Persistence of submission rows, owned outside the waitlist core.
pub trait SubmissionRepository: Send + Sync {
    /// Create a row for `resource`; new rows always start outside the waitlist.
    fn insert(
        &self,
        resource: Option<ResourceId>,
        request: &SubmissionRequest,
    ) -> Result<SubmissionRecord, RepositoryError>;
    fn fetch(&self, id: SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError>;
    fn for_resource(&self, resource: &ResourceId)
        -> Result<Vec<SubmissionRecord>, RepositoryError>;
}

/// Targeted single-row writes of the waitlist flag.
pub trait MembershipStore: Send + Sync {
    fn set_waitlisted(&self, id: SubmissionId, waitlisted: bool) -> Result<(), RepositoryError>;
}

/// Everything the service needs from storage.
pub trait SubmissionStore: SubmissionRepository + CapacityCounter + MembershipStore {}

impl<T> SubmissionStore for T where T: SubmissionRepository + CapacityCounter + MembershipStore {}

#[derive(Debug, Default)]
struct StoreState {
    next_id: u64,
    rows: BTreeMap<SubmissionId, SubmissionRecord>,
}

/// Process-local submission table.
#[derive(Debug, Default)]
pub struct InMemorySubmissionStore {
    state: Mutex<StoreState>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn count_where(&self, resource: &ResourceId, waitlisted: bool) -> u64 {
        let count = self
            .state()
            .rows
            .values()
            .filter(|row| row.resource_id.as_ref() == Some(resource))
            .filter(|row| row.is_waitlisted == waitlisted)
            .count();
        u64::try_from(count).unwrap_or(u64::MAX)
    }
}

impl SubmissionRepository for InMemorySubmissionStore {
    fn insert(
        &self,
        resource: Option<ResourceId>,
        request: &SubmissionRequest,
    ) -> Result<SubmissionRecord, RepositoryError> {
        let mut state = self.state();
        state.next_id += 1;
        let id = SubmissionId(state.next_id);

        let record = SubmissionRecord {
            id,
            resource_id: resource,
            is_waitlisted: false,
            created_at: Utc::now(),
            values: request.values.clone(),
        };
        state.rows.insert(id, record.clone());
        Ok(record)
    }

    fn fetch(&self, id: SubmissionId) -> Result<Option<SubmissionRecord>, RepositoryError> {
        Ok(self.state().rows.get(&id).cloned())
    }

    fn for_resource(
        &self,
        resource: &ResourceId,
    ) -> Result<Vec<SubmissionRecord>, RepositoryError> {
        Ok(self
            .state()
            .rows
            .values()
            .filter(|row| row.resource_id.as_ref() == Some(resource))
            .cloned()
            .collect())
    }
}

impl CapacityCounter for InMemorySubmissionStore {
    fn count_waitlisted(&self, resource: &ResourceId) -> Result<u64, RepositoryError> {
        Ok(self.count_where(resource, true))
    }

    fn count_not_waitlisted(&self, resource: &ResourceId) -> Result<u64, RepositoryError> {
        Ok(self.count_where(resource, false))
    }
}

impl MembershipStore for InMemorySubmissionStore {
    fn set_waitlisted(&self, id: SubmissionId, waitlisted: bool) -> Result<(), RepositoryError> {
        let mut state = self.state();
        let row = state.rows.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        row.is_waitlisted = waitlisted;
        Ok(())
    }
}
