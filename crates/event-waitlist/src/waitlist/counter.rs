use serde::{Deserialize, Serialize};

use super::domain::ResourceId;
use super::repository::RepositoryError;

/// Read-side view over persisted submissions for one resource.
///
/// The two counts are independent reads. Nothing ties them to each other or to a concurrent
/// write, so callers treat a [`PoolCounts`] as a snapshot that may already be stale.
pub trait CapacityCounter: Send + Sync {
    fn count_waitlisted(&self, resource: &ResourceId) -> Result<u64, RepositoryError>;
    fn count_not_waitlisted(&self, resource: &ResourceId) -> Result<u64, RepositoryError>;

    fn snapshot(&self, resource: &ResourceId) -> Result<PoolCounts, RepositoryError> {
        let waitlisted = self.count_waitlisted(resource)?;
        let not_waitlisted = self.count_not_waitlisted(resource)?;
        Ok(PoolCounts {
            waitlisted,
            not_waitlisted,
        })
    }
}

/// Point-in-time pool sizes for a resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCounts {
    pub waitlisted: u64,
    pub not_waitlisted: u64,
}

impl PoolCounts {
    pub const fn new(waitlisted: u64, not_waitlisted: u64) -> Self {
        Self {
            waitlisted,
            not_waitlisted,
        }
    }

    pub const fn total(&self) -> u64 {
        self.waitlisted.saturating_add(self.not_waitlisted)
    }
}
