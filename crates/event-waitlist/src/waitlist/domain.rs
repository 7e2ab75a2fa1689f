use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of the capacity-limited entity submissions compete for.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub String);

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Monotonic submission identifier; ordering follows creation order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of an operator invoking manual waitlist actions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

/// Incoming submission before persistence.
///
/// `source` is the resource the submission was made against. `route_override` carries a
/// route-scoped resource (for example a group listing) that takes precedence when present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    #[serde(default)]
    pub source: Option<ResourceId>,
    #[serde(default)]
    pub route_override: Option<ResourceId>,
    #[serde(default)]
    pub values: BTreeMap<String, String>,
}

impl SubmissionRequest {
    pub fn for_resource(resource: impl Into<String>) -> Self {
        Self {
            source: Some(ResourceId(resource.into())),
            ..Self::default()
        }
    }
}

/// Persisted submission row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    pub resource_id: Option<ResourceId>,
    pub is_waitlisted: bool,
    pub created_at: DateTime<Utc>,
    pub values: BTreeMap<String, String>,
}

impl SubmissionRecord {
    /// Pool membership; `None` for submissions outside the waitlist mechanism.
    pub fn pool(&self) -> Option<Pool> {
        self.resource_id
            .as_ref()
            .map(|_| Pool::from_flag(self.is_waitlisted))
    }

    pub fn status_view(&self) -> SubmissionStatusView {
        SubmissionStatusView {
            submission_id: self.id,
            resource_id: self.resource_id.clone(),
            pool: self.pool().map(Pool::label),
            is_waitlisted: self.is_waitlisted,
            created_at: self.created_at,
        }
    }
}

/// The two pools an accepted submission can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    Accepted,
    Waitlisted,
}

impl Pool {
    pub const fn from_flag(is_waitlisted: bool) -> Self {
        if is_waitlisted {
            Pool::Waitlisted
        } else {
            Pool::Accepted
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Pool::Accepted => "accepted",
            Pool::Waitlisted => "waitlisted",
        }
    }
}

/// Public projection of a submission row.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionStatusView {
    pub submission_id: SubmissionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<ResourceId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<&'static str>,
    pub is_waitlisted: bool,
    pub created_at: DateTime<Utc>,
}
