//! Manual moves between pools, gated by a two-part authorization check.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ActorId, SubmissionId, SubmissionRecord};
use super::repository::{MembershipStore, RepositoryError, SubmissionRepository};

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "reason", rename_all = "snake_case")]
pub enum AccessResult {
    Allowed,
    /// No grant either way; treated as a denial by callers.
    Neutral(String),
    Forbidden(String),
}

impl AccessResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessResult::Allowed)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            AccessResult::Allowed => None,
            AccessResult::Neutral(reason) | AccessResult::Forbidden(reason) => Some(reason),
        }
    }

    /// Conjunction: forbidden wins, then neutral; allowed only when both are allowed.
    pub fn and_if(self, other: AccessResult) -> AccessResult {
        match (self, other) {
            (forbidden @ AccessResult::Forbidden(_), _) => forbidden,
            (_, forbidden @ AccessResult::Forbidden(_)) => forbidden,
            (neutral @ AccessResult::Neutral(_), _) => neutral,
            (_, neutral @ AccessResult::Neutral(_)) => neutral,
            (AccessResult::Allowed, AccessResult::Allowed) => AccessResult::Allowed,
        }
    }
}

/// Permissions consulted before a manual move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionPermission {
    /// Edit rights on the submission's priority (sticky) facet.
    EditPriority,
    /// General update rights on the submission.
    Update,
}

/// Answers single permission questions for an actor and a submission.
pub trait Authorizer: Send + Sync {
    fn check(
        &self,
        actor: &ActorId,
        submission: &SubmissionRecord,
        permission: SubmissionPermission,
    ) -> AccessResult;
}

/// Static grants keyed by actor.
#[derive(Debug, Clone, Default)]
pub struct GrantTable {
    grants: HashSet<(ActorId, SubmissionPermission)>,
}

impl GrantTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, actor: ActorId, permission: SubmissionPermission) -> Self {
        self.grants.insert((actor, permission));
        self
    }

    /// Grant every permission a manual waitlist move needs.
    pub fn operator(self, actor: ActorId) -> Self {
        self.grant(actor.clone(), SubmissionPermission::EditPriority)
            .grant(actor, SubmissionPermission::Update)
    }

    pub fn operators<I>(actors: I) -> Self
    where
        I: IntoIterator<Item = ActorId>,
    {
        actors.into_iter().fold(Self::new(), GrantTable::operator)
    }
}

impl Authorizer for GrantTable {
    fn check(
        &self,
        actor: &ActorId,
        _submission: &SubmissionRecord,
        permission: SubmissionPermission,
    ) -> AccessResult {
        if self.grants.contains(&(actor.clone(), permission)) {
            AccessResult::Allowed
        } else {
            AccessResult::Neutral(format!("{} lacks {:?} permission", actor.0, permission))
        }
    }
}

/// The two administrative actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistAction {
    Promote,
    Demote,
}

impl WaitlistAction {
    pub const ALL: [WaitlistAction; 2] = [WaitlistAction::Promote, WaitlistAction::Demote];

    pub const fn target_state(self) -> bool {
        matches!(self, WaitlistAction::Promote)
    }

    pub const fn id(self) -> &'static str {
        match self {
            WaitlistAction::Promote => "make_waitlisted_action",
            WaitlistAction::Demote => "make_unwaitlisted_action",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            WaitlistAction::Promote => "Put submission on waitlist",
            WaitlistAction::Demote => "Take submission off waitlist",
        }
    }

    pub fn descriptor(self) -> ActionDescriptor {
        ActionDescriptor {
            id: self.id(),
            label: self.label(),
            action: self,
        }
    }
}

/// Catalogue entry for administrative action lists.
#[derive(Debug, Clone, Serialize)]
pub struct ActionDescriptor {
    pub id: &'static str,
    pub label: &'static str,
    pub action: WaitlistAction,
}

#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    #[error("{action:?} denied: {reason}")]
    Denied {
        action: WaitlistAction,
        reason: String,
    },
    #[error("submission {0} not found")]
    NotFound(SubmissionId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Direct writes of the waitlist flag on behalf of an operator.
///
/// Writes bypass the counting algorithm; repeating an action is a no-op write.
pub struct MembershipMutator<S, A> {
    store: Arc<S>,
    authorizer: Arc<A>,
}

impl<S, A> MembershipMutator<S, A>
where
    S: SubmissionRepository + MembershipStore + 'static,
    A: Authorizer + 'static,
{
    pub fn new(store: Arc<S>, authorizer: Arc<A>) -> Self {
        Self { store, authorizer }
    }

    fn load(&self, id: SubmissionId) -> Result<SubmissionRecord, ActionError> {
        self.store.fetch(id)?.ok_or(ActionError::NotFound(id))
    }

    fn access_for(&self, submission: &SubmissionRecord, actor: &ActorId) -> AccessResult {
        self.authorizer
            .check(actor, submission, SubmissionPermission::EditPriority)
            .and_if(
                self.authorizer
                    .check(actor, submission, SubmissionPermission::Update),
            )
    }

    /// Structured access result for `actor` on submission `id`.
    pub fn access(&self, id: SubmissionId, actor: &ActorId) -> Result<AccessResult, ActionError> {
        let submission = self.load(id)?;
        Ok(self.access_for(&submission, actor))
    }

    /// Boolean form of [`MembershipMutator::access`].
    pub fn allows(&self, id: SubmissionId, actor: &ActorId) -> Result<bool, ActionError> {
        self.access(id, actor).map(|result| result.is_allowed())
    }

    pub fn apply(
        &self,
        action: WaitlistAction,
        id: SubmissionId,
        actor: &ActorId,
    ) -> Result<SubmissionRecord, ActionError> {
        let mut submission = self.load(id)?;

        let access = self.access_for(&submission, actor);
        if let Some(reason) = access.reason() {
            warn!(submission = %id, actor = %actor.0, ?action, reason, "waitlist action denied");
            return Err(ActionError::Denied {
                action,
                reason: reason.to_string(),
            });
        }

        let waitlisted = action.target_state();
        self.store.set_waitlisted(id, waitlisted)?;
        submission.is_waitlisted = waitlisted;

        info!(submission = %id, actor = %actor.0, action = action.id(), "waitlist action applied");
        Ok(submission)
    }

    pub fn promote_to_waitlist(
        &self,
        id: SubmissionId,
        actor: &ActorId,
    ) -> Result<SubmissionRecord, ActionError> {
        self.apply(WaitlistAction::Promote, id, actor)
    }

    pub fn demote_from_waitlist(
        &self,
        id: SubmissionId,
        actor: &ActorId,
    ) -> Result<SubmissionRecord, ActionError> {
        self.apply(WaitlistAction::Demote, id, actor)
    }
}
