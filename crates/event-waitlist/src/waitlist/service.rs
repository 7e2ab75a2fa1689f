use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError};

use serde::Serialize;
use tracing::debug;

use super::actions::{
    AccessResult, ActionDescriptor, ActionError, Authorizer, MembershipMutator, WaitlistAction,
};
use super::counter::PoolCounts;
use super::domain::{
    ActorId, Pool, ResourceId, SubmissionId, SubmissionRecord, SubmissionRequest,
    SubmissionStatusView,
};
use super::evaluation::{
    policy, AdmissionEvaluator, ClassificationMode, DebugTrace, NoticeDecision, WaitlistSettings,
};
use super::guard::ResourceLocks;
use super::repository::{RepositoryError, SubmissionStore};
use super::tokens::{ResourceResolver, RouteFirstResolver, SubmissionTokens, TokenResolver};

/// Service composing the evaluator, storage, manual actions and resource lookup.
pub struct WaitlistService<S, A> {
    settings: WaitlistSettings,
    store: Arc<S>,
    evaluator: AdmissionEvaluator<S>,
    actions: MembershipMutator<S, A>,
    resources: Arc<dyn ResourceResolver>,
    locks: ResourceLocks,
}

impl<S, A> WaitlistService<S, A>
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    pub fn new(store: Arc<S>, authorizer: Arc<A>, settings: WaitlistSettings) -> Self {
        Self::with_collaborators(
            store,
            authorizer,
            settings,
            Arc::new(SubmissionTokens::new()),
            Arc::new(RouteFirstResolver),
        )
    }

    pub fn with_collaborators(
        store: Arc<S>,
        authorizer: Arc<A>,
        settings: WaitlistSettings,
        tokens: Arc<dyn TokenResolver>,
        resources: Arc<dyn ResourceResolver>,
    ) -> Self {
        let evaluator = AdmissionEvaluator::new(store.clone(), tokens);
        let actions = MembershipMutator::new(store.clone(), authorizer);

        Self {
            settings,
            store,
            evaluator,
            actions,
            resources,
            locks: ResourceLocks::new(),
        }
    }

    pub fn settings(&self) -> &WaitlistSettings {
        &self.settings
    }

    /// Render-time advisory notice for a prospective submission.
    pub fn notice(&self, request: &SubmissionRequest) -> Result<NoticeDecision, ServiceError> {
        let resource = self.resources.owning_resource(request);
        let resolved = self
            .evaluator
            .resolve(&self.settings, resource.as_ref(), &request.values);
        Ok(self.evaluator.evaluate_notice(&resolved, resource.as_ref())?)
    }

    /// Run a submission through limit expansion, the per-resource cap, insertion and
    /// classification.
    pub fn submit(&self, request: SubmissionRequest) -> Result<SubmissionReceipt, ServiceError> {
        let resource = self.resources.owning_resource(&request);
        let resolved = self
            .evaluator
            .resolve(&self.settings, resource.as_ref(), &request.values);

        let lock = match (self.settings.classification_mode, resource.as_ref()) {
            (ClassificationMode::Serialized, Some(resource)) => Some(self.locks.handle(resource)),
            _ => None,
        };
        let _guard = lock
            .as_ref()
            .map(|lock| lock.lock().unwrap_or_else(PoisonError::into_inner));

        let expansion = self.evaluator.expand_limit(&resolved, resource.as_ref())?;

        let refuses = policy::refuses_at_limit(resolved.enabled, resolved.threshold);
        if let Some(resource) = resource.as_ref().filter(|_| refuses) {
            let total = match expansion.counts {
                Some(counts) => counts.total(),
                None => self.store.snapshot(resource)?.total(),
            };
            if total >= expansion.effective_limit {
                debug!(
                    %resource,
                    total,
                    limit = expansion.effective_limit,
                    "submission limit reached"
                );
                return Err(ServiceError::LimitReached {
                    resource: resource.clone(),
                    limit: expansion.effective_limit,
                });
            }
        }

        let mut record = self.store.insert(resource, &request)?;
        let classification =
            self.evaluator
                .commit_classification(&resolved, &record, self.store.as_ref())?;
        if classification.pool == Some(Pool::Waitlisted) {
            record.is_waitlisted = true;
        }

        let mut trace = expansion.trace;
        trace.extend(classification.trace);

        Ok(SubmissionReceipt {
            submission: record.status_view(),
            effective_limit: expansion.effective_limit,
            confirmation: expansion.confirmation,
            trace,
        })
    }

    pub fn get(&self, id: SubmissionId) -> Result<SubmissionRecord, ServiceError> {
        self.store.fetch(id)?.ok_or(ServiceError::NotFound(id))
    }

    /// Every submission counted against `resource`, in creation order.
    pub fn submissions(
        &self,
        resource: &ResourceId,
    ) -> Result<Vec<SubmissionStatusView>, ServiceError> {
        Ok(self
            .store
            .for_resource(resource)?
            .iter()
            .map(SubmissionRecord::status_view)
            .collect())
    }

    /// Current pool sizes and limits for a resource.
    pub fn summary(&self, resource: &ResourceId) -> Result<ResourceSummary, ServiceError> {
        let values = BTreeMap::new();
        let resolved = self.evaluator.resolve(&self.settings, Some(resource), &values);
        let counts = self.store.snapshot(resource)?;
        let effective_limit = if resolved.enabled {
            policy::expanded_limit(resolved.capacity_limit, resolved.threshold, counts)
        } else {
            resolved.capacity_limit
        };

        Ok(ResourceSummary {
            resource_id: resource.clone(),
            counts,
            capacity_limit: resolved.capacity_limit,
            threshold: resolved.threshold,
            enabled: resolved.enabled,
            effective_limit,
        })
    }

    pub fn access(&self, id: SubmissionId, actor: &ActorId) -> Result<AccessResult, ServiceError> {
        Ok(self.actions.access(id, actor)?)
    }

    pub fn apply_action(
        &self,
        action: WaitlistAction,
        id: SubmissionId,
        actor: &ActorId,
    ) -> Result<SubmissionRecord, ServiceError> {
        Ok(self.actions.apply(action, id, actor)?)
    }

    pub fn promote_to_waitlist(
        &self,
        id: SubmissionId,
        actor: &ActorId,
    ) -> Result<SubmissionRecord, ServiceError> {
        Ok(self.actions.promote_to_waitlist(id, actor)?)
    }

    pub fn demote_from_waitlist(
        &self,
        id: SubmissionId,
        actor: &ActorId,
    ) -> Result<SubmissionRecord, ServiceError> {
        Ok(self.actions.demote_from_waitlist(id, actor)?)
    }

    pub fn action_catalogue(&self) -> Vec<ActionDescriptor> {
        WaitlistAction::ALL
            .into_iter()
            .map(WaitlistAction::descriptor)
            .collect()
    }
}

/// What the submitter receives after a successful submit.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub submission: SubmissionStatusView,
    pub effective_limit: u64,
    pub confirmation: String,
    #[serde(skip_serializing_if = "DebugTrace::is_empty")]
    pub trace: DebugTrace,
}

impl SubmissionReceipt {
    pub fn is_waitlisted(&self) -> bool {
        self.submission.is_waitlisted
    }
}

/// Pool sizes and limits currently in force for a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceSummary {
    pub resource_id: ResourceId,
    pub counts: PoolCounts,
    pub capacity_limit: u64,
    pub threshold: u64,
    pub enabled: bool,
    pub effective_limit: u64,
}

/// Error raised by the waitlist service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("submission limit of {limit} reached for resource {resource}")]
    LimitReached { resource: ResourceId, limit: u64 },
    #[error("submission {0} not found")]
    NotFound(SubmissionId),
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
