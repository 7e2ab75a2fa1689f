mod config;
pub mod policy;

pub use config::{
    ClassificationMode, ResolvedSettings, WaitlistSettings, DEFAULT_CONFIRMATION,
    DEFAULT_WAITLIST_NOTICE,
};

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::counter::{CapacityCounter, PoolCounts};
use super::domain::{Pool, ResourceId, SubmissionRecord};
use super::repository::{MembershipStore, RepositoryError};
use super::tokens::{TokenContext, TokenResolver};

/// Operator-visible record of which evaluation steps ran and with what context.
///
/// Lines are only collected when the settings enable debugging.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DebugTrace(Vec<String>);

impl DebugTrace {
    fn record(&mut self, settings: &ResolvedSettings, step: &str, context: impl AsRef<str>) {
        if !settings.debug {
            return;
        }
        let line = format!(
            "Invoked waitlist: AdmissionEvaluator:{step} {}",
            context.as_ref()
        );
        warn!(target: "waitlist::debug", "{line}");
        self.0.push(line);
    }

    pub fn lines(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: DebugTrace) {
        self.0.extend(other.0);
    }
}

/// Pre-insert limit expansion result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LimitExpansion {
    pub effective_limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<PoolCounts>,
    /// Confirmation shown after submit; the waitlist notice when capacity is already taken.
    pub confirmation: String,
    #[serde(skip_serializing_if = "DebugTrace::is_empty")]
    pub trace: DebugTrace,
}

/// Render-time advisory decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoticeDecision {
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<PoolCounts>,
    #[serde(skip_serializing_if = "DebugTrace::is_empty")]
    pub trace: DebugTrace,
}

/// Outcome of the post-insert classification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// `None` when the submission sits outside the waitlist mechanism.
    pub pool: Option<Pool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_waitlisted: Option<u64>,
    #[serde(skip_serializing_if = "DebugTrace::is_empty")]
    pub trace: DebugTrace,
}

/// Decision engine reconciling render, pre-insert and post-insert moments against the counters.
pub struct AdmissionEvaluator<C> {
    counter: Arc<C>,
    tokens: Arc<dyn TokenResolver>,
}

impl<C> AdmissionEvaluator<C>
where
    C: CapacityCounter + 'static,
{
    pub fn new(counter: Arc<C>, tokens: Arc<dyn TokenResolver>) -> Self {
        Self { counter, tokens }
    }

    pub fn resolve(
        &self,
        settings: &WaitlistSettings,
        resource: Option<&ResourceId>,
        values: &std::collections::BTreeMap<String, String>,
    ) -> ResolvedSettings {
        let context = TokenContext::new(resource, values);
        settings.resolve(self.tokens.as_ref(), &context)
    }

    /// Effective limit for the generic per-resource cap, plus the submit-time confirmation.
    pub fn expand_limit(
        &self,
        settings: &ResolvedSettings,
        resource: Option<&ResourceId>,
    ) -> Result<LimitExpansion, RepositoryError> {
        let mut trace = DebugTrace::default();
        let confirmation = DEFAULT_CONFIRMATION.to_string();

        let Some(resource) = resource.filter(|_| settings.enabled) else {
            trace.record(settings, "expand_limit", "skipped");
            return Ok(LimitExpansion {
                effective_limit: settings.capacity_limit,
                counts: None,
                confirmation,
                trace,
            });
        };

        let counts = self.counter.snapshot(resource)?;
        let effective_limit =
            policy::expanded_limit(settings.capacity_limit, settings.threshold, counts);
        let confirmation =
            if policy::confirmation_overridden(settings.capacity_limit, settings.threshold, counts)
            {
                settings.notice.clone()
            } else {
                confirmation
            };

        debug!(
            %resource,
            waitlisted = counts.waitlisted,
            not_waitlisted = counts.not_waitlisted,
            effective_limit,
            "expanded submission limit"
        );
        trace.record(
            settings,
            "expand_limit",
            format!(
                "resource={resource} waitlisted={} not_waitlisted={} limit={effective_limit}",
                counts.waitlisted, counts.not_waitlisted
            ),
        );

        Ok(LimitExpansion {
            effective_limit,
            counts: Some(counts),
            confirmation,
            trace,
        })
    }

    /// Advisory render-time check; never mutates state.
    pub fn evaluate_notice(
        &self,
        settings: &ResolvedSettings,
        resource: Option<&ResourceId>,
    ) -> Result<NoticeDecision, RepositoryError> {
        let mut trace = DebugTrace::default();

        let Some(resource) = resource else {
            trace.record(settings, "evaluate_notice", "no resource");
            return Ok(NoticeDecision {
                visible: false,
                message: None,
                counts: None,
                trace,
            });
        };

        let counts = self.counter.snapshot(resource)?;
        let visible = settings.enabled
            && policy::notice_visible(settings.capacity_limit, settings.threshold, counts);

        trace.record(
            settings,
            "evaluate_notice",
            format!(
                "resource={resource} waitlisted={} not_waitlisted={} visible={visible}",
                counts.waitlisted, counts.not_waitlisted
            ),
        );

        Ok(NoticeDecision {
            visible,
            message: visible.then(|| settings.notice.clone()),
            counts: Some(counts),
            trace,
        })
    }

    /// Classify a submission that has just been durably inserted.
    ///
    /// Only this submission's flag is written, and only towards the waitlist.
    pub fn commit_classification<M>(
        &self,
        settings: &ResolvedSettings,
        submission: &SubmissionRecord,
        store: &M,
    ) -> Result<Classification, RepositoryError>
    where
        M: MembershipStore + ?Sized,
    {
        let mut trace = DebugTrace::default();

        let Some(resource) = submission.resource_id.as_ref() else {
            trace.record(settings, "commit_classification", "no resource");
            return Ok(Classification {
                pool: None,
                not_waitlisted: None,
                trace,
            });
        };

        if !settings.enabled {
            trace.record(settings, "commit_classification", "disabled");
            return Ok(Classification {
                pool: Some(Pool::from_flag(submission.is_waitlisted)),
                not_waitlisted: None,
                trace,
            });
        }

        let not_waitlisted = self.counter.count_not_waitlisted(resource)?;

        let pool = if policy::commits_to_waitlist(
            settings.capacity_limit,
            settings.threshold,
            not_waitlisted,
        ) {
            store.set_waitlisted(submission.id, true)?;
            info!(
                submission = %submission.id,
                %resource,
                not_waitlisted,
                "submission placed on waitlist"
            );
            Pool::Waitlisted
        } else {
            Pool::from_flag(submission.is_waitlisted)
        };

        trace.record(
            settings,
            "commit_classification",
            format!(
                "insert submission={} not_waitlisted={not_waitlisted} pool={}",
                submission.id,
                pool.label()
            ),
        );

        Ok(Classification {
            pool: Some(pool),
            not_waitlisted: Some(not_waitlisted),
            trace,
        })
    }
}
