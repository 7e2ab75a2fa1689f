//! Capacity and waitlist admission control.
//!
//! Submissions for a resource fill the accepted pool first, spill into the waitlist pool once
//! the accepted pool reaches `capacity - threshold`, and are rejected when the effective limit
//! is exhausted. Operators can move any submission between pools by hand.
//!
//! Three moments consult the counters: render time ([`AdmissionEvaluator::evaluate_notice`]),
//! before insert ([`AdmissionEvaluator::expand_limit`]) and after insert
//! ([`AdmissionEvaluator::commit_classification`]). Only the last one writes.

pub mod actions;
pub mod counter;
pub mod domain;
pub mod evaluation;
pub mod guard;
pub mod repository;
pub mod router;
pub mod service;
pub mod tokens;

#[cfg(test)]
mod tests;

pub use actions::{
    AccessResult, ActionDescriptor, ActionError, Authorizer, GrantTable, MembershipMutator,
    SubmissionPermission, WaitlistAction,
};
pub use counter::{CapacityCounter, PoolCounts};
pub use guard::ResourceLocks;
pub use domain::{
    ActorId, Pool, ResourceId, SubmissionId, SubmissionRecord, SubmissionRequest,
    SubmissionStatusView,
};
pub use evaluation::{
    AdmissionEvaluator, Classification, ClassificationMode, DebugTrace, LimitExpansion,
    NoticeDecision, ResolvedSettings, WaitlistSettings, DEFAULT_CONFIRMATION,
    DEFAULT_WAITLIST_NOTICE,
};
pub use repository::{
    InMemorySubmissionStore, MembershipStore, RepositoryError, SubmissionRepository,
    SubmissionStore,
};
pub use router::{waitlist_router, ACTOR_HEADER};
pub use service::{ResourceSummary, ServiceError, SubmissionReceipt, WaitlistService};
pub use tokens::{
    LiteralTokens, ResourceResolver, RouteFirstResolver, SubmissionTokens, TokenContext,
    TokenError, TokenResolver,
};
