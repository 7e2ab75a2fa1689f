use event_waitlist::config::AppConfig;
use event_waitlist::waitlist::{
    ActorId, GrantTable, InMemorySubmissionStore, WaitlistService, WaitlistSettings,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub(crate) type InMemoryWaitlistService = WaitlistService<InMemorySubmissionStore, GrantTable>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Operators named in configuration get every permission a manual move needs.
pub(crate) fn operator_grants(operators: &[ActorId]) -> GrantTable {
    GrantTable::operators(operators.iter().cloned())
}

pub(crate) fn in_memory_service(
    settings: WaitlistSettings,
    operators: &[ActorId],
) -> Arc<InMemoryWaitlistService> {
    Arc::new(WaitlistService::new(
        Arc::new(InMemorySubmissionStore::new()),
        Arc::new(operator_grants(operators)),
        settings,
    ))
}

pub(crate) fn service_from_config(config: &AppConfig) -> Arc<InMemoryWaitlistService> {
    in_memory_service(config.waitlist.clone(), &config.operators)
}
