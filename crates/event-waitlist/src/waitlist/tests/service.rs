use super::common::*;
use std::sync::Arc;

use crate::waitlist::counter::{CapacityCounter, PoolCounts};
use crate::waitlist::domain::{ResourceId, SubmissionRequest};
use crate::waitlist::evaluation::{ClassificationMode, WaitlistSettings, DEFAULT_CONFIRMATION};
use crate::waitlist::repository::{RepositoryError, SubmissionRepository};
use crate::waitlist::service::{ServiceError, WaitlistService};

#[test]
fn sequential_arrivals_fill_accepted_then_waitlist() {
    let (service, store) = build_service();

    let mut waitlisted = Vec::new();
    for _ in 0..13 {
        let receipt = service.submit(gala_request()).expect("submission accepted");
        assert_eq!(receipt.effective_limit, 13);
        waitlisted.push(receipt.is_waitlisted());
    }

    assert_eq!(waitlisted[..7], [false; 7]);
    assert_eq!(waitlisted[7..], [true; 6]);
    assert_eq!(store.snapshot(&gala()), Ok(PoolCounts::new(6, 7)));
}

#[test]
fn effective_limit_keeps_rising_while_accepted_pool_is_short() {
    let (service, store) = build_service();
    seed(&store, &gala(), 6, 7);

    let receipt = service.submit(gala_request()).expect("submission accepted");

    assert_eq!(receipt.effective_limit, 16);
    assert!(receipt.is_waitlisted());
}

#[test]
fn disabled_waitlist_rejects_at_nominal_capacity() {
    let (service, store) = build_service_with(settings().disabled());

    for _ in 0..10 {
        let receipt = service.submit(gala_request()).expect("submission accepted");
        assert!(!receipt.is_waitlisted());
        assert_eq!(receipt.effective_limit, 10);
    }

    match service.submit(gala_request()) {
        Err(ServiceError::LimitReached { resource, limit }) => {
            assert_eq!(resource, gala());
            assert_eq!(limit, 10);
        }
        other => panic!("expected limit error, got {other:?}"),
    }
    assert_eq!(store.snapshot(&gala()), Ok(PoolCounts::new(0, 10)));
}

#[test]
fn zero_threshold_waitlists_arrivals_past_capacity() {
    let (service, store) = build_service_with(WaitlistSettings::new(10, 0));

    for _ in 0..10 {
        let receipt = service.submit(gala_request()).expect("submission accepted");
        assert!(!receipt.is_waitlisted());
    }

    for _ in 0..2 {
        let receipt = service.submit(gala_request()).expect("row still created");
        assert!(receipt.is_waitlisted());
        assert_eq!(receipt.effective_limit, 10);
    }
    assert_eq!(store.snapshot(&gala()), Ok(PoolCounts::new(2, 10)));
}

#[test]
fn limit_applies_once_accepted_pool_reaches_expanded_limit() {
    let (service, store) = build_service();
    seed(&store, &gala(), 0, 13);

    assert!(matches!(
        service.submit(gala_request()),
        Err(ServiceError::LimitReached { limit: 13, .. })
    ));
}

#[test]
fn submissions_without_resource_are_never_classified() {
    let (service, store) = build_service();

    for _ in 0..20 {
        let receipt = service
            .submit(SubmissionRequest::default())
            .expect("submission accepted");
        assert!(!receipt.is_waitlisted());
        assert_eq!(receipt.submission.pool, None);
    }
    assert_eq!(store.snapshot(&gala()).map(|counts| counts.total()), Ok(0));
}

#[test]
fn route_override_selects_the_counted_resource() {
    let (service, store) = build_service();
    let group = ResourceId("group-7".to_string());

    let request = SubmissionRequest {
        route_override: Some(group.clone()),
        ..gala_request()
    };
    let receipt = service.submit(request).expect("submission accepted");

    assert_eq!(receipt.submission.resource_id, Some(group.clone()));
    assert_eq!(store.count_not_waitlisted(&group), Ok(1));
    assert_eq!(store.count_not_waitlisted(&gala()), Ok(0));
}

#[test]
fn confirmation_carries_notice_when_capacity_taken() {
    let (service, store) = build_service();
    seed(&store, &gala(), 0, 9);

    let receipt = service.submit(gala_request()).expect("submission accepted");
    assert_eq!(receipt.confirmation, DEFAULT_CONFIRMATION);

    assert!(receipt.is_waitlisted());

    seed(&store, &gala(), 0, 1);
    let receipt = service.submit(gala_request()).expect("submission accepted");
    assert_eq!(receipt.confirmation, service.settings().waitlist_notice);
}

#[test]
fn notice_reflects_current_counts() {
    let (service, store) = build_service();
    seed(&store, &gala(), 1, 8);

    let notice = service.notice(&gala_request()).expect("notice");
    assert!(notice.visible);

    seed(&store, &gala(), 0, 1);
    let notice = service.notice(&gala_request()).expect("notice");
    assert!(!notice.visible);
}

#[test]
fn demotion_is_the_only_way_out_of_the_waitlist() {
    let (service, store) = build_service();
    seed(&store, &gala(), 0, 7);

    let receipt = service.submit(gala_request()).expect("submission accepted");
    assert!(receipt.is_waitlisted());
    let id = receipt.submission.submission_id;

    service.submit(gala_request()).expect("later submission");
    assert!(service.get(id).expect("record").is_waitlisted);

    service
        .demote_from_waitlist(id, &operator())
        .expect("demote");
    assert!(!service.get(id).expect("record").is_waitlisted);
    assert_eq!(store.count_not_waitlisted(&gala()), Ok(8));
}

#[test]
fn summary_reports_counts_and_limits() {
    let (service, store) = build_service();
    seed(&store, &gala(), 2, 12);

    let summary = service.summary(&gala()).expect("summary");

    assert_eq!(summary.counts, PoolCounts::new(2, 12));
    assert_eq!(summary.capacity_limit, 10);
    assert_eq!(summary.threshold, 3);
    assert!(summary.enabled);
    assert_eq!(summary.effective_limit, 17);
}

#[test]
fn debug_trace_covers_expansion_and_commit() {
    let (service, _) = build_service_with(settings().with_debug(true));

    let receipt = service.submit(gala_request()).expect("submission accepted");
    let lines = receipt.trace.lines();

    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("expand_limit"));
    assert!(lines[1].contains("commit_classification"));
}

#[test]
fn serialized_mode_produces_sequential_outcome() {
    let (service, store) =
        build_service_with(settings().with_mode(ClassificationMode::Serialized));
    let service = Arc::new(service);

    let workers: Vec<_> = (0..16)
        .map(|_| {
            let service = service.clone();
            std::thread::spawn(move || service.submit(gala_request()).is_ok())
        })
        .collect();
    let admitted = workers
        .into_iter()
        .map(|worker| worker.join().expect("worker completes"))
        .filter(|admitted| *admitted)
        .count();

    assert_eq!(admitted, 16);
    assert_eq!(store.snapshot(&gala()), Ok(PoolCounts::new(9, 7)));
}

#[test]
fn storage_failures_propagate() {
    let service = WaitlistService::new(
        Arc::new(UnavailableStore),
        Arc::new(grants()),
        settings(),
    );

    assert!(matches!(
        service.submit(gala_request()),
        Err(ServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
    assert!(matches!(
        service.notice(&gala_request()),
        Err(ServiceError::Repository(RepositoryError::Unavailable(_)))
    ));
}

#[test]
fn storage_failure_on_insert_surfaces_for_orphans() {
    let service = WaitlistService::new(
        Arc::new(UnavailableStore),
        Arc::new(grants()),
        settings(),
    );

    assert!(matches!(
        service.submit(SubmissionRequest::default()),
        Err(ServiceError::Repository(_))
    ));
    assert!(UnavailableStore.fetch(crate::waitlist::SubmissionId(1)).is_err());
}
