use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use tracing::error;

use super::actions::{ActionError, Authorizer, WaitlistAction};
use super::domain::{ActorId, ResourceId, SubmissionId, SubmissionRequest};
use super::repository::SubmissionStore;
use super::service::{ServiceError, WaitlistService};

/// Header carrying the operator identity for manual actions.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Router builder exposing the waitlist endpoints.
pub fn waitlist_router<S, A>(service: Arc<WaitlistService<S, A>>) -> Router
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    Router::new()
        .route("/api/v1/waitlist/actions", get(catalogue_handler::<S, A>))
        .route(
            "/api/v1/waitlist/resources/:resource_id",
            get(summary_handler::<S, A>),
        )
        .route(
            "/api/v1/waitlist/resources/:resource_id/submissions",
            get(listing_handler::<S, A>),
        )
        .route(
            "/api/v1/waitlist/resources/:resource_id/notice",
            get(notice_handler::<S, A>),
        )
        .route("/api/v1/waitlist/submissions", post(submit_handler::<S, A>))
        .route(
            "/api/v1/waitlist/submissions/:submission_id",
            get(status_handler::<S, A>),
        )
        .route(
            "/api/v1/waitlist/submissions/:submission_id/waitlist",
            post(promote_handler::<S, A>),
        )
        .route(
            "/api/v1/waitlist/submissions/:submission_id/unwaitlist",
            post(demote_handler::<S, A>),
        )
        .with_state(service)
}

fn error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::LimitReached { .. } => StatusCode::CONFLICT,
        ServiceError::NotFound(_) | ServiceError::Action(ActionError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        ServiceError::Action(ActionError::Denied { reason, .. }) => {
            let payload = json!({
                "error": error.to_string(),
                "reason": reason,
            });
            return (StatusCode::FORBIDDEN, axum::Json(payload)).into_response();
        }
        ServiceError::Action(ActionError::Repository(_)) | ServiceError::Repository(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn actor_from(headers: &HeaderMap) -> Option<ActorId> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| ActorId(value.to_string()))
}

pub(crate) async fn catalogue_handler<S, A>(
    State(service): State<Arc<WaitlistService<S, A>>>,
) -> Response
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    axum::Json(service.action_catalogue()).into_response()
}

pub(crate) async fn summary_handler<S, A>(
    State(service): State<Arc<WaitlistService<S, A>>>,
    Path(resource_id): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    match service.summary(&ResourceId(resource_id)) {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn listing_handler<S, A>(
    State(service): State<Arc<WaitlistService<S, A>>>,
    Path(resource_id): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    match service.submissions(&ResourceId(resource_id)) {
        Ok(submissions) => (StatusCode::OK, axum::Json(submissions)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn notice_handler<S, A>(
    State(service): State<Arc<WaitlistService<S, A>>>,
    Path(resource_id): Path<String>,
) -> Response
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    let request = SubmissionRequest::for_resource(resource_id);
    match service.notice(&request) {
        Ok(decision) => (StatusCode::OK, axum::Json(decision)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<S, A>(
    State(service): State<Arc<WaitlistService<S, A>>>,
    axum::Json(request): axum::Json<SubmissionRequest>,
) -> Response
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    // Serialized mode blocks on a per-resource lock; keep that off the async workers.
    match tokio::task::spawn_blocking(move || service.submit(request)).await {
        Ok(Ok(receipt)) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Ok(Err(error)) => error_response(error),
        Err(join_error) => {
            error!(%join_error, "submission task failed");
            let payload = json!({ "error": "submission task failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn status_handler<S, A>(
    State(service): State<Arc<WaitlistService<S, A>>>,
    Path(submission_id): Path<u64>,
) -> Response
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    match service.get(SubmissionId(submission_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

async fn run_action<S, A>(
    service: Arc<WaitlistService<S, A>>,
    action: WaitlistAction,
    submission_id: u64,
    headers: &HeaderMap,
) -> Response
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    let Some(actor) = actor_from(headers) else {
        let payload = json!({ "error": format!("missing {ACTOR_HEADER} header") });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match service.apply_action(action, SubmissionId(submission_id), &actor) {
        Ok(record) => (StatusCode::OK, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn promote_handler<S, A>(
    State(service): State<Arc<WaitlistService<S, A>>>,
    Path(submission_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    run_action(service, WaitlistAction::Promote, submission_id, &headers).await
}

pub(crate) async fn demote_handler<S, A>(
    State(service): State<Arc<WaitlistService<S, A>>>,
    Path(submission_id): Path<u64>,
    headers: HeaderMap,
) -> Response
where
    S: SubmissionStore + 'static,
    A: Authorizer + 'static,
{
    run_action(service, WaitlistAction::Demote, submission_id, &headers).await
}
