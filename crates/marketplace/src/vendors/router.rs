use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{ApplicationId, ApplicationPatch, ApplicationStatus, ApplicationSubmission};
use super::repository::ApplicationRepository;
use super::service::VendorApplicationService;
use crate::access::Caller;
use crate::error::ServiceError;
use crate::http::{created, ok};
use crate::identity::repository::UserRepository;

/// Router builder exposing the vendor onboarding workflow.
pub fn vendor_router<S>(service: Arc<VendorApplicationService<S>>) -> Router
where
    S: ApplicationRepository + UserRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/vendor-applications",
            post(submit_handler::<S>).get(list_handler::<S>),
        )
        .route("/api/v1/vendor-applications/mine", get(mine_handler::<S>))
        .route(
            "/api/v1/vendor-applications/:application_id",
            get(get_handler::<S>)
                .patch(update_handler::<S>)
                .delete(withdraw_handler::<S>),
        )
        .route(
            "/api/v1/vendor-applications/:application_id/approve",
            post(approve_handler::<S>),
        )
        .route(
            "/api/v1/vendor-applications/:application_id/reject",
            post(reject_handler::<S>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    pub(crate) status: Option<ApplicationStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RejectRequest {
    #[serde(default)]
    pub(crate) reason: Option<String>,
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<VendorApplicationService<S>>>,
    caller: Caller,
    Json(submission): Json<ApplicationSubmission>,
) -> Result<Response, ServiceError>
where
    S: ApplicationRepository + UserRepository + 'static,
{
    let application = service.submit(&caller, submission)?;
    Ok(created("vendor application submitted", application))
}

pub(crate) async fn list_handler<S>(
    State(service): State<Arc<VendorApplicationService<S>>>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> Result<Response, ServiceError>
where
    S: ApplicationRepository + UserRepository + 'static,
{
    let applications = service.list(&caller, query.status)?;
    Ok(ok("vendor applications", applications))
}

pub(crate) async fn mine_handler<S>(
    State(service): State<Arc<VendorApplicationService<S>>>,
    caller: Caller,
) -> Result<Response, ServiceError>
where
    S: ApplicationRepository + UserRepository + 'static,
{
    let applications = service.mine(&caller)?;
    Ok(ok("your vendor applications", applications))
}

pub(crate) async fn get_handler<S>(
    State(service): State<Arc<VendorApplicationService<S>>>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: ApplicationRepository + UserRepository + 'static,
{
    let application = service.get(&caller, &ApplicationId(application_id))?;
    Ok(ok("vendor application", application))
}

pub(crate) async fn update_handler<S>(
    State(service): State<Arc<VendorApplicationService<S>>>,
    caller: Caller,
    Path(application_id): Path<String>,
    Json(patch): Json<ApplicationPatch>,
) -> Result<Response, ServiceError>
where
    S: ApplicationRepository + UserRepository + 'static,
{
    let application = service.update(&caller, &ApplicationId(application_id), patch)?;
    Ok(ok("vendor application updated", application))
}

pub(crate) async fn withdraw_handler<S>(
    State(service): State<Arc<VendorApplicationService<S>>>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: ApplicationRepository + UserRepository + 'static,
{
    let id = ApplicationId(application_id);
    service.withdraw(&caller, &id)?;
    Ok(ok("vendor application withdrawn", id))
}

pub(crate) async fn approve_handler<S>(
    State(service): State<Arc<VendorApplicationService<S>>>,
    caller: Caller,
    Path(application_id): Path<String>,
) -> Result<Response, ServiceError>
where
    S: ApplicationRepository + UserRepository + 'static,
{
    let application = service.approve(&caller, &ApplicationId(application_id))?;
    Ok(ok("vendor application approved", application))
}

pub(crate) async fn reject_handler<S>(
    State(service): State<Arc<VendorApplicationService<S>>>,
    caller: Caller,
    Path(application_id): Path<String>,
    body: Option<Json<RejectRequest>>,
) -> Result<Response, ServiceError>
where
    S: ApplicationRepository + UserRepository + 'static,
{
    let reason = body.and_then(|Json(request)| request.reason);
    let application = service.reject(&caller, &ApplicationId(application_id), reason)?;
    Ok(ok("vendor application rejected", application))
}
