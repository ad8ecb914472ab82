use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use super::domain::{AccountStatus, Credentials, Registration, UserId};
use super::repository::UserRepository;
use super::service::IdentityService;
use crate::access::Caller;
use crate::error::ServiceError;
use crate::http::{created, ok};

/// Router builder exposing registration, login, and account administration.
pub fn identity_router<R>(service: Arc<IdentityService<R>>) -> Router
where
    R: UserRepository + 'static,
{
    Router::new()
        .route("/api/v1/auth/register", post(register_handler::<R>))
        .route("/api/v1/auth/login", post(login_handler::<R>))
        .route("/api/v1/auth/me", get(me_handler::<R>))
        .route(
            "/api/v1/admin/users/:user_id/status",
            patch(status_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    pub(crate) status: AccountStatus,
}

pub(crate) async fn register_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Json(registration): Json<Registration>,
) -> Result<Response, ServiceError>
where
    R: UserRepository + 'static,
{
    let session = service.register(registration)?;
    Ok(created("account registered", session))
}

pub(crate) async fn login_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    Json(credentials): Json<Credentials>,
) -> Result<Response, ServiceError>
where
    R: UserRepository + 'static,
{
    let session = service.login(credentials)?;
    Ok(ok("logged in", session))
}

pub(crate) async fn me_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    caller: Caller,
) -> Result<Response, ServiceError>
where
    R: UserRepository + 'static,
{
    let profile = service.me(&caller)?;
    Ok(ok("current user", profile))
}

pub(crate) async fn status_handler<R>(
    State(service): State<Arc<IdentityService<R>>>,
    caller: Caller,
    Path(user_id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Result<Response, ServiceError>
where
    R: UserRepository + 'static,
{
    let profile = service.set_status(&caller, &UserId(user_id), change.status)?;
    Ok(ok("account status updated", profile))
}
