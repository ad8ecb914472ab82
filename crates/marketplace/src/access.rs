//! Authorization gate and caller resolution.
//!
//! The gate is a pure role check evaluated before any lookup, so a denial never reveals
//! whether the targeted resource exists. Ownership rules go through [`owner_or_admin`].

use std::sync::Arc;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::error::ServiceError;
use crate::identity::domain::{Role, UserId};

pub const ADMIN_ONLY: &[Role] = &[Role::Admin];
pub const CONSUMER_ONLY: &[Role] = &[Role::Consumer];
pub const VENDOR_ONLY: &[Role] = &[Role::Vendor];
pub const VENDOR_OR_ADMIN: &[Role] = &[Role::Vendor, Role::Admin];

/// Authenticated principal resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: UserId,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Resources with a single owning user.
pub trait Owned {
    fn owner(&self) -> &UserId;
}

pub fn admits(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

pub fn require_role(caller: &Caller, allowed: &[Role]) -> Result<(), ServiceError> {
    if admits(caller.role, allowed) {
        Ok(())
    } else {
        Err(denied())
    }
}

pub fn is_owner_or_admin<T: Owned + ?Sized>(caller: &Caller, resource: &T) -> bool {
    caller.is_admin() || resource.owner() == &caller.user_id
}

pub fn owner_or_admin<T: Owned + ?Sized>(caller: &Caller, resource: &T) -> Result<(), ServiceError> {
    if is_owner_or_admin(caller, resource) {
        Ok(())
    } else {
        Err(denied())
    }
}

pub fn owner_only<T: Owned + ?Sized>(caller: &Caller, resource: &T) -> Result<(), ServiceError> {
    if resource.owner() == &caller.user_id {
        Ok(())
    } else {
        Err(denied())
    }
}

fn denied() -> ServiceError {
    ServiceError::forbidden("you are not allowed to perform this action")
}

/// Resolves bearer tokens into callers. Installed on the router as an `Extension`.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<Caller, ServiceError>;
}

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = parts
            .extensions
            .get::<Arc<dyn Authenticator>>()
            .cloned()
            .ok_or_else(|| ServiceError::Internal("authenticator extension missing".to_string()))?;

        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(ServiceError::Unauthenticated)?;

        authenticator.authenticate(token)
    }
}
