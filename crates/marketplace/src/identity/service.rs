use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::credentials::PasswordHasher;
use super::domain::{
    normalize_email, AccountStatus, Credentials, Registration, Role, Session, User, UserId,
    UserProfile,
};
use super::repository::UserRepository;
use super::tokens::{TokenError, TokenService};
use crate::access::{require_role, Authenticator, Caller, ADMIN_ONLY};
use crate::error::ServiceError;
use crate::store::RepositoryError;

const MIN_PASSWORD_LENGTH: usize = 8;
// bcrypt only reads the first 72 bytes
const MAX_PASSWORD_LENGTH: usize = 72;

/// Registration, login, and account administration over the user store.
pub struct IdentityService<R> {
    users: Arc<R>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
}

impl<R> IdentityService<R>
where
    R: UserRepository + 'static,
{
    pub fn new(users: Arc<R>, hasher: Arc<dyn PasswordHasher>, tokens: Arc<dyn TokenService>) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    pub fn register(&self, registration: Registration) -> Result<Session, ServiceError> {
        let Registration {
            name,
            email,
            password,
        } = registration;

        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::validation("name is required"));
        }

        let email = normalize_email(&email);
        if !is_plausible_email(&email) {
            return Err(ServiceError::validation("email address is invalid"));
        }

        validate_password(&password)?;

        let user = self.create_user(name, email, &password, Role::Consumer)?;
        info!(user_id = %user.id.0, "user registered");
        self.open_session(&user)
    }

    pub fn login(&self, credentials: Credentials) -> Result<Session, ServiceError> {
        let email = normalize_email(&credentials.email);
        let user = self
            .users
            .find_user_by_email(&email)?
            .ok_or(ServiceError::Unauthenticated)?;

        let valid = self
            .hasher
            .verify(&credentials.password, &user.password_hash)
            .map_err(|err| ServiceError::Internal(err.to_string()))?;
        if !valid {
            return Err(ServiceError::Unauthenticated);
        }

        ensure_active(&user)?;
        self.open_session(&user)
    }

    pub fn me(&self, caller: &Caller) -> Result<UserProfile, ServiceError> {
        let user = self
            .users
            .fetch_user(&caller.user_id)?
            .ok_or_else(|| ServiceError::not_found("user not found"))?;
        Ok(user.profile())
    }

    /// Administrative change of an account's standing.
    pub fn set_status(
        &self,
        caller: &Caller,
        user_id: &UserId,
        status: AccountStatus,
    ) -> Result<UserProfile, ServiceError> {
        require_role(caller, ADMIN_ONLY)?;
        if &caller.user_id == user_id {
            return Err(ServiceError::conflict(
                "administrators cannot change their own status",
            ));
        }

        let user = self
            .users
            .set_account_status(user_id, status)
            .map_err(|err| match err {
                RepositoryError::NotFound => ServiceError::not_found("user not found"),
                other => other.into(),
            })?;

        info!(
            user_id = %user.id.0,
            status = status.label(),
            admin = %caller.user_id.0,
            "account status changed"
        );
        Ok(user.profile())
    }

    /// Seed an administrator. Succeeds without changes when the email already belongs to one.
    pub fn bootstrap_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ServiceError> {
        let email = normalize_email(email);
        if let Some(existing) = self.users.find_user_by_email(&email)? {
            if existing.role == Role::Admin {
                return Ok(existing.profile());
            }
            return Err(ServiceError::conflict(
                "bootstrap email belongs to a non-admin account",
            ));
        }

        validate_password(password)?;
        let user = self.create_user(name.trim().to_string(), email, password, Role::Admin)?;
        info!(user_id = %user.id.0, "administrator bootstrapped");
        Ok(user.profile())
    }

    fn create_user(
        &self,
        name: String,
        email: String,
        password: &str,
        role: Role,
    ) -> Result<User, ServiceError> {
        let password_hash = self
            .hasher
            .hash(password)
            .map_err(|err| ServiceError::Internal(err.to_string()))?;

        let user = User {
            id: UserId::generate(),
            name,
            email,
            password_hash,
            role,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        };

        self.users.insert_user(user).map_err(|err| match err {
            RepositoryError::Conflict => ServiceError::conflict("email is already registered"),
            other => other.into(),
        })
    }

    fn open_session(&self, user: &User) -> Result<Session, ServiceError> {
        let issued = self
            .tokens
            .issue(&user.id, user.role)
            .map_err(|err| ServiceError::Internal(err.to_string()))?;

        Ok(Session {
            token: issued.token,
            expires_at: issued.expires_at,
            user: user.profile(),
        })
    }
}

impl<R> Authenticator for IdentityService<R>
where
    R: UserRepository + 'static,
{
    fn authenticate(&self, token: &str) -> Result<Caller, ServiceError> {
        let claims = self.tokens.verify(token).map_err(|err| {
            if let TokenError::Invalid(reason) = &err {
                warn!(%reason, "rejected bearer token");
            }
            ServiceError::Unauthenticated
        })?;

        let user = self
            .users
            .fetch_user(&claims.subject())?
            .ok_or(ServiceError::Unauthenticated)?;
        ensure_active(&user)?;

        Ok(Caller {
            user_id: user.id,
            role: user.role,
        })
    }
}

fn ensure_active(user: &User) -> Result<(), ServiceError> {
    match user.status {
        AccountStatus::Active => Ok(()),
        other => Err(ServiceError::forbidden(format!(
            "account is {}",
            other.label()
        ))),
    }
}

fn validate_password(password: &str) -> Result<(), ServiceError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ServiceError::validation(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }
    Ok(())
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !email.contains(' ')
        }
        None => false,
    }
}
