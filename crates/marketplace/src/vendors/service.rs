use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{
    invalid_products, missing_fields, ApplicationDecision, ApplicationId, ApplicationPatch,
    ApplicationStatus, ApplicationSubmission, BusinessProfile, InitialProduct, VendorApplication,
};
use super::repository::ApplicationRepository;
use crate::access::{
    admits, owner_only, owner_or_admin, require_role, Caller, ADMIN_ONLY, CONSUMER_ONLY,
};
use crate::error::ServiceError;
use crate::identity::domain::User;
use crate::identity::repository::UserRepository;
use crate::store::RepositoryError;

/// Consumer -> vendor onboarding. The `approve` transition is the only code path that
/// elevates a user's role.
pub struct VendorApplicationService<S> {
    store: Arc<S>,
}

impl<S> VendorApplicationService<S>
where
    S: ApplicationRepository + UserRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submit a new application. The applicant's stored role must be consumer.
    pub fn submit(
        &self,
        caller: &Caller,
        submission: ApplicationSubmission,
    ) -> Result<VendorApplication, ServiceError> {
        let applicant = self.current_user(caller)?;
        if !admits(applicant.role, CONSUMER_ONLY) {
            return Err(ServiceError::forbidden(
                "only consumers can apply to become vendors",
            ));
        }

        validate(&submission.business, &submission.initial_products)?;

        if self
            .store
            .applications_for(&applicant.id)?
            .iter()
            .any(|existing| existing.status.blocks_resubmission())
        {
            return Err(duplicate_application());
        }

        let application = VendorApplication::new(applicant.id, submission, Utc::now());
        let stored = self
            .store
            .insert_application(application)
            .map_err(|err| match err {
                RepositoryError::Conflict => duplicate_application(),
                other => other.into(),
            })?;

        info!(
            application_id = %stored.id.0,
            applicant = %stored.applicant.0,
            "vendor application submitted"
        );
        Ok(stored)
    }

    /// Admin approval: pending -> approved, applicant promoted to vendor atomically.
    pub fn approve(
        &self,
        caller: &Caller,
        id: &ApplicationId,
    ) -> Result<VendorApplication, ServiceError> {
        require_role(caller, ADMIN_ONLY)?;
        let mut application = self.load(id)?;
        application
            .decide(ApplicationDecision::Approve, &caller.user_id, Utc::now())
            .map_err(|err| ServiceError::conflict(err.to_string()))?;

        let promoted = self
            .store
            .commit_approval(application.clone())
            .map_err(already_decided)?;
        info!(
            application_id = %application.id.0,
            applicant = %promoted.id.0,
            role = promoted.role.label(),
            admin = %caller.user_id.0,
            "vendor application approved"
        );
        Ok(application)
    }

    /// Admin rejection: pending -> rejected. The applicant's role is left alone.
    pub fn reject(
        &self,
        caller: &Caller,
        id: &ApplicationId,
        reason: Option<String>,
    ) -> Result<VendorApplication, ServiceError> {
        require_role(caller, ADMIN_ONLY)?;
        let mut application = self.load(id)?;
        let reason = reason
            .map(|reason| reason.trim().to_string())
            .filter(|reason| !reason.is_empty());
        application
            .decide(
                ApplicationDecision::Reject { reason },
                &caller.user_id,
                Utc::now(),
            )
            .map_err(|err| ServiceError::conflict(err.to_string()))?;

        self.store
            .replace_pending_application(application.clone())
            .map_err(already_decided)?;
        info!(
            application_id = %application.id.0,
            applicant = %application.applicant.0,
            admin = %caller.user_id.0,
            "vendor application rejected"
        );
        Ok(application)
    }

    /// Applicant edits while the application is still pending (merge patch).
    pub fn update(
        &self,
        caller: &Caller,
        id: &ApplicationId,
        patch: ApplicationPatch,
    ) -> Result<VendorApplication, ServiceError> {
        let mut application = self.load(id)?;
        owner_only(caller, &application)?;
        ensure_pending(&application)?;

        patch.apply_to(&mut application);
        validate(&application.business, &application.initial_products)?;
        application.updated_at = Utc::now();

        self.store
            .replace_pending_application(application.clone())
            .map_err(already_decided)?;
        info!(application_id = %application.id.0, "vendor application updated");
        Ok(application)
    }

    /// Remove a pending application (applicant or admin).
    pub fn withdraw(&self, caller: &Caller, id: &ApplicationId) -> Result<(), ServiceError> {
        let application = self.load(id)?;
        owner_or_admin(caller, &application)?;
        ensure_pending(&application)?;

        self.store.withdraw_application(id).map_err(already_decided)?;
        info!(application_id = %id.0, by = %caller.user_id.0, "vendor application withdrawn");
        Ok(())
    }

    pub fn get(
        &self,
        caller: &Caller,
        id: &ApplicationId,
    ) -> Result<VendorApplication, ServiceError> {
        let application = self.load(id)?;
        owner_or_admin(caller, &application)?;
        Ok(application)
    }

    /// The caller's own applications, newest first.
    pub fn mine(&self, caller: &Caller) -> Result<Vec<VendorApplication>, ServiceError> {
        let mut applications = self.store.applications_for(&caller.user_id)?;
        applications.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(applications)
    }

    /// Admin listing, oldest first so the review queue reads in arrival order.
    pub fn list(
        &self,
        caller: &Caller,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<VendorApplication>, ServiceError> {
        require_role(caller, ADMIN_ONLY)?;
        let mut applications = self.store.list_applications(status)?;
        applications.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(applications)
    }

    fn load(&self, id: &ApplicationId) -> Result<VendorApplication, ServiceError> {
        self.store
            .fetch_application(id)?
            .ok_or_else(|| ServiceError::not_found("vendor application not found"))
    }

    fn current_user(&self, caller: &Caller) -> Result<User, ServiceError> {
        self.store
            .fetch_user(&caller.user_id)?
            .ok_or_else(|| ServiceError::not_found("user not found"))
    }
}

fn ensure_pending(application: &VendorApplication) -> Result<(), ServiceError> {
    if application.status == ApplicationStatus::Pending {
        Ok(())
    } else {
        Err(ServiceError::conflict(format!(
            "application is already {}",
            application.status.label()
        )))
    }
}

fn validate(business: &BusinessProfile, products: &[InitialProduct]) -> Result<(), ServiceError> {
    let missing = missing_fields(business);
    if !missing.is_empty() {
        return Err(ServiceError::validation(format!(
            "missing required fields: {}",
            missing.join(", ")
        )));
    }

    let problems = invalid_products(products);
    if !problems.is_empty() {
        return Err(ServiceError::validation(problems.join("; ")));
    }
    Ok(())
}

/// A conditional write found the stored application no longer pending.
fn already_decided(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict => {
            ServiceError::conflict("vendor application has already been decided")
        }
        other => other.into(),
    }
}

fn duplicate_application() -> ServiceError {
    ServiceError::conflict("an open vendor application already exists for this user")
}
