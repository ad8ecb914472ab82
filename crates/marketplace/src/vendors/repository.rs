use super::domain::{ApplicationId, ApplicationStatus, VendorApplication};
use crate::identity::domain::{User, UserId};
use crate::store::RepositoryError;

/// Storage abstraction for vendor applications.
pub trait ApplicationRepository: Send + Sync {
    /// Insert a new application. Returns [`RepositoryError::Conflict`] when the applicant
    /// already holds a pending or approved application; the check and the insert are atomic.
    fn insert_application(
        &self,
        application: VendorApplication,
    ) -> Result<VendorApplication, RepositoryError>;

    /// Overwrite an application that is still pending in storage. Returns
    /// [`RepositoryError::Conflict`] when a decision landed since it was read.
    fn replace_pending_application(
        &self,
        application: VendorApplication,
    ) -> Result<(), RepositoryError>;

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<VendorApplication>, RepositoryError>;

    /// Delete a pending application; decided ones return [`RepositoryError::Conflict`].
    fn withdraw_application(&self, id: &ApplicationId) -> Result<(), RepositoryError>;

    fn applications_for(&self, applicant: &UserId)
        -> Result<Vec<VendorApplication>, RepositoryError>;

    fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<VendorApplication>, RepositoryError>;

    /// Persist an approved application and promote its applicant to vendor in one
    /// transaction. Either both documents change or neither does; a stored application
    /// that is no longer pending yields [`RepositoryError::Conflict`].
    fn commit_approval(&self, application: VendorApplication) -> Result<User, RepositoryError>;
}
