use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use axum::{Extension, Router};
use chrono::Utc;
use serde_json::Value;

use crate::access::{Authenticator, Caller};
use crate::error::ServiceError;
use crate::identity::domain::{AccountStatus, Role, User, UserId};
use crate::identity::repository::UserRepository;
use crate::store::{MemoryStore, RepositoryError};
use crate::vendors::domain::{
    ApplicationId, ApplicationStatus, ApplicationSubmission, BankingDetails, BusinessProfile,
    ContactDetails, InitialProduct, VendorApplication,
};
use crate::vendors::repository::ApplicationRepository;
use crate::vendors::{vendor_router, VendorApplicationService};

pub(super) fn build_service() -> (VendorApplicationService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (VendorApplicationService::new(store.clone()), store)
}

/// Insert an active account with the given role and return it as a caller.
pub(super) fn enrol(store: &MemoryStore, role: Role) -> Caller {
    let id = UserId::generate();
    store
        .insert_user(User {
            id: id.clone(),
            name: format!("{} user", role.label()),
            email: format!("{}@example.test", id.0),
            password_hash: "not-a-real-hash".to_string(),
            role,
            status: AccountStatus::Active,
            created_at: Utc::now(),
        })
        .expect("user inserted");
    Caller { user_id: id, role }
}

pub(super) fn stored_role(store: &MemoryStore, caller: &Caller) -> Role {
    store
        .fetch_user(&caller.user_id)
        .expect("fetch user")
        .expect("user exists")
        .role
}

pub(super) fn business() -> BusinessProfile {
    BusinessProfile {
        business_name: "Lumen Ceramics".to_string(),
        business_type: Some("sole_proprietor".to_string()),
        tax_id: "TX-88123".to_string(),
        contact: ContactDetails {
            email: "studio@lumen.test".to_string(),
            phone: "+1-555-0100".to_string(),
            address: "12 Kiln Row".to_string(),
        },
        banking: BankingDetails {
            account_holder: "Lumen Ceramics LLC".to_string(),
            bank_name: "First Clay Bank".to_string(),
            account_number: "004412".to_string(),
            routing_code: Some("021000021".to_string()),
        },
    }
}

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        business: business(),
        initial_products: vec![InitialProduct {
            name: "Speckled Mug".to_string(),
            description: "Wheel-thrown stoneware".to_string(),
            price: 28.0,
            category: "kitchen".to_string(),
        }],
    }
}

/// Once armed, the next application read is followed by a committed approval of that
/// application, the way a second admin acting at the same moment would interleave.
pub(super) struct ApprovedAfterRead {
    pub(super) inner: MemoryStore,
    armed: AtomicBool,
}

impl ApprovedAfterRead {
    pub(super) fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            armed: AtomicBool::new(false),
        }
    }

    pub(super) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl ApplicationRepository for ApprovedAfterRead {
    fn insert_application(
        &self,
        application: VendorApplication,
    ) -> Result<VendorApplication, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn replace_pending_application(
        &self,
        application: VendorApplication,
    ) -> Result<(), RepositoryError> {
        self.inner.replace_pending_application(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<VendorApplication>, RepositoryError> {
        let read = self.inner.fetch_application(id)?;
        if self.armed.swap(false, Ordering::SeqCst) {
            if let Some(mut approved) = read.clone() {
                approved.status = ApplicationStatus::Approved;
                self.inner.commit_approval(approved)?;
            }
        }
        Ok(read)
    }

    fn withdraw_application(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        self.inner.withdraw_application(id)
    }

    fn applications_for(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<VendorApplication>, RepositoryError> {
        self.inner.applications_for(applicant)
    }

    fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<VendorApplication>, RepositoryError> {
        self.inner.list_applications(status)
    }

    fn commit_approval(&self, application: VendorApplication) -> Result<User, RepositoryError> {
        self.inner.commit_approval(application)
    }
}

impl UserRepository for ApprovedAfterRead {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        self.inner.insert_user(user)
    }

    fn set_account_status(
        &self,
        id: &UserId,
        status: AccountStatus,
    ) -> Result<User, RepositoryError> {
        self.inner.set_account_status(id, status)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.fetch_user(id)
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        self.inner.find_user_by_email(email)
    }
}

pub(super) fn racing_service() -> (
    VendorApplicationService<ApprovedAfterRead>,
    Arc<ApprovedAfterRead>,
) {
    let store = Arc::new(ApprovedAfterRead::new());
    (VendorApplicationService::new(store.clone()), store)
}

/// Resolves a bearer token equal to a user id, reloading the stored role like the real
/// identity service does.
pub(super) struct StoreAuthenticator(pub(super) Arc<MemoryStore>);

impl Authenticator for StoreAuthenticator {
    fn authenticate(&self, token: &str) -> Result<Caller, ServiceError> {
        let user = self
            .0
            .fetch_user(&UserId(token.to_string()))?
            .ok_or(ServiceError::Unauthenticated)?;
        Ok(Caller {
            user_id: user.id,
            role: user.role,
        })
    }
}

pub(super) fn router_with_service(
    service: VendorApplicationService<MemoryStore>,
    store: Arc<MemoryStore>,
) -> Router {
    let authenticator: Arc<dyn Authenticator> = Arc::new(StoreAuthenticator(store));
    vendor_router(Arc::new(service)).layer(Extension(authenticator))
}

pub(super) fn bearer(caller: &Caller) -> String {
    format!("Bearer {}", caller.user_id.0)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
