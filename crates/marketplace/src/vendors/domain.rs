use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Owned;
use crate::identity::domain::UserId;

/// Identifier wrapper for vendor applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(format!("vapp-{}", Uuid::new_v4().simple()))
    }
}

/// Lifecycle of a vendor application. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn is_terminal(self) -> bool {
        !matches!(self, ApplicationStatus::Pending)
    }

    /// Pending and approved applications both block a new submission.
    pub const fn blocks_resubmission(self) -> bool {
        !matches!(self, ApplicationStatus::Rejected)
    }
}

/// Admin verdict applied to a pending application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationDecision {
    Approve,
    Reject { reason: Option<String> },
}

impl ApplicationDecision {
    pub const fn target(&self) -> ApplicationStatus {
        match self {
            ApplicationDecision::Approve => ApplicationStatus::Approved,
            ApplicationDecision::Reject { .. } => ApplicationStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactDetails {
    pub email: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BankingDetails {
    pub account_holder: String,
    pub bank_name: String,
    pub account_number: String,
    #[serde(default)]
    pub routing_code: Option<String>,
}

/// Business identity a consumer supplies when applying to sell.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub business_name: String,
    #[serde(default)]
    pub business_type: Option<String>,
    pub tax_id: String,
    pub contact: ContactDetails,
    pub banking: BankingDetails,
}

/// Product the applicant intends to list once approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub business: BusinessProfile,
    #[serde(default)]
    pub initial_products: Vec<InitialProduct>,
}

/// Merge patch for the contact block; `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactPatch {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BankingPatch {
    pub account_holder: Option<String>,
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub routing_code: Option<String>,
}

/// Merge patch applied by the applicant while the application is pending.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApplicationPatch {
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub tax_id: Option<String>,
    #[serde(default)]
    pub contact: Option<ContactPatch>,
    #[serde(default)]
    pub banking: Option<BankingPatch>,
    pub initial_products: Option<Vec<InitialProduct>>,
}

fn merge(target: &mut String, value: Option<String>) {
    if let Some(value) = value {
        *target = value;
    }
}

impl ApplicationPatch {
    pub fn apply_to(self, application: &mut VendorApplication) {
        let business = &mut application.business;
        merge(&mut business.business_name, self.business_name);
        if let Some(kind) = self.business_type {
            business.business_type = Some(kind);
        }
        merge(&mut business.tax_id, self.tax_id);

        if let Some(contact) = self.contact {
            merge(&mut business.contact.email, contact.email);
            merge(&mut business.contact.phone, contact.phone);
            merge(&mut business.contact.address, contact.address);
        }

        if let Some(banking) = self.banking {
            merge(&mut business.banking.account_holder, banking.account_holder);
            merge(&mut business.banking.bank_name, banking.bank_name);
            merge(&mut business.banking.account_number, banking.account_number);
            if let Some(routing) = banking.routing_code {
                business.banking.routing_code = Some(routing);
            }
        }

        if let Some(products) = self.initial_products {
            application.initial_products = products;
        }
    }
}

/// Stored vendor application document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorApplication {
    pub id: ApplicationId,
    pub applicant: UserId,
    pub business: BusinessProfile,
    pub initial_products: Vec<InitialProduct>,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl VendorApplication {
    pub fn new(applicant: UserId, submission: ApplicationSubmission, now: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::generate(),
            applicant,
            business: submission.business,
            initial_products: submission.initial_products,
            status: ApplicationStatus::Pending,
            submitted_at: now,
            updated_at: now,
            decided_at: None,
            decided_by: None,
            rejection_reason: None,
        }
    }

    /// Apply an admin decision. Only pending applications accept one.
    pub fn decide(
        &mut self,
        decision: ApplicationDecision,
        admin: &UserId,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError {
                from: self.status,
                to: decision.target(),
            });
        }

        self.status = decision.target();
        self.rejection_reason = match decision {
            ApplicationDecision::Approve => None,
            ApplicationDecision::Reject { reason } => reason,
        };
        self.decided_at = Some(now);
        self.decided_by = Some(admin.clone());
        self.updated_at = now;
        Ok(())
    }
}

impl Owned for VendorApplication {
    fn owner(&self) -> &UserId {
        &self.applicant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("application is already {}, cannot move to {}", from.label(), to.label())]
pub struct TransitionError {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// Names of required business fields that are blank.
pub fn missing_fields(business: &BusinessProfile) -> Vec<&'static str> {
    let required = [
        ("business_name", &business.business_name),
        ("tax_id", &business.tax_id),
        ("contact.email", &business.contact.email),
        ("contact.phone", &business.contact.phone),
        ("contact.address", &business.contact.address),
        ("banking.account_holder", &business.banking.account_holder),
        ("banking.bank_name", &business.banking.bank_name),
        ("banking.account_number", &business.banking.account_number),
    ];

    required
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
}

/// Problems with the proposed initial catalog, one message per product.
pub fn invalid_products(products: &[InitialProduct]) -> Vec<String> {
    products
        .iter()
        .enumerate()
        .filter_map(|(index, product)| {
            if product.name.trim().is_empty() {
                Some(format!("initial_products[{index}].name is required"))
            } else if product.category.trim().is_empty() {
                Some(format!("initial_products[{index}].category is required"))
            } else if !(product.price.is_finite() && product.price > 0.0) {
                Some(format!("initial_products[{index}].price must be positive"))
            } else {
                None
            }
        })
        .collect()
}
