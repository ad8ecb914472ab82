//! Vendor onboarding: application intake, admin decisions, and role promotion.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationDecision, ApplicationId, ApplicationPatch, ApplicationStatus,
    ApplicationSubmission, BankingDetails, BankingPatch, BusinessProfile, ContactDetails,
    ContactPatch, InitialProduct, VendorApplication,
};
pub use repository::ApplicationRepository;
pub use router::vendor_router;
pub use service::VendorApplicationService;
