//! Product catalog and the review/rating consistency engine.

pub mod domain;
pub mod ratings;
pub mod repository;
mod reviews;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    Product, ProductDraft, ProductFilter, ProductId, ProductPatch, Review, ReviewId,
    ReviewSubmission,
};
pub use ratings::RatingSummary;
pub use repository::{ProductRepository, ReviewRepository};
pub use router::catalog_router;
pub use service::CatalogService;
