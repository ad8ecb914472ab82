use super::domain::{Product, ProductFilter, ProductId, Review, ReviewId, ReviewKey};
use super::ratings::RatingSummary;
use crate::store::RepositoryError;

/// Storage abstraction for product documents.
pub trait ProductRepository: Send + Sync {
    fn insert_product(&self, product: Product) -> Result<Product, RepositoryError>;
    fn update_product(&self, product: Product) -> Result<(), RepositoryError>;
    fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    /// Remove a product together with every review attached to it.
    fn delete_product(&self, id: &ProductId) -> Result<Product, RepositoryError>;

    /// Overwrite the rating cache fields only.
    fn apply_rating(
        &self,
        id: &ProductId,
        summary: RatingSummary,
    ) -> Result<Product, RepositoryError>;
}

/// Storage abstraction for reviews.
///
/// `insert_review` enforces the (product, author, order) uniqueness constraint and
/// returns [`RepositoryError::Conflict`] on violation.
pub trait ReviewRepository: Send + Sync {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError>;
    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError>;
    fn find_review(&self, key: &ReviewKey) -> Result<Option<Review>, RepositoryError>;
    fn reviews_for_product(&self, product: &ProductId) -> Result<Vec<Review>, RepositoryError>;
    fn delete_review(&self, id: &ReviewId) -> Result<Review, RepositoryError>;
}
