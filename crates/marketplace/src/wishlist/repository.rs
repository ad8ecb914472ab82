use crate::catalog::domain::ProductId;
use crate::identity::domain::UserId;
use crate::store::RepositoryError;

/// One insertion-ordered set of product ids per user.
pub trait WishlistRepository: Send + Sync {
    /// Returns `false` when the product was already listed.
    fn add_to_wishlist(&self, owner: &UserId, product: &ProductId)
        -> Result<bool, RepositoryError>;
    fn remove_from_wishlist(
        &self,
        owner: &UserId,
        product: &ProductId,
    ) -> Result<bool, RepositoryError>;
    fn wishlist_for(&self, owner: &UserId) -> Result<Vec<ProductId>, RepositoryError>;
}
