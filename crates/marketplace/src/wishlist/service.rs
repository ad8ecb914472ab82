use std::sync::Arc;

use tracing::debug;

use super::repository::WishlistRepository;
use crate::access::Caller;
use crate::catalog::domain::{Product, ProductId};
use crate::catalog::repository::ProductRepository;
use crate::error::ServiceError;

pub struct WishlistService<S> {
    store: Arc<S>,
}

impl<S> WishlistService<S>
where
    S: WishlistRepository + ProductRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Adding a product twice leaves the list unchanged.
    pub fn add(&self, caller: &Caller, product: &ProductId) -> Result<Vec<Product>, ServiceError> {
        if self.store.fetch_product(product)?.is_none() {
            return Err(ServiceError::not_found("product not found"));
        }
        let added = self.store.add_to_wishlist(&caller.user_id, product)?;
        debug!(owner = %caller.user_id.0, product_id = %product.0, added, "wishlist add");
        self.view(caller)
    }

    pub fn remove(&self, caller: &Caller, product: &ProductId) -> Result<Vec<Product>, ServiceError> {
        let removed = self.store.remove_from_wishlist(&caller.user_id, product)?;
        debug!(owner = %caller.user_id.0, product_id = %product.0, removed, "wishlist remove");
        self.view(caller)
    }

    /// Resolved products in insertion order. Entries for deleted products are skipped.
    pub fn view(&self, caller: &Caller) -> Result<Vec<Product>, ServiceError> {
        let mut products = Vec::new();
        for id in self.store.wishlist_for(&caller.user_id)? {
            if let Some(product) = self.store.fetch_product(&id)? {
                products.push(product);
            }
        }
        Ok(products)
    }
}
