use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{Product, ProductDraft, ProductFilter, ProductId, ProductPatch};
use super::ratings::{recover, ProductLocks};
use super::repository::{ProductRepository, ReviewRepository};
use crate::access::{owner_or_admin, require_role, Caller, VENDOR_ONLY};
use crate::error::ServiceError;
use crate::identity::domain::UserId;
use crate::media::MediaService;
use crate::orders::repository::OrderRepository;

/// Product listings and their reviews. Every write that touches a product document runs
/// under that product's lock so vendor edits never clobber a fresh rating aggregate.
pub struct CatalogService<S> {
    pub(super) store: Arc<S>,
    pub(super) media: Arc<MediaService>,
    pub(super) locks: ProductLocks,
}

impl<S> CatalogService<S>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    pub fn new(store: Arc<S>, media: Arc<MediaService>) -> Self {
        Self {
            store,
            media,
            locks: ProductLocks::new(),
        }
    }

    pub fn create_product(
        &self,
        caller: &Caller,
        draft: ProductDraft,
    ) -> Result<Product, ServiceError> {
        require_role(caller, VENDOR_ONLY)?;
        validate_listing(&draft.name, &draft.category, draft.price)?;
        self.media.ensure_owned(&caller.user_id, &draft.images)?;

        let product = Product::new(caller.user_id.clone(), draft, Utc::now());
        let stored = self.store.insert_product(product)?;
        info!(product_id = %stored.id.0, vendor = %stored.vendor.0, "product created");
        Ok(stored)
    }

    pub fn update_product(
        &self,
        caller: &Caller,
        id: &ProductId,
        patch: ProductPatch,
    ) -> Result<Product, ServiceError> {
        let lock = self.lock_existing(id)?;
        let _guard = recover(lock.lock());

        let mut product = self.load_locked(id)?;
        owner_or_admin(caller, &product)?;

        let previous_images = product.images.clone();
        patch.apply_to(&mut product);
        validate_listing(&product.name, &product.category, product.price)?;
        let added: Vec<String> = product
            .images
            .iter()
            .filter(|url| !previous_images.contains(url))
            .cloned()
            .collect();
        self.media.ensure_owned(&product.vendor, &added)?;
        product.updated_at = Utc::now();

        self.store.update_product(product.clone())?;

        let dropped: Vec<String> = previous_images
            .into_iter()
            .filter(|url| !product.images.contains(url))
            .collect();
        self.release_unreferenced(&product.vendor, dropped);

        info!(product_id = %product.id.0, by = %caller.user_id.0, "product updated");
        Ok(product)
    }

    /// Removes the product, its reviews, and uploaded images no other listing shows.
    pub fn delete_product(&self, caller: &Caller, id: &ProductId) -> Result<(), ServiceError> {
        let lock = self.lock_existing(id)?;
        let removed = {
            let _guard = recover(lock.lock());
            let product = self.load_locked(id)?;
            owner_or_admin(caller, &product)?;
            self.store.delete_product(id)?
        };
        self.locks.forget(id);
        self.release_unreferenced(&removed.vendor, removed.images);

        info!(product_id = %id.0, by = %caller.user_id.0, "product deleted");
        Ok(())
    }

    pub fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        self.load(id)
    }

    /// Public listing, newest first.
    pub fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, ServiceError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(ServiceError::validation(
                    "min_price must not exceed max_price",
                ));
            }
        }

        let mut products = self.store.list_products(filter)?;
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }

    pub(super) fn load(&self, id: &ProductId) -> Result<Product, ServiceError> {
        self.store
            .fetch_product(id)?
            .ok_or_else(|| ServiceError::not_found("product not found"))
    }

    /// Images are only ever attached by their uploader, so only the vendor's own listings
    /// can still reference a candidate.
    fn release_unreferenced(&self, vendor: &UserId, candidates: Vec<String>) {
        if candidates.is_empty() {
            return;
        }
        let filter = ProductFilter {
            vendor: Some(vendor.clone()),
            ..ProductFilter::default()
        };
        let still_shown: HashSet<String> = match self.store.list_products(&filter) {
            Ok(products) => products.into_iter().flat_map(|p| p.images).collect(),
            Err(err) => {
                warn!(vendor = %vendor.0, error = %err, "skipping media release");
                return;
            }
        };
        let orphaned: Vec<String> = candidates
            .into_iter()
            .filter(|url| !still_shown.contains(url))
            .collect();
        self.media.release(vendor, &orphaned);
    }

    /// Lock entries are only created for products that exist when asked for.
    pub(super) fn lock_existing(&self, id: &ProductId) -> Result<Arc<Mutex<()>>, ServiceError> {
        self.load(id)?;
        Ok(self.locks.for_product(id))
    }

    /// Re-read under the product lock. A product deleted in between loses its entry.
    pub(super) fn load_locked(&self, id: &ProductId) -> Result<Product, ServiceError> {
        let loaded = self.load(id);
        if matches!(loaded, Err(ServiceError::NotFound(_))) {
            self.locks.forget(id);
        }
        loaded
    }
}

fn validate_listing(name: &str, category: &str, price: f64) -> Result<(), ServiceError> {
    let mut problems = Vec::new();
    if name.trim().is_empty() {
        problems.push("name is required");
    }
    if category.trim().is_empty() {
        problems.push("category is required");
    }
    if !(price.is_finite() && price > 0.0) {
        problems.push("price must be positive");
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(ServiceError::validation(problems.join("; ")))
    }
}
