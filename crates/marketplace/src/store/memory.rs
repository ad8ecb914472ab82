use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::RepositoryError;
use crate::catalog::domain::{Product, ProductFilter, ProductId, Review, ReviewId, ReviewKey};
use crate::catalog::ratings::RatingSummary;
use crate::catalog::repository::{ProductRepository, ReviewRepository};
use crate::identity::domain::{AccountStatus, Role, User, UserId};
use crate::identity::repository::UserRepository;
use crate::orders::domain::{Order, OrderId, OrderStatus};
use crate::orders::repository::OrderRepository;
use crate::vendors::domain::{ApplicationId, ApplicationStatus, VendorApplication};
use crate::vendors::repository::ApplicationRepository;
use crate::wishlist::repository::WishlistRepository;

/// In-process document store. Every operation takes the same lock, which is what makes
/// the multi-document methods transactional.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<UserId, User>,
    emails: HashMap<String, UserId>,
    applications: HashMap<ApplicationId, VendorApplication>,
    products: HashMap<ProductId, Product>,
    reviews: HashMap<ReviewId, Review>,
    review_keys: HashMap<ReviewKey, ReviewId>,
    orders: HashMap<OrderId, Order>,
    wishlists: HashMap<UserId, Vec<ProductId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, RepositoryError> {
        self.inner
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl UserRepository for MemoryStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.emails.contains_key(&user.email) || guard.users.contains_key(&user.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.emails.insert(user.email.clone(), user.id.clone());
        guard.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn set_account_status(
        &self,
        id: &UserId,
        status: AccountStatus,
    ) -> Result<User, RepositoryError> {
        let mut guard = self.lock()?;
        let user = guard.users.get_mut(id).ok_or(RepositoryError::NotFound)?;
        user.status = status;
        Ok(user.clone())
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .emails
            .get(email)
            .and_then(|id| guard.users.get(id))
            .cloned())
    }
}

impl ApplicationRepository for MemoryStore {
    fn insert_application(
        &self,
        application: VendorApplication,
    ) -> Result<VendorApplication, RepositoryError> {
        let mut guard = self.lock()?;
        let open = guard.applications.values().any(|existing| {
            existing.applicant == application.applicant && existing.status.blocks_resubmission()
        });
        if open || guard.applications.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .applications
            .insert(application.id.clone(), application.clone());
        Ok(application)
    }

    fn replace_pending_application(
        &self,
        application: VendorApplication,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let slot = guard
            .applications
            .get_mut(&application.id)
            .ok_or(RepositoryError::NotFound)?;
        if slot.status != ApplicationStatus::Pending {
            return Err(RepositoryError::Conflict);
        }
        *slot = application;
        Ok(())
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<VendorApplication>, RepositoryError> {
        Ok(self.lock()?.applications.get(id).cloned())
    }

    fn withdraw_application(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.applications.get(id) {
            Some(stored) if stored.status == ApplicationStatus::Pending => {}
            Some(_) => return Err(RepositoryError::Conflict),
            None => return Err(RepositoryError::NotFound),
        }
        guard.applications.remove(id);
        Ok(())
    }

    fn applications_for(
        &self,
        applicant: &UserId,
    ) -> Result<Vec<VendorApplication>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| &application.applicant == applicant)
            .cloned()
            .collect())
    }

    fn list_applications(
        &self,
        status: Option<ApplicationStatus>,
    ) -> Result<Vec<VendorApplication>, RepositoryError> {
        Ok(self
            .lock()?
            .applications
            .values()
            .filter(|application| status.map_or(true, |wanted| application.status == wanted))
            .cloned()
            .collect())
    }

    fn commit_approval(&self, application: VendorApplication) -> Result<User, RepositoryError> {
        let mut guard = self.lock()?;

        // A concurrent decision already landed.
        match guard.applications.get(&application.id) {
            Some(stored) if stored.status == ApplicationStatus::Pending => {}
            Some(_) => return Err(RepositoryError::Conflict),
            None => return Err(RepositoryError::NotFound),
        }

        let mut user = guard
            .users
            .get(&application.applicant)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;
        user.role = Role::Vendor;

        guard.users.insert(user.id.clone(), user.clone());
        guard.applications.insert(application.id.clone(), application);
        Ok(user)
    }
}

impl ProductRepository for MemoryStore {
    fn insert_product(&self, product: Product) -> Result<Product, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.products.contains_key(&product.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.products.insert(product.id.clone(), product.clone());
        Ok(product)
    }

    fn update_product(&self, product: Product) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.products.get_mut(&product.id) {
            Some(slot) => {
                *slot = product;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.lock()?.products.get(id).cloned())
    }

    fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        Ok(self
            .lock()?
            .products
            .values()
            .filter(|product| filter.matches(product))
            .cloned()
            .collect())
    }

    fn delete_product(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        let mut guard = self.lock()?;
        let product = guard.products.remove(id).ok_or(RepositoryError::NotFound)?;

        let Collections {
            reviews,
            review_keys,
            ..
        } = &mut *guard;
        reviews.retain(|_, review| &review.product != id);
        review_keys.retain(|key, _| &key.product != id);
        Ok(product)
    }

    fn apply_rating(
        &self,
        id: &ProductId,
        summary: RatingSummary,
    ) -> Result<Product, RepositoryError> {
        let mut guard = self.lock()?;
        let product = guard.products.get_mut(id).ok_or(RepositoryError::NotFound)?;
        product.apply_rating(summary);
        Ok(product.clone())
    }
}

impl ReviewRepository for MemoryStore {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        let mut guard = self.lock()?;
        let key = review.key();
        if guard.review_keys.contains_key(&key) || guard.reviews.contains_key(&review.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.review_keys.insert(key, review.id.clone());
        guard.reviews.insert(review.id.clone(), review.clone());
        Ok(review)
    }

    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        Ok(self.lock()?.reviews.get(id).cloned())
    }

    fn find_review(&self, key: &ReviewKey) -> Result<Option<Review>, RepositoryError> {
        let guard = self.lock()?;
        Ok(guard
            .review_keys
            .get(key)
            .and_then(|id| guard.reviews.get(id))
            .cloned())
    }

    fn reviews_for_product(&self, product: &ProductId) -> Result<Vec<Review>, RepositoryError> {
        Ok(self
            .lock()?
            .reviews
            .values()
            .filter(|review| &review.product == product)
            .cloned()
            .collect())
    }

    fn delete_review(&self, id: &ReviewId) -> Result<Review, RepositoryError> {
        let mut guard = self.lock()?;
        let review = guard.reviews.remove(id).ok_or(RepositoryError::NotFound)?;
        guard.review_keys.remove(&review.key());
        Ok(review)
    }
}

impl OrderRepository for MemoryStore {
    fn place_order(&self, order: Order) -> Result<Order, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.orders.contains_key(&order.id) {
            return Err(RepositoryError::Conflict);
        }

        let mut wanted: HashMap<&ProductId, u32> = HashMap::new();
        for item in &order.items {
            *wanted.entry(&item.product).or_default() += item.quantity;
        }

        for (product, quantity) in &wanted {
            let stored = guard
                .products
                .get(*product)
                .ok_or(RepositoryError::NotFound)?;
            if stored.stock < *quantity {
                return Err(RepositoryError::Conflict);
            }
        }

        for (product, quantity) in wanted {
            if let Some(stored) = guard.products.get_mut(product) {
                stored.stock -= quantity;
            }
        }

        guard.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    fn update_order(&self, order: Order, expected: OrderStatus) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        let slot = guard
            .orders
            .get_mut(&order.id)
            .ok_or(RepositoryError::NotFound)?;
        if slot.status != expected {
            return Err(RepositoryError::Conflict);
        }
        *slot = order;
        Ok(())
    }

    fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.lock()?.orders.get(id).cloned())
    }

    fn cancel_order(&self, order: Order, expected: OrderStatus) -> Result<Order, RepositoryError> {
        let mut guard = self.lock()?;
        match guard.orders.get(&order.id) {
            Some(stored) if stored.status == expected => {}
            Some(_) => return Err(RepositoryError::Conflict),
            None => return Err(RepositoryError::NotFound),
        }

        for item in &order.items {
            if let Some(product) = guard.products.get_mut(&item.product) {
                product.stock = product.stock.saturating_add(item.quantity);
            }
        }
        guard.orders.insert(order.id.clone(), order.clone());
        Ok(order)
    }

    fn orders_for_customer(&self, customer: &UserId) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .lock()?
            .orders
            .values()
            .filter(|order| &order.customer == customer)
            .cloned()
            .collect())
    }

    fn orders_for_vendor(&self, vendor: &UserId) -> Result<Vec<Order>, RepositoryError> {
        Ok(self
            .lock()?
            .orders
            .values()
            .filter(|order| order.involves_vendor(vendor))
            .cloned()
            .collect())
    }
}

impl WishlistRepository for MemoryStore {
    fn add_to_wishlist(
        &self,
        owner: &UserId,
        product: &ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.lock()?;
        let entries = guard.wishlists.entry(owner.clone()).or_default();
        if entries.contains(product) {
            return Ok(false);
        }
        entries.push(product.clone());
        Ok(true)
    }

    fn remove_from_wishlist(
        &self,
        owner: &UserId,
        product: &ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.lock()?;
        let Some(entries) = guard.wishlists.get_mut(owner) else {
            return Ok(false);
        };
        let before = entries.len();
        entries.retain(|entry| entry != product);
        Ok(entries.len() != before)
    }

    fn wishlist_for(&self, owner: &UserId) -> Result<Vec<ProductId>, RepositoryError> {
        Ok(self
            .lock()?
            .wishlists
            .get(owner)
            .cloned()
            .unwrap_or_default())
    }
}
