use std::sync::Arc;

use axum::response::Response;
use axum::{Extension, Router};
use chrono::Utc;
use serde_json::Value;

use crate::access::{Authenticator, Caller};
use crate::catalog::domain::{
    Product, ProductDraft, ProductFilter, ProductId, Review, ReviewId, ReviewKey,
};
use crate::catalog::ratings::RatingSummary;
use crate::catalog::repository::{ProductRepository, ReviewRepository};
use crate::catalog::{catalog_router, CatalogService};
use crate::error::ServiceError;
use crate::identity::domain::{Role, UserId};
use crate::media::{InMemoryMediaStore, MediaService};
use crate::orders::domain::{LineItem, Order, OrderId, OrderStatus};
use crate::orders::repository::OrderRepository;
use crate::store::{MemoryStore, RepositoryError};

pub(super) fn media() -> Arc<MediaService> {
    Arc::new(MediaService::new(Arc::new(InMemoryMediaStore::new(
        "http://media.test",
    ))))
}

pub(super) fn build_service() -> (CatalogService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (CatalogService::new(store.clone(), media()), store)
}

pub(super) fn caller(role: Role) -> Caller {
    Caller {
        user_id: UserId::generate(),
        role,
    }
}

pub(super) fn draft(name: &str) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        description: "Hand glazed".to_string(),
        category: "kitchen".to_string(),
        price: 24.0,
        stock: 10,
        images: Vec::new(),
    }
}

/// Place an order for one unit of `product` and push it to the given status.
pub(super) fn order_with_status<S>(
    store: &S,
    buyer: &Caller,
    product: &Product,
    status: OrderStatus,
) -> OrderId
where
    S: OrderRepository,
{
    let mut order = Order::new(
        buyer.user_id.clone(),
        vec![LineItem {
            product: product.id.clone(),
            vendor: product.vendor.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            quantity: 1,
        }],
        Utc::now(),
    );
    order = store.place_order(order).expect("order placed");
    let placed = order.status;
    order.status = status;
    store.update_order(order.clone(), placed).expect("order updated");
    order.id
}

pub(super) fn delivered_order<S: OrderRepository>(
    store: &S,
    buyer: &Caller,
    product: &Product,
) -> OrderId {
    order_with_status(store, buyer, product, OrderStatus::Delivered)
}

pub(super) fn product_state(store: &MemoryStore, id: &ProductId) -> (f64, u32) {
    let product = store
        .fetch_product(id)
        .expect("fetch product")
        .expect("product exists");
    (product.rating, product.review_count)
}

/// Delegates to a [`MemoryStore`] but refuses to write rating caches.
pub(super) struct BrokenRatings(pub(super) MemoryStore);

impl ProductRepository for BrokenRatings {
    fn insert_product(&self, product: Product) -> Result<Product, RepositoryError> {
        self.0.insert_product(product)
    }
    fn update_product(&self, product: Product) -> Result<(), RepositoryError> {
        self.0.update_product(product)
    }
    fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.0.fetch_product(id)
    }
    fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        self.0.list_products(filter)
    }
    fn delete_product(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        self.0.delete_product(id)
    }
    fn apply_rating(
        &self,
        _id: &ProductId,
        _summary: RatingSummary,
    ) -> Result<Product, RepositoryError> {
        Err(RepositoryError::Unavailable("rating cache offline".to_string()))
    }
}

impl ReviewRepository for BrokenRatings {
    fn insert_review(&self, review: Review) -> Result<Review, RepositoryError> {
        self.0.insert_review(review)
    }
    fn fetch_review(&self, id: &ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.0.fetch_review(id)
    }
    fn find_review(&self, key: &ReviewKey) -> Result<Option<Review>, RepositoryError> {
        self.0.find_review(key)
    }
    fn reviews_for_product(&self, product: &ProductId) -> Result<Vec<Review>, RepositoryError> {
        self.0.reviews_for_product(product)
    }
    fn delete_review(&self, id: &ReviewId) -> Result<Review, RepositoryError> {
        self.0.delete_review(id)
    }
}

impl OrderRepository for BrokenRatings {
    fn place_order(&self, order: Order) -> Result<Order, RepositoryError> {
        self.0.place_order(order)
    }
    fn update_order(&self, order: Order, expected: OrderStatus) -> Result<(), RepositoryError> {
        self.0.update_order(order, expected)
    }
    fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        self.0.fetch_order(id)
    }
    fn cancel_order(&self, order: Order, expected: OrderStatus) -> Result<Order, RepositoryError> {
        self.0.cancel_order(order, expected)
    }
    fn orders_for_customer(&self, customer: &UserId) -> Result<Vec<Order>, RepositoryError> {
        self.0.orders_for_customer(customer)
    }
    fn orders_for_vendor(&self, vendor: &UserId) -> Result<Vec<Order>, RepositoryError> {
        self.0.orders_for_vendor(vendor)
    }
}

/// Accepts `role:user-id` tokens so routing tests can pick any caller.
pub(super) struct TokenIsCaller;

impl Authenticator for TokenIsCaller {
    fn authenticate(&self, token: &str) -> Result<Caller, ServiceError> {
        let (role, id) = token.split_once(':').ok_or(ServiceError::Unauthenticated)?;
        let role = Role::parse(role).ok_or(ServiceError::Unauthenticated)?;
        Ok(Caller {
            user_id: UserId(id.to_string()),
            role,
        })
    }
}

pub(super) fn bearer(caller: &Caller) -> String {
    format!("Bearer {}:{}", caller.role.label(), caller.user_id.0)
}

pub(super) fn router_with_service(service: CatalogService<MemoryStore>) -> Router {
    let authenticator: Arc<dyn Authenticator> = Arc::new(TokenIsCaller);
    catalog_router(Arc::new(service)).layer(Extension(authenticator))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
