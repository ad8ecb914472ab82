use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use axum::{Extension, Router};
use chrono::Utc;
use serde_json::Value;

use crate::access::{Authenticator, Caller};
use crate::catalog::domain::{Product, ProductDraft, ProductFilter, ProductId};
use crate::catalog::ratings::RatingSummary;
use crate::catalog::repository::ProductRepository;
use crate::error::ServiceError;
use crate::identity::domain::{Role, UserId};
use crate::orders::domain::{Order, OrderId, OrderRequest, OrderRequestItem, OrderStatus};
use crate::orders::repository::OrderRepository;
use crate::orders::{order_router, OrderService};
use crate::store::{MemoryStore, RepositoryError};

pub(super) fn build_service() -> (OrderService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    (OrderService::new(store.clone()), store)
}

pub(super) fn caller(role: Role) -> Caller {
    Caller {
        user_id: UserId::generate(),
        role,
    }
}

pub(super) fn stock_product(store: &MemoryStore, vendor: &Caller, name: &str, price: f64, stock: u32) -> Product {
    let product = Product::new(
        vendor.user_id.clone(),
        ProductDraft {
            name: name.to_string(),
            description: String::new(),
            category: "kitchen".to_string(),
            price,
            stock,
            images: Vec::new(),
        },
        Utc::now(),
    );
    store.insert_product(product).expect("product inserted")
}

pub(super) fn stock_of(store: &MemoryStore, id: &ProductId) -> u32 {
    store
        .fetch_product(id)
        .expect("fetch product")
        .expect("product exists")
        .stock
}

pub(super) fn request(lines: &[(&ProductId, u32)]) -> OrderRequest {
    OrderRequest {
        items: lines
            .iter()
            .map(|(product, quantity)| OrderRequestItem {
                product_id: (*product).clone(),
                quantity: *quantity,
            })
            .collect(),
    }
}

/// Accepts `role:user-id` tokens.
pub(super) struct TokenIsCaller;

impl Authenticator for TokenIsCaller {
    fn authenticate(&self, token: &str) -> Result<Caller, ServiceError> {
        let (role, id) = token.split_once(':').ok_or(ServiceError::Unauthenticated)?;
        Ok(Caller {
            user_id: UserId(id.to_string()),
            role: Role::parse(role).ok_or(ServiceError::Unauthenticated)?,
        })
    }
}

pub(super) fn bearer(caller: &Caller) -> String {
    format!("Bearer {}:{}", caller.role.label(), caller.user_id.0)
}

pub(super) fn router_with_service(service: OrderService<MemoryStore>) -> Router {
    let authenticator: Arc<dyn Authenticator> = Arc::new(TokenIsCaller);
    order_router(Arc::new(service)).layer(Extension(authenticator))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Cancels the order behind the caller's back right after the next armed read,
/// so the service acts on a copy that is already stale.
pub(super) struct CancelledAfterRead {
    pub(super) inner: MemoryStore,
    armed: AtomicBool,
}

impl CancelledAfterRead {
    pub(super) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

pub(super) fn racing_service() -> (OrderService<CancelledAfterRead>, Arc<CancelledAfterRead>) {
    let store = Arc::new(CancelledAfterRead {
        inner: MemoryStore::new(),
        armed: AtomicBool::new(false),
    });
    (OrderService::new(store.clone()), store)
}

impl OrderRepository for CancelledAfterRead {
    fn place_order(&self, order: Order) -> Result<Order, RepositoryError> {
        self.inner.place_order(order)
    }
    fn update_order(&self, order: Order, expected: OrderStatus) -> Result<(), RepositoryError> {
        self.inner.update_order(order, expected)
    }
    fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let read = self.inner.fetch_order(id)?;
        if let Some(stored) = read.clone() {
            if self.armed.swap(false, Ordering::SeqCst) {
                let from = stored.status;
                let mut cancelled = stored;
                cancelled
                    .transition(OrderStatus::Cancelled, Utc::now())
                    .expect("cancellable");
                self.inner
                    .cancel_order(cancelled, from)
                    .expect("concurrent cancel");
            }
        }
        Ok(read)
    }
    fn cancel_order(&self, order: Order, expected: OrderStatus) -> Result<Order, RepositoryError> {
        self.inner.cancel_order(order, expected)
    }
    fn orders_for_customer(&self, customer: &UserId) -> Result<Vec<Order>, RepositoryError> {
        self.inner.orders_for_customer(customer)
    }
    fn orders_for_vendor(&self, vendor: &UserId) -> Result<Vec<Order>, RepositoryError> {
        self.inner.orders_for_vendor(vendor)
    }
}

impl ProductRepository for CancelledAfterRead {
    fn insert_product(&self, product: Product) -> Result<Product, RepositoryError> {
        self.inner.insert_product(product)
    }
    fn update_product(&self, product: Product) -> Result<(), RepositoryError> {
        self.inner.update_product(product)
    }
    fn fetch_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        self.inner.fetch_product(id)
    }
    fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        self.inner.list_products(filter)
    }
    fn delete_product(&self, id: &ProductId) -> Result<Product, RepositoryError> {
        self.inner.delete_product(id)
    }
    fn apply_rating(
        &self,
        id: &ProductId,
        summary: RatingSummary,
    ) -> Result<Product, RepositoryError> {
        self.inner.apply_rating(id, summary)
    }
}
