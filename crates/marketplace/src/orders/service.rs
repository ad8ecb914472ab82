use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::domain::{LineItem, Order, OrderId, OrderRequest, OrderStatus};
use super::repository::OrderRepository;
use crate::access::{owner_or_admin, require_role, Caller, VENDOR_ONLY, VENDOR_OR_ADMIN};
use crate::catalog::domain::ProductId;
use crate::catalog::repository::ProductRepository;
use crate::error::ServiceError;
use crate::identity::domain::Role;
use crate::store::RepositoryError;

/// Order placement and fulfilment. Delivered orders are what make a purchase reviewable.
pub struct OrderService<S> {
    store: Arc<S>,
}

impl<S> OrderService<S>
where
    S: OrderRepository + ProductRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn place_order(
        &self,
        caller: &Caller,
        request: OrderRequest,
    ) -> Result<Order, ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::validation("an order needs at least one item"));
        }

        let mut items: Vec<LineItem> = Vec::with_capacity(request.items.len());
        for requested in request.items {
            if requested.quantity == 0 {
                return Err(ServiceError::validation(format!(
                    "quantity for {} must be at least 1",
                    requested.product_id.0
                )));
            }

            let product = self
                .store
                .fetch_product(&requested.product_id)?
                .ok_or_else(|| unknown_product(&requested.product_id))?;
            let already: u32 = items
                .iter()
                .filter(|item| item.product == product.id)
                .map(|item| item.quantity)
                .sum();
            if product.stock < already.saturating_add(requested.quantity) {
                return Err(ServiceError::validation(format!(
                    "insufficient stock for {}",
                    product.name
                )));
            }

            items.push(LineItem {
                product: product.id,
                vendor: product.vendor,
                name: product.name,
                unit_price: product.price,
                quantity: requested.quantity,
            });
        }

        let order = Order::new(caller.user_id.clone(), items, Utc::now());
        let placed = self.store.place_order(order).map_err(|err| match err {
            RepositoryError::Conflict | RepositoryError::NotFound => {
                ServiceError::conflict("catalog changed while the order was being placed")
            }
            other => other.into(),
        })?;

        info!(
            order_id = %placed.id.0,
            customer = %placed.customer.0,
            total = placed.total,
            "order placed"
        );
        Ok(placed)
    }

    /// Move an order one step along the fulfilment pipeline. Admins, or vendors with at
    /// least one line item in the order.
    pub fn advance(
        &self,
        caller: &Caller,
        id: &OrderId,
        next: OrderStatus,
    ) -> Result<Order, ServiceError> {
        require_role(caller, VENDOR_OR_ADMIN)?;
        if next == OrderStatus::Cancelled {
            return Err(ServiceError::validation(
                "orders are cancelled through the cancel operation",
            ));
        }

        let mut order = self.load(id)?;
        if !(caller.is_admin() || order.involves_vendor(&caller.user_id)) {
            return Err(ServiceError::forbidden(
                "you are not allowed to perform this action",
            ));
        }

        let from = order.status;
        order
            .transition(next, Utc::now())
            .map_err(|err| ServiceError::conflict(err.to_string()))?;
        self.store
            .update_order(order.clone(), from)
            .map_err(changed_concurrently)?;

        info!(order_id = %order.id.0, status = order.status.label(), by = %caller.user_id.0, "order status changed");
        Ok(order)
    }

    /// Customer or admin cancellation; stock returns to products that still exist.
    pub fn cancel(&self, caller: &Caller, id: &OrderId) -> Result<Order, ServiceError> {
        let mut order = self.load(id)?;
        owner_or_admin(caller, &order)?;
        let from = order.status;
        order
            .transition(OrderStatus::Cancelled, Utc::now())
            .map_err(|err| ServiceError::conflict(err.to_string()))?;

        let cancelled = self
            .store
            .cancel_order(order, from)
            .map_err(changed_concurrently)?;
        info!(order_id = %cancelled.id.0, by = %caller.user_id.0, "order cancelled");
        Ok(cancelled)
    }

    pub fn get(&self, caller: &Caller, id: &OrderId) -> Result<Order, ServiceError> {
        let order = self.load(id)?;
        let vendor_view = caller.role == Role::Vendor && order.involves_vendor(&caller.user_id);
        if vendor_view {
            return Ok(order);
        }
        owner_or_admin(caller, &order)?;
        Ok(order)
    }

    /// The caller's purchases, newest first.
    pub fn mine(&self, caller: &Caller) -> Result<Vec<Order>, ServiceError> {
        let mut orders = self.store.orders_for_customer(&caller.user_id)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Orders containing at least one of the calling vendor's products, newest first.
    pub fn for_vendor(&self, caller: &Caller) -> Result<Vec<Order>, ServiceError> {
        require_role(caller, VENDOR_ONLY)?;
        let mut orders = self.store.orders_for_vendor(&caller.user_id)?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    fn load(&self, id: &OrderId) -> Result<Order, ServiceError> {
        self.store
            .fetch_order(id)?
            .ok_or_else(|| ServiceError::not_found("order not found"))
    }
}

fn changed_concurrently(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::Conflict => {
            ServiceError::conflict("order status changed while the request was in flight")
        }
        other => other.into(),
    }
}

fn unknown_product(id: &ProductId) -> ServiceError {
    ServiceError::validation(format!("product {} does not exist", id.0))
}
