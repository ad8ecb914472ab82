use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::access::Owned;
use crate::catalog::domain::ProductId;
use crate::identity::domain::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn generate() -> Self {
        Self(format!("ord-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Forward step in the fulfilment pipeline, if any.
    pub fn next(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Pending => Some(OrderStatus::Confirmed),
            OrderStatus::Confirmed => Some(OrderStatus::Processing),
            OrderStatus::Processing => Some(OrderStatus::Shipped),
            OrderStatus::Shipped => Some(OrderStatus::Delivered),
            OrderStatus::Delivered | OrderStatus::Cancelled => None,
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        match target {
            OrderStatus::Cancelled => !matches!(
                self,
                OrderStatus::Delivered | OrderStatus::Cancelled
            ),
            other => self.next() == Some(other),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("order cannot move from {from} to {to}")]
pub struct OrderTransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

/// Snapshot of a product at purchase time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product: ProductId,
    pub vendor: UserId,
    pub name: String,
    pub unit_price: f64,
    pub quantity: u32,
}

impl LineItem {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequestItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub items: Vec<OrderRequestItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer: UserId,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(customer: UserId, items: Vec<LineItem>, now: DateTime<Utc>) -> Self {
        let total = items.iter().map(LineItem::subtotal).sum();
        Self {
            id: OrderId::generate(),
            customer,
            items,
            total,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn contains(&self, product: &ProductId) -> bool {
        self.items.iter().any(|item| &item.product == product)
    }

    pub fn involves_vendor(&self, vendor: &UserId) -> bool {
        self.items.iter().any(|item| &item.vendor == vendor)
    }

    /// A delivered order placed by `customer` that contains `product`.
    pub fn is_verified_purchase(&self, customer: &UserId, product: &ProductId) -> bool {
        &self.customer == customer
            && self.status == OrderStatus::Delivered
            && self.contains(product)
    }

    pub fn transition(
        &mut self,
        target: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<(), OrderTransitionError> {
        if !self.status.can_transition_to(target) {
            return Err(OrderTransitionError {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.updated_at = now;
        Ok(())
    }
}

impl Owned for Order {
    fn owner(&self) -> &UserId {
        &self.customer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order::new(
            UserId("buyer".to_string()),
            vec![
                LineItem {
                    product: ProductId("p1".to_string()),
                    vendor: UserId("v1".to_string()),
                    name: "Mug".to_string(),
                    unit_price: 12.5,
                    quantity: 2,
                },
                LineItem {
                    product: ProductId("p2".to_string()),
                    vendor: UserId("v2".to_string()),
                    name: "Plate".to_string(),
                    unit_price: 5.0,
                    quantity: 1,
                },
            ],
            Utc::now(),
        )
    }

    #[test]
    fn total_sums_line_items() {
        assert_eq!(order().total, 30.0);
    }

    #[test]
    fn fulfilment_moves_one_step_at_a_time() {
        let mut order = order();
        assert!(order.transition(OrderStatus::Shipped, Utc::now()).is_err());

        for status in [
            OrderStatus::Confirmed,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ] {
            order.transition(status, Utc::now()).expect("forward step");
        }

        let err = order
            .transition(OrderStatus::Cancelled, Utc::now())
            .unwrap_err();
        assert_eq!(err.to_string(), "order cannot move from delivered to cancelled");
    }

    #[test]
    fn cancellation_allowed_before_delivery() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Cancelled));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Confirmed));
    }

    #[test]
    fn verified_purchase_requires_delivery_and_ownership() {
        let mut order = order();
        let buyer = UserId("buyer".to_string());
        let product = ProductId("p1".to_string());
        assert!(!order.is_verified_purchase(&buyer, &product));

        order.status = OrderStatus::Delivered;
        assert!(order.is_verified_purchase(&buyer, &product));
        assert!(!order.is_verified_purchase(&UserId("other".to_string()), &product));
        assert!(!order.is_verified_purchase(&buyer, &ProductId("p9".to_string())));
        assert!(order.involves_vendor(&UserId("v2".to_string())));
    }
}
