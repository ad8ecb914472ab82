//! Orders: placement with stock reservation and the fulfilment state machine.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{LineItem, Order, OrderId, OrderRequest, OrderRequestItem, OrderStatus};
pub use repository::OrderRepository;
pub use router::order_router;
pub use service::OrderService;
