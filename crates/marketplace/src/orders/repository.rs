use super::domain::{Order, OrderId, OrderStatus};
use crate::identity::domain::UserId;
use crate::store::RepositoryError;

/// Storage abstraction for orders. Stock movements happen inside the same operation as
/// the order write.
pub trait OrderRepository: Send + Sync {
    /// Reserve stock for every line item and insert the order atomically.
    /// Returns [`RepositoryError::NotFound`] when a product vanished and
    /// [`RepositoryError::Conflict`] when stock ran out; nothing is written in either case.
    fn place_order(&self, order: Order) -> Result<Order, RepositoryError>;

    /// Replace the stored order if its status is still `expected`, otherwise
    /// [`RepositoryError::Conflict`].
    fn update_order(&self, order: Order, expected: OrderStatus) -> Result<(), RepositoryError>;
    fn fetch_order(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Persist a cancelled order and return its quantities to the products that still exist.
    /// The stored status must still be `expected`; otherwise nothing is written and
    /// [`RepositoryError::Conflict`] is returned, so stock is returned at most once.
    fn cancel_order(&self, order: Order, expected: OrderStatus) -> Result<Order, RepositoryError>;

    fn orders_for_customer(&self, customer: &UserId) -> Result<Vec<Order>, RepositoryError>;
    fn orders_for_vendor(&self, vendor: &UserId) -> Result<Vec<Order>, RepositoryError>;
}
