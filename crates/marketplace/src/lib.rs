//! Marketplace backend: identity, vendor onboarding, catalog, orders, reviews, and wishlists.
//!
//! Each component exposes a service (business rules over repository traits) and an axum
//! router. The binary in `services/api` wires the routers to a concrete store.

pub mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod media;
pub mod orders;
pub mod store;
pub mod telemetry;
pub mod vendors;
pub mod wishlist;

pub use access::{Authenticator, Caller};
pub use error::{AppError, ServiceError};
pub use store::{MemoryStore, RepositoryError};
