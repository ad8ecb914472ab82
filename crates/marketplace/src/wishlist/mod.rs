//! Per-user wishlists of catalog products.

pub mod repository;
pub mod router;
pub mod service;

pub use repository::WishlistRepository;
pub use router::wishlist_router;
pub use service::WishlistService;
