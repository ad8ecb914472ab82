//! Uploaded media (product images) behind a pluggable file store.

pub mod router;
pub mod service;
pub mod store;

pub use router::media_router;
pub use service::{MediaObject, MediaService};
pub use store::{InMemoryMediaStore, MediaError, MediaStore, StoredMedia};
