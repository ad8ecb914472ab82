//! Document storage shared by every component.
//!
//! Each component declares its own repository trait; [`MemoryStore`] implements all of
//! them over a single lock so multi-document operations (approval, order placement,
//! cascading deletes) commit atomically.

mod memory;

pub use memory::MemoryStore;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
