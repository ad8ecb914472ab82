//! Rating aggregation.
//!
//! The product cache is always rebuilt from the complete review set rather than adjusted
//! incrementally: after any review mutation `rating` is the arithmetic mean of every
//! review's rating and `review_count` is their number.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::domain::{ProductId, Review};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: u32,
}

impl RatingSummary {
    pub const EMPTY: RatingSummary = RatingSummary {
        average: 0.0,
        count: 0,
    };

    pub fn from_reviews(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self::EMPTY;
        }

        let total: u64 = reviews.iter().map(|review| u64::from(review.rating)).sum();
        let count = reviews.len();
        Self {
            average: total as f64 / count as f64,
            count: u32::try_from(count).unwrap_or(u32::MAX),
        }
    }
}

pub fn is_valid_rating(rating: u8) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}

/// Per-product mutexes serializing the insert/recompute/persist sequence so concurrent
/// reviews of one product cannot publish a stale aggregate.
#[derive(Debug, Default)]
pub struct ProductLocks {
    locks: Mutex<HashMap<ProductId, Arc<Mutex<()>>>>,
}

impl ProductLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_product(&self, product: &ProductId) -> Arc<Mutex<()>> {
        let mut table = recover(self.locks.lock());
        table.entry(product.clone()).or_default().clone()
    }

    /// Drop the entry for a deleted product.
    pub fn forget(&self, product: &ProductId) {
        recover(self.locks.lock()).remove(product);
    }

    /// Number of products with a lock entry.
    pub fn tracked(&self) -> usize {
        recover(self.locks.lock()).len()
    }
}

/// The guarded data is `()` or a lock table, so a poisoned lock carries no broken state.
pub(crate) fn recover<'a, T>(
    result: Result<MutexGuard<'a, T>, std::sync::PoisonError<MutexGuard<'a, T>>>,
) -> MutexGuard<'a, T> {
    result.unwrap_or_else(|poisoned| poisoned.into_inner())
}
