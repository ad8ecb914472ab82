use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ratings::RatingSummary;
use crate::access::Owned;
use crate::identity::domain::UserId;
use crate::orders::domain::OrderId;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn generate() -> Self {
        Self(format!("prod-{}", Uuid::new_v4().simple()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub String);

impl ReviewId {
    pub fn generate() -> Self {
        Self(format!("rev-{}", Uuid::new_v4().simple()))
    }
}

/// Stored product document. `rating` and `review_count` are cache fields derived from
/// the product's reviews and are only written through the rating recompute path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub vendor: UserId,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: f64,
    pub stock: u32,
    pub images: Vec<String>,
    pub rating: f64,
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(vendor: UserId, draft: ProductDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: ProductId::generate(),
            vendor,
            name: draft.name.trim().to_string(),
            description: draft.description,
            category: draft.category.trim().to_string(),
            price: draft.price,
            stock: draft.stock,
            images: draft.images,
            rating: 0.0,
            review_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_rating(&mut self, summary: RatingSummary) {
        self.rating = summary.average;
        self.review_count = summary.count;
    }
}

impl Owned for Product {
    fn owner(&self) -> &UserId {
        &self.vendor
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub price: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub images: Vec<String>,
}

/// Merge patch for vendor edits. Cache fields are not patchable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub stock: Option<u32>,
    pub images: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name.trim().to_string();
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(category) = self.category {
            product.category = category.trim().to_string();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(images) = self.images {
            product.images = images;
        }
    }
}

/// Optional constraints for catalog listings; every set field must match.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    pub category: Option<String>,
    pub vendor: Option<UserId>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub search: Option<String>,
}

impl ProductFilter {
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = &self.category {
            if !product.category.eq_ignore_ascii_case(category.trim()) {
                return false;
            }
        }
        if let Some(vendor) = &self.vendor {
            if &product.vendor != vendor {
                return false;
            }
        }
        if self.min_price.is_some_and(|min| product.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| product.price > max) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.trim().to_lowercase();
            if !needle.is_empty() && !product.name.to_lowercase().contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Stored review. At most one exists per (product, author, order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product: ProductId,
    pub author: UserId,
    pub order: OrderId,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    pub fn key(&self) -> ReviewKey {
        ReviewKey {
            product: self.product.clone(),
            author: self.author.clone(),
            order: self.order.clone(),
        }
    }
}

impl Owned for Review {
    fn owner(&self) -> &UserId {
        &self.author
    }
}

/// Uniqueness key for reviews: one review per purchase of a product.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReviewKey {
    pub product: ProductId,
    pub author: UserId,
    pub order: OrderId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub order_id: OrderId,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}
