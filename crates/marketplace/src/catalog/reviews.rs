use chrono::Utc;
use tracing::{info, warn};

use super::domain::{ProductId, Review, ReviewId, ReviewKey, ReviewSubmission};
use super::ratings::{is_valid_rating, recover, RatingSummary, MAX_RATING, MIN_RATING};
use super::repository::{ProductRepository, ReviewRepository};
use super::service::CatalogService;
use crate::access::{owner_or_admin, Caller};
use crate::error::ServiceError;
use crate::orders::repository::OrderRepository;
use crate::store::RepositoryError;

const NOT_ELIGIBLE: &str = "not eligible to review this product";
const ALREADY_REVIEWED: &str = "this purchase has already been reviewed";

impl<S> CatalogService<S>
where
    S: ProductRepository + ReviewRepository + OrderRepository + 'static,
{
    /// Record a verified-purchase review and refresh the product's rating cache.
    ///
    /// Eligibility requires a delivered order owned by the caller that contains the
    /// product; every failing condition yields the same error. Insert, recompute, and
    /// cache write run under the product lock, and a failed cache write removes the
    /// review again.
    pub fn submit_review(
        &self,
        caller: &Caller,
        product_id: &ProductId,
        submission: ReviewSubmission,
    ) -> Result<Review, ServiceError> {
        if !is_valid_rating(submission.rating) {
            return Err(ServiceError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        let eligible = self
            .store
            .fetch_order(&submission.order_id)?
            .is_some_and(|order| order.is_verified_purchase(&caller.user_id, product_id));
        if !eligible {
            return Err(ServiceError::forbidden(NOT_ELIGIBLE));
        }

        let key = ReviewKey {
            product: product_id.clone(),
            author: caller.user_id.clone(),
            order: submission.order_id.clone(),
        };
        if self.store.find_review(&key)?.is_some() {
            return Err(ServiceError::conflict(ALREADY_REVIEWED));
        }

        let lock = self.lock_existing(product_id)?;
        let _guard = recover(lock.lock());
        self.load_locked(product_id)?;

        let review = Review {
            id: ReviewId::generate(),
            product: key.product,
            author: key.author,
            order: key.order,
            rating: submission.rating,
            comment: submission.comment.trim().to_string(),
            created_at: Utc::now(),
        };
        let stored = self.store.insert_review(review).map_err(|err| match err {
            RepositoryError::Conflict => ServiceError::conflict(ALREADY_REVIEWED),
            other => other.into(),
        })?;

        if let Err(err) = self.refresh_rating(product_id) {
            if let Err(undo) = self.store.delete_review(&stored.id) {
                warn!(
                    review_id = %stored.id.0,
                    error = %undo,
                    "failed to roll back review after rating refresh failure"
                );
            }
            return Err(err);
        }

        info!(
            review_id = %stored.id.0,
            product_id = %product_id.0,
            author = %caller.user_id.0,
            rating = stored.rating,
            "review submitted"
        );
        Ok(stored)
    }

    /// Reviews of a product, newest first.
    pub fn list_reviews(&self, product_id: &ProductId) -> Result<Vec<Review>, ServiceError> {
        self.load(product_id)?;
        let mut reviews = self.store.reviews_for_product(product_id)?;
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    /// Author or admin removal; the rating cache is rebuilt like on submission.
    pub fn delete_review(&self, caller: &Caller, id: &ReviewId) -> Result<(), ServiceError> {
        let review = self
            .store
            .fetch_review(id)?
            .ok_or_else(|| ServiceError::not_found("review not found"))?;
        owner_or_admin(caller, &review)?;

        let lock = self.lock_existing(&review.product)?;
        let _guard = recover(lock.lock());
        self.load_locked(&review.product)?;

        let removed = self.store.delete_review(id)?;
        if let Err(err) = self.refresh_rating(&removed.product) {
            if let Err(undo) = self.store.insert_review(removed.clone()) {
                warn!(
                    review_id = %removed.id.0,
                    error = %undo,
                    "failed to restore review after rating refresh failure"
                );
            }
            return Err(err);
        }

        info!(review_id = %id.0, product_id = %removed.product.0, by = %caller.user_id.0, "review deleted");
        Ok(())
    }

    /// Full recompute of the cache fields from every stored review. Callers hold the
    /// product lock.
    fn refresh_rating(&self, product_id: &ProductId) -> Result<RatingSummary, ServiceError> {
        let reviews = self.store.reviews_for_product(product_id)?;
        let summary = RatingSummary::from_reviews(&reviews);
        self.store.apply_rating(product_id, summary)?;
        Ok(summary)
    }
}
