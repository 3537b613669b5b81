//! Review lifecycle: create, edit, remove and "helpful" votes.
//!
//! Every mutation that can change a restaurant's active rating set runs
//! under that restaurant's aggregation lock and finishes with a recompute.
//! If the recompute fails the error is returned, but the review mutation
//! itself stays committed; `recompute_all` repairs the derived fields later.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use platewise_core::{CreateReviewRequest, RestaurantId, Review, ReviewId, UpdateReviewRequest};
use tracing::info;

use crate::aggregator::RatingAggregator;
use crate::error::ServiceError;
use crate::repository::Store;

/// How `DELETE /api/reviews/{id}` removes a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Clear `is_active`, keeping the row.
    #[default]
    Soft,
    /// Remove the row.
    Hard,
}

impl fmt::Display for DeletePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeletePolicy::Soft => f.write_str("soft"),
            DeletePolicy::Hard => f.write_str("hard"),
        }
    }
}

impl FromStr for DeletePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soft" => Ok(DeletePolicy::Soft),
            "hard" => Ok(DeletePolicy::Hard),
            other => Err(format!(
                "unknown delete policy '{other}' (expected 'soft' or 'hard')"
            )),
        }
    }
}

pub struct ReviewService {
    store: Arc<dyn Store>,
    aggregator: Arc<RatingAggregator>,
    delete_policy: DeletePolicy,
}

impl ReviewService {
    pub fn new(
        store: Arc<dyn Store>,
        aggregator: Arc<RatingAggregator>,
        delete_policy: DeletePolicy,
    ) -> Self {
        Self {
            store,
            aggregator,
            delete_policy,
        }
    }

    pub fn delete_policy(&self) -> DeletePolicy {
        self.delete_policy
    }

    /// An active review, or NotFound.
    async fn active_review(&self, id: ReviewId) -> Result<Review, ServiceError> {
        self.store
            .get_review(id)
            .await?
            .filter(|review| review.is_active)
            .ok_or_else(|| ServiceError::not_found("review", id.0))
    }

    /// Reviews may only be added to restaurants that exist and are active.
    async fn open_restaurant(&self, id: RestaurantId) -> Result<(), ServiceError> {
        match self.store.get_restaurant(id).await? {
            Some(restaurant) if restaurant.is_active => Ok(()),
            _ => Err(ServiceError::not_found("restaurant", id.0)),
        }
    }

    pub async fn get(&self, id: ReviewId) -> Result<Review, ServiceError> {
        self.active_review(id).await
    }

    /// Active reviews, newest first.
    pub async fn list(
        &self,
        restaurant_id: Option<RestaurantId>,
    ) -> Result<Vec<Review>, ServiceError> {
        Ok(self.store.list_reviews(restaurant_id).await?)
    }

    pub async fn create(&self, request: CreateReviewRequest) -> Result<Review, ServiceError> {
        let new = request.validate()?;

        // Unknown ids are rejected before they get a lock entry, and checked
        // again under the lock in case the restaurant was deactivated.
        self.open_restaurant(new.restaurant_id).await?;
        let guard = self.aggregator.lock(new.restaurant_id).await;
        if let Err(err) = self.open_restaurant(new.restaurant_id).await {
            self.aggregator.release_missing(guard).await;
            return Err(err);
        }
        if self.store.get_user(new.user_id).await?.is_none() {
            return Err(ServiceError::not_found("user", new.user_id.0));
        }

        let review = self.store.insert_review(new).await?;
        info!(
            "Created review {} (rating {}) for restaurant {}",
            review.id,
            review.rating.get(),
            review.restaurant_id
        );

        self.aggregator.recompute_locked(&guard).await?;
        Ok(review)
    }

    /// Edit an active review. Recomputes only when the rating changed.
    pub async fn update(
        &self,
        id: ReviewId,
        request: UpdateReviewRequest,
    ) -> Result<Review, ServiceError> {
        let patch = request.validate()?;

        // The owning restaurant never changes, so it is safe to read it
        // before locking; the rating is re-read under the lock.
        let restaurant_id = self.active_review(id).await?.restaurant_id;
        let guard = self.aggregator.lock(restaurant_id).await;
        let before = self.active_review(id).await?;

        let updated = self
            .store
            .update_review(id, &patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("review", id.0))?;

        if updated.rating != before.rating {
            info!(
                "Review {} rating changed {} -> {}",
                id,
                before.rating.get(),
                updated.rating.get()
            );
            self.aggregator.recompute_locked(&guard).await?;
        }
        Ok(updated)
    }

    /// Remove a review according to the configured policy. Returns the
    /// review as it was before removal.
    pub async fn delete(&self, id: ReviewId) -> Result<Review, ServiceError> {
        let restaurant_id = self.active_review(id).await?.restaurant_id;
        let guard = self.aggregator.lock(restaurant_id).await;

        let removed = match self.delete_policy {
            DeletePolicy::Soft => self.store.deactivate_review(id).await?,
            DeletePolicy::Hard => self.store.delete_review(id).await?,
        }
        .ok_or_else(|| ServiceError::not_found("review", id.0))?;
        info!("Removed review {} ({} delete)", id, self.delete_policy);

        self.aggregator.recompute_locked(&guard).await?;
        Ok(removed)
    }

    /// Count one "helpful" vote. Does not affect aggregates.
    pub async fn mark_helpful(&self, id: ReviewId) -> Result<u32, ServiceError> {
        self.store
            .increment_helpful(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("review", id.0))
    }
}
