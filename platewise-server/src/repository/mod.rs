//! Storage abstraction for restaurants, reviews, users and categories.
//!
//! The service layer only talks to these traits. Two backends exist: an
//! in-memory one (tests, ephemeral runs) and SQLite (durable).
//!
//! Stores do not know about derived fields beyond persisting them:
//! `update_aggregates` is the single write path for a restaurant's
//! `average_rating` / `total_reviews`, and it is only called by the
//! rating aggregator.

mod memory;
mod sqlite;

pub use memory::InMemoryRepository;
pub use sqlite::SqliteRepository;

use async_trait::async_trait;
use platewise_core::{
    Category, NewCategory, NewRestaurant, NewReview, NewUser, RatingAggregate, Restaurant,
    RestaurantFilter, RestaurantId, RestaurantPatch, Review, ReviewId, ReviewPatch, Stats, User,
    UserId,
};
use thiserror::Error;

/// Errors from a storage backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backend itself failed (I/O, SQL error, task panic).
    #[error("storage failure during {operation}: {message}")]
    Storage {
        operation: &'static str,
        message: String,
    },

    /// A stored row could not be decoded.
    #[error("corrupt {what} in storage")]
    Corruption { what: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A uniqueness constraint rejected the write.
    #[error("{0}")]
    Conflict(String),
}

impl RepositoryError {
    pub fn storage(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Storage {
            operation,
            message: message.into(),
        }
    }

    pub fn corruption(what: impl Into<String>) -> Self {
        Self::Corruption { what: what.into() }
    }

    pub fn restaurant_not_found(id: RestaurantId) -> Self {
        Self::NotFound {
            entity: "restaurant",
            id: id.0,
        }
    }
}

#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn insert_restaurant(&self, new: NewRestaurant) -> Result<Restaurant, RepositoryError>;

    /// Fetch a restaurant regardless of `is_active`.
    async fn get_restaurant(&self, id: RestaurantId)
        -> Result<Option<Restaurant>, RepositoryError>;

    /// Active restaurants matching `filter`, newest first.
    async fn list_restaurants(
        &self,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, RepositoryError>;

    /// Every restaurant id, active or not, ascending.
    async fn list_restaurant_ids(&self) -> Result<Vec<RestaurantId>, RepositoryError>;

    /// Apply a descriptive-field patch. Returns `None` when the restaurant is missing.
    async fn update_restaurant(
        &self,
        id: RestaurantId,
        patch: &RestaurantPatch,
    ) -> Result<Option<Restaurant>, RepositoryError>;

    /// Soft-delete. Returns `false` when the restaurant is missing or already inactive.
    async fn deactivate_restaurant(&self, id: RestaurantId) -> Result<bool, RepositoryError>;

    /// Overwrite both derived fields in one write.
    ///
    /// Fails with [`RepositoryError::NotFound`] if the restaurant does not exist.
    async fn update_aggregates(
        &self,
        id: RestaurantId,
        aggregate: RatingAggregate,
    ) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Persist a new, active review.
    async fn insert_review(&self, new: NewReview) -> Result<Review, RepositoryError>;

    /// Fetch a review regardless of `is_active`.
    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;

    /// Active reviews, newest first, optionally restricted to one restaurant.
    async fn list_reviews(
        &self,
        restaurant_id: Option<RestaurantId>,
    ) -> Result<Vec<Review>, RepositoryError>;

    /// Active reviews of one restaurant. This is the aggregator's read.
    async fn list_active_by_restaurant(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<Vec<Review>, RepositoryError> {
        self.list_reviews(Some(restaurant_id)).await
    }

    /// Apply an edit to an active review. Returns `None` if it is missing or inactive.
    async fn update_review(
        &self,
        id: ReviewId,
        patch: &ReviewPatch,
    ) -> Result<Option<Review>, RepositoryError>;

    /// Soft-delete. Returns the review as it was if it was active, `None` otherwise.
    async fn deactivate_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;

    /// Hard-delete. Returns the removed row if it was active, `None` otherwise.
    async fn delete_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError>;

    /// Bump the helpful counter of an active review, returning the new value.
    async fn increment_helpful(&self, id: ReviewId) -> Result<Option<u32>, RepositoryError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] on a duplicate username or email.
    async fn insert_user(&self, new: NewUser) -> Result<User, RepositoryError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Active users, newest first.
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Fails with [`RepositoryError::Conflict`] on a duplicate name.
    async fn insert_category(&self, new: NewCategory) -> Result<Category, RepositoryError>;

    /// All categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError>;
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    async fn collect_stats(&self) -> Result<Stats, RepositoryError>;
}

/// Everything the service needs from a backend.
pub trait Store: RestaurantStore + ReviewStore + UserStore + CategoryStore + StatsStore {}

impl<T> Store for T where T: RestaurantStore + ReviewStore + UserStore + CategoryStore + StatsStore {}

#[cfg(test)]
pub(crate) mod contract;
