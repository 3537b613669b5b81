//! Store wrapper that counts writes, for asserting side effects in tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use platewise_core::{
    Category, NewCategory, NewRestaurant, NewReview, NewUser, RatingAggregate, Restaurant,
    RestaurantFilter, RestaurantId, RestaurantPatch, Review, ReviewId, ReviewPatch, Stats, User,
    UserId,
};

use crate::repository::{
    CategoryStore, InMemoryRepository, RepositoryError, RestaurantStore, ReviewStore, StatsStore,
    UserStore,
};

pub(crate) struct CountingStore {
    inner: InMemoryRepository,
    aggregate_writes: AtomicUsize,
    review_writes: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn new(inner: InMemoryRepository) -> Self {
        Self {
            inner,
            aggregate_writes: AtomicUsize::new(0),
            review_writes: AtomicUsize::new(0),
        }
    }

    /// Calls to `update_aggregates`, including failed ones.
    pub(crate) fn aggregate_writes(&self) -> usize {
        self.aggregate_writes.load(Ordering::SeqCst)
    }

    pub(crate) fn review_writes(&self) -> usize {
        self.review_writes.load(Ordering::SeqCst)
    }

    fn bump_reviews(&self) {
        self.review_writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl RestaurantStore for CountingStore {
    async fn insert_restaurant(&self, new: NewRestaurant) -> Result<Restaurant, RepositoryError> {
        self.inner.insert_restaurant(new).await
    }

    async fn get_restaurant(
        &self,
        id: RestaurantId,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        self.inner.get_restaurant(id).await
    }

    async fn list_restaurants(
        &self,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        self.inner.list_restaurants(filter).await
    }

    async fn list_restaurant_ids(&self) -> Result<Vec<RestaurantId>, RepositoryError> {
        self.inner.list_restaurant_ids().await
    }

    async fn update_restaurant(
        &self,
        id: RestaurantId,
        patch: &RestaurantPatch,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        self.inner.update_restaurant(id, patch).await
    }

    async fn deactivate_restaurant(&self, id: RestaurantId) -> Result<bool, RepositoryError> {
        self.inner.deactivate_restaurant(id).await
    }

    async fn update_aggregates(
        &self,
        id: RestaurantId,
        aggregate: RatingAggregate,
    ) -> Result<(), RepositoryError> {
        self.aggregate_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.update_aggregates(id, aggregate).await
    }
}

#[async_trait]
impl ReviewStore for CountingStore {
    async fn insert_review(&self, new: NewReview) -> Result<Review, RepositoryError> {
        self.bump_reviews();
        self.inner.insert_review(new).await
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.inner.get_review(id).await
    }

    async fn list_reviews(
        &self,
        restaurant_id: Option<RestaurantId>,
    ) -> Result<Vec<Review>, RepositoryError> {
        self.inner.list_reviews(restaurant_id).await
    }

    async fn update_review(
        &self,
        id: ReviewId,
        patch: &ReviewPatch,
    ) -> Result<Option<Review>, RepositoryError> {
        self.bump_reviews();
        self.inner.update_review(id, patch).await
    }

    async fn deactivate_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.bump_reviews();
        self.inner.deactivate_review(id).await
    }

    async fn delete_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.bump_reviews();
        self.inner.delete_review(id).await
    }

    async fn increment_helpful(&self, id: ReviewId) -> Result<Option<u32>, RepositoryError> {
        self.bump_reviews();
        self.inner.increment_helpful(id).await
    }
}

#[async_trait]
impl UserStore for CountingStore {
    async fn insert_user(&self, new: NewUser) -> Result<User, RepositoryError> {
        self.inner.insert_user(new).await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.get_user(id).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.inner.list_users().await
    }
}

#[async_trait]
impl CategoryStore for CountingStore {
    async fn insert_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        self.inner.insert_category(new).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.inner.list_categories().await
    }
}

#[async_trait]
impl StatsStore for CountingStore {
    async fn collect_stats(&self) -> Result<Stats, RepositoryError> {
        self.inner.collect_stats().await
    }
}
