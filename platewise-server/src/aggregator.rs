//! Rating aggregation: the only writer of a restaurant's derived fields.
//!
//! A restaurant's `average_rating` and `total_reviews` are recomputed from
//! scratch over its active reviews and written back in a single update. The
//! aggregator owns one async mutex per restaurant; recomputation holds it
//! across read, compute and write so two runs for the same restaurant never
//! interleave within this process. Review mutations take the same lock (see
//! [`crate::lifecycle`]) and call [`RatingAggregator::recompute_locked`].

use std::collections::HashMap;
use std::sync::Arc;

use platewise_core::{RatingAggregate, RestaurantId};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

use crate::error::ServiceError;
use crate::repository::Store;

/// Proof that the caller holds a restaurant's aggregation lock.
pub struct RestaurantGuard {
    restaurant_id: RestaurantId,
    _guard: OwnedMutexGuard<()>,
}

pub struct RatingAggregator {
    store: Arc<dyn Store>,
    locks: RwLock<HashMap<RestaurantId, Arc<Mutex<()>>>>,
}

impl RatingAggregator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: RwLock::new(HashMap::new()),
        }
    }

    async fn get_or_create_lock(&self, restaurant_id: RestaurantId) -> Arc<Mutex<()>> {
        {
            let locks = self.locks.read().await;
            if let Some(lock) = locks.get(&restaurant_id) {
                return lock.clone();
            }
        }

        let mut locks = self.locks.write().await;
        locks
            .entry(restaurant_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the aggregation lock for one restaurant.
    pub async fn lock(&self, restaurant_id: RestaurantId) -> RestaurantGuard {
        let lock = self.get_or_create_lock(restaurant_id).await;
        RestaurantGuard {
            restaurant_id,
            _guard: lock.lock_owned().await,
        }
    }

    /// Release a guard taken for a restaurant that does not exist.
    ///
    /// The map entry is dropped unless another task still holds a handle to
    /// the same mutex, so ids that never existed do not accumulate.
    pub async fn release_missing(&self, guard: RestaurantGuard) {
        let restaurant_id = guard.restaurant_id;
        drop(guard);

        let mut locks = self.locks.write().await;
        if locks
            .get(&restaurant_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&restaurant_id);
        }
    }

    #[cfg(test)]
    pub(crate) async fn lock_count(&self) -> usize {
        self.locks.read().await.len()
    }

    /// Recompute and persist the derived fields of one restaurant.
    ///
    /// Fails with [`ServiceError::NotFound`] (and writes nothing) when the
    /// restaurant does not exist. Inactive restaurants are still recomputed.
    pub async fn recompute_restaurant_rating(
        &self,
        restaurant_id: RestaurantId,
    ) -> Result<RatingAggregate, ServiceError> {
        let guard = self.lock(restaurant_id).await;
        let result = self.recompute_locked(&guard).await;
        match result {
            Err(err @ ServiceError::NotFound { .. }) => {
                self.release_missing(guard).await;
                Err(err)
            }
            result => result,
        }
    }

    /// Recompute while the caller already holds the restaurant's lock.
    pub async fn recompute_locked(
        &self,
        guard: &RestaurantGuard,
    ) -> Result<RatingAggregate, ServiceError> {
        let restaurant_id = guard.restaurant_id;

        if self.store.get_restaurant(restaurant_id).await?.is_none() {
            return Err(ServiceError::not_found("restaurant", restaurant_id.0));
        }

        let reviews = self.store.list_active_by_restaurant(restaurant_id).await?;
        let aggregate = RatingAggregate::from_ratings(reviews.iter().map(|r| r.rating));

        self.store
            .update_aggregates(restaurant_id, aggregate)
            .await?;

        debug!(
            "Restaurant {} aggregates now {} over {} reviews",
            restaurant_id, aggregate.average_rating, aggregate.total_reviews
        );
        Ok(aggregate)
    }

    /// Recompute every restaurant, active or not. Returns how many were recomputed.
    ///
    /// Stops at the first failure.
    pub async fn recompute_all(&self) -> Result<usize, ServiceError> {
        let ids = self.store.list_restaurant_ids().await?;
        for id in &ids {
            self.recompute_restaurant_rating(*id).await?;
        }
        info!("Recomputed aggregates for {} restaurants", ids.len());
        Ok(ids.len())
    }
}
