//! Restaurants, users, categories and stats: everything that is not a review
//! mutation. Nothing here writes derived fields.

use std::sync::Arc;

use platewise_core::{
    Category, CreateCategoryRequest, CreateRestaurantRequest, CreateUserRequest, Restaurant,
    RestaurantFilter, RestaurantId, Review, Stats, UpdateRestaurantRequest, User,
};
use serde::Serialize;
use tracing::info;

use crate::error::ServiceError;
use crate::repository::Store;

/// A restaurant together with its active reviews, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct RestaurantDetail {
    #[serde(flatten)]
    pub restaurant: Restaurant,
    pub reviews: Vec<Review>,
}

pub struct CatalogService {
    store: Arc<dyn Store>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// An active restaurant, or NotFound.
    async fn active_restaurant(&self, id: RestaurantId) -> Result<Restaurant, ServiceError> {
        self.store
            .get_restaurant(id)
            .await?
            .filter(|restaurant| restaurant.is_active)
            .ok_or_else(|| ServiceError::not_found("restaurant", id.0))
    }

    pub async fn create_restaurant(
        &self,
        request: CreateRestaurantRequest,
    ) -> Result<Restaurant, ServiceError> {
        let new = request.validate()?;
        let restaurant = self.store.insert_restaurant(new).await?;
        info!("Created restaurant {} ({})", restaurant.id, restaurant.name);
        Ok(restaurant)
    }

    pub async fn get_restaurant(&self, id: RestaurantId) -> Result<RestaurantDetail, ServiceError> {
        let restaurant = self.active_restaurant(id).await?;
        let reviews = self.store.list_active_by_restaurant(id).await?;
        Ok(RestaurantDetail {
            restaurant,
            reviews,
        })
    }

    pub async fn list_restaurants(
        &self,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, ServiceError> {
        Ok(self.store.list_restaurants(filter).await?)
    }

    pub async fn update_restaurant(
        &self,
        id: RestaurantId,
        request: UpdateRestaurantRequest,
    ) -> Result<Restaurant, ServiceError> {
        let patch = request.validate()?;
        self.active_restaurant(id).await?;
        self.store
            .update_restaurant(id, &patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("restaurant", id.0))
    }

    /// Soft delete. Reviews are left untouched.
    pub async fn delete_restaurant(&self, id: RestaurantId) -> Result<(), ServiceError> {
        if !self.store.deactivate_restaurant(id).await? {
            return Err(ServiceError::not_found("restaurant", id.0));
        }
        info!("Deactivated restaurant {}", id);
        Ok(())
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, ServiceError> {
        let new = request.validate()?;
        let user = self.store.insert_user(new).await?;
        info!("Created user {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.store.list_users().await?)
    }

    pub async fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<Category, ServiceError> {
        let new = request.validate()?;
        Ok(self.store.insert_category(new).await?)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, ServiceError> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn stats(&self) -> Result<Stats, ServiceError> {
        Ok(self.store.collect_stats().await?)
    }
}
