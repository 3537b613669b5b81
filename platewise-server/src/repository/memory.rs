//! In-memory implementation of the store traits.
//!
//! All data lives in `BTreeMap`s behind one `RwLock` and is lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use platewise_core::{
    AverageRating, Category, CategoryId, NewCategory, NewRestaurant, NewReview, NewUser,
    RatingAggregate, Restaurant, RestaurantFilter, RestaurantId, RestaurantPatch, Review,
    ReviewId, ReviewPatch, Stats, User, UserId,
};
use tokio::sync::RwLock;

use super::{
    CategoryStore, RepositoryError, RestaurantStore, ReviewStore, StatsStore, UserStore,
};

#[derive(Default)]
struct Tables {
    restaurants: BTreeMap<RestaurantId, Restaurant>,
    reviews: BTreeMap<ReviewId, Review>,
    users: BTreeMap<UserId, User>,
    categories: BTreeMap<CategoryId, Category>,
    next_id: i64,
}

impl Tables {
    /// Ids are unique across tables, which keeps them unambiguous in logs.
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory store.
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Newest first; ties broken by id so the order is total.
fn newest_first<T, K: Ord + Copy>(
    items: &mut [T],
    key: impl Fn(&T) -> (chrono::DateTime<Utc>, K),
) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl RestaurantStore for InMemoryRepository {
    async fn insert_restaurant(&self, new: NewRestaurant) -> Result<Restaurant, RepositoryError> {
        let mut tables = self.tables.write().await;
        let id = RestaurantId(tables.allocate_id());
        let restaurant = Restaurant::create(id, new, Utc::now());
        tables.restaurants.insert(id, restaurant.clone());
        Ok(restaurant)
    }

    async fn get_restaurant(
        &self,
        id: RestaurantId,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.restaurants.get(&id).cloned())
    }

    async fn list_restaurants(
        &self,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut restaurants: Vec<Restaurant> = tables
            .restaurants
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        newest_first(&mut restaurants, |r| (r.created_date, r.id));
        Ok(restaurants)
    }

    async fn list_restaurant_ids(&self) -> Result<Vec<RestaurantId>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.restaurants.keys().copied().collect())
    }

    async fn update_restaurant(
        &self,
        id: RestaurantId,
        patch: &RestaurantPatch,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables.restaurants.get_mut(&id).map(|restaurant| {
            restaurant.apply(patch, Utc::now());
            restaurant.clone()
        }))
    }

    async fn deactivate_restaurant(&self, id: RestaurantId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.restaurants.get_mut(&id) {
            Some(restaurant) if restaurant.is_active => {
                restaurant.is_active = false;
                restaurant.updated_date = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_aggregates(
        &self,
        id: RestaurantId,
        aggregate: RatingAggregate,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables.write().await;
        let restaurant = tables
            .restaurants
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::restaurant_not_found(id))?;
        restaurant.average_rating = aggregate.average_rating;
        restaurant.total_reviews = aggregate.total_reviews;
        Ok(())
    }
}

#[async_trait]
impl ReviewStore for InMemoryRepository {
    async fn insert_review(&self, new: NewReview) -> Result<Review, RepositoryError> {
        let mut tables = self.tables.write().await;
        // Mirror the SQLite foreign keys.
        if !tables.restaurants.contains_key(&new.restaurant_id) {
            return Err(RepositoryError::restaurant_not_found(new.restaurant_id));
        }
        if !tables.users.contains_key(&new.user_id) {
            return Err(RepositoryError::NotFound {
                entity: "user",
                id: new.user_id.0,
            });
        }
        let id = ReviewId(tables.allocate_id());
        let review = Review::create(id, new, Utc::now());
        tables.reviews.insert(id, review.clone());
        Ok(review)
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.reviews.get(&id).cloned())
    }

    async fn list_reviews(
        &self,
        restaurant_id: Option<RestaurantId>,
    ) -> Result<Vec<Review>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut reviews: Vec<Review> = tables
            .reviews
            .values()
            .filter(|r| r.is_active)
            .filter(|r| restaurant_id.map_or(true, |id| r.restaurant_id == id))
            .cloned()
            .collect();
        newest_first(&mut reviews, |r| (r.created_date, r.id));
        Ok(reviews)
    }

    async fn update_review(
        &self,
        id: ReviewId,
        patch: &ReviewPatch,
    ) -> Result<Option<Review>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .reviews
            .get_mut(&id)
            .filter(|review| review.is_active)
            .map(|review| {
                review.apply(patch, Utc::now());
                review.clone()
            }))
    }

    async fn deactivate_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let mut tables = self.tables.write().await;
        match tables.reviews.get_mut(&id) {
            Some(review) if review.is_active => {
                let before = review.clone();
                review.is_active = false;
                review.updated_date = Some(Utc::now());
                Ok(Some(before))
            }
            _ => Ok(None),
        }
    }

    async fn delete_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.reviews.get(&id).is_some_and(|r| r.is_active) {
            return Ok(None);
        }
        Ok(tables.reviews.remove(&id))
    }

    async fn increment_helpful(&self, id: ReviewId) -> Result<Option<u32>, RepositoryError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .reviews
            .get_mut(&id)
            .filter(|review| review.is_active)
            .map(|review| {
                review.helpful = review.helpful.saturating_add(1);
                review.helpful
            }))
    }
}

#[async_trait]
impl UserStore for InMemoryRepository {
    async fn insert_user(&self, new: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .users
            .values()
            .any(|u| u.username == new.username || u.email == new.email);
        if duplicate {
            return Err(RepositoryError::Conflict(
                "user with this username or email already exists".to_string(),
            ));
        }
        let id = UserId(tables.allocate_id());
        let user = User::create(id, new, Utc::now());
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables
            .users
            .values()
            .filter(|u| u.is_active)
            .cloned()
            .collect();
        newest_first(&mut users, |u| (u.created_date, u.id));
        Ok(users)
    }
}

#[async_trait]
impl CategoryStore for InMemoryRepository {
    async fn insert_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables
            .categories
            .values()
            .any(|c| c.category_name == new.category_name)
        {
            return Err(RepositoryError::Conflict(
                "category already exists".to_string(),
            ));
        }
        let id = CategoryId(tables.allocate_id());
        let category = Category::create(id, new, Utc::now());
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.category_name.cmp(&b.category_name));
        Ok(categories)
    }
}

#[async_trait]
impl StatsStore for InMemoryRepository {
    async fn collect_stats(&self) -> Result<Stats, RepositoryError> {
        let tables = self.tables.read().await;
        let active_restaurants: Vec<&Restaurant> =
            tables.restaurants.values().filter(|r| r.is_active).collect();

        Ok(Stats {
            total_restaurants: active_restaurants.len() as u64,
            total_reviews: tables.reviews.values().filter(|r| r.is_active).count() as u64,
            total_users: tables.users.values().filter(|u| u.is_active).count() as u64,
            total_categories: tables.categories.values().filter(|c| c.is_active).count() as u64,
            average_rating: AverageRating::mean_of(
                active_restaurants.iter().map(|r| r.average_rating),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::contract;

    #[tokio::test]
    async fn test_restaurant_round_trip() {
        contract::restaurant_round_trip(&InMemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_update_aggregates_missing_restaurant() {
        contract::update_aggregates_missing_restaurant(&InMemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_restaurant_patch_and_deactivate() {
        contract::restaurant_patch_and_deactivate(&InMemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_list_restaurants_filters() {
        contract::list_restaurants_filters(&InMemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_review_lifecycle_rows() {
        contract::review_lifecycle_rows(&InMemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_review_requires_existing_parents() {
        contract::review_requires_existing_parents(&InMemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_list_reviews_scoped_and_ordered() {
        contract::list_reviews_scoped_and_ordered(&InMemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_user_uniqueness() {
        contract::user_uniqueness(&InMemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_category_uniqueness_and_order() {
        contract::category_uniqueness_and_order(&InMemoryRepository::new()).await;
    }

    #[tokio::test]
    async fn test_stats() {
        contract::stats(&InMemoryRepository::new()).await;
    }
}
