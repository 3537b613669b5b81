//! Behaviour every store backend must share.
//!
//! Each backend's test module calls these against a fresh instance.

use platewise_core::{
    AverageRating, NewCategory, NewRestaurant, NewReview, NewUser, PriceRange, Rating,
    RatingAggregate, Restaurant, RestaurantFilter, RestaurantId, RestaurantPatch, ReviewPatch,
    User, UserId,
};

use super::{RepositoryError, Store};

pub(crate) async fn seed_restaurant<S: Store + ?Sized>(store: &S, name: &str) -> Restaurant {
    store
        .insert_restaurant(NewRestaurant::named(name))
        .await
        .unwrap()
}

pub(crate) async fn seed_user<S: Store + ?Sized>(store: &S, username: &str) -> User {
    store
        .insert_user(NewUser::new(username, format!("{username}@example.com")))
        .await
        .unwrap()
}

pub(crate) fn new_review(restaurant_id: RestaurantId, user_id: UserId, rating: i64) -> NewReview {
    NewReview {
        restaurant_id,
        user_id,
        rating: Rating::new(rating).unwrap(),
        review_title: Some("Dinner".to_string()),
        review_text: None,
        is_recommended: Some(true),
        moderation_status: Default::default(),
    }
}

pub(crate) async fn restaurant_round_trip<S: Store>(store: &S) {
    let created = seed_restaurant(store, "Blue Door").await;
    assert_eq!(created.aggregate(), RatingAggregate::EMPTY);
    assert!(created.is_active);

    let fetched = store.get_restaurant(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Blue Door");
    assert_eq!(fetched.id, created.id);

    assert!(store
        .get_restaurant(RestaurantId(9_999))
        .await
        .unwrap()
        .is_none());
    assert_eq!(
        store.list_restaurant_ids().await.unwrap(),
        vec![created.id]
    );

    let aggregate = RatingAggregate {
        average_rating: AverageRating::from_hundredths(433).unwrap(),
        total_reviews: 3,
    };
    store.update_aggregates(created.id, aggregate).await.unwrap();
    let fetched = store.get_restaurant(created.id).await.unwrap().unwrap();
    assert_eq!(fetched.aggregate(), aggregate);
}

pub(crate) async fn update_aggregates_missing_restaurant<S: Store>(store: &S) {
    let err = store
        .update_aggregates(RestaurantId(42), RatingAggregate::EMPTY)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::NotFound {
            entity: "restaurant",
            id: 42
        }
    ));
}

pub(crate) async fn restaurant_patch_and_deactivate<S: Store>(store: &S) {
    let created = seed_restaurant(store, "Old Name").await;

    let patch = RestaurantPatch {
        name: Some("New Name".to_string()),
        city: Some("Lisbon".to_string()),
        price_range: Some(PriceRange::new(3).unwrap()),
        ..Default::default()
    };
    let updated = store
        .update_restaurant(created.id, &patch)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.city.as_deref(), Some("Lisbon"));
    assert_eq!(updated.price_range.map(PriceRange::get), Some(3));
    assert!(updated.updated_date.is_some());
    assert_eq!(updated.aggregate(), RatingAggregate::EMPTY);

    assert!(store
        .update_restaurant(RestaurantId(9_999), &patch)
        .await
        .unwrap()
        .is_none());

    assert!(store.deactivate_restaurant(created.id).await.unwrap());
    assert!(!store.deactivate_restaurant(created.id).await.unwrap());
    let fetched = store.get_restaurant(created.id).await.unwrap().unwrap();
    assert!(!fetched.is_active);
    assert!(store
        .list_restaurants(&RestaurantFilter::default())
        .await
        .unwrap()
        .is_empty());
}

pub(crate) async fn list_restaurants_filters<S: Store>(store: &S) {
    let cheap = store
        .insert_restaurant(NewRestaurant {
            price_range: Some(PriceRange::new(1).unwrap()),
            ..NewRestaurant::named("Cheap Eats")
        })
        .await
        .unwrap();
    let fancy = store
        .insert_restaurant(NewRestaurant {
            price_range: Some(PriceRange::new(4).unwrap()),
            is_verified: true,
            ..NewRestaurant::named("Fancy Place")
        })
        .await
        .unwrap();
    store
        .update_aggregates(
            fancy.id,
            RatingAggregate {
                average_rating: AverageRating::from_hundredths(480).unwrap(),
                total_reviews: 5,
            },
        )
        .await
        .unwrap();

    let all = store
        .list_restaurants(&RestaurantFilter::default())
        .await
        .unwrap();
    let ids: Vec<RestaurantId> = all.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![fancy.id, cheap.id]);

    let by_price = store
        .list_restaurants(&RestaurantFilter {
            price_range: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_price.len(), 1);
    assert_eq!(by_price[0].id, cheap.id);

    let rated = store
        .list_restaurants(&RestaurantFilter {
            min_rating: Some(4.5),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(rated.len(), 1);
    assert_eq!(rated[0].id, fancy.id);

    let verified = store
        .list_restaurants(&RestaurantFilter {
            verified_only: true,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(verified.len(), 1);
    assert_eq!(verified[0].id, fancy.id);
}

pub(crate) async fn review_lifecycle_rows<S: Store>(store: &S) {
    let restaurant = seed_restaurant(store, "Taqueria").await;
    let user = seed_user(store, "critic").await;

    let review = store
        .insert_review(new_review(restaurant.id, user.id, 3))
        .await
        .unwrap();
    assert!(review.is_active);
    assert_eq!(review.helpful, 0);
    assert_eq!(review.rating.get(), 3);

    let patch = ReviewPatch {
        rating: Some(Rating::new(5).unwrap()),
        review_text: Some("Great salsa".to_string()),
        ..Default::default()
    };
    let updated = store.update_review(review.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.rating.get(), 5);
    assert_eq!(updated.review_text.as_deref(), Some("Great salsa"));
    assert_eq!(updated.restaurant_id, restaurant.id);
    assert!(updated.updated_date.is_some());

    assert_eq!(store.increment_helpful(review.id).await.unwrap(), Some(1));
    assert_eq!(store.increment_helpful(review.id).await.unwrap(), Some(2));

    // Soft delete keeps the row but removes it from the active set.
    let before = store.deactivate_review(review.id).await.unwrap().unwrap();
    assert_eq!(before.rating.get(), 5);
    let stored = store.get_review(review.id).await.unwrap().unwrap();
    assert!(!stored.is_active);
    assert!(store
        .list_active_by_restaurant(restaurant.id)
        .await
        .unwrap()
        .is_empty());

    // Removed is terminal.
    assert!(store.deactivate_review(review.id).await.unwrap().is_none());
    assert!(store.update_review(review.id, &patch).await.unwrap().is_none());
    assert!(store.increment_helpful(review.id).await.unwrap().is_none());
    assert!(store.delete_review(review.id).await.unwrap().is_none());

    // Hard delete removes the row.
    let second = store
        .insert_review(new_review(restaurant.id, user.id, 4))
        .await
        .unwrap();
    let removed = store.delete_review(second.id).await.unwrap().unwrap();
    assert_eq!(removed.id, second.id);
    assert!(store.get_review(second.id).await.unwrap().is_none());
    assert!(store.delete_review(second.id).await.unwrap().is_none());
}

pub(crate) async fn review_requires_existing_parents<S: Store>(store: &S) {
    let restaurant = seed_restaurant(store, "Ramen Shop").await;
    let user = seed_user(store, "slurper").await;

    let err = store
        .insert_review(new_review(RestaurantId(9_999), user.id, 4))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::NotFound {
            entity: "restaurant",
            ..
        }
    ));

    let err = store
        .insert_review(new_review(restaurant.id, UserId(9_999), 4))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { entity: "user", .. }));

    assert!(store.list_reviews(None).await.unwrap().is_empty());
}

pub(crate) async fn list_reviews_scoped_and_ordered<S: Store>(store: &S) {
    let a = seed_restaurant(store, "A").await;
    let b = seed_restaurant(store, "B").await;
    let user = seed_user(store, "eater").await;

    let first = store.insert_review(new_review(a.id, user.id, 5)).await.unwrap();
    let second = store.insert_review(new_review(b.id, user.id, 2)).await.unwrap();
    let third = store.insert_review(new_review(a.id, user.id, 4)).await.unwrap();

    let all: Vec<_> = store
        .list_reviews(None)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(all, vec![third.id, second.id, first.id]);

    let only_a: Vec<_> = store
        .list_reviews(Some(a.id))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(only_a, vec![third.id, first.id]);

    let active_b = store.list_active_by_restaurant(b.id).await.unwrap();
    assert_eq!(active_b.len(), 1);
    assert_eq!(active_b[0].rating.get(), 2);
}

pub(crate) async fn user_uniqueness<S: Store>(store: &S) {
    let user = seed_user(store, "ada").await;
    assert_eq!(
        store.get_user(user.id).await.unwrap().unwrap().username,
        "ada"
    );

    let same_name = store
        .insert_user(NewUser::new("ada", "other@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(same_name, RepositoryError::Conflict(_)));

    let same_email = store
        .insert_user(NewUser::new("lovelace", "ada@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(same_email, RepositoryError::Conflict(_)));

    let second = seed_user(store, "grace").await;
    let listed: Vec<_> = store
        .list_users()
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(listed, vec![second.id, user.id]);
}

pub(crate) async fn category_uniqueness_and_order<S: Store>(store: &S) {
    for name in ["Thai", "Bakery", "Mexican"] {
        store
            .insert_category(NewCategory {
                category_name: name.to_string(),
                category_description: None,
            })
            .await
            .unwrap();
    }
    let err = store
        .insert_category(NewCategory {
            category_name: "Thai".to_string(),
            category_description: Some("again".to_string()),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let names: Vec<String> = store
        .list_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.category_name)
        .collect();
    assert_eq!(names, vec!["Bakery", "Mexican", "Thai"]);
}

pub(crate) async fn stats<S: Store>(store: &S) {
    let empty = store.collect_stats().await.unwrap();
    assert_eq!(empty.total_restaurants, 0);
    assert_eq!(empty.average_rating, AverageRating::ZERO);

    let rated = seed_restaurant(store, "Rated").await;
    let _unrated = seed_restaurant(store, "Unrated").await;
    let closed = seed_restaurant(store, "Closed").await;
    let user = seed_user(store, "counter").await;
    store
        .insert_category(NewCategory {
            category_name: "Pizza".to_string(),
            category_description: None,
        })
        .await
        .unwrap();

    store
        .insert_review(new_review(rated.id, user.id, 5))
        .await
        .unwrap();
    let gone = store
        .insert_review(new_review(rated.id, user.id, 1))
        .await
        .unwrap();
    store.deactivate_review(gone.id).await.unwrap();

    store
        .update_aggregates(
            rated.id,
            RatingAggregate {
                average_rating: AverageRating::from_hundredths(500).unwrap(),
                total_reviews: 1,
            },
        )
        .await
        .unwrap();
    store.deactivate_restaurant(closed.id).await.unwrap();

    let stats = store.collect_stats().await.unwrap();
    assert_eq!(stats.total_restaurants, 2);
    assert_eq!(stats.total_reviews, 1);
    assert_eq!(stats.total_users, 1);
    assert_eq!(stats.total_categories, 1);
    // (5.00 + 0.00) / 2
    assert_eq!(stats.average_rating.hundredths(), 250);
}
