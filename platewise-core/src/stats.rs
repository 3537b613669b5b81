use serde::Serialize;

use crate::rating::AverageRating;

/// Site-wide statistics. Every count covers active rows only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub total_restaurants: u64,
    pub total_reviews: u64,
    pub total_users: u64,
    pub total_categories: u64,
    /// Mean of `average_rating` over active restaurants, unreviewed ones included.
    pub average_rating: AverageRating,
}
