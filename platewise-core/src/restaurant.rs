//! Restaurants and their create/update payloads.
//!
//! `average_rating` and `total_reviews` are derived fields. Neither payload
//! type accepts them; only the rating aggregator writes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{optional_text, required_text, ValidationError};
use crate::ids::RestaurantId;
use crate::rating::{AverageRating, RatingAggregate};

/// Price bracket from 1 (`$`) to 4 (`$$$$`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct PriceRange(u8);

impl PriceRange {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (1..=4).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::PriceRangeOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for PriceRange {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PriceRange> for u8 {
    fn from(price: PriceRange) -> Self {
        price.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: RestaurantId,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub website: Option<String>,
    pub price_range: Option<PriceRange>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub average_rating: AverageRating,
    pub total_reviews: u32,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl Restaurant {
    /// Build the record for a freshly validated restaurant. Derived fields start empty.
    pub fn create(id: RestaurantId, new: NewRestaurant, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            description: new.description,
            address: new.address,
            city: new.city,
            state: new.state,
            zip_code: new.zip_code,
            website: new.website,
            price_range: new.price_range,
            latitude: new.latitude,
            longitude: new.longitude,
            is_verified: new.is_verified,
            average_rating: AverageRating::ZERO,
            total_reviews: 0,
            is_active: true,
            created_date: now,
            updated_date: None,
        }
    }

    pub fn aggregate(&self) -> RatingAggregate {
        RatingAggregate {
            average_rating: self.average_rating,
            total_reviews: self.total_reviews,
        }
    }

    pub fn apply(&mut self, patch: &RestaurantPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(address) = &patch.address {
            self.address = Some(address.clone());
        }
        if let Some(city) = &patch.city {
            self.city = Some(city.clone());
        }
        if let Some(state) = &patch.state {
            self.state = Some(state.clone());
        }
        if let Some(zip_code) = &patch.zip_code {
            self.zip_code = Some(zip_code.clone());
        }
        if let Some(website) = &patch.website {
            self.website = Some(website.clone());
        }
        if let Some(price_range) = patch.price_range {
            self.price_range = Some(price_range);
        }
        if let Some(latitude) = patch.latitude {
            self.latitude = Some(latitude);
        }
        if let Some(longitude) = patch.longitude {
            self.longitude = Some(longitude);
        }
        if let Some(is_verified) = patch.is_verified {
            self.is_verified = is_verified;
        }
        self.updated_date = Some(now);
    }
}

/// Body of `POST /api/restaurants`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateRestaurantRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub website: Option<String>,
    pub price_range: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRestaurant {
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub website: Option<String>,
    pub price_range: Option<PriceRange>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
}

impl NewRestaurant {
    /// Convenience constructor with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            website: None,
            price_range: None,
            latitude: None,
            longitude: None,
            is_verified: false,
        }
    }
}

impl CreateRestaurantRequest {
    pub fn validate(self) -> Result<NewRestaurant, ValidationError> {
        Ok(NewRestaurant {
            name: required_text(self.name, "name")?,
            description: optional_text(self.description),
            address: optional_text(self.address),
            city: optional_text(self.city),
            state: optional_text(self.state),
            zip_code: optional_text(self.zip_code),
            website: optional_text(self.website),
            price_range: self.price_range.map(PriceRange::new).transpose()?,
            latitude: self.latitude,
            longitude: self.longitude,
            is_verified: self.is_verified.unwrap_or(false),
        })
    }
}

/// Body of `PUT /api/restaurants/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub website: Option<String>,
    pub price_range: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: Option<bool>,
}

/// A validated partial update. `None` leaves the field untouched; blank text
/// is treated the same as an absent field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestaurantPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub website: Option<String>,
    pub price_range: Option<PriceRange>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: Option<bool>,
}

impl UpdateRestaurantRequest {
    pub fn validate(self) -> Result<RestaurantPatch, ValidationError> {
        let name = match self.name {
            Some(name) => Some(required_text(Some(name), "name")?),
            None => None,
        };
        Ok(RestaurantPatch {
            name,
            description: optional_text(self.description),
            address: optional_text(self.address),
            city: optional_text(self.city),
            state: optional_text(self.state),
            zip_code: optional_text(self.zip_code),
            website: optional_text(self.website),
            price_range: self.price_range.map(PriceRange::new).transpose()?,
            latitude: self.latitude,
            longitude: self.longitude,
            is_verified: self.is_verified,
        })
    }
}

/// Structured filters for listing restaurants. Only active restaurants are listed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RestaurantFilter {
    pub price_range: Option<u8>,
    pub min_rating: Option<f64>,
    #[serde(default)]
    pub verified_only: bool,
}

impl RestaurantFilter {
    pub fn matches(&self, restaurant: &Restaurant) -> bool {
        if !restaurant.is_active {
            return false;
        }
        if let Some(price) = self.price_range {
            if restaurant.price_range.map(PriceRange::get) != Some(price) {
                return false;
            }
        }
        if let Some(min) = self.min_rating {
            if restaurant.average_rating.as_f64() < min {
                return false;
            }
        }
        !self.verified_only || restaurant.is_verified
    }
}
