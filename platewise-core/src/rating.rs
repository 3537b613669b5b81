//! Rating values and the arithmetic behind a restaurant's derived fields.
//!
//! Averages are held as integer hundredths so that rounding to two decimal
//! places is exact: `mean = round_half_up(100 * sum / count)`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A single review's star rating, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Validate a raw rating. Out-of-range values are rejected, never clamped.
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ValidationError::RatingOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Rating {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mean rating rounded to two decimal places, stored as hundredths (0..=500).
///
/// Serializes as a JSON number, e.g. `4.33`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AverageRating(u16);

impl AverageRating {
    pub const ZERO: Self = Self(0);
    const MAX_HUNDREDTHS: u16 = 500;

    pub fn from_hundredths(hundredths: u16) -> Option<Self> {
        (hundredths <= Self::MAX_HUNDREDTHS).then_some(Self(hundredths))
    }

    pub fn hundredths(self) -> u16 {
        self.0
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.0) / 100.0
    }

    /// Mean of several averages, itself rounded half-up to two places.
    ///
    /// Returns zero for an empty input.
    pub fn mean_of<I>(averages: I) -> Self
    where
        I: IntoIterator<Item = AverageRating>,
    {
        let (sum, count) = averages
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), avg| {
                (sum + u64::from(avg.0), count + 1)
            });
        if count == 0 {
            return Self::ZERO;
        }
        Self(round_half_up_div(sum, count) as u16)
    }
}

impl fmt::Display for AverageRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for AverageRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for AverageRating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        let hundredths = (value * 100.0).round();
        if !(0.0..=f64::from(Self::MAX_HUNDREDTHS)).contains(&hundredths) {
            return Err(serde::de::Error::custom(format!(
                "average rating {value} outside 0..=5"
            )));
        }
        Ok(Self(hundredths as u16))
    }
}

/// A restaurant's derived fields: the rounded mean and the count of its
/// active reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RatingAggregate {
    pub average_rating: AverageRating,
    pub total_reviews: u32,
}

impl RatingAggregate {
    /// Aggregate of an empty review set.
    pub const EMPTY: Self = Self {
        average_rating: AverageRating::ZERO,
        total_reviews: 0,
    };

    /// Aggregate the given ratings. An empty input yields [`RatingAggregate::EMPTY`].
    pub fn from_ratings<I>(ratings: I) -> Self
    where
        I: IntoIterator<Item = Rating>,
    {
        let (sum, count) = ratings
            .into_iter()
            .fold((0u64, 0u64), |(sum, count), rating| {
                (sum + u64::from(rating.get()), count + 1)
            });

        if count == 0 {
            return Self::EMPTY;
        }

        Self {
            average_rating: AverageRating(round_half_up_div(100 * sum, count) as u16),
            total_reviews: u32::try_from(count).unwrap_or(u32::MAX),
        }
    }
}

/// `numerator / denominator` rounded to the nearest integer, ties away from zero.
///
/// `denominator` must be non-zero.
fn round_half_up_div(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}
