//! Reviews: the stored record, creation and update payloads.
//!
//! Lifecycle: a review is created active, may be edited any number of times
//! while active, and is removed either by a hard delete or by clearing
//! `is_active`. Nothing leaves the removed state.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{optional_text, ValidationError};
use crate::ids::{RestaurantId, ReviewId, UserId};
use crate::rating::Rating;

/// Moderation outcome of a review.
///
/// Informational only: aggregation is gated by `is_active`, not by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    #[default]
    Approved,
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "rejected" => Ok(ModerationStatus::Rejected),
            other => Err(ValidationError::UnknownModerationStatus(other.to_string())),
        }
    }
}

/// A persisted review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub restaurant_id: RestaurantId,
    pub user_id: UserId,
    pub rating: Rating,
    pub review_title: Option<String>,
    pub review_text: Option<String>,
    pub is_recommended: Option<bool>,
    pub moderation_status: ModerationStatus,
    /// Independent "this was helpful" counter. Has no effect on aggregation.
    pub helpful: u32,
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
    pub updated_date: Option<DateTime<Utc>>,
}

impl Review {
    /// Build the record for a freshly validated review.
    pub fn create(id: ReviewId, new: NewReview, now: DateTime<Utc>) -> Self {
        Self {
            id,
            restaurant_id: new.restaurant_id,
            user_id: new.user_id,
            rating: new.rating,
            review_title: new.review_title,
            review_text: new.review_text,
            is_recommended: new.is_recommended,
            moderation_status: new.moderation_status,
            helpful: 0,
            is_active: true,
            created_date: now,
            updated_date: None,
        }
    }

    /// Apply an edit in place, bumping `updated_date`.
    pub fn apply(&mut self, patch: &ReviewPatch, now: DateTime<Utc>) {
        if let Some(rating) = patch.rating {
            self.rating = rating;
        }
        if let Some(title) = &patch.review_title {
            self.review_title = Some(title.clone());
        }
        if let Some(text) = &patch.review_text {
            self.review_text = Some(text.clone());
        }
        if let Some(recommended) = patch.is_recommended {
            self.is_recommended = Some(recommended);
        }
        if let Some(status) = patch.moderation_status {
            self.moderation_status = status;
        }
        self.updated_date = Some(now);
    }
}

/// Body of `POST /api/reviews` as received.
///
/// Every field is optional at the wire level so that a missing field is
/// reported as a [`ValidationError`] naming it rather than a decode error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateReviewRequest {
    pub restaurant_id: Option<i64>,
    pub user_id: Option<i64>,
    pub rating: Option<i64>,
    pub review_title: Option<String>,
    pub review_text: Option<String>,
    pub is_recommended: Option<bool>,
    pub moderation_status: Option<ModerationStatus>,
}

/// A review that passed validation and can be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub restaurant_id: RestaurantId,
    pub user_id: UserId,
    pub rating: Rating,
    pub review_title: Option<String>,
    pub review_text: Option<String>,
    pub is_recommended: Option<bool>,
    pub moderation_status: ModerationStatus,
}

impl CreateReviewRequest {
    pub fn validate(self) -> Result<NewReview, ValidationError> {
        let restaurant_id = self
            .restaurant_id
            .ok_or(ValidationError::MissingField("restaurant_id"))?;
        let user_id = self
            .user_id
            .ok_or(ValidationError::MissingField("user_id"))?;
        let rating = self.rating.ok_or(ValidationError::MissingField("rating"))?;

        Ok(NewReview {
            restaurant_id: RestaurantId(restaurant_id),
            user_id: UserId(user_id),
            rating: Rating::new(rating)?,
            review_title: optional_text(self.review_title),
            review_text: optional_text(self.review_text),
            is_recommended: self.is_recommended,
            moderation_status: self.moderation_status.unwrap_or_default(),
        })
    }
}

/// Body of `PUT /api/reviews/{id}`.
///
/// Foreign keys and `is_active` are not editable; naming them is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateReviewRequest {
    pub rating: Option<i64>,
    pub review_title: Option<String>,
    pub review_text: Option<String>,
    pub is_recommended: Option<bool>,
    pub moderation_status: Option<ModerationStatus>,
}

/// A validated partial update. `None` leaves the field untouched; blank text
/// is treated the same as an absent field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPatch {
    pub rating: Option<Rating>,
    pub review_title: Option<String>,
    pub review_text: Option<String>,
    pub is_recommended: Option<bool>,
    pub moderation_status: Option<ModerationStatus>,
}

impl UpdateReviewRequest {
    pub fn validate(self) -> Result<ReviewPatch, ValidationError> {
        Ok(ReviewPatch {
            rating: self.rating.map(Rating::new).transpose()?,
            review_title: optional_text(self.review_title),
            review_text: optional_text(self.review_text),
            is_recommended: self.is_recommended,
            moderation_status: self.moderation_status,
        })
    }
}
