//! Review rows.

use async_trait::async_trait;
use chrono::Utc;
use platewise_core::{
    ModerationStatus, NewReview, Rating, RestaurantId, Review, ReviewId, ReviewPatch, UserId,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::super::{RepositoryError, ReviewStore};
use super::{
    decode_count, decode_optional_timestamp, decode_timestamp, encode_timestamp, sql_error,
    SqliteRepository,
};

const REVIEW_COLUMNS: &str = "id, restaurant_id, user_id, rating, review_title, review_text, \
     is_recommended, moderation_status, helpful, is_active, created_date, updated_date";

fn review_from_row(row: &Row<'_>) -> rusqlite::Result<Review> {
    let rating = Rating::new(row.get(3)?).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e))
    })?;
    let moderation_status = row
        .get::<_, String>(7)?
        .parse::<ModerationStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(7, Type::Text, Box::new(e)))?;

    Ok(Review {
        id: ReviewId(row.get(0)?),
        restaurant_id: RestaurantId(row.get(1)?),
        user_id: UserId(row.get(2)?),
        rating,
        review_title: row.get(4)?,
        review_text: row.get(5)?,
        is_recommended: row.get(6)?,
        moderation_status,
        helpful: decode_count(8, row.get(8)?)?,
        is_active: row.get(9)?,
        created_date: decode_timestamp(10, row.get(10)?)?,
        updated_date: decode_optional_timestamp(11, row.get(11)?)?,
    })
}

/// A review that exists but cannot be decoded is reported as corruption
/// rather than silently dropped: the rating aggregate depends on this read.
fn decode_error(operation: &'static str, what: String) -> impl Fn(rusqlite::Error) -> RepositoryError {
    move |e| match e {
        rusqlite::Error::FromSqlConversionFailure(..) => RepositoryError::corruption(what.clone()),
        other => RepositoryError::storage(operation, other.to_string()),
    }
}

fn fetch_review(conn: &Connection, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
    conn.query_row(
        &format!("SELECT {REVIEW_COLUMNS} FROM reviews WHERE id = ?1"),
        params![id.0],
        review_from_row,
    )
    .optional()
    .map_err(decode_error("get_review", format!("review {id}")))
}

fn fetch_active_review(conn: &Connection, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
    Ok(fetch_review(conn, id)?.filter(|review| review.is_active))
}

fn row_exists(
    conn: &Connection,
    table: &'static str,
    id: i64,
) -> Result<bool, RepositoryError> {
    conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1)"),
        params![id],
        |row| row.get(0),
    )
    .map_err(sql_error("insert_review"))
}

#[async_trait]
impl ReviewStore for SqliteRepository {
    async fn insert_review(&self, new: NewReview) -> Result<Review, RepositoryError> {
        self.call("insert_review", move |conn| {
            let tx = conn.transaction().map_err(sql_error("insert_review"))?;

            // Checked explicitly so callers learn which parent is missing; the
            // foreign keys only report a generic constraint failure.
            if !row_exists(&tx, "restaurants", new.restaurant_id.0)? {
                return Err(RepositoryError::restaurant_not_found(new.restaurant_id));
            }
            if !row_exists(&tx, "users", new.user_id.0)? {
                return Err(RepositoryError::NotFound {
                    entity: "user",
                    id: new.user_id.0,
                });
            }

            tx.execute(
                "INSERT INTO reviews (restaurant_id, user_id, rating, review_title, review_text,
                                      is_recommended, moderation_status, created_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    new.restaurant_id.0,
                    new.user_id.0,
                    new.rating.get(),
                    new.review_title,
                    new.review_text,
                    new.is_recommended,
                    new.moderation_status.as_str(),
                    encode_timestamp(Utc::now()),
                ],
            )
            .map_err(sql_error("insert_review"))?;

            let id = ReviewId(tx.last_insert_rowid());
            let review = fetch_review(&tx, id)?
                .ok_or_else(|| RepositoryError::storage("insert_review", "row vanished"))?;
            tx.commit().map_err(sql_error("insert_review"))?;
            Ok(review)
        })
        .await
    }

    async fn get_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.call("get_review", move |conn| fetch_review(conn, id)).await
    }

    async fn list_reviews(
        &self,
        restaurant_id: Option<RestaurantId>,
    ) -> Result<Vec<Review>, RepositoryError> {
        self.call("list_reviews", move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {REVIEW_COLUMNS} FROM reviews
                     WHERE is_active = 1 AND (?1 IS NULL OR restaurant_id = ?1)
                     ORDER BY created_date DESC, id DESC"
                ))
                .map_err(sql_error("list_reviews"))?;

            let reviews = stmt
                .query_map(params![restaurant_id.map(|id| id.0)], review_from_row)
                .map_err(sql_error("list_reviews"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(decode_error("list_reviews", "review row".to_string()))?;
            Ok(reviews)
        })
        .await
    }

    async fn update_review(
        &self,
        id: ReviewId,
        patch: &ReviewPatch,
    ) -> Result<Option<Review>, RepositoryError> {
        let patch = patch.clone();

        self.call("update_review", move |conn| {
            let changed = conn
                .execute(
                    "UPDATE reviews SET
                         rating = COALESCE(?2, rating),
                         review_title = COALESCE(?3, review_title),
                         review_text = COALESCE(?4, review_text),
                         is_recommended = COALESCE(?5, is_recommended),
                         moderation_status = COALESCE(?6, moderation_status),
                         updated_date = ?7
                     WHERE id = ?1 AND is_active = 1",
                    params![
                        id.0,
                        patch.rating.map(Rating::get),
                        patch.review_title,
                        patch.review_text,
                        patch.is_recommended,
                        patch.moderation_status.map(ModerationStatus::as_str),
                        encode_timestamp(Utc::now()),
                    ],
                )
                .map_err(sql_error("update_review"))?;

            if changed == 0 {
                return Ok(None);
            }
            fetch_review(conn, id)
        })
        .await
    }

    async fn deactivate_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.call("deactivate_review", move |conn| {
            let tx = conn.transaction().map_err(sql_error("deactivate_review"))?;
            let Some(before) = fetch_active_review(&tx, id)? else {
                return Ok(None);
            };
            tx.execute(
                "UPDATE reviews SET is_active = 0, updated_date = ?2 WHERE id = ?1",
                params![id.0, encode_timestamp(Utc::now())],
            )
            .map_err(sql_error("deactivate_review"))?;
            tx.commit().map_err(sql_error("deactivate_review"))?;
            Ok(Some(before))
        })
        .await
    }

    async fn delete_review(&self, id: ReviewId) -> Result<Option<Review>, RepositoryError> {
        self.call("delete_review", move |conn| {
            let tx = conn.transaction().map_err(sql_error("delete_review"))?;
            let Some(before) = fetch_active_review(&tx, id)? else {
                return Ok(None);
            };
            tx.execute("DELETE FROM reviews WHERE id = ?1", params![id.0])
                .map_err(sql_error("delete_review"))?;
            tx.commit().map_err(sql_error("delete_review"))?;
            Ok(Some(before))
        })
        .await
    }

    async fn increment_helpful(&self, id: ReviewId) -> Result<Option<u32>, RepositoryError> {
        self.call("increment_helpful", move |conn| {
            let helpful: Option<i64> = conn
                .query_row(
                    "UPDATE reviews SET helpful = helpful + 1
                     WHERE id = ?1 AND is_active = 1
                     RETURNING helpful",
                    params![id.0],
                    |row| row.get(0),
                )
                .optional()
                .map_err(sql_error("increment_helpful"))?;

            helpful
                .map(|value| {
                    decode_count(0, value)
                        .map_err(|_| RepositoryError::corruption(format!("helpful count of review {id}")))
                })
                .transpose()
        })
        .await
    }
}
