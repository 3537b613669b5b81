//! Restaurant rows.

use async_trait::async_trait;
use chrono::Utc;
use platewise_core::{
    AverageRating, NewRestaurant, PriceRange, RatingAggregate, Restaurant, RestaurantFilter,
    RestaurantId, RestaurantPatch,
};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::warn;

use super::super::{RepositoryError, RestaurantStore};
use super::{
    decode_count, decode_optional_timestamp, decode_timestamp, encode_timestamp, sql_error,
    SqliteRepository,
};

const RESTAURANT_COLUMNS: &str = "id, name, description, address, city, state, zip_code, \
     website, price_range, latitude, longitude, is_verified, average_rating_hundredths, \
     total_reviews, is_active, created_date, updated_date";

fn restaurant_from_row(row: &Row<'_>) -> rusqlite::Result<Restaurant> {
    let price_range = row
        .get::<_, Option<i64>>(8)?
        .map(|p| {
            PriceRange::new(p).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(8, Type::Integer, Box::new(e))
            })
        })
        .transpose()?;

    let hundredths: i64 = row.get(12)?;
    let average_rating = u16::try_from(hundredths)
        .ok()
        .and_then(AverageRating::from_hundredths)
        .ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                12,
                Type::Integer,
                format!("average rating hundredths {hundredths} out of range").into(),
            )
        })?;

    Ok(Restaurant {
        id: RestaurantId(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        address: row.get(3)?,
        city: row.get(4)?,
        state: row.get(5)?,
        zip_code: row.get(6)?,
        website: row.get(7)?,
        price_range,
        latitude: row.get(9)?,
        longitude: row.get(10)?,
        is_verified: row.get(11)?,
        average_rating,
        total_reviews: decode_count(13, row.get(13)?)?,
        is_active: row.get(14)?,
        created_date: decode_timestamp(15, row.get(15)?)?,
        updated_date: decode_optional_timestamp(16, row.get(16)?)?,
    })
}

pub(super) fn fetch_restaurant(
    conn: &Connection,
    id: RestaurantId,
) -> Result<Option<Restaurant>, RepositoryError> {
    conn.query_row(
        &format!("SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = ?1"),
        params![id.0],
        restaurant_from_row,
    )
    .optional()
    .map_err(|e| match e {
        rusqlite::Error::FromSqlConversionFailure(..) => {
            RepositoryError::corruption(format!("restaurant {id}"))
        }
        other => RepositoryError::storage("get_restaurant", other.to_string()),
    })
}

#[async_trait]
impl RestaurantStore for SqliteRepository {
    async fn insert_restaurant(&self, new: NewRestaurant) -> Result<Restaurant, RepositoryError> {
        self.call("insert_restaurant", move |conn| {
            let now = Utc::now();
            conn.execute(
                "INSERT INTO restaurants (name, description, address, city, state, zip_code,
                                          website, price_range, latitude, longitude,
                                          is_verified, created_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    new.name,
                    new.description,
                    new.address,
                    new.city,
                    new.state,
                    new.zip_code,
                    new.website,
                    new.price_range.map(PriceRange::get),
                    new.latitude,
                    new.longitude,
                    new.is_verified,
                    encode_timestamp(now),
                ],
            )
            .map_err(sql_error("insert_restaurant"))?;

            let id = RestaurantId(conn.last_insert_rowid());
            fetch_restaurant(conn, id)?
                .ok_or_else(|| RepositoryError::storage("insert_restaurant", "row vanished"))
        })
        .await
    }

    async fn get_restaurant(
        &self,
        id: RestaurantId,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        self.call("get_restaurant", move |conn| fetch_restaurant(conn, id))
            .await
    }

    async fn list_restaurants(
        &self,
        filter: &RestaurantFilter,
    ) -> Result<Vec<Restaurant>, RepositoryError> {
        let filter = filter.clone();

        self.call("list_restaurants", move |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {RESTAURANT_COLUMNS} FROM restaurants
                     WHERE is_active = 1
                     ORDER BY created_date DESC, id DESC"
                ))
                .map_err(sql_error("list_restaurants"))?;

            let rows = stmt
                .query_map([], restaurant_from_row)
                .map_err(sql_error("list_restaurants"))?;

            let mut results = Vec::new();
            for row in rows {
                // Skip undecodable rows so one bad record does not hide the rest.
                let restaurant = match row {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("Skipping corrupt restaurant row: {}", e);
                        continue;
                    }
                };
                if filter.matches(&restaurant) {
                    results.push(restaurant);
                }
            }
            Ok(results)
        })
        .await
    }

    async fn list_restaurant_ids(&self) -> Result<Vec<RestaurantId>, RepositoryError> {
        self.call("list_restaurant_ids", |conn| {
            let mut stmt = conn
                .prepare("SELECT id FROM restaurants ORDER BY id")
                .map_err(sql_error("list_restaurant_ids"))?;
            let ids = stmt
                .query_map([], |row| row.get::<_, i64>(0).map(RestaurantId))
                .map_err(sql_error("list_restaurant_ids"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_error("list_restaurant_ids"))?;
            Ok(ids)
        })
        .await
    }

    async fn update_restaurant(
        &self,
        id: RestaurantId,
        patch: &RestaurantPatch,
    ) -> Result<Option<Restaurant>, RepositoryError> {
        let patch = patch.clone();

        self.call("update_restaurant", move |conn| {
            let changed = conn
                .execute(
                    "UPDATE restaurants SET
                         name = COALESCE(?2, name),
                         description = COALESCE(?3, description),
                         address = COALESCE(?4, address),
                         city = COALESCE(?5, city),
                         state = COALESCE(?6, state),
                         zip_code = COALESCE(?7, zip_code),
                         website = COALESCE(?8, website),
                         price_range = COALESCE(?9, price_range),
                         latitude = COALESCE(?10, latitude),
                         longitude = COALESCE(?11, longitude),
                         is_verified = COALESCE(?12, is_verified),
                         updated_date = ?13
                     WHERE id = ?1",
                    params![
                        id.0,
                        patch.name,
                        patch.description,
                        patch.address,
                        patch.city,
                        patch.state,
                        patch.zip_code,
                        patch.website,
                        patch.price_range.map(PriceRange::get),
                        patch.latitude,
                        patch.longitude,
                        patch.is_verified,
                        encode_timestamp(Utc::now()),
                    ],
                )
                .map_err(sql_error("update_restaurant"))?;

            if changed == 0 {
                return Ok(None);
            }
            fetch_restaurant(conn, id)
        })
        .await
    }

    async fn deactivate_restaurant(&self, id: RestaurantId) -> Result<bool, RepositoryError> {
        self.call("deactivate_restaurant", move |conn| {
            let changed = conn
                .execute(
                    "UPDATE restaurants SET is_active = 0, updated_date = ?2
                     WHERE id = ?1 AND is_active = 1",
                    params![id.0, encode_timestamp(Utc::now())],
                )
                .map_err(sql_error("deactivate_restaurant"))?;
            Ok(changed > 0)
        })
        .await
    }

    async fn update_aggregates(
        &self,
        id: RestaurantId,
        aggregate: RatingAggregate,
    ) -> Result<(), RepositoryError> {
        self.call("update_aggregates", move |conn| {
            let changed = conn
                .execute(
                    "UPDATE restaurants
                     SET average_rating_hundredths = ?2, total_reviews = ?3
                     WHERE id = ?1",
                    params![
                        id.0,
                        aggregate.average_rating.hundredths(),
                        aggregate.total_reviews
                    ],
                )
                .map_err(sql_error("update_aggregates"))?;

            if changed == 0 {
                return Err(RepositoryError::restaurant_not_found(id));
            }
            Ok(())
        })
        .await
    }
}
