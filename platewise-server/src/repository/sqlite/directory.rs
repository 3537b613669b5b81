//! Users, categories and the summary statistics.

use async_trait::async_trait;
use chrono::Utc;
use platewise_core::{
    AverageRating, Category, CategoryId, NewCategory, NewUser, Stats, User, UserId,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::warn;

use super::super::{CategoryStore, RepositoryError, StatsStore, UserStore};
use super::{
    count_to_u64, decode_timestamp, encode_timestamp, is_unique_violation, sql_error,
    SqliteRepository,
};

const USER_COLUMNS: &str = "id, username, email, password_hash, first_name, last_name, phone, \
     is_verified, is_active, created_date";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        phone: row.get(6)?,
        is_verified: row.get(7)?,
        is_active: row.get(8)?,
        created_date: decode_timestamp(9, row.get(9)?)?,
    })
}

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: CategoryId(row.get(0)?),
        category_name: row.get(1)?,
        category_description: row.get(2)?,
        is_active: row.get(3)?,
        created_date: decode_timestamp(4, row.get(4)?)?,
    })
}

fn fetch_user(conn: &Connection, id: UserId) -> Result<Option<User>, RepositoryError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id.0],
        user_from_row,
    )
    .optional()
    .map_err(|e| match e {
        rusqlite::Error::FromSqlConversionFailure(..) => {
            RepositoryError::corruption(format!("user {id}"))
        }
        other => RepositoryError::storage("get_user", other.to_string()),
    })
}

fn count(conn: &Connection, sql: &str) -> Result<u64, RepositoryError> {
    let value: i64 = conn
        .query_row(sql, [], |row| row.get(0))
        .map_err(sql_error("collect_stats"))?;
    count_to_u64(value, "collect_stats")
}

#[async_trait]
impl UserStore for SqliteRepository {
    async fn insert_user(&self, new: NewUser) -> Result<User, RepositoryError> {
        self.call("insert_user", move |conn| {
            conn.execute(
                "INSERT INTO users (username, email, password_hash, first_name, last_name,
                                    phone, created_date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.username,
                    new.email,
                    new.password_hash,
                    new.first_name,
                    new.last_name,
                    new.phone,
                    encode_timestamp(Utc::now()),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Conflict(
                        "user with this username or email already exists".to_string(),
                    )
                } else {
                    RepositoryError::storage("insert_user", e.to_string())
                }
            })?;

            let id = UserId(conn.last_insert_rowid());
            fetch_user(conn, id)?
                .ok_or_else(|| RepositoryError::storage("insert_user", "row vanished"))
        })
        .await
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.call("get_user", move |conn| fetch_user(conn, id)).await
    }

    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        self.call("list_users", |conn| {
            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {USER_COLUMNS} FROM users
                     WHERE is_active = 1
                     ORDER BY created_date DESC, id DESC"
                ))
                .map_err(sql_error("list_users"))?;

            let rows = stmt
                .query_map([], user_from_row)
                .map_err(sql_error("list_users"))?;

            let mut users = Vec::new();
            for row in rows {
                match row {
                    Ok(user) => users.push(user),
                    Err(e) => warn!("Skipping corrupt user row: {}", e),
                }
            }
            Ok(users)
        })
        .await
    }
}

#[async_trait]
impl CategoryStore for SqliteRepository {
    async fn insert_category(&self, new: NewCategory) -> Result<Category, RepositoryError> {
        self.call("insert_category", move |conn| {
            let created_date = Utc::now();
            conn.execute(
                "INSERT INTO categories (category_name, category_description, created_date)
                 VALUES (?1, ?2, ?3)",
                params![
                    new.category_name,
                    new.category_description,
                    encode_timestamp(created_date),
                ],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::Conflict("category already exists".to_string())
                } else {
                    RepositoryError::storage("insert_category", e.to_string())
                }
            })?;

            let id = CategoryId(conn.last_insert_rowid());
            Ok(Category::create(id, new, created_date))
        })
        .await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        self.call("list_categories", |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, category_name, category_description, is_active, created_date
                     FROM categories
                     ORDER BY category_name",
                )
                .map_err(sql_error("list_categories"))?;

            let rows = stmt
                .query_map([], category_from_row)
                .map_err(sql_error("list_categories"))?;

            let mut categories = Vec::new();
            for row in rows {
                match row {
                    Ok(category) => categories.push(category),
                    Err(e) => warn!("Skipping corrupt category row: {}", e),
                }
            }
            Ok(categories)
        })
        .await
    }
}

#[async_trait]
impl StatsStore for SqliteRepository {
    async fn collect_stats(&self) -> Result<Stats, RepositoryError> {
        self.call("collect_stats", |conn| {
            let mut stmt = conn
                .prepare("SELECT average_rating_hundredths FROM restaurants WHERE is_active = 1")
                .map_err(sql_error("collect_stats"))?;
            let averages = stmt
                .query_map([], |row| row.get::<_, i64>(0))
                .map_err(sql_error("collect_stats"))?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(sql_error("collect_stats"))?
                .into_iter()
                .map(|h| {
                    u16::try_from(h)
                        .ok()
                        .and_then(AverageRating::from_hundredths)
                        .ok_or_else(|| {
                            RepositoryError::corruption(format!("average rating hundredths {h}"))
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Stats {
                total_restaurants: averages.len() as u64,
                total_reviews: count(conn, "SELECT COUNT(*) FROM reviews WHERE is_active = 1")?,
                total_users: count(conn, "SELECT COUNT(*) FROM users WHERE is_active = 1")?,
                total_categories: count(
                    conn,
                    "SELECT COUNT(*) FROM categories WHERE is_active = 1",
                )?,
                average_rating: AverageRating::mean_of(averages),
            })
        })
        .await
    }
}
