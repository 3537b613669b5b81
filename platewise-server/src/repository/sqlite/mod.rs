//! SQLite implementation of the store traits.
//!
//! # Schema Versioning
//!
//! The database has a `schema_version` table that tracks the schema version.
//! When the schema needs to change, increment `CURRENT_SCHEMA_VERSION` and add
//! a migration in `run_migrations()`. Migrations run sequentially from the
//! current version to the target version.
//!
//! # Derived fields
//!
//! `restaurants.average_rating_hundredths` and `restaurants.total_reviews` are
//! only written by `update_aggregates`. The average is stored as integer
//! hundredths so it round-trips exactly.

mod directory;
mod restaurants;
mod reviews;


use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};

use super::RepositoryError;

/// Current schema version. Increment this when making schema changes and add
/// corresponding migration logic in `run_migrations()`.
const CURRENT_SCHEMA_VERSION: i64 = 2;

/// SQLite-backed store.
///
/// Uses `tokio::task::spawn_blocking` to run synchronous rusqlite operations
/// without blocking the async runtime.
pub struct SqliteRepository {
    /// Exposed as `pub(crate)` so tests can inspect raw rows.
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl SqliteRepository {
    /// Open (or create) the database at `path` and bring its schema up to date.
    ///
    /// # Durability
    ///
    /// The database is configured with:
    /// - `journal_mode = WAL` for better concurrency and crash safety
    /// - `synchronous = FULL` for maximum durability
    /// - `busy_timeout = 5000ms` to handle concurrent access gracefully
    /// - `foreign_keys = ON` so reviews cannot reference missing rows
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path_ref = path.as_ref();

        // Ensure parent directory exists (unless it's :memory: or empty path)
        let path_str = path_ref.to_string_lossy();
        let is_in_memory = path_str == ":memory:";
        if !is_in_memory && !path_str.is_empty() {
            if let Some(parent) = path_ref.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        RepositoryError::storage(
                            "create database directory",
                            format!("{}: {}", parent.display(), e),
                        )
                    })?;
                }
            }
        }

        let conn = Connection::open(path_ref)
            .map_err(|e| RepositoryError::storage("open database", e.to_string()))?;

        let journal_mode: String = conn
            .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
            .map_err(|e| RepositoryError::storage("set journal_mode", e.to_string()))?;
        check_journal_mode(&journal_mode, is_in_memory)?;

        conn.execute_batch(
            r#"
            PRAGMA synchronous = FULL;
            PRAGMA busy_timeout = 5000;
            PRAGMA foreign_keys = ON;
            "#,
        )
        .map_err(|e| RepositoryError::storage("configure pragmas", e.to_string()))?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                version INTEGER NOT NULL
            );
            "#,
        )
        .map_err(|e| RepositoryError::storage("create schema_version table", e.to_string()))?;

        // 0 if table is empty = fresh database
        let current_version: i64 = conn
            .query_row(
                "SELECT version FROM schema_version WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| RepositoryError::storage("get schema version", e.to_string()))?
            .unwrap_or(0);

        Self::run_migrations(&conn, current_version)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create a new in-memory SQLite repository (for testing).
    pub fn new_in_memory() -> Result<Self, RepositoryError> {
        Self::new(":memory:")
    }

    /// Run migrations from `from_version` to `CURRENT_SCHEMA_VERSION`.
    fn run_migrations(conn: &Connection, from_version: i64) -> Result<(), RepositoryError> {
        if from_version > CURRENT_SCHEMA_VERSION {
            return Err(RepositoryError::storage(
                "schema version",
                format!(
                    "Database schema version {} is newer than supported version {}. \
                     Please upgrade the application.",
                    from_version, CURRENT_SCHEMA_VERSION
                ),
            ));
        }

        if from_version == CURRENT_SCHEMA_VERSION {
            return Ok(());
        }

        if from_version < 1 {
            conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS restaurants (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    description TEXT,
                    address TEXT,
                    city TEXT,
                    state TEXT,
                    zip_code TEXT,
                    website TEXT,
                    price_range INTEGER CHECK (price_range BETWEEN 1 AND 4),
                    latitude REAL,
                    longitude REAL,
                    is_verified INTEGER NOT NULL DEFAULT 0,
                    average_rating_hundredths INTEGER NOT NULL DEFAULT 0
                        CHECK (average_rating_hundredths BETWEEN 0 AND 500),
                    total_reviews INTEGER NOT NULL DEFAULT 0 CHECK (total_reviews >= 0),
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_date TEXT NOT NULL,
                    updated_date TEXT
                );

                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    first_name TEXT,
                    last_name TEXT,
                    phone TEXT,
                    is_verified INTEGER NOT NULL DEFAULT 0,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_date TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS categories (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    category_name TEXT NOT NULL UNIQUE,
                    category_description TEXT,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_date TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS reviews (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    restaurant_id INTEGER NOT NULL REFERENCES restaurants(id),
                    user_id INTEGER NOT NULL REFERENCES users(id),
                    rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                    review_title TEXT,
                    review_text TEXT,
                    is_recommended INTEGER,
                    moderation_status TEXT NOT NULL DEFAULT 'approved'
                        CHECK (moderation_status IN ('pending', 'approved', 'rejected')),
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_date TEXT NOT NULL,
                    updated_date TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_reviews_active_by_restaurant
                    ON reviews(restaurant_id) WHERE is_active = 1;
                CREATE INDEX IF NOT EXISTS idx_restaurants_active
                    ON restaurants(created_date DESC) WHERE is_active = 1;
                "#,
            )
            .map_err(|e| RepositoryError::storage("migration v1", e.to_string()))?;
        }

        // Migration from version 1 to version 2: independent "helpful" counter on reviews.
        if from_version < 2 {
            conn.execute_batch(
                r#"
                ALTER TABLE reviews ADD COLUMN helpful INTEGER NOT NULL DEFAULT 0
                    CHECK (helpful >= 0);
                "#,
            )
            .map_err(|e| RepositoryError::storage("migration v2", e.to_string()))?;
        }

        conn.execute(
            "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
            params![CURRENT_SCHEMA_VERSION],
        )
        .map_err(|e| RepositoryError::storage("update schema version", e.to_string()))?;

        Ok(())
    }

    /// Run `f` against the connection on the blocking pool.
    async fn call<T, F>(&self, operation: &'static str, f: F) -> Result<T, RepositoryError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, RepositoryError> + Send + 'static,
    {
        let conn = self.conn.clone();

        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|_| RepositoryError::storage(operation, "connection mutex poisoned"))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| RepositoryError::storage(operation, e.to_string()))?
    }
}

/// Refuse to run without WAL. SQLite can silently keep DELETE mode on
/// filesystems without shared memory support; in-memory databases report
/// "memory".
fn check_journal_mode(journal_mode: &str, is_in_memory: bool) -> Result<(), RepositoryError> {
    let ok = journal_mode.eq_ignore_ascii_case("wal")
        || (is_in_memory && journal_mode.eq_ignore_ascii_case("memory"));
    if ok {
        return Ok(());
    }
    Err(RepositoryError::storage(
        "configure journal_mode",
        format!(
            "Failed to enable WAL mode: SQLite returned '{}' instead of 'wal'. \
             The review database needs WAL so readers never block the single writer.",
            journal_mode
        ),
    ))
}

// =============================================================================
// Conversion helpers
// =============================================================================

/// Map a rusqlite error for `operation` into a storage error.
pub(super) fn sql_error(operation: &'static str) -> impl Fn(rusqlite::Error) -> RepositoryError {
    move |e| RepositoryError::storage(operation, e.to_string())
}

/// Whether `e` is a UNIQUE constraint violation.
pub(super) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`),
/// so lexical order in SQL equals chronological order.
pub(super) fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn decode_timestamp(idx: usize, value: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(super) fn decode_optional_timestamp(
    idx: usize,
    value: Option<String>,
) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| decode_timestamp(idx, v)).transpose()
}

/// Convert a stored non-negative integer column into `u32`.
///
/// A negative or oversized value indicates database corruption.
pub(super) fn decode_count(idx: usize, value: i64) -> rusqlite::Result<u32> {
    u32::try_from(value).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e))
    })
}

/// Convert a COUNT(*) result to `u64`.
pub(super) fn count_to_u64(value: i64, operation: &'static str) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|_| {
        RepositoryError::storage(operation, format!("negative count {} from SQLite", value))
    })
}
