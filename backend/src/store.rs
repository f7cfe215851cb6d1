//! Route store: owner-scoped persistence of encoded routes.
//!
//! The [`RouteStore`] trait is the boundary the persistence adapter talks to;
//! [`PgRouteStore`] implements it over PostgreSQL. Ownership checks live here:
//! listing only returns the caller's rows and deleting a record the caller
//! does not own reports [`StoreError::NotFound`].

use std::env;
use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::TripType;
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};

/// Upper bound on the combined encoded payload per record, mirroring the
/// document-store size cap. Oversized saves must be thinned further by the
/// caller.
pub const MAX_ENCODED_PAYLOAD_BYTES: usize = 16 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("encoded route payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("route store rate limit exceeded")]
    RateLimited,

    #[error("route store unavailable: {0}")]
    Unavailable(sqlx::Error),

    #[error("route {0} not found")]
    NotFound(i32),

    #[error("invalid route data: {0}")]
    InvalidData(String),

    #[error("store configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            // pool exhaustion is the store's "too many requests" signal
            sqlx::Error::PoolTimedOut => StoreError::RateLimited,
            other => StoreError::Unavailable(other),
        }
    }
}

/// A record as submitted for storage: already thinned and encoded.
#[derive(Debug, Clone)]
pub struct NewRouteRecord {
    pub name: String,
    pub description: Option<String>,
    pub destination: String,
    pub trip_type: TripType,
    pub path_encoded: String,
    pub path_days_encoded: Vec<String>,
}

impl NewRouteRecord {
    /// Total encoded payload size, the quantity the store cap applies to.
    pub fn encoded_len(&self) -> usize {
        self.path_encoded.len()
            + self
                .path_days_encoded
                .iter()
                .map(String::len)
                .sum::<usize>()
    }
}

/// A stored record as returned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoredRoute {
    pub id: i32,
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
    pub destination: String,
    #[serde(rename = "type")]
    pub trip_type: String,
    pub path_encoded: String,
    pub path_days_encoded: Vec<String>,
    pub created_at: DateTime<Utc>,
}

pub trait RouteStore: Send + Sync {
    fn save(
        &self,
        owner: &str,
        record: NewRouteRecord,
    ) -> impl Future<Output = Result<StoredRoute, StoreError>> + Send;

    fn list(&self, owner: &str) -> impl Future<Output = Result<Vec<StoredRoute>, StoreError>> + Send;

    fn delete(&self, id: i32, owner: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// PostgreSQL-backed route store.
pub struct PgRouteStore {
    pool: PgPool,
}

impl PgRouteStore {
    /// Connect using the `DATABASE_URL` environment variable.
    pub async fn connect() -> Result<Self, StoreError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| {
            StoreError::Config("DATABASE_URL environment variable not set".to_string())
        })?;
        Self::connect_to(&database_url).await
    }

    pub async fn connect_to(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;

        tracing::info!("route store connection pool created");
        Ok(Self { pool })
    }

    /// Apply the schema migration.
    ///
    /// SQLx `query()` cannot run multiple statements, so the migration file is
    /// executed with `raw_sql` on a dedicated connection.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await?;

        let migration_sql = include_str!("../migrations/20250807_create_saved_routes.sql");
        sqlx::raw_sql(migration_sql).execute(&mut *conn).await?;

        tracing::info!("route store migrations completed");
        Ok(())
    }
}

impl RouteStore for PgRouteStore {
    async fn save(&self, owner: &str, record: NewRouteRecord) -> Result<StoredRoute, StoreError> {
        let size = record.encoded_len();
        if size > MAX_ENCODED_PAYLOAD_BYTES {
            return Err(StoreError::PayloadTooLarge {
                size,
                limit: MAX_ENCODED_PAYLOAD_BYTES,
            });
        }
        if record.name.trim().is_empty() {
            return Err(StoreError::InvalidData("route name is required".to_string()));
        }

        let route = sqlx::query_as::<_, StoredRoute>(
            r#"
            INSERT INTO saved_routes (
                owner, name, description, destination, trip_type,
                path_encoded, path_days_encoded
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(owner)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.destination)
        .bind(record.trip_type.as_str())
        .bind(&record.path_encoded)
        .bind(&record.path_days_encoded)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(owner, name = %route.name, id = route.id, "route saved");
        Ok(route)
    }

    async fn list(&self, owner: &str) -> Result<Vec<StoredRoute>, StoreError> {
        let routes = sqlx::query_as::<_, StoredRoute>(
            "SELECT * FROM saved_routes WHERE owner = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(owner, count = routes.len(), "routes listed");
        Ok(routes)
    }

    async fn delete(&self, id: i32, owner: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM saved_routes WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            // unknown id and foreign owner are indistinguishable on purpose
            return Err(StoreError::NotFound(id));
        }

        tracing::info!(owner, id, "route deleted");
        Ok(())
    }
}
