//! Read operations for the `tenants` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const TENANT_COLUMNS: &str = "id, location_id, name, category, is_anchor, created_at, updated_at";

/// A row from the `tenants` table. `category` is the raw free-text label;
/// folding into the closed taxonomy happens at the snapshot boundary.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TenantRow {
    pub id: Uuid,
    pub location_id: Uuid,
    pub name: String,
    pub category: String,
    pub is_anchor: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fetch every tenant, ordered by id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_all_tenants(pool: &PgPool) -> Result<Vec<TenantRow>, sqlx::Error> {
    sqlx::query_as::<_, TenantRow>(&format!(
        "SELECT {TENANT_COLUMNS} FROM tenants ORDER BY id"
    ))
    .fetch_all(pool)
    .await
}

/// Fetch the tenants of one location.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_tenants_by_location(
    pool: &PgPool,
    location_id: Uuid,
) -> Result<Vec<TenantRow>, sqlx::Error> {
    sqlx::query_as::<_, TenantRow>(&format!(
        "SELECT {TENANT_COLUMNS} FROM tenants WHERE location_id = $1 ORDER BY id"
    ))
    .bind(location_id)
    .fetch_all(pool)
    .await
}

/// Fetch the tenants of several locations in one round trip.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_tenants_by_locations(
    pool: &PgPool,
    location_ids: &[Uuid],
) -> Result<Vec<TenantRow>, sqlx::Error> {
    sqlx::query_as::<_, TenantRow>(&format!(
        "SELECT {TENANT_COLUMNS} FROM tenants WHERE location_id = ANY($1) ORDER BY id"
    ))
    .bind(location_ids)
    .fetch_all(pool)
    .await
}
