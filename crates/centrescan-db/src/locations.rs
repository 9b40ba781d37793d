//! Read operations for the `locations` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

const LOCATION_COLUMNS: &str = "id, name, location_type, latitude, longitude, \
                                postcode, city, county, website, number_of_stores, \
                                created_at, updated_at";

/// A row from the `locations` table.
///
/// Latitude and longitude are stored as `NUMERIC(9,6)` and surface here as
/// [`Decimal`]; conversion to `f64` happens at the snapshot boundary. The
/// legacy corpus encodes "not geocoded" as a literal `(0, 0)` pair, which
/// the snapshot loader maps to absent coordinates.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationRow {
    pub id: Uuid,
    pub name: String,
    pub location_type: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    pub website: Option<String>,
    pub number_of_stores: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fetch every location, ordered by id for deterministic snapshots.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_all_locations(pool: &PgPool) -> Result<Vec<LocationRow>, sqlx::Error> {
    sqlx::query_as::<_, LocationRow>(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations ORDER BY id"
    ))
    .fetch_all(pool)
    .await
}

/// Fetch one location by id.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_location_by_id(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<LocationRow>, sqlx::Error> {
    sqlx::query_as::<_, LocationRow>(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Fetch locations whose name contains the fragment, case-insensitively.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn fetch_locations_by_name_fragment(
    pool: &PgPool,
    fragment: &str,
) -> Result<Vec<LocationRow>, sqlx::Error> {
    let pattern = format!("%{}%", fragment.replace(['%', '_'], ""));
    sqlx::query_as::<_, LocationRow>(&format!(
        "SELECT {LOCATION_COLUMNS} FROM locations WHERE name ILIKE $1 ORDER BY id"
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await
}
