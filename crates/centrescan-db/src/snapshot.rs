//! Materialise an engine [`Snapshot`] from the store.
//!
//! The engine is pure and synchronous; all database blocking happens
//! here, once per refresh, rather than per query.

use rust_decimal::prelude::ToPrimitive;
use sqlx::PgPool;

use centrescan_core::{Category, CategoryAliases, Coordinates, Location, LocationType, Tenant};
use centrescan_engine::Snapshot;

use crate::locations::LocationRow;
use crate::tenants::TenantRow;
use crate::DbError;

/// Load the full corpus into an in-memory snapshot.
///
/// Coordinate handling: the legacy corpus stores "not geocoded" as a
/// literal `(0, 0)` pair; that sentinel, a missing ordinate, or a
/// non-finite value all map to `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either table cannot be read.
pub async fn load_snapshot(pool: &PgPool, aliases: &CategoryAliases) -> Result<Snapshot, DbError> {
    let location_rows = crate::fetch_all_locations(pool).await?;
    let tenant_rows = crate::fetch_all_tenants(pool).await?;

    let locations: Vec<Location> = location_rows.into_iter().map(row_to_location).collect();
    let tenants: Vec<Tenant> = tenant_rows
        .into_iter()
        .map(|row| row_to_tenant(row, aliases))
        .collect();

    let snapshot = Snapshot::new(locations, tenants);
    tracing::info!(locations = snapshot.len(), "snapshot loaded");
    Ok(snapshot)
}

/// Convert a location row to the domain type.
#[must_use]
pub fn row_to_location(row: LocationRow) -> Location {
    let coordinates = match (
        row.latitude.and_then(|d| d.to_f64()),
        row.longitude.and_then(|d| d.to_f64()),
    ) {
        (Some(lat), Some(lon)) if lat != 0.0 || lon != 0.0 => Coordinates::new(lat, lon),
        _ => None,
    };

    let location_type = row
        .location_type
        .parse::<LocationType>()
        .unwrap_or(LocationType::ShoppingCentre);

    Location {
        id: row.id,
        name: row.name,
        location_type,
        coordinates,
        postcode: row.postcode,
        city: row.city,
        county: row.county,
        website: row.website,
        number_of_stores: row.number_of_stores.and_then(|n| u32::try_from(n).ok()),
    }
}

/// Convert a tenant row, folding its free-text category label.
#[must_use]
pub fn row_to_tenant(row: TenantRow, aliases: &CategoryAliases) -> Tenant {
    Tenant {
        id: row.id,
        location_id: row.location_id,
        name: row.name,
        category: Category::from_label(&row.category, aliases),
        is_anchor: row.is_anchor,
    }
}
