//! Offline unit tests for centrescan-db pool configuration and row
//! conversion. These tests do not require a live database connection.

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use centrescan_core::{AppConfig, Category, CategoryAliases, Environment, LocationType};
use centrescan_db::{row_to_location, row_to_tenant, LocationRow, PoolConfig, TenantRow};

fn app_config() -> AppConfig {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};
    use std::path::PathBuf;

    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        category_aliases_path: PathBuf::from("./config/categories.yaml"),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        resolver_fuzzy_threshold: 0.6,
        resolver_ambiguity_epsilon: 0.05,
        nearby_result_limit: 20,
        gap_margin_points: 5.0,
        dedupe_name_threshold: 0.6,
        dedupe_proximity_km: 0.2,
        snapshot_refresh_cron: "0 */15 * * * *".to_string(),
        dedupe_scan_cron: "0 0 3 * * *".to_string(),
    }
}

fn location_row(lat: Option<Decimal>, lon: Option<Decimal>) -> LocationRow {
    LocationRow {
        id: Uuid::new_v4(),
        name: "Queensgate Shopping Centre".to_string(),
        location_type: "shopping-centre".to_string(),
        latitude: lat,
        longitude: lon,
        postcode: Some("PE1 1NT".to_string()),
        city: Some("Peterborough".to_string()),
        county: Some("Cambridgeshire".to_string()),
        website: Some("https://www.queensgate-shopping.co.uk".to_string()),
        number_of_stores: Some(90),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn geocoded_row_converts_to_coordinates() {
    let row = location_row(
        Some(Decimal::new(52_573_600, 6)),
        Some(Decimal::new(-247_800, 6)),
    );
    let location = row_to_location(row);
    let coords = location.coordinates.expect("coordinates expected");
    assert!((coords.latitude - 52.5736).abs() < 1e-6);
    assert!((coords.longitude + 0.2478).abs() < 1e-6);
    assert_eq!(location.location_type, LocationType::ShoppingCentre);
    assert_eq!(location.number_of_stores, Some(90));
}

#[test]
fn zero_zero_sentinel_means_not_geocoded() {
    let row = location_row(Some(Decimal::ZERO), Some(Decimal::ZERO));
    let location = row_to_location(row);
    assert!(location.coordinates.is_none());
}

#[test]
fn missing_ordinate_means_not_geocoded() {
    let row = location_row(Some(Decimal::new(52_573_600, 6)), None);
    assert!(row_to_location(row).coordinates.is_none());
}

#[test]
fn unknown_location_type_defaults_to_shopping_centre() {
    let mut row = location_row(None, None);
    row.location_type = "mystery".to_string();
    assert_eq!(
        row_to_location(row).location_type,
        LocationType::ShoppingCentre
    );
}

#[test]
fn negative_store_count_is_dropped() {
    let mut row = location_row(None, None);
    row.number_of_stores = Some(-3);
    assert_eq!(row_to_location(row).number_of_stores, None);
}

#[test]
fn tenant_row_category_label_is_folded() {
    let row = TenantRow {
        id: Uuid::new_v4(),
        location_id: Uuid::new_v4(),
        name: "Boots".to_string(),
        category: "Pharmacy".to_string(),
        is_anchor: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let tenant = row_to_tenant(row, &CategoryAliases::default());
    assert_eq!(tenant.category, Category::HealthAndBeauty);
    assert!(tenant.is_anchor);
}

#[test]
fn tenant_row_unknown_category_folds_to_other() {
    let row = TenantRow {
        id: Uuid::new_v4(),
        location_id: Uuid::new_v4(),
        name: "Mystery Shop".to_string(),
        category: "???".to_string(),
        is_anchor: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };
    let tenant = row_to_tenant(row, &CategoryAliases::default());
    assert_eq!(tenant.category, Category::Other);
}
