use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files — useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup — no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_unit_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{value} is outside [0, 1]"),
            });
        }
        Ok(value)
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let raw = or_default(var, default);
        let value = raw.parse::<f64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })?;
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("{value} is not a positive number"),
            });
        }
        Ok(value)
    };

    let database_url = require("DATABASE_URL")?;

    let env = parse_environment(&or_default("CENTRESCAN_ENV", "development"));

    let bind_addr = parse_addr("CENTRESCAN_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("CENTRESCAN_LOG_LEVEL", "info");
    let category_aliases_path = PathBuf::from(or_default(
        "CENTRESCAN_CATEGORY_ALIASES_PATH",
        "./config/categories.yaml",
    ));

    let db_max_connections = parse_u32("CENTRESCAN_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("CENTRESCAN_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("CENTRESCAN_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let resolver_fuzzy_threshold = parse_unit_f64("CENTRESCAN_RESOLVER_FUZZY_THRESHOLD", "0.6")?;
    let resolver_ambiguity_epsilon =
        parse_unit_f64("CENTRESCAN_RESOLVER_AMBIGUITY_EPSILON", "0.05")?;
    let nearby_result_limit = parse_usize("CENTRESCAN_NEARBY_RESULT_LIMIT", "20")?;
    let gap_margin_points = parse_positive_f64("CENTRESCAN_GAP_MARGIN_POINTS", "5.0")?;
    let dedupe_name_threshold = parse_unit_f64("CENTRESCAN_DEDUPE_NAME_THRESHOLD", "0.6")?;
    let dedupe_proximity_km = parse_positive_f64("CENTRESCAN_DEDUPE_PROXIMITY_KM", "0.2")?;

    let snapshot_refresh_cron = or_default("CENTRESCAN_SNAPSHOT_CRON", "0 */15 * * * *");
    let dedupe_scan_cron = or_default("CENTRESCAN_DEDUPE_CRON", "0 0 3 * * *");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        category_aliases_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        resolver_fuzzy_threshold,
        resolver_ambiguity_epsilon,
        nearby_result_limit,
        gap_margin_points,
        dedupe_name_threshold,
        dedupe_proximity_km,
        snapshot_refresh_cron,
        dedupe_scan_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
