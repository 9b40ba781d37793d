use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub category_aliases_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Minimum similarity score for the resolver's fuzzy tier.
    pub resolver_fuzzy_threshold: f64,
    /// Score spread within which top resolver candidates count as tied.
    pub resolver_ambiguity_epsilon: f64,
    /// Default cap on proximity results.
    pub nearby_result_limit: usize,
    /// Percentage-point shortfall that marks a category under-represented.
    pub gap_margin_points: f64,
    /// Name-similarity gate for the postcode duplicate rule.
    pub dedupe_name_threshold: f64,
    /// Geocode agreement distance for the proximity duplicate rule, in km.
    pub dedupe_proximity_km: f64,
    pub snapshot_refresh_cron: String,
    pub dedupe_scan_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("category_aliases_path", &self.category_aliases_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("resolver_fuzzy_threshold", &self.resolver_fuzzy_threshold)
            .field(
                "resolver_ambiguity_epsilon",
                &self.resolver_ambiguity_epsilon,
            )
            .field("nearby_result_limit", &self.nearby_result_limit)
            .field("gap_margin_points", &self.gap_margin_points)
            .field("dedupe_name_threshold", &self.dedupe_name_threshold)
            .field("dedupe_proximity_km", &self.dedupe_proximity_km)
            .field("snapshot_refresh_cron", &self.snapshot_refresh_cron)
            .field("dedupe_scan_cron", &self.dedupe_scan_cron)
            .finish()
    }
}
