pub mod app_config;
pub mod categories;
mod config;
pub mod locations;

pub use app_config::{AppConfig, Environment};
pub use categories::{load_category_aliases, parse_category_aliases, Category, CategoryAliases};
pub use config::{load_app_config, load_app_config_from_env};
pub use locations::{Coordinates, Location, LocationType, Tenant};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read category aliases file {path}: {source}")]
    AliasFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse category aliases file: {0}")]
    AliasFileParse(#[from] serde_yaml::Error),
    #[error("validation error: {0}")]
    Validation(String),
}
