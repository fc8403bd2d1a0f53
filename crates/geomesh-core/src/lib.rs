pub mod app_config;
pub mod config;
pub mod geo_point;

pub use app_config::{AppConfig, AssistantSettings, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use geo_point::{validate_latitude, validate_longitude, GeoPoint, QueryLocation};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("invalid {field}: {value} (must be finite and within [-{limit}, {limit}])")]
    InvalidCoordinate {
        field: &'static str,
        value: f64,
        limit: f64,
    },
}
