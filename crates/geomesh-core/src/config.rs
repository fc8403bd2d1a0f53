use crate::app_config::{AppConfig, AssistantSettings, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default; the only failures are unparsable values.
/// The API key is optional because offline mode and the lookup endpoints
/// work without it.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_positive_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let value = or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value == 0 {
            return Err(invalid(var, "must be at least 1".to_string()));
        }
        Ok(value)
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(invalid(var, format!("must be a positive number, got {value}")))
        }
    };

    let env = parse_environment(&or_default("GEOMESH_ENV", "development"))?;
    let bind_addr = parse_addr("GEOMESH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("GEOMESH_LOG_LEVEL", "info");
    let dataset_path = PathBuf::from(or_default(
        "GEOMESH_DATASET_PATH",
        "./school_geolocation.csv",
    ));
    let signal_radius_km = parse_positive_f64("GEOMESH_SIGNAL_RADIUS_KM", "10")?;
    let ask_rate_limit_per_minute =
        parse_positive_usize("GEOMESH_ASK_RATE_LIMIT_PER_MINUTE", "30")?;

    let api_key = lookup("OPENROUTER_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let assistant = AssistantSettings {
        api_key,
        base_url: or_default("GEOMESH_AI_BASE_URL", "https://openrouter.ai/api/v1"),
        model: or_default("GEOMESH_AI_MODEL", "openai/gpt-3.5-turbo"),
        timeout_secs: parse_u64("GEOMESH_AI_TIMEOUT_SECS", "30")?,
        max_retries: parse_u32("GEOMESH_AI_MAX_RETRIES", "2")?,
        retry_backoff_base_ms: parse_u64("GEOMESH_AI_RETRY_BACKOFF_MS", "500")?,
    };

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        dataset_path,
        signal_radius_km,
        ask_rate_limit_per_minute,
        assistant,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "GEOMESH_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
