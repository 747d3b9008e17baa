use std::path::PathBuf;
use std::str::FromStr;

use crate::app_config::{AppConfig, DEFAULT_USER_AGENT};
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
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the process environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let api_base_url = require("AISLE_API_BASE_URL")?;
    let log_level = or_default("AISLE_LOG_LEVEL", "info");
    let data_root = PathBuf::from(or_default("AISLE_DATA_ROOT", "./data"));
    let currency = or_default("AISLE_CURRENCY", "USD");
    let test_variant = or_default("AISLE_TEST_VARIANT", "A");
    let user_agent = or_default("AISLE_USER_AGENT", DEFAULT_USER_AGENT);

    let config = AppConfig {
        api_base_url,
        log_level,
        data_root,
        currency,
        test_variant,
        page_size: parse_var(&or_default, "AISLE_PAGE_SIZE", "60")?,
        max_page_items: parse_var(&or_default, "AISLE_MAX_PAGE_ITEMS", "1000")?,
        pacing_min_ms: parse_var(&or_default, "AISLE_PACING_MIN_MS", "7200")?,
        pacing_max_ms: parse_var(&or_default, "AISLE_PACING_MAX_MS", "12000")?,
        backoff_step_us: parse_var(&or_default, "AISLE_BACKOFF_STEP_US", "1500")?,
        max_retry_attempts: parse_var(&or_default, "AISLE_MAX_RETRY_ATTEMPTS", "15")?,
        max_retry_elapsed_secs: parse_var(&or_default, "AISLE_MAX_RETRY_ELAPSED_SECS", "14400")?,
        max_drift_restarts: parse_var(&or_default, "AISLE_MAX_DRIFT_RESTARTS", "10")?,
        perturb_radius: parse_var(&or_default, "AISLE_PERTURB_RADIUS", "2")?,
        perturb_probability: parse_var(&or_default, "AISLE_PERTURB_PROBABILITY", "0.3")?,
        request_timeout_secs: parse_var(&or_default, "AISLE_REQUEST_TIMEOUT_SECS", "30")?,
        user_agent,
    };

    validate_app_config(&config)?;
    Ok(config)
}

fn parse_var<T>(
    or_default: &impl Fn(&str, &str) -> String,
    var: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = or_default(var, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
}

fn validate_app_config(config: &AppConfig) -> Result<(), ConfigError> {
    let base = config.api_base_url.as_str();
    if !(base.starts_with("https://") || base.starts_with("http://")) {
        return Err(ConfigError::InvalidEnvVar {
            var: "AISLE_API_BASE_URL".to_string(),
            reason: format!("'{base}' must start with http:// or https://"),
        });
    }
    if base.contains('?') {
        return Err(ConfigError::InvalidEnvVar {
            var: "AISLE_API_BASE_URL".to_string(),
            reason: "must not carry a query string".to_string(),
        });
    }
    if config.page_size == 0 {
        return Err(ConfigError::Validation(
            "AISLE_PAGE_SIZE must be greater than zero".to_string(),
        ));
    }
    if config.max_page_items == 0 {
        return Err(ConfigError::Validation(
            "AISLE_MAX_PAGE_ITEMS must be greater than zero".to_string(),
        ));
    }
    if config.pacing_min_ms > config.pacing_max_ms {
        return Err(ConfigError::Validation(format!(
            "AISLE_PACING_MIN_MS ({}) exceeds AISLE_PACING_MAX_MS ({})",
            config.pacing_min_ms, config.pacing_max_ms
        )));
    }
    if config.max_retry_attempts == 0 {
        return Err(ConfigError::Validation(
            "AISLE_MAX_RETRY_ATTEMPTS must be at least 1".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&config.perturb_probability) {
        return Err(ConfigError::Validation(format!(
            "AISLE_PERTURB_PROBABILITY must be within [0, 1], got {}",
            config.perturb_probability
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
