use thiserror::Error;

use crate::app_config::{AppConfig, MalformedItemPolicy};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if an env var holds an unparseable value.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the
/// process, without touching `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if an env var holds an unparseable value.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

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

    let bind_addr = parse_addr("ASEARCH_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("ASEARCH_LOG_LEVEL", "info");
    let cache_ttl_secs = parse_u64("ASEARCH_CACHE_TTL_SECS", "3600")?;
    let request_timeout_secs = parse_u64("ASEARCH_REQUEST_TIMEOUT_SECS", "30")?;
    let max_concurrent_pages = parse_usize("ASEARCH_MAX_CONCURRENT_PAGES", "49")?;
    let malformed_item_policy =
        parse_malformed_item_policy(&or_default("ASEARCH_MALFORMED_ITEM_POLICY", "abort"))?;
    let description_separator = or_default("ASEARCH_DESCRIPTION_SEPARATOR", ": ");

    Ok(AppConfig {
        bind_addr,
        log_level,
        cache_ttl_secs,
        request_timeout_secs,
        max_concurrent_pages,
        malformed_item_policy,
        description_separator,
    })
}

fn parse_malformed_item_policy(s: &str) -> Result<MalformedItemPolicy, ConfigError> {
    match s {
        "abort" => Ok(MalformedItemPolicy::Abort),
        "skip" => Ok(MalformedItemPolicy::Skip),
        other => Err(ConfigError::InvalidEnvVar {
            var: "ASEARCH_MALFORMED_ITEM_POLICY".to_string(),
            reason: format!("expected \"abort\" or \"skip\", got {other:?}"),
        }),
    }
}
