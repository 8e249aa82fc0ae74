use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::app_config::{AppConfig, Environment};
use crate::normalize::{VipPolicy, DEFAULT_DELIMITER, ESCAPE};
use crate::ConfigError;

static TABLE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_]{0,62}\.)?[A-Za-z_][A-Za-z0-9_]{0,62}$")
        .expect("valid table name regex")
});

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

/// Returns `true` when `name` is a plain or schema-qualified SQL identifier
/// (`contacts`, `public.contacts`) that can be interpolated into a statement.
#[must_use]
pub fn is_valid_table_name(name: &str) -> bool {
    TABLE_NAME_RE.is_match(name)
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the process environment so tests
/// can drive them with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
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

    let database_url = require("DATABASE_URL")?;
    let tenant_id = require("SERVICETITAN_TENANT_ID")?;
    let client_id = require("SERVICETITAN_CLIENT_ID")?;
    let client_secret = require("SERVICETITAN_CLIENT_SECRET")?;
    let app_key = require("SERVICETITAN_APP_KEY")?;

    let env = parse_environment(&or_default("STSYNC_ENV", "development"))?;
    let log_level = or_default("STSYNC_LOG_LEVEL", "info");

    let api_base_url = or_default("SERVICETITAN_API_BASE_URL", "https://api.servicetitan.io");
    let auth_url = or_default(
        "SERVICETITAN_AUTH_URL",
        "https://auth.servicetitan.io/connect/token",
    );
    let api_page_size = parse_u32("STSYNC_API_PAGE_SIZE", "100")?;
    if api_page_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "STSYNC_API_PAGE_SIZE".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let api_max_pages = parse_u32("STSYNC_API_MAX_PAGES", "10")?;
    let api_request_timeout_secs = parse_u64("STSYNC_API_REQUEST_TIMEOUT_SECS", "30")?;
    let api_max_retries = parse_u32("STSYNC_API_MAX_RETRIES", "2")?;
    let api_retry_backoff_base_ms = parse_u64("STSYNC_API_RETRY_BACKOFF_BASE_MS", "500")?;

    let table_name = or_default("STSYNC_TABLE_NAME", "test_contacts");
    if !is_valid_table_name(&table_name) {
        return Err(ConfigError::InvalidEnvVar {
            var: "STSYNC_TABLE_NAME".to_string(),
            reason: format!("\"{table_name}\" is not a valid SQL identifier"),
        });
    }

    let field_delimiter = or_default("STSYNC_FIELD_DELIMITER", DEFAULT_DELIMITER);
    if field_delimiter.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "STSYNC_FIELD_DELIMITER".to_string(),
            reason: "delimiter must not be empty".to_string(),
        });
    }
    if field_delimiter.contains(ESCAPE) {
        return Err(ConfigError::InvalidEnvVar {
            var: "STSYNC_FIELD_DELIMITER".to_string(),
            reason: format!("delimiter must not contain the escape character {ESCAPE:?}"),
        });
    }

    let vip_policy = parse_vip_policy(&or_default("STSYNC_VIP_MEMBERSHIP_TYPE_IDS", "*"))?;

    let db_max_connections = parse_u32("STSYNC_DB_MAX_CONNECTIONS", "5")?;
    let db_min_connections = parse_u32("STSYNC_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STSYNC_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    let sink_max_attempts = parse_u32("STSYNC_SINK_MAX_ATTEMPTS", "3")?.max(1);
    let sink_retry_delay_ms = parse_u64("STSYNC_SINK_RETRY_DELAY_MS", "1000")?;

    let max_runtime_secs = parse_u64("STSYNC_MAX_RUNTIME_SECS", "7200")?;
    let schedule_cron = or_default("STSYNC_SCHEDULE_CRON", "0 0 6 * * *");

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        tenant_id,
        client_id,
        client_secret,
        app_key,
        api_base_url,
        auth_url,
        api_page_size,
        api_max_pages,
        api_request_timeout_secs,
        api_max_retries,
        api_retry_backoff_base_ms,
        table_name,
        field_delimiter,
        vip_policy,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        sink_max_attempts,
        sink_retry_delay_ms,
        max_runtime_secs,
        schedule_cron,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidEnvVar`] for anything other than
/// `development`, `test` or `production`.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STSYNC_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

/// Parse the VIP membership setting.
///
/// `*` means any membership marks the customer as VIP; otherwise the value is
/// a comma-separated list of membership type ids.
fn parse_vip_policy(raw: &str) -> Result<VipPolicy, ConfigError> {
    let raw = raw.trim();
    if raw == "*" {
        return Ok(VipPolicy::AnyMembership);
    }

    let ids = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
                var: "STSYNC_VIP_MEMBERSHIP_TYPE_IDS".to_string(),
                reason: format!("\"{s}\": {e}"),
            })
        })
        .collect::<Result<BTreeSet<i64>, _>>()?;

    if ids.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "STSYNC_VIP_MEMBERSHIP_TYPE_IDS".to_string(),
            reason: "expected \"*\" or a comma-separated list of ids".to_string(),
        });
    }

    Ok(VipPolicy::TypeIds(ids))
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
