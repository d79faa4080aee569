use crate::app_config::{AppConfig, Environment};
use crate::types::MatchMode;
use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://igreval.maharashtra.gov.in/eASR2.0/eASRCommon.aspx";
pub const DEFAULT_TRANSLATE_PRIMARY_URL: &str = "https://translate.googleapis.com/translate_a/single";
pub const DEFAULT_TRANSLATE_SECONDARY_URL: &str = "https://api.mymemory.translated.net/get";

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
/// Every variable has a default, so the lookup only fails the build when a
/// value is present and unparseable.
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

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        parse_flag(&or_default(var, default)).ok_or_else(|| {
            invalid(var, "expected one of true/false/1/0/yes/no".to_string())
        })
    };

    // An explicitly empty URL disables that backend.
    let optional_url = |var: &str, default: &str| -> Option<String> {
        let raw = or_default(var, default);
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    let env = parse_environment(&or_default("IGR_ENV", "development"))?;

    let bind_addr = or_default("IGR_BIND_ADDR", "0.0.0.0:3000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("IGR_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("IGR_LOG_LEVEL", "info");

    let base_url = or_default("IGR_BASE_URL", DEFAULT_BASE_URL);
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        return Err(invalid(
            "IGR_BASE_URL",
            "must start with http:// or https://".to_string(),
        ));
    }

    let headless = parse_bool("IGR_HEADLESS", "true")?;
    let browser_pool_size = parse_usize("IGR_BROWSER_POOL_SIZE", "2")?;
    if browser_pool_size == 0 {
        return Err(invalid(
            "IGR_BROWSER_POOL_SIZE",
            "must be at least 1".to_string(),
        ));
    }
    let chrome_path = lookup("IGR_CHROME_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let navigation_timeout_ms = parse_u64("IGR_NAVIGATION_TIMEOUT_MS", "30000")?;
    let element_timeout_ms = parse_u64("IGR_ELEMENT_TIMEOUT_MS", "30000")?;
    let poll_interval_ms = parse_u64("IGR_POLL_INTERVAL_MS", "200")?;
    let postback_settle_ms = parse_u64("IGR_POSTBACK_SETTLE_MS", "2000")?;
    let page_change_retries = parse_u32("IGR_PAGE_CHANGE_RETRIES", "60")?;
    let detail_poll_attempts = parse_u32("IGR_DETAIL_POLL_ATTEMPTS", "60")?;
    let max_pages = parse_usize("IGR_MAX_PAGES", "50")?;

    let match_mode_raw = or_default("IGR_MATCH_MODE", "identifiers");
    let match_mode = match_mode_raw
        .parse::<MatchMode>()
        .map_err(|reason| invalid("IGR_MATCH_MODE", reason))?;

    let translate_admin = parse_bool("IGR_TRANSLATE_ADMIN", "true")?;
    let translate_primary_url =
        optional_url("IGR_TRANSLATE_PRIMARY_URL", DEFAULT_TRANSLATE_PRIMARY_URL);
    let translate_secondary_url =
        optional_url("IGR_TRANSLATE_SECONDARY_URL", DEFAULT_TRANSLATE_SECONDARY_URL);
    let translate_timeout_secs = parse_u64("IGR_TRANSLATE_TIMEOUT_SECS", "10")?;
    let translate_max_retries = parse_u32("IGR_TRANSLATE_MAX_RETRIES", "1")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        base_url,
        headless,
        browser_pool_size,
        chrome_path,
        navigation_timeout_ms,
        element_timeout_ms,
        poll_interval_ms,
        postback_settle_ms,
        page_change_retries,
        detail_poll_attempts,
        max_pages,
        match_mode,
        translate_admin,
        translate_primary_url,
        translate_secondary_url,
        translate_timeout_secs,
        translate_max_retries,
    })
}

/// Parse a string into an `Environment` variant.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` for unrecognized values.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "IGR_ENV".to_string(),
            reason: format!("unknown environment \"{other}\""),
        }),
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
