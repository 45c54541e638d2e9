use crate::app_config::AppConfig;
use crate::geo::BoundingBox;
use crate::ConfigError;

pub const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
pub const DEFAULT_CATALOG_BASE_URL: &str = "https://api.openchargemap.io/v3/poi/";

/// Smallest accepted grid or tile step, roughly 11 m of latitude.
pub const MIN_SWEEP_STEP_DEG: f64 = 1e-4;

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

/// Parse and validate configuration from an env-var lookup function.
///
/// Credentials are optional here; each command checks the ones it needs
/// through the `require_*` accessors on [`AppConfig`] before any request.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if a value is present but invalid.
pub fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let optional = |var: &str| -> Option<String> {
        lookup(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    };

    let or_default =
        |var: &str, default: &str| -> String { optional(var).unwrap_or_else(|| default.to_string()) };

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

    let parse_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = or_default(var, default)
            .parse::<f64>()
            .map_err(|e| invalid(var, e.to_string()))?;
        if value.is_finite() {
            Ok(value)
        } else {
            Err(invalid(var, "must be a finite number".to_string()))
        }
    };

    let parse_positive_f64 = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = parse_f64(var, default)?;
        if value > 0.0 {
            Ok(value)
        } else {
            Err(invalid(var, format!("must be greater than zero, got {value}")))
        }
    };

    let log_level = or_default("EVTRACK_LOG_LEVEL", "info");

    let database_url = optional("DATABASE_URL");
    let google_api_key = optional("GOOGLE_API_KEY");
    let ocm_api_key = optional("OCM_API_KEY");

    let region = BoundingBox {
        min_lat: parse_f64("EVTRACK_MIN_LAT", "51.48")?,
        max_lat: parse_f64("EVTRACK_MAX_LAT", "51.55")?,
        min_lng: parse_f64("EVTRACK_MIN_LNG", "-0.20")?,
        max_lng: parse_f64("EVTRACK_MAX_LNG", "-0.02")?,
    };
    region
        .validate()
        .map_err(|reason| invalid("EVTRACK_MIN_LAT/EVTRACK_MAX_LAT/EVTRACK_MIN_LNG/EVTRACK_MAX_LNG", reason))?;

    let parse_step = |var: &str, default: &str| -> Result<f64, ConfigError> {
        let value = parse_positive_f64(var, default)?;
        if value >= MIN_SWEEP_STEP_DEG {
            Ok(value)
        } else {
            Err(invalid(
                var,
                format!("must be at least {MIN_SWEEP_STEP_DEG} degrees, got {value}"),
            ))
        }
    };

    let places_grid_step_deg = parse_step("EVTRACK_PLACES_GRID_STEP_DEG", "0.03")?;
    let places_search_radius_m = parse_u32("EVTRACK_PLACES_SEARCH_RADIUS_M", "3000")?;
    let places_keyword = or_default("EVTRACK_PLACES_KEYWORD", "electric vehicle charging");

    let catalog_tile_step_deg = parse_step("EVTRACK_CATALOG_TILE_STEP_DEG", "0.01")?;
    let catalog_country_code = or_default("EVTRACK_CATALOG_COUNTRY_CODE", "GB");
    let catalog_max_results = parse_u32("EVTRACK_CATALOG_MAX_RESULTS", "1000")?;
    let match_radius_km = parse_positive_f64("EVTRACK_MATCH_RADIUS_KM", "0.1")?;
    let match_max_results = parse_u32("EVTRACK_MATCH_MAX_RESULTS", "5")?;

    let request_timeout_secs = parse_u64("EVTRACK_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("EVTRACK_USER_AGENT", "evtrack/0.1 (ev-charger-sync)");
    let max_retries = parse_u32("EVTRACK_MAX_RETRIES", "5")?;
    let retry_backoff_base_ms = parse_u64("EVTRACK_RETRY_BACKOFF_BASE_MS", "1000")?;
    let page_token_delay_ms = parse_u64("EVTRACK_PAGE_TOKEN_DELAY_MS", "2000")?;
    let places_min_interval_ms = parse_u64("EVTRACK_PLACES_MIN_INTERVAL_MS", "350")?;
    let catalog_min_interval_ms = parse_u64("EVTRACK_CATALOG_MIN_INTERVAL_MS", "500")?;

    let places_base_url = or_default("EVTRACK_PLACES_BASE_URL", DEFAULT_PLACES_BASE_URL);
    let catalog_base_url = or_default("EVTRACK_CATALOG_BASE_URL", DEFAULT_CATALOG_BASE_URL);

    let table = or_default("EVTRACK_TABLE", "ev_chargers");
    let snapshot_dir = PathBuf::from(or_default("EVTRACK_SNAPSHOT_DIR", "./ev_data"));

    let db_max_connections = parse_u32("EVTRACK_DB_MAX_CONNECTIONS", "5")?;
    let db_acquire_timeout_secs = parse_u64("EVTRACK_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        database_url,
        log_level,
        google_api_key,
        ocm_api_key,
        region,
        places_grid_step_deg,
        places_search_radius_m,
        places_keyword,
        catalog_tile_step_deg,
        catalog_country_code,
        catalog_max_results,
        match_radius_km,
        match_max_results,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
        page_token_delay_ms,
        places_min_interval_ms,
        catalog_min_interval_ms,
        places_base_url,
        catalog_base_url,
        table,
        snapshot_dir,
        db_max_connections,
        db_acquire_timeout_secs,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
