use std::path::PathBuf;

use crate::error::ConfigError;
use crate::geo::BoundingBox;

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub log_level: String,
    pub google_api_key: Option<String>,
    pub ocm_api_key: Option<String>,
    pub region: BoundingBox,
    pub places_grid_step_deg: f64,
    pub places_search_radius_m: u32,
    pub places_keyword: String,
    pub catalog_tile_step_deg: f64,
    pub catalog_country_code: String,
    pub catalog_max_results: u32,
    pub match_radius_km: f64,
    pub match_max_results: u32,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub page_token_delay_ms: u64,
    pub places_min_interval_ms: u64,
    pub catalog_min_interval_ms: u64,
    pub places_base_url: String,
    pub catalog_base_url: String,
    pub table: String,
    pub snapshot_dir: PathBuf,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl AppConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `DATABASE_URL` is unset.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `GOOGLE_API_KEY` is unset.
    pub fn require_google_api_key(&self) -> Result<&str, ConfigError> {
        self.google_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("GOOGLE_API_KEY".to_string()))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingEnvVar`] when `OCM_API_KEY` is unset.
    pub fn require_ocm_api_key(&self) -> Result<&str, ConfigError> {
        self.ocm_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("OCM_API_KEY".to_string()))
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("log_level", &self.log_level)
            .field("database_url", &self.database_url.as_ref().map(|_| "[redacted]"))
            .field("google_api_key", &self.google_api_key.as_ref().map(|_| "[redacted]"))
            .field("ocm_api_key", &self.ocm_api_key.as_ref().map(|_| "[redacted]"))
            .field("region", &self.region)
            .field("places_grid_step_deg", &self.places_grid_step_deg)
            .field("places_search_radius_m", &self.places_search_radius_m)
            .field("places_keyword", &self.places_keyword)
            .field("catalog_tile_step_deg", &self.catalog_tile_step_deg)
            .field("catalog_country_code", &self.catalog_country_code)
            .field("catalog_max_results", &self.catalog_max_results)
            .field("match_radius_km", &self.match_radius_km)
            .field("match_max_results", &self.match_max_results)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("page_token_delay_ms", &self.page_token_delay_ms)
            .field("places_min_interval_ms", &self.places_min_interval_ms)
            .field("catalog_min_interval_ms", &self.catalog_min_interval_ms)
            .field("places_base_url", &self.places_base_url)
            .field("catalog_base_url", &self.catalog_base_url)
            .field("table", &self.table)
            .field("snapshot_dir", &self.snapshot_dir)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
