//! One ETL run: extract with the chosen strategy, snapshot the unique rows,
//! then sync them incrementally into the destination.
//!
//! Per-anchor failures are absorbed by the sweep session. Only configuration
//! and sink errors reach the caller, which reports them as a failed run.

use chrono::NaiveDate;
use evtrack_core::{
    dedup_last_wins, sync_to_sink, AppConfig, ArtifactWriter, ChargerRecord, ChargerRow,
    ChargerSink, ConfigError, SyncOutcome,
};
use evtrack_db::artifact_name;
use evtrack_scraper::{
    CatalogClient, FetchSettings, GridPoints, PlacesClient, Reconciler, RetryPolicy, SweepSession,
    SweepStats, Tiles,
};
use serde::Serialize;
use uuid::Uuid;

/// Extraction strategy selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Strategy {
    /// Verified places from the places provider, enriched from the catalog
    Places,
    /// Every catalog location in the region, tile by tile
    Catalog,
}

impl Strategy {
    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Places => "places",
            Self::Catalog => "catalog",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum RunStatus {
    Ok,
    NoData,
    NoNewData,
    DryRun,
    Failed,
}

/// JSON document printed at the end of every run.
#[derive(Debug, Serialize)]
pub(crate) struct RunSummary {
    pub run_id: Uuid,
    pub strategy: Strategy,
    pub status: RunStatus,
    pub message: String,
    pub stats: SweepStats,
    pub records_extracted: usize,
    pub records_unique: usize,
    pub records_appended: u64,
    pub artifact: Option<String>,
}

impl RunSummary {
    fn new(run_id: Uuid, strategy: Strategy) -> Self {
        Self {
            run_id,
            strategy,
            status: RunStatus::Ok,
            message: String::new(),
            stats: SweepStats::default(),
            records_extracted: 0,
            records_unique: 0,
            records_appended: 0,
            artifact: None,
        }
    }

    pub(crate) fn failed(run_id: Uuid, strategy: Strategy, err: &anyhow::Error) -> Self {
        Self {
            status: RunStatus::Failed,
            message: format!("{err:#}"),
            ..Self::new(run_id, strategy)
        }
    }
}

/// Fail fast on missing credentials, before any request or sink write.
/// `DATABASE_URL` is only needed when the run will sync.
///
/// # Errors
///
/// Returns [`ConfigError::MissingEnvVar`] naming the first missing variable.
pub(crate) fn check_credentials(
    strategy: Strategy,
    config: &AppConfig,
    dry_run: bool,
) -> Result<(), ConfigError> {
    match strategy {
        Strategy::Places => {
            config.require_google_api_key()?;
        }
        Strategy::Catalog => {
            config.require_ocm_api_key()?;
        }
    }
    if !dry_run {
        config.require_database_url()?;
    }
    Ok(())
}

fn fetch_settings(config: &AppConfig, min_interval_ms: u64) -> FetchSettings {
    FetchSettings {
        timeout_secs: config.request_timeout_secs,
        user_agent: config.user_agent.clone(),
        retry: RetryPolicy::new(config.max_retries, config.retry_backoff_base_ms),
        min_interval_ms,
        page_token_delay_ms: config.page_token_delay_ms,
    }
}

fn catalog_client(config: &AppConfig, api_key: &str) -> anyhow::Result<CatalogClient> {
    let client = CatalogClient::with_base_url(
        api_key,
        &fetch_settings(config, config.catalog_min_interval_ms),
        &config.catalog_base_url,
        &config.catalog_country_code,
        config.catalog_max_results,
    )?;
    Ok(client)
}

/// Run the sweep for `strategy` and classify every emitted record.
///
/// # Errors
///
/// Returns an error if a required API key is missing or a provider client
/// cannot be built. Request failures during the sweep are logged and skipped.
pub(crate) async fn extract(
    strategy: Strategy,
    config: &AppConfig,
) -> anyhow::Result<(Vec<ChargerRecord>, SweepStats)> {
    let mut session = SweepSession::new();

    let records = match strategy {
        Strategy::Places => {
            let places = PlacesClient::with_base_url(
                config.require_google_api_key()?,
                &fetch_settings(config, config.places_min_interval_ms),
                &config.places_base_url,
            )?;
            let catalog = match config.ocm_api_key.as_deref() {
                Some(key) => Some(catalog_client(config, key)?),
                None => {
                    tracing::warn!("OCM_API_KEY not set, connector data will be unavailable");
                    None
                }
            };
            let reconciler =
                Reconciler::new(catalog, config.match_radius_km, config.match_max_results);
            let grid = GridPoints::new(
                config.region,
                config.places_grid_step_deg,
                config.places_search_radius_m,
            );
            let (rows, cols) = grid.dimensions();
            tracing::info!(rows, cols, "starting verified-place sweep");
            session
                .extract_verified_places(&places, &reconciler, grid, &config.places_keyword)
                .await
        }
        Strategy::Catalog => {
            let catalog = catalog_client(config, config.require_ocm_api_key()?)?;
            let tiles = Tiles::new(config.region, config.catalog_tile_step_deg);
            let (rows, cols) = tiles.dimensions();
            tracing::info!(rows, cols, "starting catalog tile sweep");
            session.extract_catalog(&catalog, tiles).await
        }
    };

    Ok((records, session.into_stats()))
}

/// Extract, snapshot and sync. `sink: None` is a dry run; `artifacts: None`
/// skips the snapshot.
///
/// # Errors
///
/// Returns an error on missing credentials or when the destination fails.
/// Snapshot failures are logged and never fail the run.
pub(crate) async fn run_etl(
    config: &AppConfig,
    strategy: Strategy,
    run_id: Uuid,
    sink: Option<&dyn ChargerSink>,
    artifacts: Option<&dyn ArtifactWriter>,
    today: NaiveDate,
) -> anyhow::Result<RunSummary> {
    let mut summary = RunSummary::new(run_id, strategy);

    let (records, stats) = extract(strategy, config).await?;
    summary.stats = stats;
    summary.records_extracted = records.len();

    if records.is_empty() {
        summary.status = RunStatus::NoData;
        summary.message = "No data extracted".to_string();
        return Ok(summary);
    }

    let unique = dedup_last_wins(records);
    summary.records_unique = unique.len();

    if let Some(writer) = artifacts {
        let rows: Vec<ChargerRow> = unique.iter().map(ChargerRecord::to_row).collect();
        let name = artifact_name(strategy.as_str(), today);
        match writer.write_artifact(&name, &rows).await {
            Ok(location) => summary.artifact = Some(location),
            Err(err) => tracing::warn!(error = %err, "snapshot failed, continuing with sync"),
        }
    }

    let Some(sink) = sink else {
        summary.status = RunStatus::DryRun;
        summary.message = format!("Dry run: {} unique records not synced", unique.len());
        return Ok(summary);
    };

    match sync_to_sink(sink, unique).await? {
        SyncOutcome::NoNewData => {
            summary.status = RunStatus::NoNewData;
            summary.message = "No new data".to_string();
        }
        outcome @ (SyncOutcome::Created(_) | SyncOutcome::Appended(_)) => {
            summary.records_appended = outcome.rows_written();
            summary.message = format!(
                "Loaded {} new records into {}",
                summary.records_appended,
                sink.destination()
            );
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[path = "etl_test.rs"]
mod tests;
