mod etl;

use clap::{Parser, Subcommand};
use evtrack_core::{AppConfig, ArtifactWriter, ChargerSink};
use evtrack_db::{CsvSnapshotWriter, PgChargerSink, PoolConfig};
use tracing::Instrument;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::etl::{RunSummary, Strategy};

#[derive(Debug, Parser)]
#[command(name = "evtrack")]
#[command(about = "EV charger extraction and incremental sync")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract chargers for the configured region and sync new ones
    Run {
        #[arg(value_enum)]
        strategy: Strategy,

        /// Extract and report without touching the database
        #[arg(long)]
        dry_run: bool,

        /// Skip the dated CSV snapshot
        #[arg(long)]
        no_snapshot: bool,
    },
    /// Database utilities
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check that the database is reachable
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = evtrack_core::load_app_config_from_env()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            strategy,
            dry_run,
            no_snapshot,
        } => run_command(&config, strategy, dry_run, no_snapshot).await,
        Commands::Db {
            command: DbCommands::Ping,
        } => db_ping(&config).await,
    }
}

/// Print the run summary as JSON on stdout, including for failed runs, and
/// propagate the failure so the process exits non-zero.
async fn run_command(
    config: &AppConfig,
    strategy: Strategy,
    dry_run: bool,
    no_snapshot: bool,
) -> anyhow::Result<()> {
    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("run", %run_id, strategy = strategy.as_str());

    let result = execute(config, strategy, run_id, dry_run, no_snapshot)
        .instrument(span)
        .await;

    match result {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
        Err(err) => {
            tracing::error!(run_id = %run_id, error = %format!("{err:#}"), "run failed");
            let summary = RunSummary::failed(run_id, strategy, &err);
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Err(err)
        }
    }
}

async fn execute(
    config: &AppConfig,
    strategy: Strategy,
    run_id: Uuid,
    dry_run: bool,
    no_snapshot: bool,
) -> anyhow::Result<RunSummary> {
    etl::check_credentials(strategy, config, dry_run)?;

    let sink = if dry_run {
        None
    } else {
        let pool = evtrack_db::connect_pool(
            config.require_database_url()?,
            PoolConfig::from_app_config(config),
        )
        .await?;
        Some(PgChargerSink::new(pool, &config.table)?)
    };
    let writer = (!no_snapshot).then(|| CsvSnapshotWriter::new(&config.snapshot_dir));

    etl::run_etl(
        config,
        strategy,
        run_id,
        sink.as_ref().map(|s| s as &dyn ChargerSink),
        writer.as_ref().map(|w| w as &dyn ArtifactWriter),
        chrono::Utc::now().date_naive(),
    )
    .await
}

async fn db_ping(config: &AppConfig) -> anyhow::Result<()> {
    let pool = evtrack_db::connect_pool(
        config.require_database_url()?,
        PoolConfig::from_app_config(config),
    )
    .await?;
    evtrack_db::ping(&pool).await?;
    println!("database reachable");
    Ok(())
}

#[cfg(test)]
mod tests;
