//! Dated CSV snapshot of every row produced by a run.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use evtrack_core::{ArtifactWriter, ChargerRow, SinkError};

/// `ev_chargers_<strategy>_<YYYY-MM-DD>.csv`
#[must_use]
pub fn artifact_name(strategy: &str, date: NaiveDate) -> String {
    format!("ev_chargers_{strategy}_{}.csv", date.format("%Y-%m-%d"))
}

/// Writes snapshots into a directory, creating it on first use. An existing
/// file with the same name is overwritten.
#[derive(Debug, Clone)]
pub struct CsvSnapshotWriter {
    dir: PathBuf,
}

impl CsvSnapshotWriter {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ArtifactWriter for CsvSnapshotWriter {
    async fn write_artifact(&self, name: &str, rows: &[ChargerRow]) -> Result<String, SinkError> {
        let path = self.dir.join(name);
        let rows = rows.to_vec();
        let dir = self.dir.clone();
        let target = path.clone();

        tokio::task::spawn_blocking(move || write_csv(&dir, &target, &rows))
            .await
            .map_err(|e| artifact_error(&path, &e))??;

        let written = path.display().to_string();
        tracing::info!(path = %written, "snapshot written");
        Ok(written)
    }
}

fn write_csv(dir: &Path, path: &Path, rows: &[ChargerRow]) -> Result<(), SinkError> {
    fs::create_dir_all(dir).map_err(|e| artifact_error(path, &e))?;

    // Header is written explicitly so an empty run still yields a usable file.
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| artifact_error(path, &e))?;
    writer
        .write_record(ChargerRow::COLUMNS)
        .map_err(|e| artifact_error(path, &e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| artifact_error(path, &e))?;
    }
    writer.flush().map_err(|e| artifact_error(path, &e))?;
    Ok(())
}

fn artifact_error(path: &Path, err: &dyn std::fmt::Display) -> SinkError {
    SinkError::Artifact {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
