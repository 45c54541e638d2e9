//! Capabilities the sync planner needs from a destination. Concrete adapters
//! live in `evtrack-db`.

use std::collections::HashSet;

use async_trait::async_trait;

use crate::charger::ChargerRow;
use crate::error::SinkError;

/// Persistent destination keyed by `place_id`.
#[async_trait]
pub trait ChargerSink: Send + Sync {
    /// Human-readable destination name used in logs and errors.
    fn destination(&self) -> &str;

    /// Every key already stored, read with one bulk query.
    /// `None` means the destination does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if the destination cannot be queried.
    async fn existing_keys(&self) -> Result<Option<HashSet<String>>, SinkError>;

    /// Append rows, creating the destination first when `create` is set.
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError`] if creation or the insert fails.
    async fn append_rows(&self, rows: &[ChargerRow], create: bool) -> Result<u64, SinkError>;
}

/// Snapshot artifact writer. Failures are reported but never fatal to a run.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    /// Write `rows` under `name`, returning the location written.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Artifact`] if the artifact cannot be written.
    async fn write_artifact(&self, name: &str, rows: &[ChargerRow]) -> Result<String, SinkError>;
}
