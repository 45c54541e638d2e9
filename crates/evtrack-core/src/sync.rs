//! Deduplication and incremental-append planning.
//!
//! A run never rewrites rows: records whose `place_id` is already stored are
//! dropped, the rest are appended, and an absent destination is created from
//! the full deduplicated batch.

use std::collections::{HashMap, HashSet};

use crate::charger::{ChargerRecord, ChargerRow};
use crate::error::SinkError;
use crate::sink::ChargerSink;

/// What a sync should do with a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncPlan {
    /// The destination does not exist; create it and write these records.
    Create(Vec<ChargerRecord>),
    /// Append only these records to the existing destination.
    Append(Vec<ChargerRecord>),
    /// Nothing new to write. Terminal success.
    NoNewData,
}

/// Result of [`sync_to_sink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Created(u64),
    Appended(u64),
    NoNewData,
}

impl SyncOutcome {
    #[must_use]
    pub fn rows_written(self) -> u64 {
        match self {
            Self::Created(n) | Self::Appended(n) => n,
            Self::NoNewData => 0,
        }
    }
}

/// Collapse duplicate `place_id`s keeping the last occurrence, which stays at
/// its last-seen position in the batch.
#[must_use]
pub fn dedup_last_wins(batch: Vec<ChargerRecord>) -> Vec<ChargerRecord> {
    let mut last_index: HashMap<String, usize> = HashMap::with_capacity(batch.len());
    for (idx, record) in batch.iter().enumerate() {
        last_index.insert(record.place_id().to_string(), idx);
    }

    batch
        .into_iter()
        .enumerate()
        .filter(|(idx, record)| last_index.get(record.place_id()) == Some(idx))
        .map(|(_, record)| record)
        .collect()
}

/// Plan a sync of `batch` against the destination's current key set.
///
/// `existing` is `None` when the destination does not exist.
#[must_use]
pub fn plan_sync(batch: Vec<ChargerRecord>, existing: Option<&HashSet<String>>) -> SyncPlan {
    let unique = dedup_last_wins(batch);

    match existing {
        Some(keys) => {
            let fresh: Vec<ChargerRecord> = unique
                .into_iter()
                .filter(|record| !keys.contains(record.place_id()))
                .collect();
            if fresh.is_empty() {
                SyncPlan::NoNewData
            } else {
                SyncPlan::Append(fresh)
            }
        }
        None if unique.is_empty() => SyncPlan::NoNewData,
        None => SyncPlan::Create(unique),
    }
}

/// Read the destination's keys once, plan, and write the remainder.
///
/// # Errors
///
/// Returns [`SinkError`] if the key read or the append fails.
pub async fn sync_to_sink<S>(sink: &S, batch: Vec<ChargerRecord>) -> Result<SyncOutcome, SinkError>
where
    S: ChargerSink + ?Sized,
{
    let existing = sink.existing_keys().await?;
    let destination = sink.destination();

    match plan_sync(batch, existing.as_ref()) {
        SyncPlan::NoNewData => {
            tracing::info!(destination, "no new data to append");
            Ok(SyncOutcome::NoNewData)
        }
        SyncPlan::Create(records) => {
            let rows: Vec<ChargerRow> = records.iter().map(ChargerRecord::to_row).collect();
            let written = sink.append_rows(&rows, true).await?;
            tracing::info!(destination, rows = written, "created destination");
            Ok(SyncOutcome::Created(written))
        }
        SyncPlan::Append(records) => {
            let rows: Vec<ChargerRow> = records.iter().map(ChargerRecord::to_row).collect();
            let written = sink.append_rows(&rows, false).await?;
            tracing::info!(destination, rows = written, "appended new records");
            Ok(SyncOutcome::Appended(written))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::charger::{ChargerDraft, MatchStatus, RecordSource};

    fn record(place_id: &str, name: &str) -> ChargerRecord {
        ChargerDraft {
            place_id: place_id.to_string(),
            name: name.to_string(),
            address: "Unknown".to_string(),
            latitude: 51.5,
            longitude: -0.1,
            business_status: "Unknown".to_string(),
            operator: "Unknown".to_string(),
            usage_type: "Unknown".to_string(),
            phone: "Unknown".to_string(),
            source: RecordSource::Catalog,
            match_status: MatchStatus::CatalogRecord,
            connectors: Vec::new(),
        }
        .classify()
    }

    fn ids(records: &[ChargerRecord]) -> Vec<&str> {
        records.iter().map(ChargerRecord::place_id).collect()
    }

    #[derive(Default)]
    struct MemorySink {
        rows: Mutex<Option<Vec<ChargerRow>>>,
    }

    #[async_trait]
    impl ChargerSink for MemorySink {
        fn destination(&self) -> &str {
            "memory"
        }

        async fn existing_keys(&self) -> Result<Option<HashSet<String>>, SinkError> {
            let guard = self.rows.lock().unwrap();
            Ok(guard
                .as_ref()
                .map(|rows| rows.iter().map(|r| r.place_id.clone()).collect()))
        }

        async fn append_rows(&self, rows: &[ChargerRow], create: bool) -> Result<u64, SinkError> {
            let mut guard = self.rows.lock().unwrap();
            if create {
                assert!(guard.is_none(), "create requested for an existing table");
                *guard = Some(Vec::new());
            }
            let Some(stored) = guard.as_mut() else {
                return Err(SinkError::Unavailable {
                    destination: "memory".to_string(),
                    reason: "table does not exist".to_string(),
                });
            };
            stored.extend_from_slice(rows);
            Ok(rows.len() as u64)
        }
    }

    #[test]
    fn dedup_keeps_last_occurrence_at_its_position() {
        let batch = vec![
            record("a", "first a"),
            record("b", "b"),
            record("a", "second a"),
            record("c", "c"),
        ];
        let unique = dedup_last_wins(batch);
        assert_eq!(ids(&unique), vec!["b", "a", "c"]);
        assert_eq!(unique[1].name(), "second a");
    }

    #[test]
    fn absent_destination_plans_create_with_all_unique_records() {
        let batch = vec![record("a", "a"), record("a", "a2"), record("b", "b")];
        match plan_sync(batch, None) {
            SyncPlan::Create(records) => assert_eq!(ids(&records), vec!["a", "b"]),
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn existing_keys_are_filtered_out() {
        let existing: HashSet<String> = ["a".to_string()].into_iter().collect();
        let batch = vec![record("a", "a"), record("b", "b")];
        match plan_sync(batch, Some(&existing)) {
            SyncPlan::Append(records) => assert_eq!(ids(&records), vec!["b"]),
            other => panic!("expected Append, got {other:?}"),
        }
    }

    #[test]
    fn fully_known_batch_is_no_new_data() {
        let existing: HashSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        let batch = vec![record("a", "a"), record("b", "b")];
        assert_eq!(plan_sync(batch, Some(&existing)), SyncPlan::NoNewData);
    }

    #[test]
    fn empty_batch_is_no_new_data_even_without_destination() {
        assert_eq!(plan_sync(Vec::new(), None), SyncPlan::NoNewData);
    }

    #[tokio::test]
    async fn second_sync_with_same_batch_appends_nothing() {
        let sink = MemorySink::default();
        let batch = vec![record("a", "a"), record("b", "b"), record("a", "a again")];

        let first = sync_to_sink(&sink, batch.clone()).await.unwrap();
        assert_eq!(first, SyncOutcome::Created(2));

        let second = sync_to_sink(&sink, batch).await.unwrap();
        assert_eq!(second, SyncOutcome::NoNewData);
        assert_eq!(second.rows_written(), 0);

        let stored = sink.rows.lock().unwrap().clone().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].name, "a again");
    }

    #[tokio::test]
    async fn later_run_appends_only_new_keys() {
        let sink = MemorySink::default();
        sync_to_sink(&sink, vec![record("a", "a")]).await.unwrap();

        let outcome = sync_to_sink(&sink, vec![record("a", "a"), record("c", "c")])
            .await
            .unwrap();
        assert_eq!(outcome, SyncOutcome::Appended(1));

        let stored = sink.rows.lock().unwrap().clone().unwrap();
        let keys: Vec<&str> = stored.iter().map(|r| r.place_id.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }
}
