//! Live tests for `PgChargerSink`. They need a disposable Postgres reachable
//! through `DATABASE_URL` and are ignored by default:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/evtrack_test cargo test -p evtrack-db -- --ignored
//! ```

use evtrack_core::{
    sync_to_sink, ChargerDraft, ChargerRecord, ChargerSink, Connector, MatchStatus, RecordSource,
    SyncOutcome,
};
use evtrack_db::{connect_pool, PgChargerSink, PoolConfig};

fn record(place_id: &str, power: f64) -> ChargerRecord {
    ChargerDraft {
        place_id: place_id.to_string(),
        name: format!("Charger {place_id}"),
        address: "1 High St".to_string(),
        latitude: 51.5,
        longitude: -0.1,
        business_status: "OPERATIONAL".to_string(),
        operator: "Unknown".to_string(),
        usage_type: "Unknown".to_string(),
        phone: "Unknown".to_string(),
        source: RecordSource::Places,
        match_status: MatchStatus::Matched,
        connectors: vec![Connector {
            connection_type: Some("CCS".to_string()),
            current_type_id: Some(30),
            power_kw: Some(power),
        }],
    }
    .classify()
}

async fn fresh_sink(table: &str) -> PgChargerSink {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for live tests");
    let pool = connect_pool(&url, PoolConfig::default())
        .await
        .expect("connect");
    sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
        .execute(&pool)
        .await
        .expect("drop");
    PgChargerSink::new(pool, table).expect("valid table name")
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn first_sync_creates_then_appends_only_new_keys() {
    let sink = fresh_sink("evtrack_live_sync").await;

    assert!(sink.existing_keys().await.unwrap().is_none());

    let first = sync_to_sink(&sink, vec![record("a", 7.0), record("b", 50.0)])
        .await
        .unwrap();
    assert_eq!(first, SyncOutcome::Created(2));

    let again = sync_to_sink(&sink, vec![record("a", 7.0), record("b", 50.0)])
        .await
        .unwrap();
    assert_eq!(again, SyncOutcome::NoNewData);

    let more = sync_to_sink(&sink, vec![record("b", 50.0), record("c", 3.0)])
        .await
        .unwrap();
    assert_eq!(more, SyncOutcome::Appended(1));

    let keys = sink.existing_keys().await.unwrap().unwrap();
    assert_eq!(keys.len(), 3);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn foreign_table_shape_is_a_schema_mismatch() {
    let sink = fresh_sink("evtrack_live_mismatch").await;
    let url = std::env::var("DATABASE_URL").unwrap();
    let pool = connect_pool(&url, PoolConfig::default()).await.unwrap();
    sqlx::query("CREATE TABLE evtrack_live_mismatch (id BIGINT PRIMARY KEY)")
        .execute(&pool)
        .await
        .unwrap();

    let err = sink.existing_keys().await.unwrap_err();
    assert!(matches!(
        err,
        evtrack_core::SinkError::SchemaMismatch { .. }
    ));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn table_without_place_id_key_is_a_schema_mismatch() {
    let sink = fresh_sink("evtrack_live_nokey").await;
    let url = std::env::var("DATABASE_URL").unwrap();
    let pool = connect_pool(&url, PoolConfig::default()).await.unwrap();
    let columns: Vec<String> = evtrack_core::ChargerRow::COLUMNS
        .iter()
        .map(|c| format!("{c} TEXT"))
        .collect();
    sqlx::query(&format!(
        "CREATE TABLE evtrack_live_nokey ({})",
        columns.join(", ")
    ))
    .execute(&pool)
    .await
    .unwrap();

    let err = sink.existing_keys().await.unwrap_err();
    match err {
        evtrack_core::SinkError::SchemaMismatch { reason, .. } => {
            assert!(reason.contains("place_id"), "unexpected reason: {reason}");
        }
        other => panic!("expected schema mismatch, got {other:?}"),
    }
}
