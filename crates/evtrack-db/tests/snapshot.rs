//! CSV snapshot writer tests against a temporary directory.

use evtrack_core::{
    ArtifactWriter, ChargerDraft, ChargerRow, Connector, MatchStatus, RecordSource, SinkError,
};
use evtrack_db::CsvSnapshotWriter;

fn row(place_id: &str, name: &str, powers: &[f64]) -> ChargerRow {
    ChargerDraft {
        place_id: place_id.to_string(),
        name: name.to_string(),
        address: "1 High St, London".to_string(),
        latitude: 51.5,
        longitude: -0.1,
        business_status: "Operational".to_string(),
        operator: "Unknown".to_string(),
        usage_type: "Public".to_string(),
        phone: "Unknown".to_string(),
        source: RecordSource::Catalog,
        match_status: MatchStatus::CatalogRecord,
        connectors: powers
            .iter()
            .map(|p| Connector {
                connection_type: Some("Type 2".to_string()),
                current_type_id: None,
                power_kw: Some(*p),
            })
            .collect(),
    }
    .classify()
    .to_row()
}

#[tokio::test]
async fn writes_header_and_rows() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = CsvSnapshotWriter::new(dir.path().join("ev_data"));

    let rows = vec![row("1", "Depot, North", &[7.0, 50.0]), row("2", "Kerbside", &[])];
    let written = writer
        .write_artifact("ev_chargers_catalog_2024-03-07.csv", &rows)
        .await
        .expect("snapshot should be written");

    let content = std::fs::read_to_string(&written).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next().unwrap(), ChargerRow::COLUMNS.join(","));

    let mut reader = csv::Reader::from_path(&written).unwrap();
    let parsed: Vec<ChargerRow> = reader.deserialize().map(Result::unwrap).collect();
    assert_eq!(parsed, rows);
    assert_eq!(parsed[0].name, "Depot, North");
    assert_eq!(parsed[0].charging_tier_max, "Rapid");
    assert_eq!(parsed[0].connector_powers, "7.0 kW; 50.0 kW");
    assert_eq!(parsed[1].connector_powers, "");
    assert_eq!(parsed[1].min_power_kw, None);
}

#[tokio::test]
async fn empty_run_still_writes_header() {
    let dir = tempfile::tempdir().expect("tempdir");
    let writer = CsvSnapshotWriter::new(dir.path());

    let written = writer.write_artifact("empty.csv", &[]).await.unwrap();
    let content = std::fs::read_to_string(written).unwrap();
    assert_eq!(content.trim_end(), ChargerRow::COLUMNS.join(","));
}

#[tokio::test]
async fn unwritable_location_is_an_artifact_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let blocker = dir.path().join("not_a_dir");
    std::fs::write(&blocker, b"file").unwrap();

    let writer = CsvSnapshotWriter::new(&blocker);
    let err = writer.write_artifact("x.csv", &[]).await.unwrap_err();
    assert!(matches!(err, SinkError::Artifact { .. }));
}
