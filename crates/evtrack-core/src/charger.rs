//! Charger records: the merged draft produced by the source adapters, the
//! classified record, and the flat row shared by every sink.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::classify::{summarize, ChargingSummary, ChargingTier};

/// Label used in `connector_types` when a connector carries no type.
const UNKNOWN_CONNECTOR_TYPE: &str = "Unknown Type";
/// Label used in `connector_powers` when a connector has no usable reading.
const UNKNOWN_CONNECTOR_POWER: &str = "Power Unknown";

/// One physical connector at a charging site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connector {
    pub connection_type: Option<String>,
    pub current_type_id: Option<i64>,
    pub power_kw: Option<f64>,
}

impl Connector {
    /// Power reading usable for classification. Non-finite and negative
    /// readings are treated as unknown.
    #[must_use]
    pub fn known_power_kw(&self) -> Option<f64> {
        self.power_kw.filter(|p| p.is_finite() && *p >= 0.0)
    }

    fn type_label(&self) -> &str {
        self.connection_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_CONNECTOR_TYPE)
    }

    fn power_label(&self) -> String {
        self.known_power_kw().map_or_else(
            || UNKNOWN_CONNECTOR_POWER.to_string(),
            |kw| format!("{kw:.1} kW"),
        )
    }
}

fn join_labels<I>(labels: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    labels
        .into_iter()
        .map(|label| label.as_ref().to_owned())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Which extraction strategy produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Places,
    Catalog,
}

impl RecordSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Places => "places",
            Self::Catalog => "catalog",
        }
    }
}

impl fmt::Display for RecordSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of cross-source reconciliation, kept on the record as provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// The catalog returned a location with at least one connector.
    Matched,
    /// No catalog key was configured, so no lookup was attempted.
    NotAvailable,
    /// The catalog returned nothing near the coordinates.
    NoMatch,
    /// The nearest catalog location lists no connectors.
    NoConnections,
    /// The catalog lookup failed after retries.
    ApiError,
    /// The record came from the catalog itself.
    CatalogRecord,
}

impl MatchStatus {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Matched => "Matched",
            Self::NotAvailable => "Not Available",
            Self::NoMatch => "No Match Found",
            Self::NoConnections => "No Connections Listed",
            Self::ApiError => "API Error",
            Self::CatalogRecord => "Catalog Record",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Merged, not yet classified record.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargerDraft {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub business_status: String,
    pub operator: String,
    pub usage_type: String,
    pub phone: String,
    pub source: RecordSource,
    pub match_status: MatchStatus,
    pub connectors: Vec<Connector>,
}

impl ChargerDraft {
    /// Derive the charging summary and freeze the record.
    #[must_use]
    pub fn classify(self) -> ChargerRecord {
        let summary = summarize(&self.connectors);
        ChargerRecord {
            draft: self,
            summary,
        }
    }
}

/// Classified charger. Derived fields can only come from [`ChargerDraft::classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChargerRecord {
    draft: ChargerDraft,
    summary: ChargingSummary,
}

impl ChargerRecord {
    #[must_use]
    pub fn place_id(&self) -> &str {
        &self.draft.place_id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.draft.name
    }

    #[must_use]
    pub fn coordinates(&self) -> (f64, f64) {
        (self.draft.latitude, self.draft.longitude)
    }

    #[must_use]
    pub fn source(&self) -> RecordSource {
        self.draft.source
    }

    #[must_use]
    pub fn match_status(&self) -> MatchStatus {
        self.draft.match_status
    }

    #[must_use]
    pub fn connectors(&self) -> &[Connector] {
        &self.draft.connectors
    }

    #[must_use]
    pub fn summary(&self) -> &ChargingSummary {
        &self.summary
    }

    #[must_use]
    pub fn tier_max(&self) -> ChargingTier {
        self.summary.tier_max()
    }

    /// Flat projection with the stable sink column names.
    #[must_use]
    pub fn to_row(&self) -> ChargerRow {
        let d = &self.draft;
        let s = &self.summary;
        ChargerRow {
            place_id: d.place_id.clone(),
            name: d.name.clone(),
            address: d.address.clone(),
            latitude: d.latitude,
            longitude: d.longitude,
            business_status: d.business_status.clone(),
            operator: d.operator.clone(),
            usage: d.usage_type.clone(),
            phone: d.phone.clone(),
            connector_count: i32::try_from(s.connector_count()).unwrap_or(i32::MAX),
            connector_types: join_labels(d.connectors.iter().map(Connector::type_label)),
            connector_powers: join_labels(d.connectors.iter().map(Connector::power_label)),
            current_types: join_labels(
                d.connectors
                    .iter()
                    .filter_map(|c| c.current_type_id)
                    .map(|id| id.to_string()),
            ),
            min_power_kw: s.min_power_kw(),
            max_power_kw: s.max_power_kw(),
            charging_tier_max: s.tier_max().as_str().to_string(),
            rapid_available: s.rapid_available(),
            fast_available: s.fast_available(),
            slow_available: s.slow_available(),
            source: d.source.as_str().to_string(),
            match_status: d.match_status.label().to_string(),
        }
    }
}

/// Flat, serialisable projection of a [`ChargerRecord`]. Field order is the
/// column order of every sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargerRow {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub business_status: String,
    pub operator: String,
    pub usage: String,
    pub phone: String,
    pub connector_count: i32,
    pub connector_types: String,
    /// Per-connector power in connector order, e.g. `7.0 kW; Power Unknown`.
    pub connector_powers: String,
    /// Provider current-type ids of the connectors that report one.
    pub current_types: String,
    pub min_power_kw: Option<f64>,
    pub max_power_kw: Option<f64>,
    pub charging_tier_max: String,
    pub rapid_available: bool,
    pub fast_available: bool,
    pub slow_available: bool,
    pub source: String,
    pub match_status: String,
}

impl ChargerRow {
    pub const COLUMNS: [&'static str; 21] = [
        "place_id",
        "name",
        "address",
        "latitude",
        "longitude",
        "business_status",
        "operator",
        "usage",
        "phone",
        "connector_count",
        "connector_types",
        "connector_powers",
        "current_types",
        "min_power_kw",
        "max_power_kw",
        "charging_tier_max",
        "rapid_available",
        "fast_available",
        "slow_available",
        "source",
        "match_status",
    ];
}
