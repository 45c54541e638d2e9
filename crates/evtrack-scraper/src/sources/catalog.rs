//! POI catalog provider (Open Charge Map `v3/poi`).
//!
//! The catalog's nested objects are loosely typed in practice: any of them may
//! be `null`, missing, or carry unexpected shapes. Each nested field decodes
//! independently and falls back to its default, so one bad sub-object never
//! costs the whole row.

use evtrack_core::{ChargerDraft, Connector, MatchStatus, RecordSource};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::client::{FetchClient, FetchSettings};
use crate::error::FetchError;
use crate::normalize::{join_address, normalize_operator, normalize_usage, or_unknown};
use crate::sources::parse_base_url;
use crate::sweep::Tile;

pub const PROVIDER: &str = "catalog";

fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Every array element is kept; `null` and malformed entries decode to
/// `T::default()` so they still count.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Array(items) = value else {
        return Ok(Vec::new());
    };
    Ok(items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect())
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub contact_telephone1: Option<String>,
}

/// Any catalog reference object that only matters for its `Title`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Titled {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OcmConnection {
    #[serde(rename = "ConnectionTypeID", default, deserialize_with = "lenient")]
    pub connection_type_id: Option<i64>,
    #[serde(rename = "ConnectionType", default, deserialize_with = "lenient")]
    pub connection_type: Titled,
    #[serde(rename = "CurrentTypeID", default, deserialize_with = "lenient")]
    pub current_type_id: Option<i64>,
    #[serde(rename = "PowerKW", default, deserialize_with = "lenient")]
    pub power_kw: Option<f64>,
}

impl OcmConnection {
    /// Type label is the provider title when present, else the numeric type id.
    #[must_use]
    pub fn to_connector(&self) -> Connector {
        let title = self
            .connection_type
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned);
        Connector {
            connection_type: title.or_else(|| self.connection_type_id.map(|id| id.to_string())),
            current_type_id: self.current_type_id,
            power_kw: self.power_kw,
        }
    }
}

/// One catalog location.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OcmPoi {
    #[serde(rename = "ID", default, deserialize_with = "lenient")]
    pub id: Option<i64>,
    #[serde(rename = "AddressInfo", default, deserialize_with = "lenient")]
    pub address_info: AddressInfo,
    #[serde(rename = "OperatorInfo", default, deserialize_with = "lenient")]
    pub operator_info: Titled,
    #[serde(rename = "UsageType", default, deserialize_with = "lenient")]
    pub usage_type: Titled,
    #[serde(rename = "StatusType", default, deserialize_with = "lenient")]
    pub status_type: Titled,
    #[serde(rename = "Connections", default, deserialize_with = "lenient_list")]
    pub connections: Vec<OcmConnection>,
}

impl OcmPoi {
    #[must_use]
    pub fn connectors(&self) -> Vec<Connector> {
        self.connections.iter().map(OcmConnection::to_connector).collect()
    }

    /// Flatten into a catalog-sourced draft. `None` when the row has no ID or
    /// no usable coordinates.
    #[must_use]
    pub fn into_draft(self) -> Option<ChargerDraft> {
        let id = self.id?;
        let info = &self.address_info;
        let latitude = info.latitude.filter(|v| v.is_finite())?;
        let longitude = info.longitude.filter(|v| v.is_finite())?;

        Some(ChargerDraft {
            place_id: id.to_string(),
            name: or_unknown(info.title.as_deref()),
            address: join_address(&[
                info.address_line1.as_deref(),
                info.town.as_deref(),
                info.postcode.as_deref(),
            ]),
            latitude,
            longitude,
            business_status: or_unknown(self.status_type.title.as_deref()),
            operator: normalize_operator(self.operator_info.title.as_deref()),
            usage_type: normalize_usage(self.usage_type.title.as_deref()),
            phone: or_unknown(info.contact_telephone1.as_deref()),
            source: RecordSource::Catalog,
            match_status: MatchStatus::CatalogRecord,
            connectors: self.connectors(),
        })
    }
}

/// Decode a catalog response array element by element. Elements that are not
/// objects are skipped with a warning.
///
/// # Errors
///
/// Returns [`FetchError::Deserialize`] if the body is not a JSON array.
pub fn parse_pois(body: Value, context: &str) -> Result<Vec<OcmPoi>, FetchError> {
    let items: Vec<Value> =
        serde_json::from_value(body).map_err(|e| FetchError::Deserialize {
            context: context.to_owned(),
            source: e,
        })?;

    let mut pois = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<OcmPoi>(item) {
            Ok(poi) => pois.push(poi),
            Err(e) => tracing::warn!(index, context, error = %e, "skipping undecodable catalog row"),
        }
    }
    Ok(pois)
}

pub struct CatalogClient {
    fetch: FetchClient,
    api_key: String,
    base_url: Url,
    country_code: String,
    max_results: u32,
}

impl CatalogClient {
    /// Creates a client pointed at the production catalog API.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the HTTP client cannot be constructed.
    pub fn new(
        api_key: &str,
        settings: &FetchSettings,
        country_code: &str,
        max_results: u32,
    ) -> Result<Self, FetchError> {
        Self::with_base_url(
            api_key,
            settings,
            evtrack_core::config::DEFAULT_CATALOG_BASE_URL,
            country_code,
            max_results,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if `base_url` does not parse, or
    /// [`FetchError::Http`] if the HTTP client cannot be constructed.
    pub fn with_base_url(
        api_key: &str,
        settings: &FetchSettings,
        base_url: &str,
        country_code: &str,
        max_results: u32,
    ) -> Result<Self, FetchError> {
        Ok(Self {
            fetch: FetchClient::new(PROVIDER, settings)?,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
            country_code: country_code.to_owned(),
            max_results,
        })
    }

    /// Every catalog location inside one tile.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails after retries or the body
    /// is not an array.
    pub async fn fetch_tile(&self, tile: &Tile) -> Result<Vec<OcmPoi>, FetchError> {
        let b = &tile.bbox;
        let bbox_param = format!(
            "({},{}),({},{})",
            b.min_lat, b.min_lng, b.max_lat, b.max_lng
        );
        let url = self.build_url(&[
            ("boundingbox", bbox_param.as_str()),
            ("maxresults", &self.max_results.to_string()),
            ("compact", "false"),
            ("verbose", "true"),
        ]);
        let body = self.fetch.get_json(&url).await?;
        parse_pois(body, &format!("tile {bbox_param}"))
    }

    /// Catalog locations within `distance_km` of a coordinate, nearest first.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails after retries or the body
    /// is not an array.
    pub async fn nearby(
        &self,
        lat: f64,
        lng: f64,
        distance_km: f64,
        max_results: u32,
    ) -> Result<Vec<OcmPoi>, FetchError> {
        let url = self.build_url(&[
            ("latitude", &lat.to_string()),
            ("longitude", &lng.to_string()),
            ("distance", &distance_km.to_string()),
            ("distanceunit", "KM"),
            ("maxresults", &max_results.to_string()),
        ]);
        let body = self.fetch.get_json(&url).await?;
        parse_pois(body, &format!("nearby {lat},{lng}"))
    }

    fn build_url(&self, extra: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("output", "json");
            pairs.append_pair("countrycode", &self.country_code);
            for (k, v) in extra {
                pairs.append_pair(k, v);
            }
            pairs.append_pair("key", &self.api_key);
        }
        url
    }
}
