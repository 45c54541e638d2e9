//! Verified-place provider (Google Places nearby search + place details).

use evtrack_core::{ChargerDraft, RecordSource};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::client::{FetchClient, FetchSettings};
use crate::error::FetchError;
use crate::normalize::or_unknown;
use crate::reconcile::Reconciliation;
use crate::sources::parse_base_url;

pub const PROVIDER: &str = "places";

/// Fields requested from the details endpoint.
pub const DETAILS_FIELDS: &str =
    "name,formatted_address,geometry,types,business_status,formatted_phone_number";

const CHARGER_TYPES: &[&str] = &["electric_vehicle_charging_station", "charging_station"];

/// Lower-case name fragments that mark a charging location.
pub const CHARGER_KEYWORDS: &[&str] = &[
    "charge",
    "charging",
    "ev",
    "ev-charger",
    "ev charger",
    "pod point",
    "pod-point",
    "podpoint",
    "bp pulse",
    "bp-pulse",
    "tesla",
    "tesla supercharger",
    "supercharger",
    "instavolt",
    "chargepoint",
    "rapid charger",
    "rapid charge",
    "ac charger",
    "dc charger",
    "shell recharge",
    "shell-recharge",
    "ionity",
    "evgo",
    "engie",
    "mer",
    "octopus",
    "octopus energy",
];

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

/// One nearby-search candidate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NearbyResult {
    pub place_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl NearbyResult {
    #[must_use]
    pub fn location(&self) -> Option<LatLng> {
        self.geometry.as_ref().map(|g| g.location)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub business_status: Option<String>,
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
}

impl PlaceDetails {
    #[must_use]
    pub fn location(&self) -> Option<LatLng> {
        self.geometry.as_ref().map(|g| g.location)
    }

    /// Merge with a reconciliation outcome into a draft at the given coordinates.
    #[must_use]
    pub fn into_draft(
        self,
        place_id: &str,
        location: LatLng,
        reconciliation: Reconciliation,
    ) -> ChargerDraft {
        ChargerDraft {
            place_id: place_id.to_owned(),
            name: or_unknown(self.name.as_deref()),
            address: or_unknown(self.formatted_address.as_deref()),
            latitude: location.lat,
            longitude: location.lng,
            business_status: or_unknown(self.business_status.as_deref()),
            operator: or_unknown(None),
            usage_type: or_unknown(None),
            phone: or_unknown(self.formatted_phone_number.as_deref()),
            source: RecordSource::Places,
            match_status: reconciliation.status,
            connectors: reconciliation.connectors,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DetailsEnvelope {
    #[serde(default)]
    result: Option<PlaceDetails>,
}

/// Accept a candidate when its types, name or address mark it as a charger.
#[must_use]
pub fn is_charger_place(details: &PlaceDetails) -> bool {
    if details
        .types
        .iter()
        .any(|t| CHARGER_TYPES.contains(&t.to_lowercase().as_str()))
    {
        return true;
    }

    let name = details.name.as_deref().unwrap_or_default().to_lowercase();
    if CHARGER_KEYWORDS.iter().any(|kw| name.contains(kw)) {
        return true;
    }

    let address = details
        .formatted_address
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    address.contains("charging") || address.contains("ev")
}

/// In-band status handling for the places API, which answers 200 even when
/// throttled or refusing a request.
fn places_status(body: &Value, token_request: bool) -> Result<(), FetchError> {
    let status = body.get("status").and_then(Value::as_str);
    match status {
        None | Some("OK" | "ZERO_RESULTS") => Ok(()),
        Some("OVER_QUERY_LIMIT") => Err(FetchError::RateLimited {
            provider: PROVIDER.to_owned(),
            retry_after_secs: None,
        }),
        Some("INVALID_REQUEST") if token_request => Err(FetchError::PageTokenPending {
            provider: PROVIDER.to_owned(),
        }),
        Some(other) => Err(FetchError::Provider {
            provider: PROVIDER.to_owned(),
            status: other.to_owned(),
            message: body
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("no error message")
                .to_owned(),
        }),
    }
}

pub struct PlacesClient {
    fetch: FetchClient,
    api_key: String,
    base_url: Url,
}

impl PlacesClient {
    /// Creates a client pointed at the production places API.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the HTTP client cannot be constructed.
    pub fn new(api_key: &str, settings: &FetchSettings) -> Result<Self, FetchError> {
        Self::with_base_url(api_key, settings, evtrack_core::config::DEFAULT_PLACES_BASE_URL)
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
    ) -> Result<Self, FetchError> {
        let fetch = FetchClient::new(PROVIDER, settings)?.with_status_check(places_status);
        Ok(Self {
            fetch,
            api_key: api_key.to_owned(),
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Collect every candidate around a centre, following page tokens.
    ///
    /// Results without a `place_id` are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if any page fails after retries.
    pub async fn nearby_search(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        keyword: &str,
    ) -> Result<Vec<NearbyResult>, FetchError> {
        let mut url = self.endpoint("nearbysearch/json")?;
        url.query_pairs_mut()
            .append_pair("location", &format!("{lat},{lng}"))
            .append_pair("radius", &radius_m.to_string())
            .append_pair("keyword", keyword)
            .append_pair("key", &self.api_key);

        let pages = self
            .fetch
            .get_paginated(&url, "pagetoken", "next_page_token")
            .await?;

        let mut results = Vec::new();
        for page in pages {
            let Some(items) = page.get("results").and_then(Value::as_array) else {
                continue;
            };
            for item in items {
                match serde_json::from_value::<NearbyResult>(item.clone()) {
                    Ok(result) => results.push(result),
                    Err(e) => tracing::debug!(error = %e, "skipping nearby result without place_id"),
                }
            }
        }
        Ok(results)
    }

    /// Fetch details for one place. `Ok(None)` when the provider returns no result.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] if the request fails after retries or the
    /// result does not decode.
    pub async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>, FetchError> {
        let mut url = self.endpoint("details/json")?;
        url.query_pairs_mut()
            .append_pair("place_id", place_id)
            .append_pair("fields", DETAILS_FIELDS)
            .append_pair("key", &self.api_key);

        let body = self.fetch.get_json(&url).await?;
        let envelope: DetailsEnvelope =
            serde_json::from_value(body).map_err(|e| FetchError::Deserialize {
                context: format!("place details for {place_id}"),
                source: e,
            })?;
        Ok(envelope.result)
    }

    fn endpoint(&self, path: &str) -> Result<Url, FetchError> {
        self.base_url.join(path).map_err(|e| FetchError::InvalidUrl {
            url: format!("{}{path}", self.base_url),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(name: &str, types: &[&str], address: &str) -> PlaceDetails {
        PlaceDetails {
            name: Some(name.to_owned()),
            formatted_address: Some(address.to_owned()),
            types: types.iter().map(|t| (*t).to_owned()).collect(),
            ..PlaceDetails::default()
        }
    }

    #[test]
    fn accepts_named_charger_with_generic_type() {
        let d = details("Acme EV Charger", &["establishment"], "1 High St, Charging Yard");
        assert!(is_charger_place(&d));
    }

    #[test]
    fn rejects_hardware_store() {
        let d = details("Acme Hardware", &["hardware_store"], "1 High St");
        assert!(!is_charger_place(&d));
    }

    #[test]
    fn accepts_on_type_alone() {
        let d = details("Car Park Level 2", &["ELECTRIC_VEHICLE_CHARGING_STATION"], "");
        assert!(is_charger_place(&d));
        let d = details("Bay 4", &["charging_station"], "");
        assert!(is_charger_place(&d));
    }

    #[test]
    fn accepts_on_address_alone() {
        let d = details("Bay 4", &["parking"], "Charging Hub, Wharf Rd");
        assert!(is_charger_place(&d));
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let d = details("IONITY Park Royal", &["point_of_interest"], "Western Ave");
        assert!(is_charger_place(&d));
    }

    #[test]
    fn status_ok_and_zero_results_pass() {
        assert!(places_status(&serde_json::json!({"status": "OK"}), false).is_ok());
        assert!(places_status(&serde_json::json!({"status": "ZERO_RESULTS"}), true).is_ok());
        assert!(places_status(&serde_json::json!({"results": []}), false).is_ok());
    }

    #[test]
    fn over_query_limit_is_rate_limited() {
        let err = places_status(&serde_json::json!({"status": "OVER_QUERY_LIMIT"}), false)
            .unwrap_err();
        assert!(matches!(err, FetchError::RateLimited { retry_after_secs: None, .. }));
    }

    #[test]
    fn invalid_request_is_pending_only_for_token_requests() {
        let body = serde_json::json!({"status": "INVALID_REQUEST"});
        assert!(matches!(
            places_status(&body, true),
            Err(FetchError::PageTokenPending { .. })
        ));
        assert!(matches!(
            places_status(&body, false),
            Err(FetchError::Provider { .. })
        ));
    }

    #[test]
    fn request_denied_carries_message() {
        let body = serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        });
        match places_status(&body, false) {
            Err(FetchError::Provider { status, message, .. }) => {
                assert_eq!(status, "REQUEST_DENIED");
                assert_eq!(message, "The provided API key is invalid.");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }

    #[test]
    fn into_draft_fills_unknowns_and_keeps_provenance() {
        let d = details("Acme EV Charger", &["establishment"], "1 High St");
        let draft = d.into_draft(
            "ChIJ1",
            LatLng { lat: 51.5, lng: -0.1 },
            Reconciliation::not_available(),
        );
        assert_eq!(draft.place_id, "ChIJ1");
        assert_eq!(draft.business_status, "Unknown");
        assert_eq!(draft.phone, "Unknown");
        assert_eq!(draft.source, RecordSource::Places);
        assert_eq!(draft.match_status, evtrack_core::MatchStatus::NotAvailable);
        assert!(draft.connectors.is_empty());
    }
}
