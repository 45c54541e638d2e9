//! Provider adapters. Each decodes its own typed payloads and converts them
//! into [`evtrack_core::ChargerDraft`] at this boundary.

pub mod catalog;
pub mod places;

use reqwest::Url;

use crate::error::FetchError;

/// Parse a provider base URL, ensuring a trailing slash so relative endpoint
/// paths join under it rather than replacing its last segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<Url, FetchError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| FetchError::InvalidUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_single_trailing_slash() {
        let url = parse_base_url("https://maps.googleapis.com/maps/api/place").unwrap();
        assert_eq!(
            url.join("nearbysearch/json").unwrap().as_str(),
            "https://maps.googleapis.com/maps/api/place/nearbysearch/json"
        );
        let url = parse_base_url("https://api.openchargemap.io/v3/poi//").unwrap();
        assert_eq!(url.as_str(), "https://api.openchargemap.io/v3/poi/");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
