//! Text cleanup applied when provider payloads become [`evtrack_core::ChargerDraft`]s.

pub(crate) const UNKNOWN: &str = "Unknown";

/// Trimmed text, or `"Unknown"` when missing or blank.
pub(crate) fn or_unknown(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

/// Catalog operator titles wrap placeholders in parentheses.
pub(crate) fn normalize_operator(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some("(Business Owner at Location)") => "Business Owner at Location".to_string(),
        Some("(Unknown Operator)") => UNKNOWN.to_string(),
        other => or_unknown(other),
    }
}

pub(crate) fn normalize_usage(title: Option<&str>) -> String {
    match title.map(str::trim) {
        Some("(Unknown)") => UNKNOWN.to_string(),
        other => or_unknown(other),
    }
}

/// Join the non-blank address parts with `", "`, or `"Unknown"` if none.
pub(crate) fn join_address(parts: &[Option<&str>]) -> String {
    let joined = parts
        .iter()
        .filter_map(|p| p.map(str::trim).filter(|s| !s.is_empty()))
        .collect::<Vec<_>>()
        .join(", ");
    or_unknown(Some(&joined))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_missing_become_unknown() {
        assert_eq!(or_unknown(None), "Unknown");
        assert_eq!(or_unknown(Some("   ")), "Unknown");
        assert_eq!(or_unknown(Some(" OPERATIONAL ")), "OPERATIONAL");
    }

    #[test]
    fn operator_placeholders_are_rewritten() {
        assert_eq!(
            normalize_operator(Some("(Business Owner at Location)")),
            "Business Owner at Location"
        );
        assert_eq!(normalize_operator(Some("(Unknown Operator)")), "Unknown");
        assert_eq!(normalize_operator(Some("Pod Point")), "Pod Point");
        assert_eq!(normalize_operator(None), "Unknown");
    }

    #[test]
    fn usage_placeholder_is_rewritten() {
        assert_eq!(normalize_usage(Some("(Unknown)")), "Unknown");
        assert_eq!(normalize_usage(Some("Public")), "Public");
        assert_eq!(normalize_usage(Some("")), "Unknown");
    }

    #[test]
    fn address_skips_blank_parts() {
        assert_eq!(
            join_address(&[Some("1 High St"), None, Some("SW1A 1AA")]),
            "1 High St, SW1A 1AA"
        );
        assert_eq!(
            join_address(&[Some(" "), Some("London"), Some("")]),
            "London"
        );
        assert_eq!(join_address(&[None, None, None]), "Unknown");
    }
}
