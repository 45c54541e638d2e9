//! Cross-source reconciliation: enrich a verified place with connector data
//! from the nearest catalog location.

use evtrack_core::{Connector, MatchStatus};

use crate::sources::catalog::CatalogClient;

/// Outcome of one lookup. Misses are provenance, never errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub status: MatchStatus,
    pub connectors: Vec<Connector>,
}

impl Reconciliation {
    #[must_use]
    pub fn not_available() -> Self {
        Self::miss(MatchStatus::NotAvailable)
    }

    fn miss(status: MatchStatus) -> Self {
        Self {
            status,
            connectors: Vec::new(),
        }
    }
}

/// Point lookup against the catalog. Without a catalog client every lookup
/// reports [`MatchStatus::NotAvailable`].
pub struct Reconciler {
    catalog: Option<CatalogClient>,
    distance_km: f64,
    max_results: u32,
}

impl Reconciler {
    #[must_use]
    pub fn new(catalog: Option<CatalogClient>, distance_km: f64, max_results: u32) -> Self {
        Self {
            catalog,
            distance_km,
            max_results,
        }
    }

    /// Reconcile one coordinate. The first (nearest) catalog result is taken
    /// as the match.
    pub async fn reconcile(&self, lat: f64, lng: f64) -> Reconciliation {
        let Some(catalog) = &self.catalog else {
            return Reconciliation::not_available();
        };

        match catalog
            .nearby(lat, lng, self.distance_km, self.max_results)
            .await
        {
            Ok(pois) => {
                let Some(first) = pois.first() else {
                    return Reconciliation::miss(MatchStatus::NoMatch);
                };
                if first.connections.is_empty() {
                    return Reconciliation::miss(MatchStatus::NoConnections);
                }
                Reconciliation {
                    status: MatchStatus::Matched,
                    connectors: first.connectors(),
                }
            }
            Err(err) => {
                tracing::warn!(lat, lng, error = %err, "catalog lookup failed");
                Reconciliation::miss(MatchStatus::ApiError)
            }
        }
    }
}
