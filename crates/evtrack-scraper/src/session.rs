//! One extraction run over the sweep anchors.
//!
//! Anchors are processed sequentially. A failing anchor or identifier is
//! logged, counted and skipped; it never aborts the run.

use std::collections::HashSet;

use evtrack_core::{ChargerDraft, ChargerRecord};
use serde::Serialize;

use crate::reconcile::Reconciler;
use crate::sources::catalog::CatalogClient;
use crate::sources::places::{is_charger_place, PlacesClient};
use crate::sweep::{GridPoints, Tiles};

/// Counters reported in the run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepStats {
    pub anchors_total: usize,
    pub anchors_failed: usize,
    /// Candidates returned by the primary source, duplicates included.
    pub candidates_seen: usize,
    /// Candidates skipped because their identifier was already requested.
    pub duplicates_skipped: usize,
    pub details_failed: usize,
    pub candidates_rejected: usize,
    /// Rows dropped for lacking an identifier or coordinates.
    pub rows_dropped: usize,
    pub records_emitted: usize,
}

/// Owns the seen-identifier set and counters for one run.
#[derive(Debug, Default)]
pub struct SweepSession {
    seen: HashSet<String>,
    stats: SweepStats,
}

impl SweepSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn stats(&self) -> &SweepStats {
        &self.stats
    }

    #[must_use]
    pub fn into_stats(self) -> SweepStats {
        self.stats
    }

    /// Record `place_id` as requested. Returns `false` if it was already seen.
    fn mark_seen(&mut self, place_id: &str) -> bool {
        if self.seen.contains(place_id) {
            return false;
        }
        self.seen.insert(place_id.to_owned());
        true
    }

    /// Verified-place strategy: nearby search per grid point, details per new
    /// candidate, charger verification, then catalog reconciliation.
    ///
    /// Unmatched places are kept; their match status records why.
    pub async fn extract_verified_places(
        &mut self,
        places: &PlacesClient,
        reconciler: &Reconciler,
        grid: GridPoints,
        keyword: &str,
    ) -> Vec<ChargerRecord> {
        let mut records = Vec::new();

        for point in grid {
            self.stats.anchors_total += 1;
            let candidates = match places
                .nearby_search(point.lat, point.lng, point.radius_m, keyword)
                .await
            {
                Ok(candidates) => candidates,
                Err(err) => {
                    self.stats.anchors_failed += 1;
                    tracing::warn!(
                        row = point.row,
                        col = point.col,
                        lat = point.lat,
                        lng = point.lng,
                        error = %err,
                        "nearby search failed, skipping anchor"
                    );
                    continue;
                }
            };
            tracing::info!(
                row = point.row,
                col = point.col,
                candidates = candidates.len(),
                "nearby search complete"
            );

            for candidate in candidates {
                self.stats.candidates_seen += 1;
                if !self.mark_seen(&candidate.place_id) {
                    self.stats.duplicates_skipped += 1;
                    continue;
                }

                let details = match places.place_details(&candidate.place_id).await {
                    Ok(Some(details)) => details,
                    Ok(None) => {
                        self.stats.details_failed += 1;
                        tracing::warn!(place_id = %candidate.place_id, "place details returned no result");
                        continue;
                    }
                    Err(err) => {
                        self.stats.details_failed += 1;
                        tracing::warn!(
                            place_id = %candidate.place_id,
                            error = %err,
                            "place details failed, skipping candidate"
                        );
                        continue;
                    }
                };

                if !is_charger_place(&details) {
                    self.stats.candidates_rejected += 1;
                    tracing::debug!(
                        place_id = %candidate.place_id,
                        name = details.name.as_deref().unwrap_or_default(),
                        "not a charging location"
                    );
                    continue;
                }

                let Some(location) = details.location().or_else(|| candidate.location()) else {
                    self.stats.rows_dropped += 1;
                    tracing::warn!(place_id = %candidate.place_id, "verified place has no coordinates");
                    continue;
                };

                let reconciliation = reconciler.reconcile(location.lat, location.lng).await;
                tracing::debug!(
                    place_id = %candidate.place_id,
                    match_status = %reconciliation.status,
                    "reconciled"
                );
                let draft = details.into_draft(&candidate.place_id, location, reconciliation);
                records.push(self.emit(draft));
            }
        }

        records
    }

    /// Catalog strategy: one bounding-box query per tile.
    ///
    /// Locations on a shared tile edge can appear twice; batch deduplication
    /// happens at sync time.
    pub async fn extract_catalog(
        &mut self,
        catalog: &CatalogClient,
        tiles: Tiles,
    ) -> Vec<ChargerRecord> {
        let mut records = Vec::new();

        for tile in tiles {
            self.stats.anchors_total += 1;
            let pois = match catalog.fetch_tile(&tile).await {
                Ok(pois) => pois,
                Err(err) => {
                    self.stats.anchors_failed += 1;
                    tracing::warn!(
                        row = tile.row,
                        col = tile.col,
                        error = %err,
                        "tile query failed, skipping anchor"
                    );
                    continue;
                }
            };
            tracing::info!(row = tile.row, col = tile.col, pois = pois.len(), "tile fetched");

            for poi in pois {
                self.stats.candidates_seen += 1;
                let id = poi.id;
                match poi.into_draft() {
                    Some(draft) => records.push(self.emit(draft)),
                    None => {
                        self.stats.rows_dropped += 1;
                        tracing::warn!(id = ?id, "catalog row has no ID or coordinates, dropping");
                    }
                }
            }
        }

        records
    }

    fn emit(&mut self, draft: ChargerDraft) -> ChargerRecord {
        self.stats.records_emitted += 1;
        draft.classify()
    }
}
