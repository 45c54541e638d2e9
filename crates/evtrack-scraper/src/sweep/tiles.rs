//! Sub-box anchors for bounding-box bulk queries.

use evtrack_core::BoundingBox;

use super::{cell_count, fit_dimensions, offset};

/// One tile of the sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    pub row: usize,
    pub col: usize,
    pub bbox: BoundingBox,
}

/// Lazy, restartable iterator of tiles covering the region exactly.
///
/// Tile `i` on an axis spans `[min + i * step, min(min + (i + 1) * step, max)]`.
/// Shared edges are computed from the same index, so neighbours agree
/// bit-for-bit, and the last tile on each axis ends exactly at `max`.
#[derive(Debug, Clone)]
pub struct Tiles {
    bbox: BoundingBox,
    step: f64,
    rows: usize,
    cols: usize,
    next: usize,
}

impl Tiles {
    #[must_use]
    pub fn new(bbox: BoundingBox, step_deg: f64) -> Self {
        let (rows, cols) = fit_dimensions(
            cell_count(bbox.min_lat, bbox.max_lat, step_deg),
            cell_count(bbox.min_lng, bbox.max_lng, step_deg),
        );
        Self {
            bbox,
            step: step_deg,
            rows,
            cols,
            next: 0,
        }
    }

    /// `(rows, cols)` of the full sweep.
    #[must_use]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn total(&self) -> usize {
        self.rows * self.cols
    }

    fn lat_edge(&self, index: usize) -> f64 {
        if index >= self.rows {
            self.bbox.max_lat
        } else {
            offset(self.bbox.min_lat, index, self.step).min(self.bbox.max_lat)
        }
    }

    fn lng_edge(&self, index: usize) -> f64 {
        if index >= self.cols {
            self.bbox.max_lng
        } else {
            offset(self.bbox.min_lng, index, self.step).min(self.bbox.max_lng)
        }
    }
}

impl Iterator for Tiles {
    type Item = Tile;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total() {
            return None;
        }
        let row = self.next / self.cols;
        let col = self.next % self.cols;
        self.next += 1;

        Some(Tile {
            row,
            col,
            bbox: BoundingBox {
                min_lat: self.lat_edge(row),
                max_lat: self.lat_edge(row + 1),
                min_lng: self.lng_edge(col),
                max_lng: self.lng_edge(col + 1),
            },
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Tiles {}
