//! Point anchors for radius-based nearby searches.

use evtrack_core::BoundingBox;

use super::{fit_dimensions, offset, point_count};

/// One search centre in the sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridPoint {
    pub row: usize,
    pub col: usize,
    pub lat: f64,
    pub lng: f64,
    pub radius_m: u32,
}

/// Lazy, restartable iterator over grid centres `min + i * step` on each axis.
///
/// The last row/column sits at or inside the box edge; no point is ever
/// generated beyond `max`.
#[derive(Debug, Clone)]
pub struct GridPoints {
    bbox: BoundingBox,
    step: f64,
    radius_m: u32,
    rows: usize,
    cols: usize,
    next: usize,
}

impl GridPoints {
    #[must_use]
    pub fn new(bbox: BoundingBox, step_deg: f64, radius_m: u32) -> Self {
        let (rows, cols) = fit_dimensions(
            point_count(bbox.min_lat, bbox.max_lat, step_deg),
            point_count(bbox.min_lng, bbox.max_lng, step_deg),
        );
        Self {
            bbox,
            step: step_deg,
            radius_m,
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
}

impl Iterator for GridPoints {
    type Item = GridPoint;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total() {
            return None;
        }
        let row = self.next / self.cols;
        let col = self.next % self.cols;
        self.next += 1;

        Some(GridPoint {
            row,
            col,
            lat: offset(self.bbox.min_lat, row, self.step).min(self.bbox.max_lat),
            lng: offset(self.bbox.min_lng, col, self.step).min(self.bbox.max_lng),
            radius_m: self.radius_m,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total().saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for GridPoints {}
