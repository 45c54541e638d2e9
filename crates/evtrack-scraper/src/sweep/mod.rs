//! Spatial sweep anchors over a bounding box.
//!
//! Both iterators walk row-major: latitude rows outside, longitude columns
//! inside. Every position is derived from its integer index, so repeated
//! addition can never drift past the box edge.

mod grid;
mod tiles;

pub use grid::{GridPoint, GridPoints};
pub use tiles::{Tile, Tiles};

/// Relative slack absorbing decimal-to-binary representation error, so that
/// `51.48 + 7 * 0.01` still counts as reaching `51.55`.
const STEP_TOLERANCE: f64 = 1e-9;

fn usable_step(step: f64) -> bool {
    step.is_finite() && step > 0.0
}

/// Number of points `min + i * step` with `min + i * step <= max`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn point_count(min: f64, max: f64, step: f64) -> usize {
    if !usable_step(step) || max < min {
        return 0;
    }
    ((max - min) / step + STEP_TOLERANCE).floor() as usize + 1
}

/// Number of `step`-wide cells needed to cover `[min, max]`. A zero-width
/// span still gets one degenerate cell.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn cell_count(min: f64, max: f64, step: f64) -> usize {
    if !usable_step(step) || max < min {
        return 0;
    }
    let cells = ((max - min) / step - STEP_TOLERANCE).ceil();
    if cells < 1.0 {
        1
    } else {
        cells as usize
    }
}

/// `(rows, cols)` unchanged when the product fits in `usize`, otherwise an
/// empty sweep.
fn fit_dimensions(rows: usize, cols: usize) -> (usize, usize) {
    if rows.checked_mul(cols).is_some() {
        (rows, cols)
    } else {
        tracing::warn!(rows, cols, "sweep too large to enumerate, step is too small");
        (0, 0)
    }
}

#[allow(clippy::cast_precision_loss)]
fn offset(min: f64, index: usize, step: f64) -> f64 {
    min + index as f64 * step
}
