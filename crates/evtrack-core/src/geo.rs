//! Geographic bounding box for a sweep region.

use serde::{Deserialize, Serialize};

/// Inclusive lat/lng rectangle in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Central London, the default sweep region.
    #[must_use]
    pub const fn central_london() -> Self {
        Self {
            min_lat: 51.48,
            max_lat: 51.55,
            min_lng: -0.20,
            max_lng: -0.02,
        }
    }

    /// Check that the box is well formed.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when a coordinate is non-finite, out of
    /// range, or a minimum exceeds its maximum.
    pub fn validate(&self) -> Result<(), String> {
        let all = [self.min_lat, self.max_lat, self.min_lng, self.max_lng];
        if all.iter().any(|v| !v.is_finite()) {
            return Err("coordinates must be finite".to_string());
        }
        if !(-90.0..=90.0).contains(&self.min_lat) || !(-90.0..=90.0).contains(&self.max_lat) {
            return Err("latitude must be within [-90, 90]".to_string());
        }
        if !(-180.0..=180.0).contains(&self.min_lng) || !(-180.0..=180.0).contains(&self.max_lng)
        {
            return Err("longitude must be within [-180, 180]".to_string());
        }
        if self.min_lat > self.max_lat {
            return Err(format!(
                "min_lat {} exceeds max_lat {}",
                self.min_lat, self.max_lat
            ));
        }
        if self.min_lng > self.max_lng {
            return Err(format!(
                "min_lng {} exceeds max_lng {}",
                self.min_lng, self.max_lng
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn central_london_is_valid() {
        assert!(BoundingBox::central_london().validate().is_ok());
    }

    #[test]
    fn inverted_latitude_is_rejected() {
        let bbox = BoundingBox {
            min_lat: 51.6,
            ..BoundingBox::central_london()
        };
        let err = bbox.validate().unwrap_err();
        assert!(err.contains("min_lat"), "unexpected reason: {err}");
    }

    #[test]
    fn out_of_range_longitude_is_rejected() {
        let bbox = BoundingBox {
            max_lng: 181.0,
            ..BoundingBox::central_london()
        };
        assert!(bbox.validate().is_err());
    }

    #[test]
    fn nan_is_rejected() {
        let bbox = BoundingBox {
            min_lat: f64::NAN,
            ..BoundingBox::central_london()
        };
        assert!(bbox.validate().is_err());
    }
}
