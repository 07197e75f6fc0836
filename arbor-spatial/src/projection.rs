//! Local planar projection.
//!
//! Deduplication radii are a handful of meters, so instead of geodesic
//! math every distance test runs in a planar frame: an equirectangular
//! projection centered near the data region. Within a metropolitan-scale
//! extent the distortion is far below the ~1 m identifier grid, which is
//! the only precision the pipeline relies on.

use std::f64::consts::PI;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Planar frame centered at a fixed geographic point.
///
/// `x` grows eastward and `y` northward, both in meters from the center.
#[derive(Debug, Clone, Copy)]
pub struct LocalProjection {
    center_lng: f64,
    center_lat: f64,
    cos_lat: f64,
}

impl LocalProjection {
    /// Create a projection centered at the given coordinate.
    pub fn new(center_lng: f64, center_lat: f64) -> Self {
        Self {
            center_lng,
            center_lat,
            // Clamp so polar centers cannot blow up the inverse scale.
            cos_lat: center_lat.to_radians().cos().max(1e-6),
        }
    }

    /// Center the frame on the mean coordinate of a batch.
    ///
    /// Returns `None` for an empty batch.
    pub fn fit(coords: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut n = 0usize;
        let (mut sum_lng, mut sum_lat) = (0.0, 0.0);
        for (lng, lat) in coords {
            sum_lng += lng;
            sum_lat += lat;
            n += 1;
        }
        (n > 0).then(|| Self::new(sum_lng / n as f64, sum_lat / n as f64))
    }

    /// The frame's geographic center as (lng, lat).
    pub fn center(&self) -> (f64, f64) {
        (self.center_lng, self.center_lat)
    }

    /// Project a geographic coordinate into the planar frame (meters).
    pub fn to_planar(&self, lng: f64, lat: f64) -> (f64, f64) {
        let x = (lng - self.center_lng).to_radians() * self.cos_lat * EARTH_RADIUS_M;
        let y = (lat - self.center_lat).to_radians() * EARTH_RADIUS_M;
        (x, y)
    }

    /// Degree offsets spanning `radius_m` meters at the frame's center,
    /// as (dlng, dlat). Used to expand geographic bounding boxes for
    /// radius queries.
    pub fn degree_offsets(&self, radius_m: f64) -> (f64, f64) {
        let dlat = radius_m / EARTH_RADIUS_M * 180.0 / PI;
        let dlng = dlat / self.cos_lat;
        (dlng, dlat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_distance_scale() {
        let proj = LocalProjection::new(34.75, 32.05);
        // One arc-second of latitude is ~30.9 m everywhere.
        let (_, y0) = proj.to_planar(34.75, 32.05);
        let (_, y1) = proj.to_planar(34.75, 32.05 + 1.0 / 3600.0);
        let dy = y1 - y0;
        assert!((dy - 30.9).abs() < 0.2, "dy = {}", dy);
    }

    #[test]
    fn test_degree_offsets_roundtrip() {
        let proj = LocalProjection::new(34.75, 32.05);
        let (dlng, dlat) = proj.degree_offsets(100.0);
        let (x, _) = proj.to_planar(34.75 + dlng, 32.05);
        let (_, y) = proj.to_planar(34.75, 32.05 + dlat);
        assert!((x - 100.0).abs() < 0.01);
        assert!((y - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_fit_centers_on_mean() {
        let proj = LocalProjection::fit([(34.0, 32.0), (35.0, 33.0)]).unwrap();
        let (lng, lat) = proj.center();
        assert!((lng - 34.5).abs() < 1e-12);
        assert!((lat - 32.5).abs() < 1e-12);
        assert!(LocalProjection::fit(std::iter::empty()).is_none());
    }
}
