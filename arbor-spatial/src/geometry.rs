//! Geometry parsing, bounding boxes, and fallible relation tests.
//!
//! WKT is the source-of-truth text encoding for persisted reference
//! polygons; parsing happens at layer build/load time and again never in
//! the hot loops. Relation tests (`intersects`, `contains_point`) return a
//! `Result` so malformed shapes surface as [`SpatialError::InvalidGeometry`]
//! instead of producing silent garbage — callers map that error to
//! "no relation" and keep going.

use crate::error::{Result, SpatialError};
use geo::{BoundingRect, Contains, CoordsIter, Intersects, Validation};
use geo_types::{Geometry, Point};

/// Axis-aligned bounding box.
///
/// Used in geographic degrees for reference layers and canopy clustering,
/// and in planar meters for point deduplication. `x` is longitude/easting,
/// `y` is latitude/northing.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    /// Create a new bounding box.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Zero-area box at a single point, used for containment queries.
    pub fn point(x: f64, y: f64) -> Self {
        Self::new(x, y, x, y)
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// Check if this bbox contains a point.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// A copy of this box grown by `dx`/`dy` on each side.
    pub fn expanded(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.min_x - dx,
            self.min_y - dy,
            self.max_x + dx,
            self.max_y + dy,
        )
    }

    /// Compute from a geo-types Geometry.
    ///
    /// Returns `None` for empty geometries or when any bound is
    /// non-finite.
    pub fn from_geometry(geom: &Geometry<f64>) -> Option<Self> {
        let rect = geom.bounding_rect()?;
        let bbox = Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        };
        bbox.is_finite().then_some(bbox)
    }

    fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
    }
}

/// Parse a WKT string to a geo-types Geometry.
pub fn parse_wkt(wkt_str: &str) -> Result<Geometry<f64>> {
    use std::str::FromStr;
    wkt::Wkt::from_str(wkt_str)
        .map_err(|e| SpatialError::WktParse(format!("{:?}", e)))
        .and_then(|w| {
            w.try_into()
                .map_err(|e: wkt::conversion::Error| SpatialError::WktParse(format!("{:?}", e)))
        })
}

/// Serialize a geometry to its WKT text form.
pub fn to_wkt(geom: &Geometry<f64>) -> String {
    use wkt::ToWkt;
    geom.wkt_string()
}

/// Check that a geometry is usable in relation tests.
///
/// Rejects non-finite coordinates and shapes the `geo` validation rules
/// consider invalid (unclosed or self-intersecting rings, etc).
pub fn ensure_valid(geom: &Geometry<f64>) -> Result<()> {
    if geom.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
        return Err(SpatialError::InvalidGeometry(
            "non-finite coordinate".into(),
        ));
    }
    if !geom.is_valid() {
        return Err(SpatialError::InvalidGeometry(
            "geometry fails validity rules".into(),
        ));
    }
    Ok(())
}

/// True geometric intersection test.
pub fn intersects(a: &Geometry<f64>, b: &Geometry<f64>) -> Result<bool> {
    ensure_valid(a)?;
    ensure_valid(b)?;
    Ok(a.intersects(b))
}

/// True point-in-geometry containment test.
pub fn contains_point(geom: &Geometry<f64>, point: &Point<f64>) -> Result<bool> {
    ensure_valid(geom)?;
    if !point.x().is_finite() || !point.y().is_finite() {
        return Err(SpatialError::InvalidGeometry(
            "non-finite point coordinate".into(),
        ));
    }
    Ok(geom.contains(point))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_polygon() {
        let wkt_str = "POLYGON((0 0,1 0,1 1,0 1,0 0))";
        let geom = parse_wkt(wkt_str).unwrap();
        assert!(matches!(geom, Geometry::Polygon(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_wkt("POLYWOG((0 0))").is_err());
    }

    #[test]
    fn test_wkt_roundtrip() {
        let wkt_str = "POLYGON((0 0,10 0,10 20,0 20,0 0))";
        let geom = parse_wkt(wkt_str).unwrap();
        let reparsed = parse_wkt(&to_wkt(&geom)).unwrap();
        assert_eq!(
            BBox::from_geometry(&geom).unwrap(),
            BBox::from_geometry(&reparsed).unwrap()
        );
    }

    #[test]
    fn test_bbox_relations() {
        let a = BBox::new(0.0, 0.0, 2.0, 2.0);
        let b = BBox::new(1.0, 1.0, 3.0, 3.0);
        let c = BBox::new(5.0, 5.0, 6.0, 6.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_point(1.0, 1.0));
        assert!(!a.contains_point(2.5, 1.0));
        assert!(a.expanded(1.0, 1.0).contains_point(2.5, 1.0));
    }

    #[test]
    fn test_intersects_rejects_bowtie() {
        // Self-intersecting "bowtie" ring
        let bowtie = parse_wkt("POLYGON((0 0,2 2,2 0,0 2,0 0))").unwrap();
        let square = parse_wkt("POLYGON((0 0,1 0,1 1,0 1,0 0))").unwrap();
        assert!(matches!(
            intersects(&bowtie, &square),
            Err(SpatialError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_contains_point() {
        let square = parse_wkt("POLYGON((0 0,4 0,4 4,0 4,0 0))").unwrap();
        assert!(contains_point(&square, &Point::new(2.0, 2.0)).unwrap());
        assert!(!contains_point(&square, &Point::new(5.0, 2.0)).unwrap());
    }
}
