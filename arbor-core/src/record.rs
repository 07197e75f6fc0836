//! Observation record model.
//!
//! Raw inputs arrive as loosely-typed feature rows from heterogeneous
//! loaders (field surveys, municipal registries, remote-sensing
//! extraction). They are validated once at ingestion into explicit
//! variants and are immutable afterwards; every later stage works on
//! these types, never on raw rows.

use crate::error::{Error, Result};
use geo_types::{MultiPolygon, Polygon};
use serde_json::{Map, Value};

/// Named attributes carried by an observation or a reference polygon.
pub type AttrMap = Map<String, Value>;

/// A single point observation: one reported tree location.
#[derive(Debug, Clone)]
pub struct PointObservation {
    /// Which loader produced this record (e.g. "survey", "muni-registry",
    /// "canopies").
    pub source: String,

    /// Longitude in degrees (WGS84).
    pub lng: f64,

    /// Latitude in degrees (WGS84).
    pub lat: f64,

    /// Attributes copied verbatim from the loader.
    pub attrs: AttrMap,
}

impl PointObservation {
    /// Validate and construct a point observation.
    ///
    /// Rejects non-finite coordinates and coordinates outside the
    /// geographic domain.
    pub fn new(source: impl Into<String>, lng: f64, lat: f64, attrs: AttrMap) -> Result<Self> {
        if !lng.is_finite() || !lat.is_finite() {
            return Err(Error::invalid_observation(format!(
                "non-finite coordinates ({}, {})",
                lng, lat
            )));
        }
        if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::invalid_observation(format!(
                "coordinates out of range ({}, {})",
                lng, lat
            )));
        }
        Ok(Self {
            source: source.into(),
            lng,
            lat,
            attrs,
        })
    }
}

/// A single polygon observation: one detected canopy footprint.
#[derive(Debug, Clone)]
pub struct PolygonObservation {
    /// Which loader produced this record.
    pub source: String,

    /// Footprint geometry in geographic coordinates. Plain polygons are
    /// promoted to single-member multipolygons at ingestion.
    pub geometry: MultiPolygon<f64>,

    /// Precomputed footprint area in square meters, carried from the
    /// upstream extraction.
    pub area_sqm: f64,

    /// Attributes copied verbatim from the loader.
    pub attrs: AttrMap,
}

impl PolygonObservation {
    /// Validate and construct a polygon observation.
    pub fn new(
        source: impl Into<String>,
        geometry: MultiPolygon<f64>,
        area_sqm: f64,
        attrs: AttrMap,
    ) -> Result<Self> {
        if geometry.0.is_empty() {
            return Err(Error::invalid_observation("empty multipolygon"));
        }
        for polygon in &geometry {
            validate_polygon(polygon)?;
        }
        if !area_sqm.is_finite() || area_sqm < 0.0 {
            return Err(Error::invalid_observation(format!(
                "invalid area {}",
                area_sqm
            )));
        }
        Ok(Self {
            source: source.into(),
            geometry,
            area_sqm,
            attrs,
        })
    }

    /// Construct from a plain polygon, promoting it to a multipolygon.
    pub fn from_polygon(
        source: impl Into<String>,
        polygon: Polygon<f64>,
        area_sqm: f64,
        attrs: AttrMap,
    ) -> Result<Self> {
        Self::new(source, MultiPolygon(vec![polygon]), area_sqm, attrs)
    }
}

fn validate_polygon(polygon: &Polygon<f64>) -> Result<()> {
    let exterior = polygon.exterior();
    if exterior.0.len() < 4 {
        return Err(Error::invalid_observation(
            "exterior ring has fewer than 4 coordinates",
        ));
    }
    for coord in exterior.0.iter().chain(polygon.interiors().iter().flat_map(|r| r.0.iter())) {
        if !coord.x.is_finite() || !coord.y.is_finite() {
            return Err(Error::invalid_observation("non-finite ring coordinate"));
        }
    }
    Ok(())
}

/// One raw input record, point or polygon.
#[derive(Debug, Clone)]
pub enum Observation {
    Point(PointObservation),
    Polygon(PolygonObservation),
}

impl Observation {
    /// Source tag of the underlying record.
    pub fn source(&self) -> &str {
        match self {
            Observation::Point(p) => &p.source,
            Observation::Polygon(p) => &p.source,
        }
    }
}

/// Split a mixed observation stream into the point and polygon substreams
/// consumed by the two deduplication passes. Relative order within each
/// substream is the input order.
pub fn partition_observations(
    observations: impl IntoIterator<Item = Observation>,
) -> (Vec<PointObservation>, Vec<PolygonObservation>) {
    let mut points = Vec::new();
    let mut polygons = Vec::new();
    for observation in observations {
        match observation {
            Observation::Point(p) => points.push(p),
            Observation::Polygon(p) => polygons.push(p),
        }
    }
    (points, polygons)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::{Coord, LineString};

    fn square() -> Polygon<f64> {
        Polygon::new(
            LineString(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
                Coord { x: 0.0, y: 1.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        )
    }

    #[test]
    fn test_point_validation() {
        assert!(PointObservation::new("survey", 34.75, 32.05, AttrMap::new()).is_ok());
        assert!(PointObservation::new("survey", f64::NAN, 32.05, AttrMap::new()).is_err());
        assert!(PointObservation::new("survey", 200.0, 32.05, AttrMap::new()).is_err());
        assert!(PointObservation::new("survey", 34.75, -95.0, AttrMap::new()).is_err());
    }

    #[test]
    fn test_polygon_promotion() {
        let obs = PolygonObservation::from_polygon("canopies", square(), 12.0, AttrMap::new())
            .unwrap();
        assert_eq!(obs.geometry.0.len(), 1);
    }

    #[test]
    fn test_partition_preserves_substream_order() {
        let poly = PolygonObservation::from_polygon("canopies", square(), 9.0, AttrMap::new())
            .unwrap();
        let p1 = PointObservation::new("survey", 34.75, 32.05, AttrMap::new()).unwrap();
        let p2 = PointObservation::new("muni-registry", 34.76, 32.06, AttrMap::new()).unwrap();

        let (points, polygons) = partition_observations(vec![
            Observation::Point(p1),
            Observation::Polygon(poly),
            Observation::Point(p2),
        ]);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].source, "survey");
        assert_eq!(points[1].source, "muni-registry");
        assert_eq!(polygons.len(), 1);
        assert_eq!(polygons[0].source, "canopies");
    }

    #[test]
    fn test_polygon_rejects_degenerate() {
        let open = Polygon::new(
            LineString(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        );
        assert!(
            PolygonObservation::from_polygon("canopies", open, 1.0, AttrMap::new()).is_err()
        );

        let empty = MultiPolygon::<f64>(vec![]);
        assert!(PolygonObservation::new("canopies", empty, 1.0, AttrMap::new()).is_err());

        assert!(
            PolygonObservation::from_polygon("canopies", square(), f64::NAN, AttrMap::new())
                .is_err()
        );
    }
}
