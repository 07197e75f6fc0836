//! Nearest-road proximity.
//!
//! For each tree the pass finds the closest road within a search radius
//! and records its distance, name, and id — street trees sit meters from
//! a corridor, park trees do not. Distances run in a planar frame centered
//! on the queried point, so each candidate geometry is projected before
//! measuring. Results are memoized by the 5-decimal coordinate key:
//! observation streams revisit the same rounded location often and the
//! candidate scan is the expensive part.

use arbor_core::AttrMap;
use arbor_spatial::{geometry, BBox, LocalProjection, ReferenceLayer};
use geo::{Euclidean, Distance, MapCoords};
use geo_types::{Coord, Geometry, Point};
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::sync::Arc;

/// Configuration for road proximity.
#[derive(Debug, Clone)]
pub struct RoadDistanceConfig {
    /// Candidate scan radius around the point.
    /// Default: 20.0 m
    pub search_radius_m: f64,

    /// Matches farther than this are discarded.
    /// Default: 10.0 m
    pub max_distance_m: f64,
}

impl Default for RoadDistanceConfig {
    fn default() -> Self {
        Self {
            search_radius_m: 20.0,
            max_distance_m: 10.0,
        }
    }
}

/// The nearest qualifying road for a point.
#[derive(Debug, Clone)]
pub struct RoadMatch {
    /// Planar distance to the road geometry, in meters.
    pub distance_m: f64,

    /// `road_name` attribute of the matched road.
    pub road_name: Value,

    /// `road_id` attribute of the matched road.
    pub road_id: Value,
}

/// Computes and memoizes nearest-road matches against the road layer.
pub struct DistanceToRoad {
    layer: Arc<ReferenceLayer>,
    config: RoadDistanceConfig,
    memo: FxHashMap<String, Option<RoadMatch>>,
}

impl DistanceToRoad {
    /// Create a pass over a built road layer.
    pub fn new(layer: Arc<ReferenceLayer>, config: RoadDistanceConfig) -> Self {
        Self {
            layer,
            config,
            memo: FxHashMap::default(),
        }
    }

    /// Nearest road within the distance cap, if any. Memoized per
    /// rounded coordinate.
    pub fn nearest(&mut self, lng: f64, lat: f64) -> Option<RoadMatch> {
        let key = format!("{:.5},{:.5}", lng, lat);
        if let Some(cached) = self.memo.get(&key) {
            return cached.clone();
        }
        let result = self.compute(lng, lat);
        self.memo.insert(key, result.clone());
        result
    }

    /// Write `distance_to_road`, `road_name` and `road_id` onto `attrs`,
    /// all null when no road qualifies.
    pub fn apply(&mut self, lng: f64, lat: f64, attrs: &mut AttrMap) {
        let nearest = self.nearest(lng, lat);
        let (distance, name, id) = match nearest {
            Some(m) => (
                serde_json::Number::from_f64(m.distance_m).map_or(Value::Null, Value::Number),
                m.road_name,
                m.road_id,
            ),
            None => (Value::Null, Value::Null, Value::Null),
        };
        attrs.insert("distance_to_road".to_string(), distance);
        attrs.insert("road_name".to_string(), name);
        attrs.insert("road_id".to_string(), id);
    }

    fn compute(&self, lng: f64, lat: f64) -> Option<RoadMatch> {
        let projection = LocalProjection::new(lng, lat);
        let (dlng, dlat) = projection.degree_offsets(self.config.search_radius_m);
        let query = BBox::point(lng, lat).expanded(dlng, dlat);
        let origin = Geometry::Point(Point::new(0.0, 0.0));

        let mut minimum: Option<RoadMatch> = None;
        for candidate in self.layer.query(&query) {
            if let Err(e) = geometry::ensure_valid(&candidate.geometry) {
                tracing::debug!(road = candidate.id, error = %e, "skipping invalid road geometry");
                continue;
            }
            let planar = candidate.geometry.map_coords(|c: Coord<f64>| {
                let (x, y) = projection.to_planar(c.x, c.y);
                Coord { x, y }
            });
            let distance = Euclidean.distance(&origin, &planar);
            if !distance.is_finite() {
                continue;
            }
            if minimum.as_ref().map_or(true, |m| distance < m.distance_m) {
                minimum = Some(RoadMatch {
                    distance_m: distance,
                    road_name: candidate.payload.get("road_name").cloned().unwrap_or(Value::Null),
                    road_id: candidate.payload.get("road_id").cloned().unwrap_or(Value::Null),
                });
            }
        }

        minimum.filter(|m| m.distance_m < self.config.max_distance_m)
    }
}
