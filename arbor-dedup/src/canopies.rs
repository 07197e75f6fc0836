//! Canopy footprint clustering.
//!
//! Remote-sensing extraction reports the same crown several times with
//! slightly different boundaries. This pass collapses overlapping
//! footprints into one cluster per real tree: a single visitation-guarded
//! sweep in input order, bbox candidates from the index, true intersection
//! re-tests, and the largest footprint elected representative. The greedy
//! sweep is order-dependent by design; area ties keep the first candidate
//! encountered.

use crate::config::CanopyConfig;
use arbor_core::{AttrMap, PointObservation, PolygonObservation};
use arbor_spatial::{geometry, BBox, GeometryIndex, LocalProjection};
use geo::{BooleanOps, Centroid};
use geo_types::{Geometry, MultiPolygon, Point};
use rustc_hash::FxHashSet;
use serde_json::Value;

/// Source tag attached to tree points extracted from canopy clusters.
pub const CANOPY_SOURCE: &str = "canopies";

/// One canopy cluster: a set of footprint observations judged to be the
/// same crown.
#[derive(Debug, Clone)]
pub struct CanopyCluster {
    /// Input index of the representative (largest-area) member.
    pub representative: u64,

    /// Input indices of every member, representative included.
    pub members: Vec<u64>,

    /// Emitted geometry: the representative's footprint, or the union of
    /// all members when merging is enabled.
    pub geometry: MultiPolygon<f64>,

    /// Largest area observed among the members, in square meters.
    pub area_sqm: f64,

    /// Centroid of the emitted geometry.
    pub centroid: Option<Point<f64>>,

    /// Footprint area over the squared longest side of the planar
    /// bounding box. Low values flag sprawling multi-crown blobs.
    pub compactness: Option<f64>,
}

/// Collapse overlapping canopy footprints into clusters.
///
/// Every indexable observation lands in exactly one cluster; an isolated
/// footprint becomes a singleton. Observations whose geometry cannot
/// produce a bounding box are rejected by the index build (logged there)
/// and take no part in clustering.
pub fn cluster_canopies(
    observations: &[PolygonObservation],
    config: &CanopyConfig,
) -> Vec<CanopyCluster> {
    let Some(projection) = LocalProjection::fit(
        observations
            .iter()
            .filter_map(|o| BBox::from_geometry(&Geometry::MultiPolygon(o.geometry.clone())))
            .map(|b| ((b.min_x + b.max_x) / 2.0, (b.min_y + b.max_y) / 2.0)),
    ) else {
        return Vec::new();
    };

    let index = GeometryIndex::build(
        observations
            .iter()
            .enumerate()
            .map(|(i, o)| (i as u64, Geometry::MultiPolygon(o.geometry.clone()), ())),
    );

    let (dlng, dlat) = projection.degree_offsets(config.bbox_buffer_m);
    let mut visited: FxHashSet<u64> = FxHashSet::default();
    let mut clusters = Vec::new();

    for entry in index.iter() {
        if visited.contains(&entry.id) {
            continue;
        }
        visited.insert(entry.id);

        let mut members = vec![entry.id];
        let mut best_id = entry.id;
        let mut best_area = observations[entry.id as usize].area_sqm;

        for candidate in index.query(&entry.bbox.expanded(dlng, dlat)) {
            if visited.contains(&candidate.id) {
                continue;
            }
            match geometry::intersects(&entry.geometry, &candidate.geometry) {
                Ok(true) => {
                    visited.insert(candidate.id);
                    members.push(candidate.id);
                    let area = observations[candidate.id as usize].area_sqm;
                    if area > best_area {
                        best_area = area;
                        best_id = candidate.id;
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(
                        anchor = entry.id,
                        candidate = candidate.id,
                        error = %e,
                        "skipping candidate with invalid geometry"
                    );
                }
            }
        }

        let emitted = emit_geometry(observations, best_id, &members, config);
        let centroid = emitted.centroid();
        let compactness = planar_compactness(&emitted, best_area, &projection);
        clusters.push(CanopyCluster {
            representative: best_id,
            members,
            geometry: emitted,
            area_sqm: best_area,
            centroid,
            compactness,
        });
    }

    tracing::info!(
        footprints = index.len(),
        clusters = clusters.len(),
        "clustered canopy footprints"
    );
    clusters
}

/// The representative's footprint, or the member union when enabled.
///
/// A member whose geometry fails validity checks is left out of the union
/// and logged; the union of the rest still ships.
fn emit_geometry(
    observations: &[PolygonObservation],
    representative: u64,
    members: &[u64],
    config: &CanopyConfig,
) -> MultiPolygon<f64> {
    let rep = observations[representative as usize].geometry.clone();
    if !config.merge_geometry {
        return rep;
    }

    let mut merged = rep;
    for &member in members {
        if member == representative {
            continue;
        }
        let geom = &observations[member as usize].geometry;
        if let Err(e) = geometry::ensure_valid(&Geometry::MultiPolygon(geom.clone())) {
            tracing::warn!(member, error = %e, "excluding member from merged geometry");
            continue;
        }
        merged = merged.union(geom);
    }
    merged
}

fn planar_compactness(
    geometry: &MultiPolygon<f64>,
    area_sqm: f64,
    projection: &LocalProjection,
) -> Option<f64> {
    let bbox = BBox::from_geometry(&Geometry::MultiPolygon(geometry.clone()))?;
    let (x0, y0) = projection.to_planar(bbox.min_x, bbox.min_y);
    let (x1, y1) = projection.to_planar(bbox.max_x, bbox.max_y);
    let side = (x1 - x0).abs().max((y1 - y0).abs());
    (side > 0.0).then(|| area_sqm / (side * side))
}

/// Convert area-banded clusters into synthetic tree points at their
/// centroids, tagged with the canopy source and carrying the footprint
/// metrics as attributes.
pub fn extract_tree_points(
    clusters: &[CanopyCluster],
    config: &CanopyConfig,
) -> Vec<PointObservation> {
    let mut points = Vec::new();
    for cluster in clusters {
        if cluster.area_sqm <= config.min_area_sqm || cluster.area_sqm >= config.max_area_sqm {
            continue;
        }
        let Some(centroid) = cluster.centroid else {
            tracing::warn!(
                representative = cluster.representative,
                "cluster has no centroid, skipping extraction"
            );
            continue;
        };

        let mut attrs = AttrMap::new();
        attrs.insert("area".to_string(), json_number(cluster.area_sqm));
        attrs.insert(
            "compactness".to_string(),
            cluster.compactness.map_or(Value::Null, json_number),
        );
        match PointObservation::new(CANOPY_SOURCE, centroid.x(), centroid.y(), attrs) {
            Ok(point) => points.push(point),
            Err(e) => {
                tracing::warn!(
                    representative = cluster.representative,
                    error = %e,
                    "centroid failed point validation, skipping extraction"
                );
            }
        }
    }
    points
}

fn json_number(value: f64) -> Value {
    serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_spatial::parse_wkt;

    fn footprint(wkt: &str, area_sqm: f64) -> PolygonObservation {
        let Geometry::Polygon(polygon) = parse_wkt(wkt).unwrap() else {
            panic!("expected polygon");
        };
        PolygonObservation::from_polygon(CANOPY_SOURCE, polygon, area_sqm, AttrMap::new()).unwrap()
    }

    // Two overlapping squares near (34.75, 32.05), roughly 10x10 m each.
    fn overlapping_pair() -> Vec<PolygonObservation> {
        vec![
            footprint(
                "POLYGON((34.7500 32.0500,34.7501 32.0500,34.7501 32.0501,34.7500 32.0501,34.7500 32.0500))",
                10.0,
            ),
            footprint(
                "POLYGON((34.75005 32.05005,34.75015 32.05005,34.75015 32.05015,34.75005 32.05015,34.75005 32.05005))",
                15.0,
            ),
        ]
    }

    #[test]
    fn test_overlap_merges_and_keeps_max_area() {
        let clusters = cluster_canopies(&overlapping_pair(), &CanopyConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
        assert_eq!(clusters[0].representative, 1);
        assert_eq!(clusters[0].area_sqm, 15.0);
    }

    #[test]
    fn test_disjoint_footprints_stay_separate() {
        let observations = vec![
            footprint(
                "POLYGON((34.7500 32.0500,34.7501 32.0500,34.7501 32.0501,34.7500 32.0501,34.7500 32.0500))",
                10.0,
            ),
            footprint(
                "POLYGON((34.7600 32.0600,34.7601 32.0600,34.7601 32.0601,34.7600 32.0601,34.7600 32.0600))",
                12.0,
            ),
        ];
        let clusters = cluster_canopies(&observations, &CanopyConfig::default());
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(|c| c.members.len() == 1));
    }

    #[test]
    fn test_area_tie_keeps_first_encountered() {
        let mut observations = overlapping_pair();
        observations[1].area_sqm = 10.0;
        let clusters = cluster_canopies(&observations, &CanopyConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].representative, 0);
    }

    #[test]
    fn test_every_footprint_in_exactly_one_cluster() {
        let mut observations = overlapping_pair();
        observations.push(footprint(
            "POLYGON((34.7600 32.0600,34.7601 32.0600,34.7601 32.0601,34.7600 32.0601,34.7600 32.0600))",
            7.0,
        ));
        let clusters = cluster_canopies(&observations, &CanopyConfig::default());
        let mut seen: Vec<u64> = clusters.iter().flat_map(|c| c.members.clone()).collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2]);
    }

    #[test]
    fn test_merge_geometry_unions_members() {
        let config = CanopyConfig::default().with_merge_geometry(true);
        let clusters = cluster_canopies(&overlapping_pair(), &config);
        assert_eq!(clusters.len(), 1);
        // The union of two offset squares is one connected polygon.
        assert_eq!(clusters[0].geometry.0.len(), 1);
    }

    #[test]
    fn test_extract_tree_points_applies_area_band() {
        let mut observations = overlapping_pair(); // cluster area 15.0
        observations.push(footprint(
            "POLYGON((34.7600 32.0600,34.7601 32.0600,34.7601 32.0601,34.7600 32.0601,34.7600 32.0600))",
            500.0,
        ));
        let config = CanopyConfig::default();
        let clusters = cluster_canopies(&observations, &config);
        let points = extract_tree_points(&clusters, &config);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].source, CANOPY_SOURCE);
        assert_eq!(points[0].attrs["area"], 15.0);
        // Centroid of the representative square.
        assert!((points[0].lng - 34.7501).abs() < 1e-4);
        assert!((points[0].lat - 32.0501).abs() < 1e-4);
    }
}
