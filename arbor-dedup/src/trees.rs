//! Point deduplication.
//!
//! Different loaders report the same physical tree at slightly different
//! coordinates. This pass merges near-coincident observations from
//! *distinct* sources into one canonical tree — a source is trusted not to
//! double-report, so two points from the same loader never merge no matter
//! how close they sit.
//!
//! The sweep is greedy and strictly ordered: low-confidence sources are
//! processed last, so when a survey point and an extracted canopy point
//! describe the same tree, the survey point anchors the cluster and the
//! identifier derives from its coordinates. Reordering the input changes
//! the result; that is part of the contract, not an accident.

use crate::config::DedupConfig;
use crate::tree_id::TreeId;
use arbor_core::PointObservation;
use arbor_spatial::{BBox, GeometryIndex, LocalProjection};
use geo_types::{Geometry, Point};
use rustc_hash::FxHashMap;

/// One deduplicated observation: the original point annotated with its
/// canonical identity.
#[derive(Debug, Clone)]
pub struct DedupedTree {
    /// The original observation, unchanged.
    pub observation: PointObservation,

    /// Canonical identifier shared by every member of the cluster.
    pub tree_id: TreeId,

    /// Number of observations merged into this tree (1 for singletons).
    pub cluster_size: u32,
}

/// Merge near-coincident points from distinct sources into canonical
/// trees.
///
/// Emits one record per input point, in processing order: every point
/// survives, annotated with its cluster's identifier and size. A point
/// with no eligible neighbor becomes its own singleton.
pub fn dedup_trees(points: Vec<PointObservation>, config: &DedupConfig) -> Vec<DedupedTree> {
    let Some(projection) = LocalProjection::fit(points.iter().map(|p| (p.lng, p.lat))) else {
        return Vec::new();
    };

    // Low-confidence sources go last; relative order is otherwise kept.
    let is_low_confidence =
        |p: &PointObservation| config.low_confidence_sources.iter().any(|s| s == &p.source);
    let mut order: Vec<usize> = (0..points.len())
        .filter(|&i| !is_low_confidence(&points[i]))
        .collect();
    order.extend((0..points.len()).filter(|&i| is_low_confidence(&points[i])));

    let planar: Vec<(f64, f64)> = points.iter().map(|p| projection.to_planar(p.lng, p.lat)).collect();
    let index = GeometryIndex::build(order.iter().map(|&i| {
        let (x, y) = planar[i];
        (i as u64, Geometry::Point(Point::new(x, y)), ())
    }));

    let radius = config.search_radius_m;
    let mut matched: FxHashMap<usize, (TreeId, u32)> = FxHashMap::default();
    let mut output = Vec::with_capacity(points.len());
    let mut cluster_count = 0usize;

    for &i in &order {
        if let Some((tree_id, cluster_size)) = matched.get(&i) {
            // Assigned while a cluster anchor was processed earlier.
            output.push(DedupedTree {
                observation: points[i].clone(),
                tree_id: tree_id.clone(),
                cluster_size: *cluster_size,
            });
            continue;
        }

        let point = &points[i];
        let (x, y) = planar[i];

        // Nearest unmatched neighbor per distinct other source.
        let mut nearest: FxHashMap<&str, (usize, f64)> = FxHashMap::default();
        for candidate in index.query(&BBox::new(x - radius, y - radius, x + radius, y + radius)) {
            let j = candidate.id as usize;
            if j == i || matched.contains_key(&j) {
                continue;
            }
            let neighbor = &points[j];
            if neighbor.source == point.source {
                continue;
            }
            let (cx, cy) = planar[j];
            let distance = (cx - x).hypot(cy - y);
            if !distance.is_finite() {
                tracing::warn!(anchor = i, neighbor = j, "non-finite neighbor distance, skipping");
                continue;
            }
            if distance > radius {
                continue;
            }
            match nearest.get(neighbor.source.as_str()) {
                Some(&(_, best)) if best <= distance => {}
                _ => {
                    nearest.insert(neighbor.source.as_str(), (j, distance));
                }
            }
        }

        let tree_id = TreeId::from_coords(point.lat, point.lng);
        let cluster_size = 1 + nearest.len() as u32;
        for &(j, _) in nearest.values() {
            matched.insert(j, (tree_id.clone(), cluster_size));
        }
        matched.insert(i, (tree_id.clone(), cluster_size));
        cluster_count += 1;

        output.push(DedupedTree {
            observation: points[i].clone(),
            tree_id,
            cluster_size,
        });
    }

    tracing::info!(
        observations = points.len(),
        trees = cluster_count,
        "deduplicated tree observations"
    );
    output
}
