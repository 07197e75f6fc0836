//! Bounding-box candidate index over a fixed set of geometries.
//!
//! Built once, queried many times, never mutated. Queries return every
//! entry whose *bounding box* intersects the query box — a superset of the
//! true matches. Callers re-test the real geometric relation on each
//! candidate; the index only narrows the scan.

use crate::geometry::BBox;
use geo_types::Geometry;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{RTree, AABB};

/// One index entry: identifier, precomputed bbox, geometry, and an opaque
/// payload carried through for the caller's re-tests.
#[derive(Debug, Clone)]
pub struct IndexEntry<P> {
    pub id: u64,
    pub bbox: BBox,
    pub geometry: Geometry<f64>,
    pub payload: P,
}

/// Statistics collected during index building.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of records offered to the builder.
    pub records_processed: u64,

    /// Number of entries actually indexed.
    pub indexed: u64,

    /// Records rejected because no finite bounding box could be computed.
    pub rejected: u64,
}

type BBoxTree = RTree<GeomWithData<Rectangle<[f64; 2]>, usize>>;

/// Read-only spatial index over geometry + payload records.
#[derive(Debug)]
pub struct GeometryIndex<P> {
    entries: Vec<IndexEntry<P>>,
    tree: BBoxTree,
    stats: BuildStats,
}

impl<P> GeometryIndex<P> {
    /// Build an index from `(id, geometry, payload)` records.
    ///
    /// A record whose geometry cannot produce a finite bounding box
    /// (empty shape, NaN coordinate) is rejected and logged; it does not
    /// abort the build.
    pub fn build(records: impl IntoIterator<Item = (u64, Geometry<f64>, P)>) -> Self {
        let mut entries = Vec::new();
        let mut stats = BuildStats::default();

        for (id, geometry, payload) in records {
            stats.records_processed += 1;
            let Some(bbox) = BBox::from_geometry(&geometry) else {
                tracing::warn!(id, "rejecting geometry with no finite bounding box");
                stats.rejected += 1;
                continue;
            };
            entries.push(IndexEntry {
                id,
                bbox,
                geometry,
                payload,
            });
        }
        stats.indexed = entries.len() as u64;

        let leaves = entries
            .iter()
            .enumerate()
            .map(|(pos, e)| {
                GeomWithData::new(
                    Rectangle::from_corners([e.bbox.min_x, e.bbox.min_y], [e.bbox.max_x, e.bbox.max_y]),
                    pos,
                )
            })
            .collect();
        let tree = RTree::bulk_load(leaves);

        Self {
            entries,
            tree,
            stats,
        }
    }

    /// All entries whose bounding box intersects the query box.
    pub fn query<'a>(&'a self, bbox: &BBox) -> impl Iterator<Item = &'a IndexEntry<P>> + 'a {
        let envelope = AABB::from_corners([bbox.min_x, bbox.min_y], [bbox.max_x, bbox.max_y]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .map(move |leaf| &self.entries[leaf.data])
    }

    /// Iterate all entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &IndexEntry<P>> {
        self.entries.iter()
    }

    /// Number of indexed entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build statistics.
    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }
}
