//! # Arbor Enrich
//!
//! Spatial enrichment for deduplicated tree records:
//!
//! - [`layers`]: named reference-layer specs and their attribute mappings
//! - [`joiner`]: point-in-polygon attribute joins with all-or-null fill
//! - [`roads`]: nearest-road distance with a coordinate-keyed memo
//!
//! Enrichment never fails a record: an uncontained point, an invalid
//! candidate polygon, or a too-distant road all yield null attributes and
//! the record keeps flowing.

pub mod joiner;
pub mod layers;
pub mod roads;

pub use joiner::ReferenceJoiner;
pub use layers::{FieldMapping, LayerSpec};
pub use roads::{DistanceToRoad, RoadDistanceConfig, RoadMatch};
