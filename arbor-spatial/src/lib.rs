//! # Arbor Spatial
//!
//! Spatial primitives for the arbor pipeline:
//!
//! - [`geometry`]: WKT parsing, bounding boxes, and fallible relation
//!   tests that surface invalid shapes as recoverable errors
//! - [`projection`]: local planar frame for meter-radius comparisons
//! - [`index`]: read-only bounding-box candidate index
//! - [`layer_store`]: build-once, persist-by-name reference-layer store
//!
//! The index follows a build-then-query discipline: it is assembled once
//! from a full record set and never mutated afterwards. Queries return
//! bbox-level candidates only; true geometric relations are re-tested by
//! the caller through [`geometry`].

pub mod error;
pub mod geometry;
pub mod index;
pub mod layer_store;
pub mod projection;

pub use error::{Result, SpatialError};
pub use geometry::{contains_point, ensure_valid, intersects, parse_wkt, to_wkt, BBox};
pub use index::{BuildStats, GeometryIndex, IndexEntry};
pub use layer_store::{
    decode_layer, encode_layer, layer_address, LayerRecord, LayerStore, ReferenceLayer,
};
pub use projection::{LocalProjection, EARTH_RADIUS_M};
