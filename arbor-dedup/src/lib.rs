//! # Arbor Dedup
//!
//! Deduplication passes for the arbor pipeline:
//!
//! - [`canopies`]: collapse overlapping canopy footprints into one
//!   cluster per crown, electing the largest footprint representative
//! - [`trees`]: merge near-coincident point observations from distinct
//!   sources into canonical trees with stable location-derived ids
//! - [`tree_id`]: the deterministic identifier grid
//!
//! Both passes are single-threaded, streaming and order-dependent: the
//! visitation order is part of the algorithm's contract (low-confidence
//! sources last, input order otherwise), and all clustering state is
//! owned by the pass itself.

pub mod canopies;
pub mod config;
pub mod tree_id;
pub mod trees;

pub use canopies::{cluster_canopies, extract_tree_points, CanopyCluster, CANOPY_SOURCE};
pub use config::{CanopyConfig, DedupConfig};
pub use tree_id::{TreeId, GRID_PRECISION_DECIMALS};
pub use trees::{dedup_trees, DedupedTree};
