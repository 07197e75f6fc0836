//! # Arbor Core
//!
//! Shared foundation for the arbor ingestion pipeline: the validated
//! observation record model, the workspace-base error type, and the async
//! storage seam used to persist built reference-layer indexes.
//!
//! ## Design Principles
//!
//! 1. **Validate once**: observations are checked at ingestion and
//!    immutable afterwards; downstream stages never re-validate rows.
//! 2. **Async at the I/O seam only**: storage is async, everything that
//!    runs per-record is synchronous.

pub mod error;
pub mod record;
pub mod storage;

pub use error::{Error, Result};
pub use record::{
    partition_observations, AttrMap, Observation, PointObservation, PolygonObservation,
};
pub use storage::{FileStorage, MemoryStorage, Storage, StorageRead, StorageWrite};
