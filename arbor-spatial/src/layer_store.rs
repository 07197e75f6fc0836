//! Persistent reference-layer store.
//!
//! A reference layer (parcels, municipalities, statistical areas, buffered
//! roads) is expensive to assemble: the builder reads and reprojects a
//! national dataset. The store builds each layer at most once — per run via
//! an in-memory name map, across runs via the storage collaborator — and
//! serves a read-only [`GeometryIndex`] keyed by the layer name.
//!
//! Persisted format (`layers/{name}.lyr`):
//! ```text
//! Header (8 bytes):
//!   magic: "ABL1" (4B)
//!   version: u8
//!   flags: u8
//!   _reserved: u16
//!
//! Body (zstd compressed): JSON array of LayerRecord
//! ```

use crate::error::{Result, SpatialError};
use crate::geometry::parse_wkt;
use crate::index::GeometryIndex;
use arbor_core::{AttrMap, Storage};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Magic bytes for persisted layer files.
pub const LAYER_MAGIC: &[u8; 4] = b"ABL1";

/// Current layer format version.
pub const LAYER_VERSION: u8 = 1;

/// Persisted form of one reference polygon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerRecord {
    /// Geometry as WKT, the source of truth.
    pub wkt: String,

    /// Administrative attributes copied onto matching points.
    pub attrs: AttrMap,
}

/// Storage address for a named layer.
pub fn layer_address(name: &str) -> String {
    format!("layers/{}.lyr", name)
}

/// Serialize layer records to the persisted frame.
pub fn encode_layer(records: &[LayerRecord]) -> Result<Vec<u8>> {
    let body = serde_json::to_vec(records)
        .map_err(|e| SpatialError::FormatError(format!("encode failed: {}", e)))?;
    let compressed =
        zstd::encode_all(&body[..], 3).map_err(|e| SpatialError::Io(std::io::Error::other(e)))?;

    let mut buf = Vec::with_capacity(8 + compressed.len());
    buf.extend_from_slice(LAYER_MAGIC);
    buf.push(LAYER_VERSION);
    buf.push(0); // flags
    buf.extend_from_slice(&[0u8; 2]); // reserved
    buf.extend_from_slice(&compressed);
    Ok(buf)
}

/// Decode a persisted frame back into layer records.
pub fn decode_layer(data: &[u8]) -> Result<Vec<LayerRecord>> {
    if data.len() < 8 {
        return Err(SpatialError::FormatError("layer file too short".into()));
    }
    if &data[0..4] != LAYER_MAGIC {
        return Err(SpatialError::FormatError("invalid layer magic".into()));
    }
    let version = data[4];
    if version != LAYER_VERSION {
        return Err(SpatialError::FormatError(format!(
            "unsupported layer version: {}",
            version
        )));
    }
    let body =
        zstd::decode_all(&data[8..]).map_err(|e| SpatialError::Io(std::io::Error::other(e)))?;
    serde_json::from_slice(&body)
        .map_err(|e| SpatialError::FormatError(format!("decode failed: {}", e)))
}

/// A built reference layer, ready for containment queries.
pub type ReferenceLayer = GeometryIndex<AttrMap>;

/// Builds reference layers at most once and persists them by name.
pub struct LayerStore {
    storage: Arc<dyn Storage>,
    loaded: Mutex<FxHashMap<String, Arc<ReferenceLayer>>>,
}

impl LayerStore {
    /// Create a store over the given storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            loaded: Mutex::new(FxHashMap::default()),
        }
    }

    /// Get the layer `name`, building it with `builder` only if no
    /// persisted form exists yet.
    ///
    /// Within a run the builder is invoked at most once per name; a second
    /// call returns the already-built index. Build and decode failures are
    /// fatal and name the layer.
    pub async fn get_or_build<F>(&self, name: &str, builder: F) -> Result<Arc<ReferenceLayer>>
    where
        F: FnOnce() -> Result<Vec<LayerRecord>>,
    {
        let mut loaded = self.loaded.lock().await;
        if let Some(layer) = loaded.get(name) {
            return Ok(layer.clone());
        }

        let address = layer_address(name);
        let records = if self.storage.exists(&address).await.map_err(fatal(name))? {
            let bytes = self.storage.read_bytes(&address).await.map_err(fatal(name))?;
            let records = decode_layer(&bytes).map_err(|e| named(name, e))?;
            tracing::info!(layer = name, records = records.len(), "loaded persisted layer");
            records
        } else {
            let records = builder().map_err(|e| named(name, e))?;
            let bytes = encode_layer(&records).map_err(|e| named(name, e))?;
            self.storage
                .write_bytes(&address, &bytes)
                .await
                .map_err(fatal(name))?;
            tracing::info!(
                layer = name,
                records = records.len(),
                bytes = bytes.len(),
                "built and persisted layer"
            );
            records
        };

        let layer = Arc::new(build_layer_index(name, records)?);
        loaded.insert(name.to_string(), layer.clone());
        Ok(layer)
    }
}

/// Parse layer records and assemble the containment index.
///
/// A record whose WKT does not parse fails the whole layer: a persisted
/// body is produced by [`encode_layer`], so garbage here means corruption,
/// not a stray bad row.
fn build_layer_index(name: &str, records: Vec<LayerRecord>) -> Result<ReferenceLayer> {
    let mut parsed = Vec::with_capacity(records.len());
    for (i, record) in records.into_iter().enumerate() {
        let geometry = parse_wkt(&record.wkt).map_err(|e| {
            SpatialError::FormatError(format!("layer {}: record {}: {}", name, i, e))
        })?;
        parsed.push((i as u64, geometry, record.attrs));
    }
    let index = GeometryIndex::build(parsed);
    if index.stats().rejected > 0 {
        tracing::warn!(
            layer = name,
            rejected = index.stats().rejected,
            "layer contains unboundable geometries"
        );
    }
    Ok(index)
}

fn fatal(name: &str) -> impl FnOnce(arbor_core::Error) -> SpatialError + '_ {
    move |e| SpatialError::Storage(arbor_core::Error::other(format!("layer {}: {}", name, e)))
}

fn named(name: &str, e: SpatialError) -> SpatialError {
    match e {
        SpatialError::FormatError(msg) => {
            SpatialError::FormatError(format!("layer {}: {}", name, msg))
        }
        other => other,
    }
}
