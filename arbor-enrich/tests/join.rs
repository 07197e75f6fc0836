//! Reference-join scenarios against a persisted parcel layer.

use arbor_core::{AttrMap, MemoryStorage, PointObservation};
use arbor_dedup::{dedup_trees, DedupConfig};
use arbor_enrich::{LayerSpec, ReferenceJoiner};
use arbor_spatial::{LayerRecord, LayerStore};
use serde_json::Value;
use std::sync::Arc;

fn parcel_records() -> Vec<LayerRecord> {
    let mut inside = AttrMap::new();
    inside.insert("gush".to_string(), Value::String("101".to_string()));
    inside.insert("parcel".to_string(), Value::String("7".to_string()));
    inside.insert("code".to_string(), Value::String("101/7".to_string()));
    vec![LayerRecord {
        wkt: "POLYGON((34.70 32.00,34.80 32.00,34.80 32.10,34.70 32.10,34.70 32.00))".to_string(),
        attrs: inside,
    }]
}

#[tokio::test]
async fn contained_point_gets_parcel_attributes() {
    let store = LayerStore::new(Arc::new(MemoryStorage::new()));
    let layer = store
        .get_or_build("parcels", || Ok(parcel_records()))
        .await
        .unwrap();
    let joiner = ReferenceJoiner::new(layer, LayerSpec::parcels());

    let mut attrs = AttrMap::new();
    joiner.join(34.75, 32.05, &mut attrs);
    assert_eq!(attrs["gush"], "101");
    assert_eq!(attrs["parcel"], "7");
    assert_eq!(attrs["parcel-code"], "101/7");
}

#[tokio::test]
async fn uncontained_point_gets_all_nulls() {
    let store = LayerStore::new(Arc::new(MemoryStorage::new()));
    let layer = store
        .get_or_build("parcels", || Ok(parcel_records()))
        .await
        .unwrap();
    let joiner = ReferenceJoiner::new(layer, LayerSpec::parcels());

    let mut attrs = AttrMap::new();
    joiner.join(35.50, 33.00, &mut attrs);
    for field in &joiner.spec().fields {
        assert_eq!(attrs[&field.output], Value::Null, "field {}", field.output);
    }
}

/// Deduplicated records flow into the joiner: both members of a merged
/// tree resolve to the same parcel.
#[tokio::test]
async fn dedup_output_joins_cleanly() {
    let store = LayerStore::new(Arc::new(MemoryStorage::new()));
    let layer = store
        .get_or_build("parcels", || Ok(parcel_records()))
        .await
        .unwrap();
    let joiner = ReferenceJoiner::new(layer, LayerSpec::parcels());

    let two_m = 34.75 + 2.0 / 94_000.0;
    let points = vec![
        PointObservation::new("survey", 34.75, 32.05, AttrMap::new()).unwrap(),
        PointObservation::new("remote-sensing", two_m, 32.05, AttrMap::new()).unwrap(),
    ];
    let deduped = dedup_trees(points, &DedupConfig::default());
    assert_eq!(deduped[0].tree_id, deduped[1].tree_id);

    for tree in &deduped {
        let mut attrs = tree.observation.attrs.clone();
        joiner.join(tree.observation.lng, tree.observation.lat, &mut attrs);
        assert_eq!(attrs["gush"], "101");
    }
}
