//! Point-in-polygon attribute joins.
//!
//! For each point the joiner asks the layer index for candidates at a
//! zero-area box, re-tests true containment, and copies the configured
//! attributes from the containing polygon. No containing polygon means
//! every configured field is set to null — the output schema is identical
//! either way.
//!
//! Reference layers are built so their polygons do not overlap. When that
//! assumption is violated anyway, all candidates are still tested and the
//! lowest entry id wins, so the answer does not depend on index iteration
//! order; the violation is logged.

use crate::layers::LayerSpec;
use arbor_core::AttrMap;
use arbor_spatial::{geometry, BBox, ReferenceLayer};
use geo_types::Point;
use serde_json::Value;
use std::sync::Arc;

/// Joins point records against one reference layer.
pub struct ReferenceJoiner {
    layer: Arc<ReferenceLayer>,
    spec: LayerSpec,
}

impl ReferenceJoiner {
    /// Create a joiner over a built layer index.
    pub fn new(layer: Arc<ReferenceLayer>, spec: LayerSpec) -> Self {
        Self { layer, spec }
    }

    /// The layer spec this joiner applies.
    pub fn spec(&self) -> &LayerSpec {
        &self.spec
    }

    /// Payload of the polygon containing the point, if any.
    ///
    /// Candidates that fail geometry validity are logged and treated as
    /// non-containing; the point still gets a conservative "no match".
    pub fn locate(&self, lng: f64, lat: f64) -> Option<&AttrMap> {
        let point = Point::new(lng, lat);
        let mut containing: Option<(u64, &AttrMap)> = None;
        let mut matches = 0usize;

        for candidate in self.layer.query(&BBox::point(lng, lat)) {
            match geometry::contains_point(&candidate.geometry, &point) {
                Ok(true) => {
                    matches += 1;
                    match containing {
                        Some((id, _)) if id <= candidate.id => {}
                        _ => containing = Some((candidate.id, &candidate.payload)),
                    }
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(
                        layer = %self.spec.name,
                        candidate = candidate.id,
                        error = %e,
                        "skipping invalid candidate polygon"
                    );
                }
            }
        }

        if matches > 1 {
            tracing::warn!(
                layer = %self.spec.name,
                lng,
                lat,
                matches,
                "point contained by multiple reference polygons"
            );
        }
        containing.map(|(_, attrs)| attrs)
    }

    /// Write the configured attributes onto `attrs`: all copied from the
    /// containing polygon, or all null when no polygon contains the point.
    pub fn join(&self, lng: f64, lat: f64, attrs: &mut AttrMap) {
        let payload = self.locate(lng, lat);
        for field in &self.spec.fields {
            let value = payload
                .and_then(|p| p.get(&field.source))
                .cloned()
                .unwrap_or(Value::Null);
            attrs.insert(field.output.clone(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::FieldMapping;
    use arbor_spatial::{parse_wkt, GeometryIndex};

    fn layer_of(polygons: &[(&str, &str)]) -> Arc<ReferenceLayer> {
        let records = polygons.iter().enumerate().map(|(i, (wkt, gush))| {
            let mut attrs = AttrMap::new();
            attrs.insert("gush".to_string(), Value::String(gush.to_string()));
            (i as u64, parse_wkt(wkt).unwrap(), attrs)
        });
        Arc::new(GeometryIndex::build(records))
    }

    fn gush_spec() -> LayerSpec {
        LayerSpec::new("parcels", vec![FieldMapping::same("gush")])
    }

    #[test]
    fn test_inside_copies_attributes() {
        let layer = layer_of(&[("POLYGON((0 0,4 0,4 4,0 4,0 0))", "101")]);
        let joiner = ReferenceJoiner::new(layer, gush_spec());

        let mut attrs = AttrMap::new();
        joiner.join(2.0, 2.0, &mut attrs);
        assert_eq!(attrs["gush"], "101");
    }

    #[test]
    fn test_outside_fills_null() {
        let layer = layer_of(&[("POLYGON((0 0,4 0,4 4,0 4,0 0))", "101")]);
        let joiner = ReferenceJoiner::new(layer, gush_spec());

        let mut attrs = AttrMap::new();
        joiner.join(9.0, 9.0, &mut attrs);
        assert_eq!(attrs["gush"], Value::Null);
    }

    #[test]
    fn test_overlap_resolves_to_lowest_id() {
        let layer = layer_of(&[
            ("POLYGON((0 0,4 0,4 4,0 4,0 0))", "101"),
            ("POLYGON((1 1,5 1,5 5,1 5,1 1))", "102"),
        ]);
        let joiner = ReferenceJoiner::new(layer, gush_spec());
        assert_eq!(joiner.locate(2.0, 2.0).unwrap()["gush"], "101");
        // A point only the second polygon contains.
        assert_eq!(joiner.locate(4.5, 4.5).unwrap()["gush"], "102");
    }

    #[test]
    fn test_missing_source_attribute_is_null() {
        let layer = layer_of(&[("POLYGON((0 0,4 0,4 4,0 4,0 0))", "101")]);
        let spec = LayerSpec::new(
            "parcels",
            vec![FieldMapping::same("gush"), FieldMapping::same("parcel")],
        );
        let joiner = ReferenceJoiner::new(layer, spec);

        let mut attrs = AttrMap::new();
        joiner.join(2.0, 2.0, &mut attrs);
        assert_eq!(attrs["gush"], "101");
        assert_eq!(attrs["parcel"], Value::Null);
    }
}
