//! Reference layer configuration.
//!
//! A layer spec names a persisted reference layer and the attribute
//! mapping the joiner applies on a containment match: for each mapping,
//! the polygon payload's `source` attribute is copied to the record's
//! `output` field. The built-in specs cover the four national layers the
//! pipeline enriches against.

/// One attribute copied from a matching polygon onto the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    /// Field name written on the enriched record.
    pub output: String,

    /// Attribute name read from the polygon payload.
    pub source: String,
}

impl FieldMapping {
    /// Map a payload attribute to an output field of the same name.
    pub fn same(name: &str) -> Self {
        Self {
            output: name.to_string(),
            source: name.to_string(),
        }
    }

    /// Map a payload attribute to a differently-named output field.
    pub fn renamed(output: &str, source: &str) -> Self {
        Self {
            output: output.to_string(),
            source: source.to_string(),
        }
    }
}

/// A named reference layer and the attributes it contributes.
#[derive(Debug, Clone)]
pub struct LayerSpec {
    /// Logical layer name, also the persistence key.
    pub name: String,

    /// Attributes copied on match. On a miss every output field is set
    /// to null — never a partial fill.
    pub fields: Vec<FieldMapping>,
}

impl LayerSpec {
    /// Create a spec from `(output, source)` field pairs.
    pub fn new(name: &str, fields: Vec<FieldMapping>) -> Self {
        Self {
            name: name.to_string(),
            fields,
        }
    }

    /// Cadastral parcels: block/parcel codes plus locality context.
    pub fn parcels() -> Self {
        Self::new(
            "parcels",
            vec![
                FieldMapping::renamed("parcel-code", "code"),
                FieldMapping::same("gush"),
                FieldMapping::same("parcel"),
                FieldMapping::same("city_code"),
                FieldMapping::same("city_name"),
            ],
        )
    }

    /// Municipal boundaries.
    pub fn munis() -> Self {
        Self::new(
            "munis",
            vec![
                FieldMapping::same("muni_code"),
                FieldMapping::same("muni_name"),
                FieldMapping::same("muni_name_en"),
                FieldMapping::same("muni_region"),
            ],
        )
    }

    /// Census statistical areas.
    pub fn stat_areas() -> Self {
        Self::new(
            "stat_areas",
            vec![
                FieldMapping::renamed("stat-area-code", "code"),
                FieldMapping::same("city_code"),
                FieldMapping::same("city_name"),
                FieldMapping::same("city_name_en"),
                FieldMapping::same("area_code"),
                FieldMapping::same("rova_name"),
                FieldMapping::same("tat_rova_name"),
            ],
        )
    }

    /// Buffered road corridors (polygons prepared upstream).
    pub fn roads() -> Self {
        Self::new(
            "roads",
            vec![
                FieldMapping::same("road_type"),
                FieldMapping::same("road_name"),
            ],
        )
    }
}
