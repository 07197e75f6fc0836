//! Deduplication configuration types.

/// Configuration for point deduplication.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Two observations from different sources within this distance are
    /// considered the same tree.
    /// Default: 3.0 m
    pub search_radius_m: f64,

    /// Sources processed after everything else, so representative
    /// selection leans toward the higher-confidence loaders.
    /// Default: ["canopies"]
    pub low_confidence_sources: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            search_radius_m: 3.0,
            low_confidence_sources: vec!["canopies".to_string()],
        }
    }
}

impl DedupConfig {
    /// Set the search radius.
    pub fn with_search_radius_m(mut self, radius: f64) -> Self {
        self.search_radius_m = radius;
        self
    }

    /// Set the low-confidence source list.
    pub fn with_low_confidence_sources(mut self, sources: Vec<String>) -> Self {
        self.low_confidence_sources = sources;
        self
    }
}

/// Configuration for canopy clustering.
#[derive(Debug, Clone)]
pub struct CanopyConfig {
    /// Bounding-box expansion applied to each candidate query, catching
    /// near-touching footprints whose boxes don't quite overlap.
    /// Default: 0.5 m
    pub bbox_buffer_m: f64,

    /// Emit the boolean union of all member footprints instead of the
    /// representative's geometry alone.
    /// Default: false
    pub merge_geometry: bool,

    /// Smallest footprint area kept when extracting tree points.
    /// Default: 4.0 m²
    pub min_area_sqm: f64,

    /// Largest footprint area kept when extracting tree points.
    /// Default: 200.0 m²
    pub max_area_sqm: f64,
}

impl Default for CanopyConfig {
    fn default() -> Self {
        Self {
            bbox_buffer_m: 0.5,
            merge_geometry: false,
            min_area_sqm: 4.0,
            max_area_sqm: 200.0,
        }
    }
}

impl CanopyConfig {
    /// Set the candidate-query bbox buffer.
    pub fn with_bbox_buffer_m(mut self, buffer: f64) -> Self {
        self.bbox_buffer_m = buffer;
        self
    }

    /// Enable emitting merged member geometry.
    pub fn with_merge_geometry(mut self, merge: bool) -> Self {
        self.merge_geometry = merge;
        self
    }

    /// Set the extraction area band.
    pub fn with_area_band(mut self, min_sqm: f64, max_sqm: f64) -> Self {
        self.min_area_sqm = min_sqm;
        self.max_area_sqm = max_sqm;
        self
    }
}
